//! Scheduler configuration.

use crate::{TokenError, TokenResult};

/// Weights of the grant-priority function.
///
/// ```text
/// priority = (recency_secs * time_weight + attention_term * attention_weight) * modifier
/// ```
///
/// `attention_term` is the raw attention signal clamped into
/// `[0, attention_damping]` and rescaled to `[0, 1]`.  With a damping of zero
/// the signal is clamped to `[0, 1]` directly.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PriorityWeights {
    pub time_weight:       f64,
    pub attention_weight:  f64,
    pub attention_damping: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            time_weight:       1.0,
            attention_weight:  5.0,
            attention_damping: 0.5,
        }
    }
}

/// Pool and cooldown settings for a [`TokenScheduler`][crate::TokenScheduler].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TokenConfig {
    /// Number of tokens in circulation.
    pub pool_size: usize,

    /// Default time between returning a token and its slot (and the returning
    /// agent) becoming available again.  Agents may override it.
    pub cooldown_secs: f64,

    pub weights: PriorityWeights,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            pool_size:     3,
            cooldown_secs: 1.0,
            weights:       PriorityWeights::default(),
        }
    }
}

impl TokenConfig {
    pub fn validate(&self) -> TokenResult<()> {
        if !self.cooldown_secs.is_finite() || self.cooldown_secs < 0.0 {
            return Err(TokenError::Config(format!(
                "cooldown_secs must be finite and >= 0, got {}",
                self.cooldown_secs
            )));
        }
        let w = &self.weights;
        if !w.time_weight.is_finite() || !w.attention_weight.is_finite() {
            return Err(TokenError::Config("priority weights must be finite".into()));
        }
        if !(0.0..=1.0).contains(&w.attention_damping) {
            return Err(TokenError::Config(format!(
                "attention_damping must lie in [0, 1], got {}",
                w.attention_damping
            )));
        }
        Ok(())
    }
}
