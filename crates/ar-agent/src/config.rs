//! Per-agent tuning.

use std::time::Duration;

use ar_core::secs;

use crate::{AgentError, AgentResult};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AgentConfig {
    /// Multiplies the agent's grant priority.  Must be `> 0`.
    pub priority_modifier: f32,

    /// Wait after returning a token before asking again.  `None` uses the
    /// scheduler's cooldown.  Does not delay the slot's return to the pool.
    pub token_cooldown_secs: Option<f64>,

    /// Delay between spawning and first activation.
    pub enable_delay_secs: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            priority_modifier:   1.0,
            token_cooldown_secs: None,
            enable_delay_secs:   0.0,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> AgentResult<()> {
        if !self.priority_modifier.is_finite() || self.priority_modifier <= 0.0 {
            return Err(AgentError::InvalidPriorityModifier(self.priority_modifier));
        }
        if let Some(c) = self.token_cooldown_secs {
            if !c.is_finite() || c < 0.0 {
                return Err(AgentError::Config(format!(
                    "token_cooldown_secs must be finite and >= 0, got {c}"
                )));
            }
        }
        if !self.enable_delay_secs.is_finite() || self.enable_delay_secs < 0.0 {
            return Err(AgentError::Config(format!(
                "enable_delay_secs must be finite and >= 0, got {}",
                self.enable_delay_secs
            )));
        }
        Ok(())
    }

    pub fn token_cooldown(&self) -> Option<Duration> {
        self.token_cooldown_secs.map(secs)
    }

    pub fn enable_delay(&self) -> Duration {
        secs(self.enable_delay_secs)
    }
}
