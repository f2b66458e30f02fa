//! Grant-priority function.

use ar_core::SimTime;

use crate::{PriorityInputs, PriorityWeights};

/// Attention signal clamped into `[0, damping]` and rescaled to `[0, 1]`.
#[inline]
pub fn attention_term(signal: f32, damping: f64) -> f64 {
    let s = f64::from(signal);
    if s.is_nan() {
        return 0.0;
    }
    if damping > 0.0 {
        s.clamp(0.0, damping) / damping
    } else {
        s.clamp(0.0, 1.0)
    }
}

/// Priority of a pending request at `now`.  Higher is granted first.
pub fn priority(inputs: &PriorityInputs, now: SimTime, weights: &PriorityWeights) -> f64 {
    let recency = now.saturating_since(inputs.last_token_at).as_secs_f64();
    let base = recency * weights.time_weight
        + attention_term(inputs.attention, weights.attention_damping) * weights.attention_weight;
    base * f64::from(inputs.modifier)
}
