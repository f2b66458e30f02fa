//! Seeded random sources.
//!
//! Weighted branches are the only randomness inside an agent, and each agent
//! draws from its own [`AgentRng`].  Its stream is keyed on the run seed and
//! the agent's id, so one agent's choices never shift another's and a run
//! replays exactly for a given seed and spawn order.  [`SimRng`] is for the
//! host: picking targets, rolling outcomes of world events.

use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::AgentId;

/// Golden-ratio increment; spreads consecutive ids across the seed space.
const GOLDEN: u64 = 0x9e37_79b9_7f4a_7c15;

/// An agent's private random stream.
pub struct AgentRng(SmallRng);

impl AgentRng {
    pub fn new(run_seed: u64, agent: AgentId) -> Self {
        let key = u64::from(agent.0).wrapping_add(1).wrapping_mul(GOLDEN);
        AgentRng(SmallRng::seed_from_u64(run_seed ^ key))
    }

    /// Uniform pick in `range`, used when every weight in a branch is zero.
    #[inline]
    pub fn gen_range<T: SampleUniform, R: SampleRange<T>>(&mut self, range: R) -> T {
        self.0.gen_range(range)
    }

    /// Uniform draw in `[0, upper)`; `0.0` for a non-positive `upper`.
    #[inline]
    pub fn unit_scaled(&mut self, upper: f32) -> f32 {
        if upper > 0.0 { self.0.r#gen::<f32>() * upper } else { 0.0 }
    }
}

/// Host-side random stream, independent of every agent's.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    #[inline]
    pub fn gen_range<T: SampleUniform, R: SampleRange<T>>(&mut self, range: R) -> T {
        self.0.gen_range(range)
    }

    /// `true` with probability `p`, clamped into `[0, 1]`.
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }
}
