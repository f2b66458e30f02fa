//! `ar-sim`: fixed-step driver loop for the arbiter agent framework.
//!
//! # Tick loop
//!
//! ```text
//! for tick in 0..config.total_ticks:
//!   ① Activations: deferred activations (enable delay, suspension) due now
//!                  bring their agents online; stale timers are skipped.
//!   ② Cooldowns:   TokenScheduler::advance returns expired cooldown slots
//!                  and grants queued requests, highest priority first.
//!   ③ Agents:      every active agent ticks once, in registration order;
//!                  token requests and returns happen inside the tick.
//!   ④ Clock:       now += step.
//! ```
//!
//! Everything is single-threaded and deterministic for a given seed and
//! sequence of host calls.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use ar_agent::AgentBuilder;
//! use ar_core::SimConfig;
//! use ar_sim::{NoopObserver, SimBuilder};
//!
//! let mut sim = SimBuilder::new(SimConfig::default()).build()?;
//! sim.spawn(AgentBuilder::new(&main_tree).token_tree(&attack_tree))?;
//! sim.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod roster;
pub mod sim;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use roster::AgentRoster;
pub use sim::Sim;
