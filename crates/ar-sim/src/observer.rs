//! Simulation observer trait for progress reporting and data collection.

use ar_core::SimTime;
use ar_token::TokenScheduler;

use crate::AgentRoster;

/// Callbacks invoked by [`Sim::tick`][crate::Sim::tick] and
/// [`Sim::run`][crate::Sim::run] at tick boundaries.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.  Per-agent events (grants, returns, state
/// changes) are reported through [`ar_agent::AgentObserver`] instead.
///
/// # Example: holder count printer
///
/// ```rust,ignore
/// struct Holders;
///
/// impl SimObserver for Holders {
///     fn on_tick_end(&mut self, now: SimTime, _agents: &AgentRoster, tokens: &TokenScheduler) {
///         println!("{now}: {} holding", tokens.holder_count());
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each tick, before any timer fires.
    fn on_tick_start(&mut self, _now: SimTime) {}

    /// Called after every agent has ticked, before the clock advances.
    ///
    /// Provides read-only access to the agents and the token pool so that
    /// recorders can sample state without the sim knowing their format.
    fn on_tick_end(
        &mut self,
        _now:    SimTime,
        _agents: &AgentRoster,
        _tokens: &TokenScheduler,
    ) {}

    /// Called once after the final tick of [`Sim::run`][crate::Sim::run].
    fn on_sim_end(&mut self, _final_time: SimTime) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
