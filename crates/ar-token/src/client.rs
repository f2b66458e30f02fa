//! The scheduler's view of agents.
//!
//! The scheduler never owns agents.  It reaches them through two seams:
//!
//! - [`TokenClient`]: one agent, passed in directly when that agent is the one
//!   acting (`request_token`, `return_token`, `revoke_request`).
//! - [`TokenRoster`]: id → client lookup for passes that touch agents other
//!   than the caller (`grant_next_tokens`, cooldown expiry in `advance`).

use std::time::Duration;

use ar_core::{AgentId, SimTime, TokenStatus};

/// Raw inputs of the grant-priority function for one agent.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PriorityInputs {
    /// When the agent last received a token (or was activated).
    pub last_token_at: SimTime,
    /// External attention signal, nominally in `[-1, 1]`.
    pub attention:     f32,
    /// Per-agent multiplier, always `> 0`.
    pub modifier:      f32,
}

/// One agent as seen by the [`TokenScheduler`][crate::TokenScheduler].
///
/// Status callbacks are notifications: the scheduler has already updated its
/// own bookkeeping when they run, and they must not call back into it.
pub trait TokenClient {
    fn id(&self) -> AgentId;

    /// The agent's own record of its token status.
    fn token_status(&self) -> TokenStatus;

    /// Grant-time eligibility: not holding, not cooling down, the token tree
    /// can resolve and every request gate passes.
    fn can_receive_token(&self) -> bool;

    fn priority_inputs(&self) -> PriorityInputs;

    /// How long the agent waits after returning a token before it may ask
    /// again.  `None` uses the scheduler's cooldown.  The returned slot
    /// follows the pool delay regardless.
    fn token_cooldown(&self) -> Option<Duration> {
        None
    }

    /// No token was free; the request is waiting in the queue.
    fn on_request_queued(&mut self) {}

    /// A queued request was revoked, or failed its grant-time eligibility
    /// check.  The agent is back to `TokenStatus::None`.
    fn on_request_dropped(&mut self) {}

    /// A token was granted at `now`.
    fn on_token_granted(&mut self, now: SimTime);

    /// The agent's token was taken back at `now`; its cooldown has started.
    fn on_token_returned(&mut self, _now: SimTime) {}

    /// The agent's own cooldown elapsed at `now`.
    fn on_cooldown_finished(&mut self, _now: SimTime) {}
}

/// Lookup of registered clients by id.
pub trait TokenRoster {
    fn client(&mut self, id: AgentId) -> Option<&mut dyn TokenClient>;
}

/// Linear-scan roster over any owned collection of clients.
impl<C: TokenClient> TokenRoster for Vec<C> {
    fn client(&mut self, id: AgentId) -> Option<&mut dyn TokenClient> {
        self.iter_mut()
            .find(|c| c.id() == id)
            .map(|c| c as &mut dyn TokenClient)
    }
}
