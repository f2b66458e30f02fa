//! `TokenScheduler`: the single owner of the token pool.
//!
//! # Bookkeeping
//!
//! | Field       | Meaning                                                     |
//! |-------------|-------------------------------------------------------------|
//! | `available` | free tokens                                                 |
//! | `holders`   | agents holding a token                                      |
//! | `pending`   | queued requests, oldest first                               |
//! | `cooling`   | returned slots waiting out the pool's re-availability delay |
//! | `cooldowns` | agents cooling down → the deadline they may ask again       |
//! | `debt`      | slots owed after shrinking the pool below its in-use count  |
//!
//! Conservation: `available + |holders| + cooling == pool_size + debt`.
//! A returned token stays out of circulation until the pool delay elapses, so
//! with no outstanding debt `available + |holders| <= pool_size`.
//!
//! # Two cooldowns
//!
//! Returning a token starts two independent timers.  The slot comes back to
//! the pool after the scheduler's `cooldown_secs`; the agent may ask again
//! after its own [`TokenClient::token_cooldown`], defaulting to the same
//! value.  Neither one waits for the other.
//!
//! Both kinds of expiry sit in one `TimerQueue<Expiry>` popped by
//! [`TokenScheduler::advance`].  Cancelling an agent's cooldown only forgets
//! its entry in `cooldowns`; the queued timer is recognised as stale when it
//! fires.  Slot timers are never cancelled.

use std::time::Duration;

use ar_core::{AgentId, SimTime, TimerQueue, TokenStatus, secs};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::{TokenClient, TokenConfig, TokenError, TokenResult, TokenRoster, priority};

/// Result of [`TokenScheduler::request_token`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A token was free and has been granted.
    Granted,
    /// No token was free; the request waits in the queue.
    Queued,
    /// The agent is already requesting, holding or cooling down.  No-op.
    AlreadyActive,
    /// The agent failed its eligibility check.  No-op.
    Ineligible,
}

/// A queued cooldown expiry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Expiry {
    /// A returned slot rejoins the pool.
    Slot,
    /// An agent's own cooldown ends.
    Agent(AgentId),
}

pub struct TokenScheduler {
    config:    TokenConfig,
    cooldown:  Duration,
    available: usize,
    debt:      usize,
    cooling:   usize,
    holders:   FxHashSet<AgentId>,
    pending:   Vec<AgentId>,
    cooldowns: FxHashMap<AgentId, SimTime>,
    timers:    TimerQueue<Expiry>,
}

impl TokenScheduler {
    /// A scheduler with every token free.
    pub fn new(config: TokenConfig) -> TokenResult<Self> {
        config.validate()?;
        Ok(Self {
            cooldown:  secs(config.cooldown_secs),
            available: config.pool_size,
            debt:      0,
            cooling:   0,
            holders:   FxHashSet::default(),
            pending:   Vec::new(),
            cooldowns: FxHashMap::default(),
            timers:    TimerQueue::new(),
            config,
        })
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    pub fn pool_size(&self) -> usize {
        self.config.pool_size
    }

    pub fn available(&self) -> usize {
        self.available
    }

    /// Slots still owed after a pool shrink.  Absorbs the next releases.
    pub fn debt(&self) -> usize {
        self.debt
    }

    /// The pool's re-availability delay, also the cooldown of agents
    /// without an override.
    pub fn default_cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Returned slots still waiting out the pool delay.
    pub fn cooling(&self) -> usize {
        self.cooling
    }

    pub fn holders(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.holders.iter().copied()
    }

    pub fn holder_count(&self) -> usize {
        self.holders.len()
    }

    /// Queued requests in arrival order.
    pub fn pending(&self) -> &[AgentId] {
        &self.pending
    }

    /// When `agent` may ask for a token again, if it is cooling down.
    pub fn cooldown_deadline(&self, agent: AgentId) -> Option<SimTime> {
        self.cooldowns.get(&agent).copied()
    }

    /// The earliest slot or agent timer still queued (possibly stale).
    pub fn next_deadline(&self) -> Option<SimTime> {
        self.timers.next_deadline()
    }

    /// The scheduler's view of `agent`'s token status.
    pub fn status_of(&self, agent: AgentId) -> TokenStatus {
        if self.holders.contains(&agent) {
            TokenStatus::Held
        } else if self.cooldowns.contains_key(&agent) {
            TokenStatus::Cooldown
        } else if self.pending.contains(&agent) {
            TokenStatus::Requested
        } else {
            TokenStatus::None
        }
    }

    /// Grant priority of `client` at `now`.
    pub fn priority_of(&self, client: &dyn TokenClient, now: SimTime) -> f64 {
        priority(&client.priority_inputs(), now, &self.config.weights)
    }

    // ── Agent-initiated operations ────────────────────────────────────────

    /// Ask for a token on behalf of `client`.
    ///
    /// Grants immediately when a token is free, otherwise queues the request.
    /// Requests from agents that are already requesting, holding or cooling
    /// down are ignored, as are requests from ineligible agents.
    pub fn request_token(&mut self, client: &mut dyn TokenClient, now: SimTime) -> RequestOutcome {
        let id = client.id();
        if self.status_of(id).blocks_request() || client.token_status().blocks_request() {
            return RequestOutcome::AlreadyActive;
        }
        if !client.can_receive_token() {
            return RequestOutcome::Ineligible;
        }
        if self.available > 0 {
            return if self.grant(client, now) {
                RequestOutcome::Granted
            } else {
                RequestOutcome::Ineligible
            };
        }
        self.pending.push(id);
        client.on_request_queued();
        debug!(agent = %id, queued = self.pending.len(), "token request queued");
        RequestOutcome::Queued
    }

    /// Withdraw `client`'s queued request.  Returns `false` if none was queued.
    pub fn revoke_request(&mut self, client: &mut dyn TokenClient) -> bool {
        let id = client.id();
        let Some(pos) = self.pending.iter().position(|&p| p == id) else {
            return false;
        };
        self.pending.remove(pos);
        client.on_request_dropped();
        debug!(agent = %id, "token request revoked");
        true
    }

    /// Take `client`'s token back and start both cooldowns.
    ///
    /// The slot returns to the pool after the pool delay; the agent may ask
    /// again after its own cooldown (see [`advance`][Self::advance]).
    /// Returns `false` if `client` held no token.
    pub fn return_token(&mut self, client: &mut dyn TokenClient, now: SimTime) -> bool {
        let id = client.id();
        if !self.holders.remove(&id) {
            return false;
        }
        self.cool_slot(now);

        let until = now + client.token_cooldown().unwrap_or(self.cooldown);
        self.cooldowns.insert(id, until);
        self.timers.push(until, Expiry::Agent(id));
        client.on_token_returned(now);
        debug!(agent = %id, %now, %until, "token returned");
        true
    }

    /// Forget `agent` entirely: drop its queued request and its own cooldown,
    /// and give back a held token immediately, without the pool delay.
    ///
    /// A slot the agent returned earlier keeps cooling; it belongs to the
    /// pool, not the agent.
    ///
    /// Returns `true` if a held slot was released.  Follow up with
    /// [`grant_next_tokens`][Self::grant_next_tokens] (or use
    /// [`remove_agent`][Self::remove_agent]) to hand it on.
    pub fn release_agent(&mut self, agent: AgentId) -> bool {
        self.pending.retain(|&p| p != agent);
        if self.cooldowns.remove(&agent).is_some() {
            self.timers.retain(|&e| e != Expiry::Agent(agent));
        }
        let released = self.holders.remove(&agent);
        if released {
            self.release_slot();
            debug!(agent = %agent, available = self.available, "slot released by removal");
        }
        released
    }

    /// [`release_agent`][Self::release_agent], then grant any freed slot to
    /// the best pending request.
    pub fn remove_agent(&mut self, agent: AgentId, roster: &mut dyn TokenRoster, now: SimTime) -> bool {
        let released = self.release_agent(agent);
        if released {
            self.grant_next_tokens(roster, now);
        }
        released
    }

    // ── Driver-initiated operations ───────────────────────────────────────

    /// Fire every timer due at or before `now`.  Expired slots rejoin the
    /// pool and expired agent cooldowns are reported to their agents; a grant
    /// pass follows.  Returns the number of slots that came back.
    pub fn advance(&mut self, now: SimTime, roster: &mut dyn TokenRoster) -> usize {
        let mut returned = 0;
        for (deadline, expiry) in self.timers.pop_due(now) {
            match expiry {
                Expiry::Slot => {
                    self.cooling -= 1;
                    self.release_slot();
                    returned += 1;
                    debug!(%now, available = self.available, "slot back in pool");
                }
                Expiry::Agent(id) => {
                    if self.cooldowns.get(&id) != Some(&deadline) {
                        trace!(agent = %id, %deadline, "stale cooldown timer ignored");
                        continue;
                    }
                    self.cooldowns.remove(&id);
                    debug!(agent = %id, %now, "cooldown finished");
                    if let Some(client) = roster.client(id) {
                        client.on_cooldown_finished(now);
                    }
                }
            }
        }
        if returned > 0 {
            self.grant_next_tokens(roster, now);
        }
        returned
    }

    /// Grant free tokens to queued requests, highest priority first.
    ///
    /// Equal priorities keep queue order.  Requests failing grant-time
    /// eligibility are dropped and do not consume a token.  Returns the number
    /// of tokens granted.
    pub fn grant_next_tokens(&mut self, roster: &mut dyn TokenRoster, now: SimTime) -> usize {
        if self.available == 0 || self.pending.is_empty() {
            return 0;
        }
        let weights = self.config.weights;

        let mut ranked: Vec<(AgentId, f64)> = Vec::with_capacity(self.pending.len());
        for id in self.pending.clone() {
            match roster.client(id) {
                Some(client) => ranked.push((id, priority(&client.priority_inputs(), now, &weights))),
                None => {
                    trace!(agent = %id, "pending agent not in roster, dropping request");
                    self.pending.retain(|&p| p != id);
                }
            }
        }
        // Stable: ties stay in queue order.
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut granted = 0;
        for (id, prio) in ranked {
            if self.available == 0 {
                break;
            }
            let Some(client) = roster.client(id) else { continue };
            trace!(agent = %id, priority = prio, "granting from queue");
            if self.grant(client, now) {
                granted += 1;
            }
        }
        granted
    }

    /// Resize the pool at runtime.
    ///
    /// Growing frees the new tokens at once and runs a grant pass.  Shrinking
    /// takes free tokens out of circulation first; any shortfall becomes
    /// debt, repaid as held or cooling tokens come back.  Held tokens are
    /// never revoked.
    pub fn set_pool_size(&mut self, size: usize, roster: &mut dyn TokenRoster, now: SimTime) {
        let old = self.config.pool_size;
        if size >= old {
            let grow = size - old;
            let repaid = grow.min(self.debt);
            self.debt -= repaid;
            self.available += grow - repaid;
        } else {
            let shrink = old - size;
            let taken = shrink.min(self.available);
            self.available -= taken;
            self.debt += shrink - taken;
        }
        self.config.pool_size = size;
        debug!(old, new = size, available = self.available, debt = self.debt, "token pool resized");
        self.grant_next_tokens(roster, now);
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// Hand a token to `client` if it still qualifies.  The caller checks
    /// that a token is free.
    fn grant(&mut self, client: &mut dyn TokenClient, now: SimTime) -> bool {
        let id = client.id();
        self.pending.retain(|&p| p != id);
        if !client.can_receive_token() {
            debug!(agent = %id, "grant-time eligibility failed, request dropped");
            client.on_request_dropped();
            return false;
        }
        self.available -= 1;
        self.holders.insert(id);
        client.on_token_granted(now);
        debug!(agent = %id, %now, available = self.available, "token granted");
        true
    }

    fn cool_slot(&mut self, now: SimTime) {
        self.cooling += 1;
        self.timers.push(now + self.cooldown, Expiry::Slot);
    }

    fn release_slot(&mut self) {
        if self.debt > 0 {
            self.debt -= 1;
        } else {
            self.available += 1;
        }
    }

    // ── Invariants ────────────────────────────────────────────────────────

    /// Verify pool conservation and that no agent is in two of `holders`,
    /// `pending` and `cooldowns` at once.
    pub fn check_invariants(&self) -> TokenResult<()> {
        let in_use = self.holders.len() + self.cooling;
        if self.available + in_use != self.config.pool_size + self.debt {
            return Err(TokenError::Invariant(format!(
                "available {} + held {} + cooling {} != pool {} + debt {}",
                self.available,
                self.holders.len(),
                self.cooling,
                self.config.pool_size,
                self.debt
            )));
        }
        if self.debt > in_use {
            return Err(TokenError::Invariant(format!("debt {} exceeds in-use {in_use}", self.debt)));
        }
        let mut seen = FxHashSet::default();
        for &id in &self.pending {
            if !seen.insert(id) {
                return Err(TokenError::Invariant(format!("{id} queued twice")));
            }
            if self.holders.contains(&id) {
                return Err(TokenError::Invariant(format!("{id} both holding and queued")));
            }
            if self.cooldowns.contains_key(&id) {
                return Err(TokenError::Invariant(format!("{id} both cooling down and queued")));
            }
        }
        if let Some(id) = self.holders.iter().find(|id| self.cooldowns.contains_key(*id)) {
            return Err(TokenError::Invariant(format!("{id} both holding and cooling down")));
        }
        Ok(())
    }
}

impl std::fmt::Debug for TokenScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenScheduler")
            .field("pool_size", &self.config.pool_size)
            .field("available", &self.available)
            .field("debt", &self.debt)
            .field("holders", &self.holders.len())
            .field("pending", &self.pending)
            .field("cooling", &self.cooling)
            .field("agents_cooling", &self.cooldowns.len())
            .finish()
    }
}
