//! The `Sim` struct and its tick loop.

use std::time::Duration;

use ar_agent::{Agent, AgentBuilder};
use ar_core::{AgentId, ArError, SimClock, SimConfig, SimTime, TimerQueue};
use ar_token::TokenScheduler;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::{AgentRoster, SimError, SimObserver, SimResult};

/// Events the driver schedules for itself.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum SimEvent {
    /// Bring a spawned or suspended agent online.
    Activate(AgentId),
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// `Sim` owns the clock, the token pool and every registered agent, and
/// drives the fixed-step tick loop:
///
/// 1. **Activations**: deferred activations due this tick bring agents online.
/// 2. **Cooldowns**: expired token cooldowns return their slots and queued
///    requests are granted ([`TokenScheduler::advance`]).
/// 3. **Agents**: every active agent ticks once, in registration order.
/// 4. **Clock**: advances by one step.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim {
    /// Global configuration (step length, tick count, seed).
    pub config: SimConfig,

    clock:     SimClock,
    scheduler: TokenScheduler,
    roster:    AgentRoster,

    /// Deferred activations.  `pending` holds the live deadline per agent;
    /// popped events that disagree with it are stale.
    timers:  TimerQueue<SimEvent>,
    pending: FxHashMap<AgentId, SimTime>,

    next_id: u32,
}

impl Sim {
    pub(crate) fn new(config: SimConfig, scheduler: TokenScheduler) -> Self {
        Self {
            config,
            clock:   SimClock::new(),
            scheduler,
            roster:  AgentRoster::new(),
            timers:  TimerQueue::new(),
            pending: FxHashMap::default(),
            next_id: 0,
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────

    #[inline]
    pub fn now(&self) -> SimTime {
        self.clock.now
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn scheduler(&self) -> &TokenScheduler {
        &self.scheduler
    }

    pub fn agents(&self) -> &AgentRoster {
        &self.roster
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.roster.get(id)
    }

    /// Mutable access for the host, e.g. to update an agent's components.
    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.roster.get_mut(id)
    }

    /// `true` while at least one registered agent is active.
    pub fn in_combat(&self) -> bool {
        self.roster.iter().any(Agent::is_active)
    }

    /// Deadline of `id`'s deferred activation, if one is scheduled.
    pub fn pending_activation(&self, id: AgentId) -> Option<SimTime> {
        self.pending.get(&id).copied()
    }

    // ── Run loop ──────────────────────────────────────────────────────────

    /// Run `config.total_ticks` fixed steps from the current time.
    ///
    /// Use [`NoopObserver`][crate::NoopObserver] if you don't need callbacks.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        self.run_ticks(self.config.total_ticks, observer)?;
        observer.on_sim_end(self.clock.now);
        Ok(())
    }

    /// Run exactly `n` fixed steps.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        let dt = self.config.step();
        for _ in 0..n {
            self.tick(dt, observer)?;
        }
        Ok(())
    }

    /// Process one tick of length `dt` at the current time, then advance
    /// the clock by `dt`.
    ///
    /// Fails with [`SimError::Token`] if the pool bookkeeping is found
    /// inconsistent after the agents have ticked.
    pub fn tick<O: SimObserver>(&mut self, dt: Duration, observer: &mut O) -> SimResult<()> {
        let now = self.clock.now;
        observer.on_tick_start(now);

        self.fire_activations(now);
        self.scheduler.advance(now, &mut self.roster);
        for agent in self.roster.iter_mut() {
            agent.tick(dt, now, &mut self.scheduler);
        }

        self.scheduler.check_invariants()?;

        observer.on_tick_end(now, &self.roster, &self.scheduler);
        self.clock.advance(dt);
        Ok(())
    }

    fn fire_activations(&mut self, now: SimTime) {
        for (deadline, event) in self.timers.pop_due(now) {
            match event {
                SimEvent::Activate(id) => {
                    if self.pending.get(&id) != Some(&deadline) {
                        trace!(agent = %id, %deadline, "stale activation timer ignored");
                        continue;
                    }
                    self.pending.remove(&id);
                    if let Some(agent) = self.roster.get_mut(id) {
                        agent.activate(now);
                    }
                }
            }
        }
    }

    fn schedule_activation(&mut self, id: AgentId, at: SimTime) {
        self.pending.insert(id, at);
        self.timers.push(at, SimEvent::Activate(id));
        debug!(agent = %id, %at, "activation scheduled");
    }

    // ── Agent lifecycle ───────────────────────────────────────────────────

    /// Register a new agent under the next free id.
    ///
    /// The agent comes online at once, or after its configured enable delay.
    /// Ids are never reused.
    pub fn spawn(&mut self, builder: AgentBuilder) -> SimResult<AgentId> {
        let id = AgentId(self.next_id);
        let next = self.next_id.checked_add(1).ok_or(SimError::IdsExhausted(self.next_id))?;
        let delay = builder.agent_config().enable_delay();

        let mut agent = builder.build(id, self.config.seed)?;
        let now = self.clock.now;
        if delay.is_zero() {
            agent.activate(now);
        }
        self.roster.push(agent);
        self.next_id = next;
        if !delay.is_zero() {
            self.schedule_activation(id, now + delay);
        }
        debug!(agent = %id, %now, ?delay, "agent spawned");
        Ok(id)
    }

    /// Bring `id` online now, cancelling any deferred activation.
    /// `Ok(false)` if it was already active.
    pub fn activate(&mut self, id: AgentId) -> SimResult<bool> {
        let now = self.clock.now;
        let agent = self.roster.get_mut(id).ok_or(ArError::AgentNotFound(id))?;
        self.pending.remove(&id);
        Ok(agent.activate(now))
    }

    /// Take `id` offline, releasing its token state and handing any freed
    /// slot to the best queued request.  Cancels any deferred activation.
    pub fn deactivate(&mut self, id: AgentId) -> SimResult<bool> {
        let now = self.clock.now;
        let agent = self.roster.get_mut(id).ok_or(ArError::AgentNotFound(id))?;
        self.pending.remove(&id);
        let changed = agent.deactivate(&mut self.scheduler, now);
        self.scheduler.grant_next_tokens(&mut self.roster, now);
        Ok(changed)
    }

    /// Deactivate `id` now and bring it back online after `delay`.
    pub fn suspend_for(&mut self, id: AgentId, delay: Duration) -> SimResult<()> {
        self.deactivate(id)?;
        let at = self.clock.now + delay;
        self.schedule_activation(id, at);
        Ok(())
    }

    /// Deactivate and unregister `id`, returning the agent.  Any slot it held
    /// goes to the best queued request.
    pub fn remove(&mut self, id: AgentId) -> SimResult<Agent> {
        let now = self.clock.now;
        let agent = self.roster.get_mut(id).ok_or(ArError::AgentNotFound(id))?;
        agent.deactivate(&mut self.scheduler, now);
        self.pending.remove(&id);

        let agent = self.roster.remove(id).ok_or(ArError::AgentNotFound(id))?;
        self.scheduler.grant_next_tokens(&mut self.roster, now);
        debug!(agent = %id, %now, remaining = self.roster.len(), "agent removed");
        Ok(agent)
    }

    /// Remove every registered agent.  Returns how many were removed.
    pub fn remove_all(&mut self) -> usize {
        let now = self.clock.now;
        let ids = self.roster.ids();
        for &id in &ids {
            if let Some(agent) = self.roster.get_mut(id) {
                agent.deactivate(&mut self.scheduler, now);
            }
            self.roster.remove(id);
        }
        self.pending.clear();
        self.timers.retain(|_| false);
        debug!(%now, removed = ids.len(), "all agents removed");
        ids.len()
    }

    /// External preemption: `id` drops its current behavior and returns any
    /// held token.
    pub fn disrupt(&mut self, id: AgentId) -> SimResult<()> {
        let now = self.clock.now;
        let agent = self.roster.get_mut(id).ok_or(ArError::AgentNotFound(id))?;
        agent.on_disruption_event(&mut self.scheduler, now);
        Ok(())
    }

    /// Set or clear `id`'s disruption flag.
    pub fn set_disrupted(&mut self, id: AgentId, disrupted: bool) -> SimResult<()> {
        let agent = self.roster.get_mut(id).ok_or(ArError::AgentNotFound(id))?;
        agent.set_disrupted(disrupted);
        Ok(())
    }

    /// Withdraw `id`'s queued token request.  `Ok(false)` if none was queued.
    pub fn revoke_request(&mut self, id: AgentId) -> SimResult<bool> {
        let agent = self.roster.get_mut(id).ok_or(ArError::AgentNotFound(id))?;
        Ok(self.scheduler.revoke_request(agent))
    }

    // ── Token pool ────────────────────────────────────────────────────────

    /// Resize the token pool.  Growth is granted to queued requests at once.
    pub fn set_pool_size(&mut self, size: usize) {
        let now = self.clock.now;
        self.scheduler.set_pool_size(size, &mut self.roster, now);
    }
}

impl std::fmt::Debug for Sim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sim")
            .field("clock", &self.clock)
            .field("agents", &self.roster.len())
            .field("scheduler", &self.scheduler)
            .field("pending_activations", &self.pending.len())
            .finish()
    }
}
