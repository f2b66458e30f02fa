//! `Agent`: one autonomous agent: its trees, its context and its per-tick
//! driver.
//!
//! # Per-tick protocol
//!
//! ```text
//! inactive ─────────────────────────────────────────────▶ return
//! disrupted ────────────────────────────────────────────▶ elapsed += dt
//! otherwise:
//!   update current behavior
//!   finished = no behavior || elapsed > min_duration
//!   next     = current.next_state(finished)
//!   finished && next is None → return held token, next = main.resolve()
//!   next differs from current (or is repeatable) → exit, switch, enter
//!   current is interruptible && status None → request a token
//!   elapsed += dt
//! ```
//!
//! Token grants arrive through the [`TokenClient`] impl: the scheduler calls
//! `on_token_granted`, which switches the agent into its token tree.

use std::sync::Arc;
use std::time::Duration;

use ar_core::{AgentId, AgentRng, NodeId, SimTime, TokenStatus};
use ar_token::{PriorityInputs, TokenClient, TokenScheduler};
use ar_tree::{AgentContext, Behavior, DecisionTree, Guard};
use tracing::debug;

use crate::observer::Observers;
use crate::{AgentConfig, AgentObserver, AttentionSignal, SubscriptionId};

/// Which of the agent's two trees a behavior belongs to.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum TreeSlot {
    Main,
    Token,
}

/// The behavior an agent is currently running.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ActiveBehavior {
    pub slot: TreeSlot,
    pub node: NodeId,
}

fn tree_for<'a>(
    main:  &'a DecisionTree,
    token: Option<&'a DecisionTree>,
    slot:  TreeSlot,
) -> Option<&'a DecisionTree> {
    match slot {
        TreeSlot::Main => Some(main),
        TreeSlot::Token => token,
    }
}

fn behavior_in<'a>(
    main:   &'a DecisionTree,
    token:  Option<&'a DecisionTree>,
    active: ActiveBehavior,
) -> Option<&'a Behavior> {
    tree_for(main, token, active.slot)?.behavior(active.node)
}

pub struct Agent {
    pub(crate) ctx:           AgentContext,
    pub(crate) rng:           AgentRng,
    pub(crate) main:          DecisionTree,
    pub(crate) token_tree:    Option<DecisionTree>,
    pub(crate) current:       Option<ActiveBehavior>,
    pub(crate) config:        AgentConfig,
    pub(crate) gates:         Vec<Arc<dyn Guard>>,
    pub(crate) attention:     Option<Box<dyn AttentionSignal>>,
    pub(crate) observers:     Observers,
    pub(crate) active:        bool,
    pub(crate) last_token_at: SimTime,
}

impl Agent {
    // ── Queries ───────────────────────────────────────────────────────────

    #[inline]
    pub fn id(&self) -> AgentId {
        self.ctx.agent()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn context(&self) -> &AgentContext {
        &self.ctx
    }

    /// Mutable access for the host, e.g. to update components between ticks.
    pub fn context_mut(&mut self) -> &mut AgentContext {
        &mut self.ctx
    }

    pub fn main_tree(&self) -> &DecisionTree {
        &self.main
    }

    pub fn token_tree(&self) -> Option<&DecisionTree> {
        self.token_tree.as_ref()
    }

    pub fn current(&self) -> Option<ActiveBehavior> {
        self.current
    }

    pub fn current_behavior(&self) -> Option<&Behavior> {
        behavior_in(&self.main, self.token_tree.as_ref(), self.current?)
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current_behavior().map(|b| b.name.as_str())
    }

    pub fn state_elapsed(&self) -> Duration {
        self.ctx.state_elapsed()
    }

    pub fn token_status(&self) -> TokenStatus {
        self.ctx.token_status()
    }

    /// When the agent last received a token (or was last activated).
    pub fn last_token_at(&self) -> SimTime {
        self.last_token_at
    }

    pub fn is_disrupted(&self) -> bool {
        self.ctx.is_disrupted()
    }

    /// Set the external disruption flag (stunned, knocked down, ...).
    /// While set, ticks only advance the state timer.
    pub fn set_disrupted(&mut self, disrupted: bool) {
        self.ctx.set_disrupted(disrupted);
    }

    // ── Observers ─────────────────────────────────────────────────────────

    pub fn subscribe(&mut self, observer: Box<dyn AgentObserver>) -> SubscriptionId {
        self.observers.subscribe(observer)
    }

    /// Remove a subscription, handing the observer back.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> Option<Box<dyn AgentObserver>> {
        self.observers.unsubscribe(id)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Start ticking.  Resets the recency clock used for grant priority.
    /// Returns `false` if already active.
    pub fn activate(&mut self, now: SimTime) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.last_token_at = now;
        self.ctx.set_now(now);
        let id = self.id();
        debug!(agent = %id, %now, "agent activated");
        self.observers.each(|o| o.on_activate(id, now));
        true
    }

    /// Stop ticking: exit the current behavior, give up any token request,
    /// held token or running cooldown.  Returns `false` if already inactive.
    ///
    /// A slot freed here is not handed on; the caller runs
    /// [`TokenScheduler::grant_next_tokens`] afterwards.
    pub fn deactivate(&mut self, scheduler: &mut TokenScheduler, now: SimTime) -> bool {
        if !self.active {
            return false;
        }
        self.ctx.set_now(now);
        self.change_behavior(None, now);

        let id = self.id();
        let was_holding = self.ctx.token_status() == TokenStatus::Held;
        scheduler.release_agent(id);
        self.ctx.set_token_status(TokenStatus::None);
        if was_holding {
            self.observers.each(|o| o.on_return_token(id, now));
        }

        self.active = false;
        debug!(agent = %id, %now, "agent deactivated");
        self.observers.each(|o| o.on_deactivate(id, now));
        true
    }

    /// External preemption: break out of the current behavior without
    /// choosing a new one and return a held token.  The next tick resolves
    /// the main tree afresh.
    pub fn on_disruption_event(&mut self, scheduler: &mut TokenScheduler, now: SimTime) {
        self.ctx.set_now(now);
        self.change_behavior(None, now);
        if self.ctx.token_status() == TokenStatus::Held {
            scheduler.return_token(self, now);
        }
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// Advance the agent by one step of length `dt` ending at `now`.
    pub fn tick(&mut self, dt: Duration, now: SimTime, scheduler: &mut TokenScheduler) {
        if !self.active {
            return;
        }
        self.ctx.set_now(now);

        if !self.ctx.is_disrupted() {
            self.step(now, scheduler);
        }

        let elapsed = self.ctx.state_elapsed() + dt;
        self.ctx.set_state_elapsed(elapsed);
    }

    fn step(&mut self, now: SimTime, scheduler: &mut TokenScheduler) {
        if let Some(cur) = self.current {
            if let Some(tree) = tree_for(&self.main, self.token_tree.as_ref(), cur.slot) {
                tree.update(cur.node, &mut self.ctx);
            }
        }

        let finished = match self.current_behavior() {
            None => true,
            Some(b) => self.ctx.state_elapsed() > b.min_duration,
        };

        let mut next = self.current.and_then(|cur| {
            let tree = match cur.slot {
                TreeSlot::Main => &mut self.main,
                TreeSlot::Token => self.token_tree.as_mut()?,
            };
            let node = tree.next_state(cur.node, &self.ctx, &mut self.rng, finished)?;
            Some(ActiveBehavior { slot: cur.slot, node })
        });

        if finished && next.is_none() {
            if self.ctx.token_status() == TokenStatus::Held {
                scheduler.return_token(self, now);
            }
            next = self
                .main
                .resolve(&self.ctx, &mut self.rng)
                .map(|node| ActiveBehavior { slot: TreeSlot::Main, node });
        }

        if let Some(next) = next {
            let repeatable = behavior_in(&self.main, self.token_tree.as_ref(), next)
                .is_some_and(|b| b.repeatable);
            if Some(next) != self.current || repeatable {
                self.change_behavior(Some(next), now);
            }
        }

        let interruptible = self.current_behavior().is_some_and(|b| b.interruptible);
        if interruptible && !self.ctx.token_status().blocks_request() {
            scheduler.request_token(self, now);
        }
    }

    /// Exit the current behavior, switch to `next` and enter it.
    fn change_behavior(&mut self, next: Option<ActiveBehavior>, now: SimTime) {
        let from = self.current.take();
        if from.is_none() && next.is_none() {
            return;
        }
        if let Some(cur) = from {
            if let Some(tree) = tree_for(&self.main, self.token_tree.as_ref(), cur.slot) {
                tree.exit(cur.node, &mut self.ctx);
            }
        }

        self.current = next;
        self.ctx.set_state_elapsed(Duration::ZERO);

        if let Some(n) = next {
            if let Some(tree) = tree_for(&self.main, self.token_tree.as_ref(), n.slot) {
                tree.enter(n.node, &mut self.ctx);
            }
        }

        let id = self.ctx.agent();
        let token = self.token_tree.as_ref();
        let from_name = from.and_then(|b| behavior_in(&self.main, token, b)).map(|b| b.name.as_str());
        let to_name = next.and_then(|b| behavior_in(&self.main, token, b)).map(|b| b.name.as_str());
        debug!(agent = %id, from = ?from_name, to = ?to_name, "behavior changed");
        self.observers.each(|o| o.on_state_change(id, from_name, to_name, now));
    }
}

// ── Scheduler seam ────────────────────────────────────────────────────────────

impl TokenClient for Agent {
    fn id(&self) -> AgentId {
        self.ctx.agent()
    }

    fn token_status(&self) -> TokenStatus {
        self.ctx.token_status()
    }

    fn can_receive_token(&self) -> bool {
        if !self.active {
            return false;
        }
        if matches!(self.ctx.token_status(), TokenStatus::Held | TokenStatus::Cooldown) {
            return false;
        }
        let Some(tree) = &self.token_tree else {
            return false;
        };
        tree.can_resolve(&self.ctx) && self.gates.iter().all(|g| g.decide(&self.ctx))
    }

    fn priority_inputs(&self) -> PriorityInputs {
        PriorityInputs {
            last_token_at: self.last_token_at,
            attention:     self.attention.as_ref().map_or(0.0, |a| a.attention(&self.ctx)),
            modifier:      self.config.priority_modifier,
        }
    }

    fn token_cooldown(&self) -> Option<Duration> {
        self.config.token_cooldown()
    }

    fn on_request_queued(&mut self) {
        self.ctx.set_token_status(TokenStatus::Requested);
    }

    fn on_request_dropped(&mut self) {
        self.ctx.set_token_status(TokenStatus::None);
    }

    fn on_token_granted(&mut self, now: SimTime) {
        self.ctx.set_now(now);
        self.ctx.set_token_status(TokenStatus::Held);
        self.last_token_at = now;

        let next = match self.token_tree.as_mut() {
            Some(tree) => tree.resolve(&self.ctx, &mut self.rng),
            None => None,
        };
        if let Some(node) = next {
            self.change_behavior(Some(ActiveBehavior { slot: TreeSlot::Token, node }), now);
        }

        let id = self.id();
        self.observers.each(|o| o.on_receive_token(id, now));
    }

    fn on_token_returned(&mut self, now: SimTime) {
        self.ctx.set_token_status(TokenStatus::Cooldown);
        let id = self.id();
        self.observers.each(|o| o.on_return_token(id, now));
    }

    fn on_cooldown_finished(&mut self, now: SimTime) {
        self.ctx.set_token_status(TokenStatus::None);
        let id = self.id();
        self.observers.each(|o| o.on_cooldown_finish(id, now));
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id())
            .field("active", &self.active)
            .field("current", &self.current_name())
            .field("token", &self.ctx.token_status())
            .field("elapsed", &self.ctx.state_elapsed())
            .finish_non_exhaustive()
    }
}
