//! The per-agent state that guards, effects and hooks observe.
//!
//! # Design
//!
//! Tree evaluation needs `&mut DecisionTree` (weights) while collaborators
//! need `&AgentContext` or `&mut AgentContext`.  Keeping the context in its own
//! struct, next to (not inside) the agent's trees, lets both borrows coexist.
//!
//! The lifecycle fields (`now`, `state_elapsed`, `token`, `disrupted`) are
//! owned by the agent driver, which refreshes them before every callback.
//! Application state lives in the [`Components`] blackboard.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Duration;

use ar_core::{AgentId, SimTime, TokenStatus};

use crate::{AnimationCue, AnimationSink};

// ── Components ────────────────────────────────────────────────────────────────

/// Type-keyed bag of application values, at most one per type.
///
/// ```rust
/// use ar_tree::Components;
///
/// struct Health(f32);
///
/// let mut bag = Components::new();
/// bag.insert(Health(10.0));
/// assert!(bag.contains::<Health>());
/// bag.get_mut::<Health>().unwrap().0 -= 3.0;
/// assert_eq!(bag.get::<Health>().unwrap().0, 7.0);
/// ```
#[derive(Default)]
pub struct Components {
    map: HashMap<TypeId, Box<dyn Any>>,
}

impl Components {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value`, returning the previous value of the same type if any.
    pub fn insert<T: 'static>(&mut self, value: T) -> Option<T> {
        self.map
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|b| *b)
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.map.get(&TypeId::of::<T>()).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.map.get_mut(&TypeId::of::<T>()).and_then(|v| v.downcast_mut::<T>())
    }

    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.map
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast::<T>().ok())
            .map(|b| *b)
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    /// Number of distinct component types stored.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

// ── AgentContext ──────────────────────────────────────────────────────────────

/// Observable agent state passed to every [`Guard`][crate::Guard],
/// [`Effect`][crate::Effect] and [`StateHook`][crate::StateHook].
pub struct AgentContext {
    agent:         AgentId,
    now:           SimTime,
    state_elapsed: Duration,
    token:         TokenStatus,
    disrupted:     bool,
    components:    Components,
    animator:      Option<Box<dyn AnimationSink>>,
}

impl AgentContext {
    pub fn new(agent: AgentId) -> Self {
        Self {
            agent,
            now:           SimTime::ZERO,
            state_elapsed: Duration::ZERO,
            token:         TokenStatus::None,
            disrupted:     false,
            components:    Components::new(),
            animator:      None,
        }
    }

    // ── Driver-owned lifecycle fields ─────────────────────────────────────

    #[inline]
    pub fn agent(&self) -> AgentId {
        self.agent
    }

    /// Instant of the tick (or event) currently being processed.
    #[inline]
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Time spent in the current behavior.
    #[inline]
    pub fn state_elapsed(&self) -> Duration {
        self.state_elapsed
    }

    #[inline]
    pub fn token_status(&self) -> TokenStatus {
        self.token
    }

    /// `true` while the environment has the agent disrupted (stunned,
    /// knocked down, ...).
    #[inline]
    pub fn is_disrupted(&self) -> bool {
        self.disrupted
    }

    pub fn set_now(&mut self, now: SimTime) {
        self.now = now;
    }

    pub fn set_state_elapsed(&mut self, elapsed: Duration) {
        self.state_elapsed = elapsed;
    }

    pub fn set_token_status(&mut self, status: TokenStatus) {
        self.token = status;
    }

    pub fn set_disrupted(&mut self, disrupted: bool) {
        self.disrupted = disrupted;
    }

    // ── Application state ─────────────────────────────────────────────────

    pub fn components(&self) -> &Components {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut Components {
        &mut self.components
    }

    /// Shorthand for `components().get::<T>()`.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.components.get::<T>()
    }

    /// Shorthand for `components_mut().get_mut::<T>()`.
    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.components.get_mut::<T>()
    }

    /// Shorthand for `components_mut().insert(value)`.
    pub fn insert<T: 'static>(&mut self, value: T) -> Option<T> {
        self.components.insert(value)
    }

    // ── Animation collaborator ────────────────────────────────────────────

    /// Install the sink that receives behavior animation cues.
    pub fn set_animator(&mut self, sink: Box<dyn AnimationSink>) {
        self.animator = Some(sink);
    }

    /// Forward `cue` to the installed sink.  No-op without one.
    pub fn cue_animation(&mut self, cue: &AnimationCue) {
        let agent = self.agent;
        if let Some(sink) = self.animator.as_mut() {
            match cue {
                AnimationCue::Trigger(name) => sink.trigger(agent, name),
                AnimationCue::Play(state) => sink.play(agent, state),
            }
        }
    }
}
