//! Decision node variants.
//!
//! ```text
//! DecisionNode ─┬─ Behavior           terminal; effects, hooks, transitions
//!               ├─ ConditionalBranch  first arm whose guards pass
//!               └─ WeightedBranch     weighted-random pick among reachable entries
//! ```
//!
//! Node links (`ConditionalArm::child`, `WeightedEntry::child`,
//! `Transition::target`) are `NodeId`s into the owning `DecisionTree` arena.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ar_core::NodeId;

use crate::{AgentContext, AnimationCue, Effect, Guard, StateHook};

/// `true` iff every guard passes.  An empty set always passes.
#[inline]
pub(crate) fn all_pass(guards: &[Arc<dyn Guard>], ctx: &AgentContext) -> bool {
    guards.iter().all(|g| g.decide(ctx))
}

// ── Transition ────────────────────────────────────────────────────────────────

/// A guarded edge from a behavior to any node of the same tree.
#[derive(Clone)]
pub struct Transition {
    guards:            Vec<Arc<dyn Guard>>,
    pub target:        NodeId,
    /// May fire before the source behavior's `min_duration` has elapsed.
    pub interruptible: bool,
}

impl Transition {
    /// An unguarded, non-interrupting transition to `target`.
    pub fn to(target: NodeId) -> Self {
        Self { guards: Vec::new(), target, interruptible: false }
    }

    /// Add a guard; all guards must pass for the transition to fire.
    pub fn when(mut self, guard: Arc<dyn Guard>) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn interruptible(mut self, interruptible: bool) -> Self {
        self.interruptible = interruptible;
        self
    }

    /// `true` iff all guards pass.
    #[inline]
    pub fn fires(&self, ctx: &AgentContext) -> bool {
        all_pass(&self.guards, ctx)
    }

    /// Considered at all: the source behavior finished, or the edge may interrupt.
    #[inline]
    pub fn eligible(&self, finished: bool) -> bool {
        finished || self.interruptible
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("target", &self.target)
            .field("guards", &self.guards.len())
            .field("interruptible", &self.interruptible)
            .finish()
    }
}

// ── Behavior ──────────────────────────────────────────────────────────────────

/// A terminal, executable state.
#[derive(Clone)]
pub struct Behavior {
    pub name: String,

    enter_effects:  Vec<Arc<dyn Effect>>,
    update_effects: Vec<Arc<dyn Effect>>,
    exit_effects:   Vec<Arc<dyn Effect>>,
    hooks:          Vec<Arc<dyn StateHook>>,

    pub(crate) transitions: Vec<Transition>,

    /// Whether an agent in this behavior may ask for a token (and so be
    /// switched into its token tree on grant).  Default: `true`.
    pub interruptible: bool,

    /// Re-entering the same behavior runs exit/enter again.  Default: `false`.
    pub repeatable: bool,

    /// Time before non-interruptible transitions are considered.
    pub min_duration: Duration,

    pub animation: Option<AnimationCue>,
}

impl Behavior {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:           name.into(),
            enter_effects:  Vec::new(),
            update_effects: Vec::new(),
            exit_effects:   Vec::new(),
            hooks:          Vec::new(),
            transitions:    Vec::new(),
            interruptible:  true,
            repeatable:     false,
            min_duration:   Duration::ZERO,
            animation:      None,
        }
    }

    // ── Authoring ─────────────────────────────────────────────────────────

    pub fn on_enter(mut self, effect: Arc<dyn Effect>) -> Self {
        self.enter_effects.push(effect);
        self
    }

    pub fn on_update(mut self, effect: Arc<dyn Effect>) -> Self {
        self.update_effects.push(effect);
        self
    }

    pub fn on_exit(mut self, effect: Arc<dyn Effect>) -> Self {
        self.exit_effects.push(effect);
        self
    }

    pub fn hook(mut self, hook: Arc<dyn StateHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn interruptible(mut self, interruptible: bool) -> Self {
        self.interruptible = interruptible;
        self
    }

    pub fn repeatable(mut self, repeatable: bool) -> Self {
        self.repeatable = repeatable;
        self
    }

    pub fn min_duration(mut self, duration: Duration) -> Self {
        self.min_duration = duration;
        self
    }

    pub fn animation(mut self, cue: AnimationCue) -> Self {
        self.animation = Some(cue);
        self
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Enter effects, then hook `enter`s, then the animation cue.
    pub fn enter(&self, ctx: &mut AgentContext) {
        for effect in &self.enter_effects {
            effect.act(ctx);
        }
        for hook in &self.hooks {
            hook.enter(ctx);
        }
        if let Some(cue) = &self.animation {
            ctx.cue_animation(cue);
        }
    }

    pub fn update(&self, ctx: &mut AgentContext) {
        for effect in &self.update_effects {
            effect.act(ctx);
        }
        for hook in &self.hooks {
            hook.update(ctx);
        }
    }

    pub fn exit(&self, ctx: &mut AgentContext) {
        for effect in &self.exit_effects {
            effect.act(ctx);
        }
        for hook in &self.hooks {
            hook.exit(ctx);
        }
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Target of the first transition that is eligible under `finished` and
    /// whose guards all pass.
    pub fn first_firing(&self, ctx: &AgentContext, finished: bool) -> Option<NodeId> {
        self.transitions
            .iter()
            .find(|t| t.eligible(finished) && t.fires(ctx))
            .map(|t| t.target)
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("name", &self.name)
            .field("transitions", &self.transitions)
            .field("interruptible", &self.interruptible)
            .field("repeatable", &self.repeatable)
            .field("min_duration", &self.min_duration)
            .field("animation", &self.animation)
            .finish_non_exhaustive()
    }
}

// ── ConditionalBranch ─────────────────────────────────────────────────────────

/// One `(guards, child)` pair of a [`ConditionalBranch`].
#[derive(Clone)]
pub struct ConditionalArm {
    guards:    Vec<Arc<dyn Guard>>,
    pub child: NodeId,
}

impl ConditionalArm {
    /// An arm that always passes.
    pub fn to(child: NodeId) -> Self {
        Self { guards: Vec::new(), child }
    }

    pub fn when(mut self, guard: Arc<dyn Guard>) -> Self {
        self.guards.push(guard);
        self
    }

    #[inline]
    pub fn passes(&self, ctx: &AgentContext) -> bool {
        all_pass(&self.guards, ctx)
    }
}

/// Arms evaluated in declaration order.
#[derive(Clone, Default)]
pub struct ConditionalBranch {
    pub arms: Vec<ConditionalArm>,
}

// ── WeightedBranch ────────────────────────────────────────────────────────────

/// One candidate of a [`WeightedBranch`].
///
/// `current_weight` is per-instance state: it drops to `reset_weight` when
/// the entry is picked and grows by `increment` every time a sibling is
/// picked instead, so long-unpicked entries become steadily more likely.
pub struct WeightedEntry {
    pub child:          NodeId,
    pub increment:      f32,
    pub reset_weight:   f32,
    pub initial_weight: f32,
    current_weight:     f32,
}

impl WeightedEntry {
    /// Starts at `reset_weight`.
    pub fn new(child: NodeId, increment: f32, reset_weight: f32) -> Self {
        Self {
            child,
            increment,
            reset_weight,
            initial_weight: reset_weight,
            current_weight: reset_weight,
        }
    }

    /// Override the starting weight.
    pub fn initial_weight(mut self, weight: f32) -> Self {
        self.initial_weight = weight;
        self.current_weight = weight;
        self
    }

    #[inline]
    pub fn current_weight(&self) -> f32 {
        self.current_weight
    }

    #[inline]
    pub(crate) fn on_picked(&mut self) {
        self.current_weight = self.reset_weight;
    }

    #[inline]
    pub(crate) fn on_passed_over(&mut self) {
        self.current_weight += self.increment;
    }
}

/// Cloning yields a fresh instance: `current_weight` restarts at
/// `initial_weight`.
impl Clone for WeightedEntry {
    fn clone(&self) -> Self {
        Self {
            child:          self.child,
            increment:      self.increment,
            reset_weight:   self.reset_weight,
            initial_weight: self.initial_weight,
            current_weight: self.initial_weight,
        }
    }
}

impl fmt::Debug for WeightedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightedEntry")
            .field("child", &self.child)
            .field("current_weight", &self.current_weight)
            .field("increment", &self.increment)
            .field("reset_weight", &self.reset_weight)
            .finish()
    }
}

#[derive(Clone, Debug, Default)]
pub struct WeightedBranch {
    pub entries: Vec<WeightedEntry>,
}

// ── DecisionNode ──────────────────────────────────────────────────────────────

#[derive(Clone)]
pub enum DecisionNode {
    Behavior(Behavior),
    Conditional(ConditionalBranch),
    Weighted(WeightedBranch),
}

impl DecisionNode {
    pub fn as_behavior(&self) -> Option<&Behavior> {
        match self {
            DecisionNode::Behavior(b) => Some(b),
            _ => None,
        }
    }

    /// Child links followed during resolution (empty for behaviors).
    pub(crate) fn children(&self) -> Vec<NodeId> {
        match self {
            DecisionNode::Behavior(_) => Vec::new(),
            DecisionNode::Conditional(c) => c.arms.iter().map(|a| a.child).collect(),
            DecisionNode::Weighted(w) => w.entries.iter().map(|e| e.child).collect(),
        }
    }
}
