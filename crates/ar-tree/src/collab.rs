//! Collaborator interfaces invoked by the tree but implemented by the host.
//!
//! The core treats these as opaque, total functions: a guard always returns
//! a bool, an effect always returns.  What they do to the world (movement,
//! combat, animation) is outside the engine.
//!
//! Plain closures implement [`Guard`] and [`Effect`] directly:
//!
//! ```rust
//! use std::sync::Arc;
//! use ar_tree::{AgentContext, Effect, Guard};
//!
//! struct Ammo(u32);
//!
//! let has_ammo: Arc<dyn Guard> = Arc::new(|ctx: &AgentContext| {
//!     ctx.get::<Ammo>().is_some_and(|a| a.0 > 0)
//! });
//! let fire: Arc<dyn Effect> = Arc::new(|ctx: &mut AgentContext| {
//!     if let Some(a) = ctx.get_mut::<Ammo>() {
//!         a.0 -= 1;
//!     }
//! });
//! # let _ = (has_ammo, fire);
//! ```

use ar_core::AgentId;

use crate::AgentContext;

/// A pure predicate over an agent's observable state.
///
/// Side effects inside `decide` are not supported: `can_resolve` probes call
/// guards speculatively and may call them more than once per tick.
pub trait Guard {
    fn decide(&self, ctx: &AgentContext) -> bool;
}

impl<F> Guard for F
where
    F: Fn(&AgentContext) -> bool,
{
    #[inline]
    fn decide(&self, ctx: &AgentContext) -> bool {
        self(ctx)
    }
}

/// An action run at a behavior's enter, update or exit point.  Effects in a
/// list run in declaration order.
pub trait Effect {
    fn act(&self, ctx: &mut AgentContext);
}

impl<F> Effect for F
where
    F: Fn(&mut AgentContext),
{
    #[inline]
    fn act(&self, ctx: &mut AgentContext) {
        self(ctx)
    }
}

/// A continuous effect spanning a behavior's whole duration: `enter` when the
/// behavior starts, `update` every tick, `exit` when it ends.  Typical use is
/// subscribing to a host event on enter and unsubscribing on exit.
///
/// All methods default to no-ops.
pub trait StateHook {
    fn enter(&self, _ctx: &mut AgentContext) {}

    fn update(&self, _ctx: &mut AgentContext) {}

    fn exit(&self, _ctx: &mut AgentContext) {}
}

/// Which external animation to start when a behavior is entered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnimationCue {
    /// Fire a named trigger on the host animator.
    Trigger(String),
    /// Jump straight to a named animator state.
    Play(String),
}

/// Host animation system.
pub trait AnimationSink {
    fn trigger(&mut self, agent: AgentId, name: &str);

    fn play(&mut self, agent: AgentId, state: &str);
}
