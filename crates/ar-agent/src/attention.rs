//! External attention signal feeding the grant priority.

use ar_tree::AgentContext;

/// How strongly the agent is currently being watched, nominally in `[-1, 1]`
/// (for instance the dot product between a camera's forward vector and the
/// direction to the agent).  Values outside `[0, damping]` are clamped by the
/// priority function.
pub trait AttentionSignal {
    fn attention(&self, ctx: &AgentContext) -> f32;
}

impl<F> AttentionSignal for F
where
    F: Fn(&AgentContext) -> f32,
{
    #[inline]
    fn attention(&self, ctx: &AgentContext) -> f32 {
        self(ctx)
    }
}
