//! `ar-tree`: hierarchical decision trees that select an agent's behavior.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                            |
//! |--------------|-------------------------------------------------------------------- |
//! | [`context`]  | `AgentContext` (what collaborators see), `Components` blackboard    |
//! | [`collab`]   | `Guard`, `Effect`, `StateHook`, `AnimationSink`, `AnimationCue`     |
//! | [`node`]     | `DecisionNode` variants, `Behavior`, `Transition`, weighted entries |
//! | [`tree`]     | `DecisionTree` arena: `resolve`, `can_resolve`, `next_state`        |
//! | [`builder`]  | `TreeBuilder`: authoring with validation                            |
//! | [`error`]    | `TreeError`, `TreeResult<T>`                                        |
//!
//! # Evaluation model
//!
//! A tree is an arena of nodes addressed by `NodeId`.  Branch nodes
//! (`Conditional`, `Weighted`) resolve recursively down to a terminal
//! `Behavior`; behaviors carry guarded transitions pointing anywhere in the
//! same arena.  Weighted branches keep per-instance weights, which is why every
//! agent owns its own `clone()` of an authored tree: cloning resets those
//! weights to their authored starting values.

pub mod builder;
pub mod collab;
pub mod context;
pub mod error;
pub mod node;
pub mod tree;

#[cfg(test)]
mod tests;

pub use builder::TreeBuilder;
pub use collab::{AnimationCue, AnimationSink, Effect, Guard, StateHook};
pub use context::{AgentContext, Components};
pub use error::{TreeError, TreeResult};
pub use node::{Behavior, ConditionalArm, ConditionalBranch, DecisionNode, Transition, WeightedBranch, WeightedEntry};
pub use tree::DecisionTree;
