//! Authoring API for [`DecisionTree`].
//!
//! Nodes are added bottom-up: every `add_*` call returns the new node's
//! `NodeId`, which later branch arms and transitions refer to.  Transitions are
//! attached separately with [`TreeBuilder::transition`] so they can point at
//! nodes added afterwards (state graphs are routinely cyclic).
//!
//! ```rust
//! use std::time::Duration;
//! use ar_tree::{Behavior, ConditionalArm, Transition, TreeBuilder, WeightedEntry};
//!
//! let mut b = TreeBuilder::new("grunt");
//! let idle   = b.behavior(Behavior::new("idle"));
//! let strafe = b.behavior(Behavior::new("strafe").min_duration(Duration::from_secs(2)));
//! let taunt  = b.behavior(Behavior::new("taunt"));
//! let mix    = b.weighted(vec![
//!     WeightedEntry::new(strafe, 1.0, 1.0),
//!     WeightedEntry::new(taunt, 1.0, 0.5),
//! ]);
//! let root   = b.conditional(vec![ConditionalArm::to(mix), ConditionalArm::to(idle)]);
//! b.transition(strafe, Transition::to(root));
//! b.transition(taunt, Transition::to(root));
//!
//! let tree = b.build(root).unwrap();
//! assert_eq!(tree.len(), 5);
//! ```

use ar_core::NodeId;
use tracing::debug;

use crate::{
    Behavior, ConditionalArm, ConditionalBranch, DecisionNode, DecisionTree, Transition, TreeError,
    TreeResult, WeightedBranch, WeightedEntry,
};

pub struct TreeBuilder {
    name:        String,
    nodes:       Vec<DecisionNode>,
    transitions: Vec<(NodeId, Transition)>,
}

impl TreeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), nodes: Vec::new(), transitions: Vec::new() }
    }

    /// Add any node.
    pub fn node(&mut self, node: DecisionNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn behavior(&mut self, behavior: Behavior) -> NodeId {
        self.node(DecisionNode::Behavior(behavior))
    }

    pub fn conditional(&mut self, arms: Vec<ConditionalArm>) -> NodeId {
        self.node(DecisionNode::Conditional(ConditionalBranch { arms }))
    }

    pub fn weighted(&mut self, entries: Vec<WeightedEntry>) -> NodeId {
        self.node(DecisionNode::Weighted(WeightedBranch { entries }))
    }

    /// Attach `transition` to the behavior `from`.  Transitions on one
    /// behavior are tried in the order they were attached.
    pub fn transition(&mut self, from: NodeId, transition: Transition) -> &mut Self {
        self.transitions.push((from, transition));
        self
    }

    /// Validate and freeze the tree with `root` as its entry point.
    ///
    /// # Errors
    ///
    /// - [`TreeError::UnknownNode`] for a root, child or transition target
    ///   outside the arena.
    /// - [`TreeError::TransitionFromBranch`] for a transition attached to a
    ///   branch node.
    /// - [`TreeError::InvalidWeight`] for a negative or non-finite weight or
    ///   increment.
    /// - [`TreeError::Cycle`] if branch-child links loop back on themselves.
    pub fn build(self, root: NodeId) -> TreeResult<DecisionTree> {
        let TreeBuilder { name, mut nodes, transitions } = self;
        let len = nodes.len();
        let unknown = |node: NodeId| TreeError::UnknownNode { tree: name.clone(), node };

        if root.index() >= len {
            return Err(unknown(root));
        }

        // ── Attach transitions ────────────────────────────────────────────
        for (from, transition) in transitions {
            if transition.target.index() >= len {
                return Err(unknown(transition.target));
            }
            match nodes.get_mut(from.index()) {
                None => return Err(unknown(from)),
                Some(DecisionNode::Behavior(b)) => b.transitions.push(transition),
                Some(_) => {
                    return Err(TreeError::TransitionFromBranch { tree: name.clone(), node: from });
                }
            }
        }

        // ── Per-node checks ───────────────────────────────────────────────
        for (i, node) in nodes.iter().enumerate() {
            let id = NodeId(i as u32);
            for child in node.children() {
                if child.index() >= len {
                    return Err(unknown(child));
                }
            }
            if let DecisionNode::Weighted(branch) = node {
                for (entry, e) in branch.entries.iter().enumerate() {
                    for value in [e.increment, e.reset_weight, e.initial_weight] {
                        if !value.is_finite() || value < 0.0 {
                            return Err(TreeError::InvalidWeight {
                                tree: name.clone(),
                                node: id,
                                entry,
                                value,
                            });
                        }
                    }
                }
            }
        }

        if let Some(node) = find_cycle(&nodes) {
            return Err(TreeError::Cycle { tree: name, node });
        }

        debug!(tree = %name, nodes = len, %root, "decision tree built");
        Ok(DecisionTree { name, nodes, root })
    }
}

/// First node found on a branch-child cycle, if any.  Iterative DFS with
/// three-colour marking.
fn find_cycle(nodes: &[DecisionNode]) -> Option<NodeId> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnStack,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; nodes.len()];
    for start in 0..nodes.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        // (node, its children, next child to visit)
        let mut stack: Vec<(usize, Vec<NodeId>, usize)> =
            vec![(start, nodes[start].children(), 0)];
        marks[start] = Mark::OnStack;

        while let Some((node, children, next)) = stack.last_mut() {
            if let Some(&child) = children.get(*next) {
                *next += 1;
                let c = child.index();
                match marks[c] {
                    Mark::OnStack => return Some(child),
                    Mark::Done => {}
                    Mark::Unvisited => {
                        marks[c] = Mark::OnStack;
                        stack.push((c, nodes[c].children(), 0));
                    }
                }
            } else {
                marks[*node] = Mark::Done;
                stack.pop();
            }
        }
    }
    None
}
