//! `DecisionTree`: node arena plus the evaluation engine.
//!
//! # Resolution rules
//!
//! | Node          | `resolve`                                                     |
//! |---------------|---------------------------------------------------------------|
//! | `Behavior`    | itself                                                        |
//! | `Conditional` | first arm whose guards pass *and* whose child resolves        |
//! | `Weighted`    | weighted-random pick among reachable entries, then reweight   |
//!
//! `can_resolve` mirrors those rules without touching weights or the RNG, so
//! the token scheduler can probe eligibility freely.  A `None` from either is
//! not an error: it means "no selectable behavior" and callers fall back.

use ar_core::{AgentRng, NodeId};
use tracing::trace;

use crate::{AgentContext, Behavior, DecisionNode};

/// An authored or per-agent decision tree.
///
/// Build with [`TreeBuilder`][crate::TreeBuilder].  `clone()` produces an
/// independent instance with weighted entries back at their starting weights;
/// give each agent its own clone.
#[derive(Clone)]
pub struct DecisionTree {
    pub(crate) name:  String,
    pub(crate) nodes: Vec<DecisionNode>,
    pub(crate) root:  NodeId,
}

impl DecisionTree {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&DecisionNode> {
        self.nodes.get(id.index())
    }

    /// The behavior stored at `id`, or `None` for branches / unknown ids.
    pub fn behavior(&self, id: NodeId) -> Option<&Behavior> {
        self.node(id).and_then(DecisionNode::as_behavior)
    }

    /// Current weights of the weighted branch at `id`, in entry order.
    pub fn weights(&self, id: NodeId) -> Option<Vec<f32>> {
        match self.node(id)? {
            DecisionNode::Weighted(w) => Some(w.entries.iter().map(|e| e.current_weight()).collect()),
            _ => None,
        }
    }

    // ── Evaluation ────────────────────────────────────────────────────────

    /// Resolve from the root.
    pub fn resolve(&mut self, ctx: &AgentContext, rng: &mut AgentRng) -> Option<NodeId> {
        self.resolve_node(self.root, ctx, rng)
    }

    /// Resolve the subtree at `id` to a behavior node.
    pub fn resolve_node(
        &mut self,
        id:  NodeId,
        ctx: &AgentContext,
        rng: &mut AgentRng,
    ) -> Option<NodeId> {
        match self.nodes.get(id.index())? {
            DecisionNode::Behavior(_) => Some(id),
            DecisionNode::Conditional(branch) => {
                let passing: Vec<NodeId> = branch
                    .arms
                    .iter()
                    .filter(|arm| arm.passes(ctx))
                    .map(|arm| arm.child)
                    .collect();
                passing
                    .into_iter()
                    .find_map(|child| self.resolve_node(child, ctx, rng))
            }
            DecisionNode::Weighted(_) => self.resolve_weighted(id, ctx, rng),
        }
    }

    /// Reachability probe: could `resolve` from the root yield a behavior?
    pub fn can_resolve(&self, ctx: &AgentContext) -> bool {
        self.can_resolve_node(self.root, ctx)
    }

    pub fn can_resolve_node(&self, id: NodeId, ctx: &AgentContext) -> bool {
        match self.nodes.get(id.index()) {
            None => false,
            Some(DecisionNode::Behavior(_)) => true,
            Some(DecisionNode::Conditional(branch)) => branch
                .arms
                .iter()
                .any(|arm| arm.passes(ctx) && self.can_resolve_node(arm.child, ctx)),
            Some(DecisionNode::Weighted(branch)) => branch
                .entries
                .iter()
                .any(|e| self.can_resolve_node(e.child, ctx)),
        }
    }

    /// Follow the first eligible, firing transition out of `current` and
    /// resolve its target.
    ///
    /// A transition is eligible when `finished` or when it is marked
    /// interruptible.  Only the first firing transition is tried: if its
    /// target does not resolve, the result is `None` rather than a fallback
    /// to later transitions.
    pub fn next_state(
        &mut self,
        current:  NodeId,
        ctx:      &AgentContext,
        rng:      &mut AgentRng,
        finished: bool,
    ) -> Option<NodeId> {
        let target = self.behavior(current)?.first_firing(ctx, finished)?;
        self.resolve_node(target, ctx, rng)
    }

    // ── Behavior lifecycle passthroughs ───────────────────────────────────

    pub fn enter(&self, id: NodeId, ctx: &mut AgentContext) {
        if let Some(b) = self.behavior(id) {
            b.enter(ctx);
        }
    }

    pub fn update(&self, id: NodeId, ctx: &mut AgentContext) {
        if let Some(b) = self.behavior(id) {
            b.update(ctx);
        }
    }

    pub fn exit(&self, id: NodeId, ctx: &mut AgentContext) {
        if let Some(b) = self.behavior(id) {
            b.exit(ctx);
        }
    }

    // ── Weighted selection ────────────────────────────────────────────────

    fn resolve_weighted(
        &mut self,
        id:  NodeId,
        ctx: &AgentContext,
        rng: &mut AgentRng,
    ) -> Option<NodeId> {
        let DecisionNode::Weighted(branch) = &self.nodes[id.index()] else {
            return None;
        };

        // (entry index, child, weight) for every entry reachable right now.
        let mut candidates: Vec<(usize, NodeId, f32)> = branch
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| self.can_resolve_node(e.child, ctx))
            .map(|(i, e)| (i, e.child, e.current_weight()))
            .collect();

        // Each failed pick removes a candidate, so this runs at most
        // `candidates.len()` times.
        while !candidates.is_empty() {
            let pick = draw(&candidates, rng);
            let (entry, child, weight) = candidates[pick];
            trace!(tree = %self.name, node = %id, entry, weight, "weighted draw");

            match self.resolve_node(child, ctx, rng) {
                Some(behavior) => {
                    self.reweight(id, entry);
                    return Some(behavior);
                }
                None => {
                    trace!(tree = %self.name, node = %id, entry, "picked entry did not resolve");
                    candidates.remove(pick);
                }
            }
        }
        None
    }

    /// Picked entry drops to its reset weight; every other entry grows.
    fn reweight(&mut self, id: NodeId, picked: usize) {
        if let Some(DecisionNode::Weighted(branch)) = self.nodes.get_mut(id.index()) {
            for (i, entry) in branch.entries.iter_mut().enumerate() {
                if i == picked {
                    entry.on_picked();
                } else {
                    entry.on_passed_over();
                }
            }
        }
    }
}

/// Index into `candidates` of a weighted-random pick.
///
/// Draws `r` in `[0, total)` and returns the candidate whose band
/// `[acc, acc + w)` contains it.  Zero-weight candidates have empty bands and
/// are only reachable when every weight is zero, in which case the pick is
/// uniform.
fn draw(candidates: &[(usize, NodeId, f32)], rng: &mut AgentRng) -> usize {
    let total: f32 = candidates.iter().map(|c| c.2).sum();
    if total <= 0.0 {
        return rng.gen_range(0..candidates.len());
    }
    let r = rng.unit_scaled(total);
    let mut acc = 0.0;
    for (i, &(_, _, w)) in candidates.iter().enumerate() {
        if w > 0.0 && r < acc + w {
            return i;
        }
        acc += w;
    }
    // Float rounding can push `r` onto the upper edge of the last band.
    candidates
        .iter()
        .rposition(|c| c.2 > 0.0)
        .unwrap_or(candidates.len() - 1)
}

impl std::fmt::Debug for DecisionTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionTree")
            .field("name", &self.name)
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .finish()
    }
}
