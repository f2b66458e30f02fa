//! Unit tests for ar-tree.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use ar_core::{AgentId, AgentRng, NodeId};

use crate::{
    AgentContext, AnimationCue, AnimationSink, Behavior, ConditionalArm, DecisionTree, Effect, Guard,
    StateHook, Transition, TreeBuilder, TreeError, WeightedEntry,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

type Log = Rc<RefCell<Vec<String>>>;

fn ctx() -> AgentContext {
    AgentContext::new(AgentId(0))
}

fn rng() -> AgentRng {
    AgentRng::new(7, AgentId(0))
}

fn guard(f: impl Fn(&AgentContext) -> bool + 'static) -> Arc<dyn Guard> {
    Arc::new(f)
}

fn always() -> Arc<dyn Guard> {
    guard(|_| true)
}

fn never() -> Arc<dyn Guard> {
    guard(|_| false)
}

fn record(log: &Log, tag: &str) -> Arc<dyn Effect> {
    let log = log.clone();
    let tag = tag.to_string();
    Arc::new(move |_: &mut AgentContext| log.borrow_mut().push(tag.clone()))
}

/// A conditional node that can never resolve.
fn dead_end(b: &mut TreeBuilder, leaf: NodeId) -> NodeId {
    b.conditional(vec![ConditionalArm::to(leaf).when(never())])
}

fn name_of(tree: &DecisionTree, id: Option<NodeId>) -> Option<&str> {
    id.and_then(|id| tree.behavior(id)).map(|b| b.name.as_str())
}

// ── Resolution ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod resolve_tests {
    use super::*;

    #[test]
    fn behavior_resolves_to_itself() {
        let mut b = TreeBuilder::new("t");
        let idle = b.behavior(Behavior::new("idle"));
        let mut tree = b.build(idle).unwrap();
        assert_eq!(tree.resolve(&ctx(), &mut rng()), Some(idle));
        assert!(tree.can_resolve(&ctx()));
    }

    #[test]
    fn conditional_picks_first_passing_arm() {
        let mut b = TreeBuilder::new("t");
        let a = b.behavior(Behavior::new("a"));
        let bb = b.behavior(Behavior::new("b"));
        let c = b.behavior(Behavior::new("c"));
        let root = b.conditional(vec![
            ConditionalArm::to(a).when(never()),
            ConditionalArm::to(bb).when(always()),
            ConditionalArm::to(c),
        ]);
        let mut tree = b.build(root).unwrap();
        let got = tree.resolve(&ctx(), &mut rng());
        assert_eq!(name_of(&tree, got), Some("b"));
    }

    #[test]
    fn all_guards_must_pass() {
        let mut b = TreeBuilder::new("t");
        let a = b.behavior(Behavior::new("a"));
        let c = b.behavior(Behavior::new("c"));
        let root = b.conditional(vec![
            ConditionalArm::to(a).when(always()).when(never()),
            ConditionalArm::to(c),
        ]);
        let mut tree = b.build(root).unwrap();
        assert_eq!(tree.resolve(&ctx(), &mut rng()), Some(c));
    }

    #[test]
    fn conditional_falls_through_unresolvable_child() {
        let mut b = TreeBuilder::new("t");
        let a = b.behavior(Behavior::new("a"));
        let fallback = b.behavior(Behavior::new("fallback"));
        let inner = dead_end(&mut b, a);
        let root = b.conditional(vec![ConditionalArm::to(inner), ConditionalArm::to(fallback)]);
        let mut tree = b.build(root).unwrap();
        assert!(tree.can_resolve(&ctx()));
        assert_eq!(tree.resolve(&ctx(), &mut rng()), Some(fallback));
    }

    #[test]
    fn no_passing_arm_resolves_to_none() {
        let mut b = TreeBuilder::new("t");
        let a = b.behavior(Behavior::new("a"));
        let root = dead_end(&mut b, a);
        let mut tree = b.build(root).unwrap();
        assert!(!tree.can_resolve(&ctx()));
        assert_eq!(tree.resolve(&ctx(), &mut rng()), None);
    }

    #[test]
    fn empty_branches_resolve_to_none() {
        let mut b = TreeBuilder::new("t");
        let cond = b.conditional(Vec::new());
        let weighted = b.weighted(Vec::new());
        let root = b.conditional(vec![ConditionalArm::to(cond), ConditionalArm::to(weighted)]);
        let mut tree = b.build(root).unwrap();
        assert!(!tree.can_resolve(&ctx()));
        assert_eq!(tree.resolve(&ctx(), &mut rng()), None);
    }

    #[test]
    fn unknown_node_is_none() {
        let mut b = TreeBuilder::new("t");
        let a = b.behavior(Behavior::new("a"));
        let mut tree = b.build(a).unwrap();
        assert_eq!(tree.resolve_node(NodeId(99), &ctx(), &mut rng()), None);
        assert!(!tree.can_resolve_node(NodeId(99), &ctx()));
    }

    #[test]
    fn guards_see_components() {
        struct Enraged;

        let mut b = TreeBuilder::new("t");
        let calm = b.behavior(Behavior::new("calm"));
        let rage = b.behavior(Behavior::new("rage"));
        let root = b.conditional(vec![
            ConditionalArm::to(rage).when(guard(|c| c.get::<Enraged>().is_some())),
            ConditionalArm::to(calm),
        ]);
        let mut tree = b.build(root).unwrap();
        let mut c = ctx();
        assert_eq!(tree.resolve(&c, &mut rng()), Some(calm));
        c.insert(Enraged);
        assert_eq!(tree.resolve(&c, &mut rng()), Some(rage));
    }
}

// ── Weighted branches ─────────────────────────────────────────────────────────

#[cfg(test)]
mod weighted_tests {
    use super::*;

    fn two_way(increment: f32, reset: f32, initial: f32) -> (DecisionTree, NodeId, NodeId) {
        let mut b = TreeBuilder::new("w");
        let a = b.behavior(Behavior::new("a"));
        let c = b.behavior(Behavior::new("c"));
        let root = b.weighted(vec![
            WeightedEntry::new(a, increment, reset).initial_weight(initial),
            WeightedEntry::new(c, increment, reset).initial_weight(initial),
        ]);
        (b.build(root).unwrap(), a, c)
    }

    #[test]
    fn zero_reset_never_repeats_and_splits_evenly() {
        let (mut tree, a, _) = two_way(1.0, 0.0, 1.0);
        let ctx = ctx();
        let mut rng = rng();
        let mut prev = None;
        let mut a_count = 0;
        for _ in 0..200 {
            let pick = tree.resolve(&ctx, &mut rng);
            assert!(pick.is_some());
            assert_ne!(pick, prev, "same entry picked twice in a row");
            if pick == Some(a) {
                a_count += 1;
            }
            prev = pick;
        }
        assert_eq!(a_count, 100);
    }

    #[test]
    fn long_run_frequency_is_uniform() {
        let (mut tree, a, _) = two_way(0.5, 1.0, 1.0);
        let ctx = ctx();
        let mut rng = rng();
        let n = 4000;
        let a_count = (0..n).filter(|_| tree.resolve(&ctx, &mut rng) == Some(a)).count();
        let freq = a_count as f64 / n as f64;
        assert!((0.4..0.6).contains(&freq), "frequency {freq} not near 0.5");
    }

    #[test]
    fn reweights_after_selection() {
        let (mut tree, a, _) = two_way(2.0, 0.5, 1.0);
        let root = tree.root();
        let pick = tree.resolve(&ctx(), &mut rng());
        let weights = tree.weights(root).unwrap();
        if pick == Some(a) {
            assert_eq!(weights, vec![0.5, 3.0]);
        } else {
            assert_eq!(weights, vec![3.0, 0.5]);
        }
    }

    #[test]
    fn unreachable_entry_is_never_selected() {
        let mut b = TreeBuilder::new("w");
        let a = b.behavior(Behavior::new("a"));
        let c = b.behavior(Behavior::new("c"));
        let blocked = dead_end(&mut b, a);
        let root = b.weighted(vec![
            WeightedEntry::new(blocked, 1.0, 100.0),
            WeightedEntry::new(c, 1.0, 1.0),
        ]);
        let mut tree = b.build(root).unwrap();
        let ctx = ctx();
        let mut rng = rng();
        for _ in 0..100 {
            assert_eq!(tree.resolve(&ctx, &mut rng), Some(c));
        }
        // The filtered entry still counts as passed over.
        assert_eq!(tree.weights(root).unwrap(), vec![200.0, 1.0]);
    }

    #[test]
    fn all_unreachable_terminates_with_none() {
        let mut b = TreeBuilder::new("w");
        let a = b.behavior(Behavior::new("a"));
        let d1 = dead_end(&mut b, a);
        let d2 = dead_end(&mut b, a);
        let root = b.weighted(vec![WeightedEntry::new(d1, 1.0, 1.0), WeightedEntry::new(d2, 1.0, 1.0)]);
        let mut tree = b.build(root).unwrap();
        assert_eq!(tree.resolve(&ctx(), &mut rng()), None);
        // No selection, no reweighting.
        assert_eq!(tree.weights(root).unwrap(), vec![1.0, 1.0]);
    }

    #[test]
    fn zero_total_weight_draws_uniformly() {
        let (mut tree, a, c) = two_way(0.0, 0.0, 0.0);
        let ctx = ctx();
        let mut rng = rng();
        let picks: Vec<_> = (0..200).map(|_| tree.resolve(&ctx, &mut rng)).collect();
        assert!(picks.contains(&Some(a)));
        assert!(picks.contains(&Some(c)));
    }

    #[test]
    fn nested_weighted_under_conditional() {
        let mut b = TreeBuilder::new("w");
        let a = b.behavior(Behavior::new("a"));
        let c = b.behavior(Behavior::new("c"));
        let mix = b.weighted(vec![WeightedEntry::new(a, 1.0, 0.0), WeightedEntry::new(c, 1.0, 1.0)]);
        let root = b.conditional(vec![ConditionalArm::to(mix)]);
        let mut tree = b.build(root).unwrap();
        // `a` starts at weight zero, so the first pick is `c`.
        assert_eq!(tree.resolve(&ctx(), &mut rng()), Some(c));
        assert_eq!(tree.weights(mix).unwrap(), vec![1.0, 1.0]);
    }

    #[test]
    fn clone_resets_weights() {
        let (mut tree, _, _) = two_way(1.0, 0.0, 1.0);
        let root = tree.root();
        tree.resolve(&ctx(), &mut rng());
        assert_ne!(tree.weights(root).unwrap(), vec![1.0, 1.0]);

        let fresh = tree.clone();
        assert_eq!(fresh.weights(root).unwrap(), vec![1.0, 1.0]);
        // The original is untouched by cloning.
        assert_ne!(tree.weights(root).unwrap(), vec![1.0, 1.0]);
    }

    #[test]
    fn clones_do_not_share_weights() {
        let (authored, _, _) = two_way(1.0, 0.0, 1.0);
        let root = authored.root();
        let mut one = authored.clone();
        let two = authored.clone();
        one.resolve(&ctx(), &mut rng());
        assert_eq!(two.weights(root).unwrap(), vec![1.0, 1.0]);
    }

    #[test]
    fn same_seed_same_sequence() {
        let (authored, _, _) = two_way(0.25, 0.5, 1.0);
        let run = || {
            let mut tree = authored.clone();
            let ctx = ctx();
            let mut rng = rng();
            (0..50).map(|_| tree.resolve(&ctx, &mut rng)).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}

// ── Transitions ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod transition_tests {
    use super::*;

    #[test]
    fn unfinished_only_considers_interruptible() {
        let mut b = TreeBuilder::new("t");
        let s = b.behavior(Behavior::new("s"));
        let x = b.behavior(Behavior::new("x"));
        let y = b.behavior(Behavior::new("y"));
        b.transition(s, Transition::to(x).when(never()).interruptible(false));
        b.transition(s, Transition::to(y).when(always()).interruptible(true));
        let mut tree = b.build(s).unwrap();
        assert_eq!(tree.next_state(s, &ctx(), &mut rng(), false), Some(y));
    }

    #[test]
    fn non_interruptible_waits_for_finish() {
        let mut b = TreeBuilder::new("t");
        let s = b.behavior(Behavior::new("s"));
        let x = b.behavior(Behavior::new("x"));
        b.transition(s, Transition::to(x));
        let mut tree = b.build(s).unwrap();
        assert_eq!(tree.next_state(s, &ctx(), &mut rng(), false), None);
        assert_eq!(tree.next_state(s, &ctx(), &mut rng(), true), Some(x));
    }

    #[test]
    fn first_firing_transition_wins_without_fallback() {
        let mut b = TreeBuilder::new("t");
        let s = b.behavior(Behavior::new("s"));
        let y = b.behavior(Behavior::new("y"));
        let blocked = dead_end(&mut b, y);
        b.transition(s, Transition::to(blocked));
        b.transition(s, Transition::to(y));
        let mut tree = b.build(s).unwrap();
        assert_eq!(tree.next_state(s, &ctx(), &mut rng(), true), None);
    }

    #[test]
    fn target_branch_is_resolved() {
        let mut b = TreeBuilder::new("t");
        let s = b.behavior(Behavior::new("s"));
        let y = b.behavior(Behavior::new("y"));
        let z = b.behavior(Behavior::new("z"));
        let branch = b.conditional(vec![ConditionalArm::to(y).when(never()), ConditionalArm::to(z)]);
        b.transition(s, Transition::to(branch));
        let mut tree = b.build(s).unwrap();
        assert_eq!(tree.next_state(s, &ctx(), &mut rng(), true), Some(z));
    }

    #[test]
    fn no_transitions_is_none() {
        let mut b = TreeBuilder::new("t");
        let s = b.behavior(Behavior::new("s"));
        let branch = b.conditional(vec![ConditionalArm::to(s)]);
        let mut tree = b.build(branch).unwrap();
        assert_eq!(tree.next_state(s, &ctx(), &mut rng(), true), None);
        // Branch nodes have no transitions of their own.
        assert_eq!(tree.next_state(branch, &ctx(), &mut rng(), true), None);
    }

    #[test]
    fn self_transition_is_allowed() {
        let mut b = TreeBuilder::new("t");
        let s = b.behavior(Behavior::new("s").repeatable(true));
        b.transition(s, Transition::to(s));
        let mut tree = b.build(s).unwrap();
        assert_eq!(tree.next_state(s, &ctx(), &mut rng(), true), Some(s));
    }
}

// ── Behavior lifecycle ────────────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle_tests {
    use super::*;

    struct Hook(Log);

    impl StateHook for Hook {
        fn enter(&self, _ctx: &mut AgentContext) {
            self.0.borrow_mut().push("hook-enter".into());
        }
        fn update(&self, _ctx: &mut AgentContext) {
            self.0.borrow_mut().push("hook-update".into());
        }
        fn exit(&self, _ctx: &mut AgentContext) {
            self.0.borrow_mut().push("hook-exit".into());
        }
    }

    struct Sink(Log);

    impl AnimationSink for Sink {
        fn trigger(&mut self, agent: AgentId, name: &str) {
            self.0.borrow_mut().push(format!("trigger {name} {agent}"));
        }
        fn play(&mut self, agent: AgentId, state: &str) {
            self.0.borrow_mut().push(format!("play {state} {agent}"));
        }
    }

    fn instrumented(log: &Log) -> (DecisionTree, NodeId) {
        let mut b = TreeBuilder::new("t");
        let s = b.behavior(
            Behavior::new("s")
                .on_enter(record(log, "enter-1"))
                .on_enter(record(log, "enter-2"))
                .on_update(record(log, "update"))
                .on_exit(record(log, "exit-1"))
                .on_exit(record(log, "exit-2"))
                .hook(Arc::new(Hook(log.clone())))
                .animation(AnimationCue::Trigger("swing".into())),
        );
        (b.build(s).unwrap(), s)
    }

    #[test]
    fn enter_runs_effects_then_hooks_then_animation() {
        let log: Log = Rc::default();
        let (tree, s) = instrumented(&log);
        let mut c = ctx();
        c.set_animator(Box::new(Sink(log.clone())));
        tree.enter(s, &mut c);
        assert_eq!(
            *log.borrow(),
            vec!["enter-1", "enter-2", "hook-enter", "trigger swing AgentId(0)"]
        );
    }

    #[test]
    fn update_and_exit_preserve_order() {
        let log: Log = Rc::default();
        let (tree, s) = instrumented(&log);
        let mut c = ctx();
        tree.update(s, &mut c);
        tree.exit(s, &mut c);
        assert_eq!(*log.borrow(), vec!["update", "hook-update", "exit-1", "exit-2", "hook-exit"]);
    }

    #[test]
    fn animation_without_sink_is_silent() {
        let log: Log = Rc::default();
        let (tree, s) = instrumented(&log);
        tree.enter(s, &mut ctx());
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn play_cue_forwards_state_name() {
        let log: Log = Rc::default();
        let mut b = TreeBuilder::new("t");
        let s = b.behavior(Behavior::new("s").animation(AnimationCue::Play("Idle".into())));
        let tree = b.build(s).unwrap();
        let mut c = AgentContext::new(AgentId(3));
        c.set_animator(Box::new(Sink(log.clone())));
        tree.enter(s, &mut c);
        assert_eq!(*log.borrow(), vec!["play Idle AgentId(3)"]);
    }

    #[test]
    fn effects_mutate_components() {
        struct Counter(u32);

        let mut b = TreeBuilder::new("t");
        let bump: Arc<dyn Effect> = Arc::new(|c: &mut AgentContext| {
            if let Some(n) = c.get_mut::<Counter>() {
                n.0 += 1;
            }
        });
        let s = b.behavior(Behavior::new("s").on_update(bump));
        let tree = b.build(s).unwrap();
        let mut c = ctx();
        c.insert(Counter(0));
        for _ in 0..3 {
            tree.update(s, &mut c);
        }
        assert_eq!(c.get::<Counter>().map(|n| n.0), Some(3));
    }

    #[test]
    fn lifecycle_on_branch_is_noop() {
        let log: Log = Rc::default();
        let mut b = TreeBuilder::new("t");
        let s = b.behavior(Behavior::new("s").on_enter(record(&log, "enter")));
        let root = b.conditional(vec![ConditionalArm::to(s)]);
        let tree = b.build(root).unwrap();
        tree.enter(root, &mut ctx());
        assert!(log.borrow().is_empty());
    }
}

// ── Builder validation ────────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn unknown_root() {
        let mut b = TreeBuilder::new("t");
        b.behavior(Behavior::new("a"));
        assert!(matches!(b.build(NodeId(5)), Err(TreeError::UnknownNode { node: NodeId(5), .. })));
    }

    #[test]
    fn unknown_child() {
        let mut b = TreeBuilder::new("t");
        let root = b.conditional(vec![ConditionalArm::to(NodeId(9))]);
        assert!(matches!(b.build(root), Err(TreeError::UnknownNode { node: NodeId(9), .. })));
    }

    #[test]
    fn unknown_transition_target() {
        let mut b = TreeBuilder::new("t");
        let s = b.behavior(Behavior::new("s"));
        b.transition(s, Transition::to(NodeId(4)));
        assert!(matches!(b.build(s), Err(TreeError::UnknownNode { node: NodeId(4), .. })));
    }

    #[test]
    fn transition_from_branch_rejected() {
        let mut b = TreeBuilder::new("t");
        let s = b.behavior(Behavior::new("s"));
        let root = b.conditional(vec![ConditionalArm::to(s)]);
        b.transition(root, Transition::to(s));
        assert!(matches!(b.build(root), Err(TreeError::TransitionFromBranch { .. })));
    }

    #[test]
    fn invalid_weights_rejected() {
        for (inc, reset) in [(-1.0, 1.0), (1.0, -0.5), (f32::NAN, 1.0), (1.0, f32::INFINITY)] {
            let mut b = TreeBuilder::new("t");
            let s = b.behavior(Behavior::new("s"));
            let root = b.weighted(vec![WeightedEntry::new(s, 1.0, 1.0), WeightedEntry::new(s, inc, reset)]);
            match b.build(root) {
                Err(TreeError::InvalidWeight { entry, .. }) => assert_eq!(entry, 1),
                other => panic!("expected InvalidWeight, got {other:?}"),
            }
        }
    }

    #[test]
    fn branch_cycle_rejected() {
        let mut b = TreeBuilder::new("t");
        let first = b.conditional(vec![ConditionalArm::to(NodeId(1))]);
        let _second = b.weighted(vec![WeightedEntry::new(first, 1.0, 1.0)]);
        assert!(matches!(b.build(first), Err(TreeError::Cycle { .. })));
    }

    #[test]
    fn transition_cycles_are_fine() {
        let mut b = TreeBuilder::new("t");
        let a = b.behavior(Behavior::new("a"));
        let c = b.behavior(Behavior::new("c"));
        b.transition(a, Transition::to(c));
        b.transition(c, Transition::to(a));
        let tree = b.build(a).unwrap();
        assert_eq!(tree.behavior(a).unwrap().transitions().len(), 1);
        assert_eq!(tree.name(), "t");
    }

    #[test]
    fn shared_children_are_not_cycles() {
        let mut b = TreeBuilder::new("t");
        let s = b.behavior(Behavior::new("s"));
        let left = b.conditional(vec![ConditionalArm::to(s)]);
        let right = b.conditional(vec![ConditionalArm::to(s)]);
        let root = b.conditional(vec![ConditionalArm::to(left), ConditionalArm::to(right)]);
        assert!(b.build(root).is_ok());
    }

    #[test]
    fn error_messages_name_the_tree() {
        let mut b = TreeBuilder::new("grunt");
        let s = b.behavior(Behavior::new("s"));
        let root = b.conditional(vec![ConditionalArm::to(s)]);
        b.transition(root, Transition::to(s));
        let err = b.build(root).unwrap_err();
        assert!(err.to_string().contains("`grunt`"));
    }
}
