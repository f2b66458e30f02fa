//! Decision trees for the skirmish squads.
//!
//! ```text
//! main  ─ Conditional ─┬─ health < 10 ──▶ retreat
//!                      └─ otherwise ────▶ Weighted ─┬─ advance
//!                                                   ├─ strafe
//!                                                   └─ taunt
//! token ─ Conditional ─┬─ distance < 3 ─▶ melee  (trigger "swing")
//!                      └─ otherwise ────▶ lunge  (play "lunge")
//! ```

use std::sync::Arc;
use std::time::Duration;

use ar_tree::{
    AgentContext, AnimationCue, Behavior, ConditionalArm, DecisionTree, Transition, TreeBuilder,
    TreeResult, WeightedEntry,
};

// ── Components ────────────────────────────────────────────────────────────────

/// Remaining hit points.
pub struct Health(pub f32);

/// Distance to the player, in metres.
pub struct Distance(pub f32);

/// Hits landed on the player.
#[derive(Default)]
pub struct Hits(pub u32);

const LOW_HEALTH: f32 = 10.0;
const MELEE_RANGE: f32 = 3.0;

fn low_health(ctx: &AgentContext) -> bool {
    ctx.get::<Health>().is_some_and(|h| h.0 < LOW_HEALTH)
}

fn in_melee_range(ctx: &AgentContext) -> bool {
    ctx.get::<Distance>().is_some_and(|d| d.0 < MELEE_RANGE)
}

fn approach(step: f32) -> impl Fn(&mut AgentContext) {
    move |ctx: &mut AgentContext| {
        if let Some(d) = ctx.get_mut::<Distance>() {
            d.0 = (d.0 - step).max(0.5);
        }
    }
}

fn land_hit(ctx: &mut AgentContext) {
    if let Some(h) = ctx.get_mut::<Hits>() {
        h.0 += 1;
    }
}

// ── Trees ─────────────────────────────────────────────────────────────────────

/// What a squad member does between tokens.
pub fn main_tree() -> TreeResult<DecisionTree> {
    let mut b = TreeBuilder::new("skirmisher");

    let retreat = b.behavior(
        Behavior::new("retreat")
            .interruptible(false)
            .min_duration(Duration::from_millis(1500))
            .on_update(Arc::new(approach(-0.4))),
    );
    let advance = b.behavior(
        Behavior::new("advance")
            .min_duration(Duration::from_millis(800))
            .on_update(Arc::new(approach(0.25))),
    );
    let strafe = b.behavior(Behavior::new("strafe").min_duration(Duration::from_millis(800)));
    let taunt = b.behavior(
        Behavior::new("taunt")
            .min_duration(Duration::from_millis(600))
            .animation(AnimationCue::Trigger("taunt".into())),
    );

    // Hurt agents break off whatever they were doing.
    for from in [advance, strafe, taunt] {
        b.transition(from, Transition::to(retreat).when(Arc::new(low_health)).interruptible(true));
    }

    let roam = b.weighted(vec![
        WeightedEntry::new(advance, 1.0, 0.5).initial_weight(2.0),
        WeightedEntry::new(strafe, 0.5, 0.5).initial_weight(1.0),
        WeightedEntry::new(taunt, 0.25, 0.0),
    ]);
    let root = b.conditional(vec![
        ConditionalArm::to(retreat).when(Arc::new(low_health)),
        ConditionalArm::to(roam),
    ]);
    b.build(root)
}

/// What a squad member does while holding an attack token.
pub fn attack_tree() -> TreeResult<DecisionTree> {
    let mut b = TreeBuilder::new("attacks");

    let melee = b.behavior(
        Behavior::new("melee")
            .interruptible(false)
            .min_duration(Duration::from_millis(600))
            .animation(AnimationCue::Trigger("swing".into()))
            .on_exit(Arc::new(land_hit)),
    );
    let lunge = b.behavior(
        Behavior::new("lunge")
            .interruptible(false)
            .min_duration(Duration::from_millis(900))
            .animation(AnimationCue::Play("lunge".into()))
            .on_update(Arc::new(approach(0.5))),
    );
    // A lunge that closes the gap turns into a swing.
    b.transition(lunge, Transition::to(melee).when(Arc::new(in_melee_range)));

    let root = b.conditional(vec![
        ConditionalArm::to(melee).when(Arc::new(in_melee_range)),
        ConditionalArm::to(lunge),
    ]);
    b.build(root)
}
