//! Unit tests for ar-sim.

use std::time::Duration;

use ar_agent::{AgentBuilder, AgentConfig};
use ar_core::{AgentId, ArError, SimConfig, SimTime, TokenStatus};
use ar_token::{TokenConfig, TokenScheduler};
use ar_tree::{Behavior, DecisionTree, TreeBuilder, WeightedEntry};

use crate::{AgentRoster, NoopObserver, Sim, SimBuilder, SimError, SimObserver};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn t(s: f64) -> SimTime {
    SimTime::from_secs_f64(s)
}

fn patrol_tree() -> DecisionTree {
    let mut b = TreeBuilder::new("main");
    let patrol = b.behavior(Behavior::new("patrol").min_duration(Duration::from_secs(1)));
    b.build(patrol).unwrap()
}

fn attack_tree() -> DecisionTree {
    let mut b = TreeBuilder::new("token");
    let attack = b.behavior(
        Behavior::new("attack").interruptible(false).min_duration(Duration::from_millis(500)),
    );
    b.build(attack).unwrap()
}

/// Quarter-second steps, one-second cooldown.
fn sim(pool_size: usize) -> Sim {
    let config = SimConfig { step_secs: 0.25, total_ticks: 8, seed: 7 };
    SimBuilder::new(config)
        .tokens(TokenConfig { pool_size, cooldown_secs: 1.0, ..TokenConfig::default() })
        .build()
        .unwrap()
}

fn fighter() -> AgentBuilder {
    AgentBuilder::new(&patrol_tree()).token_tree(&attack_tree())
}

fn fighter_with(config: AgentConfig) -> AgentBuilder {
    fighter().config(config)
}

fn status(sim: &Sim, id: AgentId) -> TokenStatus {
    sim.agent(id).map_or(TokenStatus::None, |a| a.token_status())
}

fn step(sim: &mut Sim, n: u64) {
    sim.run_ticks(n, &mut NoopObserver).unwrap();
}

// ── Construction ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn rejects_bad_step() {
        let config = SimConfig { step_secs: 0.0, ..SimConfig::default() };
        assert!(matches!(SimBuilder::new(config).build(), Err(SimError::Core(ArError::Config(_)))));
    }

    #[test]
    fn rejects_bad_token_config() {
        let result = SimBuilder::new(SimConfig::default())
            .tokens(TokenConfig { cooldown_secs: -1.0, ..TokenConfig::default() })
            .build();
        assert!(matches!(result, Err(SimError::Token(_))));
    }

    #[test]
    fn starts_empty_at_time_zero() {
        let sim = sim(3);
        assert_eq!(sim.now(), SimTime::ZERO);
        assert!(sim.agents().is_empty());
        assert!(!sim.in_combat());
        assert_eq!(sim.scheduler().available(), 3);
    }
}

// ── Spawning and activation ───────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle_tests {
    use super::*;

    #[test]
    fn spawn_assigns_sequential_ids_and_activates() {
        let mut sim = sim(1);
        let a = sim.spawn(fighter()).unwrap();
        let b = sim.spawn(fighter()).unwrap();
        assert_eq!((a, b), (AgentId(0), AgentId(1)));
        assert!(sim.agent(a).unwrap().is_active());
        assert!(sim.in_combat());
        assert_eq!(sim.agents().ids(), vec![a, b]);
    }

    #[test]
    fn spawn_rejects_invalid_agent_config() {
        let mut sim = sim(1);
        let result = sim.spawn(fighter_with(AgentConfig { priority_modifier: 0.0, ..AgentConfig::default() }));
        assert!(matches!(result, Err(SimError::Agent(_))));
        // The failed spawn does not burn an id.
        assert_eq!(sim.spawn(fighter()).unwrap(), AgentId(0));
    }

    #[test]
    fn spawn_after_removal_keeps_lookup_consistent() {
        let mut sim = sim(1);
        let a = sim.spawn(fighter()).unwrap();
        let b = sim.spawn(fighter()).unwrap();
        sim.remove(a).unwrap();
        let c = sim.spawn(fighter()).unwrap();
        assert_eq!(c, AgentId(2));
        assert_eq!(sim.agents().ids(), vec![b, c]);
        assert_eq!(sim.agent(c).map(|x| x.id()), Some(c));
        assert_eq!(sim.agent(b).map(|x| x.id()), Some(b));
        assert!(!sim.agents().contains(a));
    }

    #[test]
    fn enable_delay_defers_activation() {
        let mut sim = sim(1);
        let a = sim
            .spawn(fighter_with(AgentConfig { enable_delay_secs: 0.5, ..AgentConfig::default() }))
            .unwrap();
        assert_eq!(sim.pending_activation(a), Some(t(0.5)));
        assert!(!sim.in_combat());

        step(&mut sim, 2);
        assert!(!sim.agent(a).unwrap().is_active());
        assert_eq!(sim.agent(a).unwrap().current(), None);

        step(&mut sim, 1);
        let agent = sim.agent(a).unwrap();
        assert!(agent.is_active());
        assert_eq!(agent.last_token_at(), t(0.5));
        assert_eq!(agent.current_name(), Some("attack"));
        assert_eq!(sim.pending_activation(a), None);
    }

    #[test]
    fn explicit_activation_makes_deferred_timer_stale() {
        let mut sim = sim(1);
        let a = sim
            .spawn(fighter_with(AgentConfig { enable_delay_secs: 0.5, ..AgentConfig::default() }))
            .unwrap();
        assert!(sim.activate(a).unwrap());
        assert!(!sim.activate(a).unwrap());
        assert!(sim.deactivate(a).unwrap());

        step(&mut sim, 4);
        assert!(!sim.agent(a).unwrap().is_active());
    }

    #[test]
    fn suspend_for_reactivates_later() {
        let mut sim = sim(1);
        let a = sim.spawn(fighter()).unwrap();
        step(&mut sim, 1);
        assert_eq!(status(&sim, a), TokenStatus::Held);

        sim.suspend_for(a, Duration::from_secs(1)).unwrap();
        assert!(!sim.in_combat());
        assert_eq!(status(&sim, a), TokenStatus::None);
        assert_eq!(sim.scheduler().available(), 1);
        assert_eq!(sim.pending_activation(a), Some(t(1.25)));

        step(&mut sim, 4);
        assert!(!sim.agent(a).unwrap().is_active());

        step(&mut sim, 1);
        assert!(sim.agent(a).unwrap().is_active());
        assert_eq!(status(&sim, a), TokenStatus::Held);
    }

    #[test]
    fn unknown_ids_are_errors() {
        let mut sim = sim(1);
        let ghost = AgentId(9);
        assert!(matches!(sim.activate(ghost), Err(SimError::Core(ArError::AgentNotFound(_)))));
        assert!(sim.deactivate(ghost).is_err());
        assert!(sim.disrupt(ghost).is_err());
        assert!(sim.set_disrupted(ghost, true).is_err());
        assert!(sim.revoke_request(ghost).is_err());
        assert!(sim.remove(ghost).is_err());
    }
}

// ── Removal ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod removal_tests {
    use super::*;

    #[test]
    fn removing_holder_hands_slot_to_queue() {
        let mut sim = sim(1);
        let a = sim.spawn(fighter()).unwrap();
        let b = sim.spawn(fighter()).unwrap();
        step(&mut sim, 1);
        assert_eq!(status(&sim, a), TokenStatus::Held);
        assert_eq!(status(&sim, b), TokenStatus::Requested);

        let removed = sim.remove(a).unwrap();
        assert!(!removed.is_active());
        assert_eq!(status(&sim, b), TokenStatus::Held);
        assert_eq!(sim.agent(b).unwrap().current_name(), Some("attack"));
        assert!(sim.agent(a).is_none());
        assert!(matches!(sim.remove(a), Err(SimError::Core(ArError::AgentNotFound(_)))));

        // Ids are never reused.
        assert_eq!(sim.spawn(fighter()).unwrap(), AgentId(2));
        sim.scheduler().check_invariants().unwrap();
    }

    #[test]
    fn removing_cooling_agent_leaves_pool_delay_running() {
        let mut sim = sim(1);
        let a = sim.spawn(fighter()).unwrap();
        let b = sim
            .spawn(fighter_with(AgentConfig { enable_delay_secs: 1.0, ..AgentConfig::default() }))
            .unwrap();
        // a returns at t=0.75; its slot comes back at t=1.75.
        step(&mut sim, 4);
        assert_eq!(status(&sim, a), TokenStatus::Cooldown);
        assert_eq!(sim.scheduler().available(), 0);

        sim.remove(a).unwrap();
        assert_eq!(sim.scheduler().available(), 0);
        assert_eq!(sim.scheduler().cooldown_deadline(a), None);

        // b comes online at t=1.0 and queues until the slot returns.
        step(&mut sim, 3);
        assert_eq!(status(&sim, b), TokenStatus::Requested);
        step(&mut sim, 1);
        assert_eq!(status(&sim, b), TokenStatus::Held);
        sim.scheduler().check_invariants().unwrap();
    }

    #[test]
    fn remove_all_ends_combat() {
        let mut sim = sim(1);
        for _ in 0..3 {
            sim.spawn(fighter()).unwrap();
        }
        sim.spawn(fighter_with(AgentConfig { enable_delay_secs: 1.0, ..AgentConfig::default() }))
            .unwrap();
        step(&mut sim, 1);
        assert!(sim.in_combat());

        assert_eq!(sim.remove_all(), 4);
        assert!(!sim.in_combat());
        assert!(sim.agents().is_empty());
        assert_eq!(sim.scheduler().available(), 1);
        assert!(sim.scheduler().pending().is_empty());

        step(&mut sim, 8);
        assert!(sim.agents().is_empty());
    }
}

// ── Token arbitration through the driver ──────────────────────────────────────

#[cfg(test)]
mod arbitration_tests {
    use super::*;

    #[test]
    fn highest_priority_wins_freed_slot() {
        let mut sim = sim(1);
        let a = sim.spawn(fighter()).unwrap();
        let b = sim.spawn(fighter()).unwrap();
        let c = sim
            .spawn(fighter_with(AgentConfig { priority_modifier: 3.0, ..AgentConfig::default() }))
            .unwrap();

        step(&mut sim, 1);
        assert_eq!(status(&sim, a), TokenStatus::Held);
        assert_eq!(sim.scheduler().pending(), &[b, c]);

        // a returns at t=0.75; its slot comes back at t=1.75.
        step(&mut sim, 6);
        assert_eq!(status(&sim, a), TokenStatus::Cooldown);
        step(&mut sim, 1);
        assert_eq!(status(&sim, c), TokenStatus::Held);
        assert_eq!(status(&sim, b), TokenStatus::Requested);
        assert_eq!(status(&sim, a), TokenStatus::Requested);
    }

    #[test]
    fn growing_pool_grants_queued_requests() {
        let mut sim = sim(1);
        let ids: Vec<_> = (0..3).map(|_| sim.spawn(fighter()).unwrap()).collect();
        step(&mut sim, 1);
        assert_eq!(sim.scheduler().holder_count(), 1);

        sim.set_pool_size(3);
        assert!(ids.iter().all(|&id| status(&sim, id) == TokenStatus::Held));

        sim.set_pool_size(1);
        assert_eq!(sim.scheduler().debt(), 2);
        assert_eq!(sim.scheduler().holder_count(), 3);
        sim.scheduler().check_invariants().unwrap();
    }

    #[test]
    fn disrupt_returns_held_token() {
        let mut sim = sim(1);
        let a = sim.spawn(fighter()).unwrap();
        step(&mut sim, 1);
        sim.disrupt(a).unwrap();
        assert_eq!(status(&sim, a), TokenStatus::Cooldown);
        assert_eq!(sim.agent(a).unwrap().current(), None);
        assert_eq!(sim.scheduler().cooldown_deadline(a), Some(t(1.25)));
    }

    #[test]
    fn disrupted_flag_freezes_behavior_choice() {
        let mut sim = sim(1);
        let a = sim.spawn(fighter()).unwrap();
        step(&mut sim, 1);
        sim.set_disrupted(a, true).unwrap();
        // Long enough for attack to finish were the agent not disrupted.
        step(&mut sim, 8);
        assert_eq!(sim.agent(a).unwrap().current_name(), Some("attack"));
        assert_eq!(status(&sim, a), TokenStatus::Held);

        sim.set_disrupted(a, false).unwrap();
        step(&mut sim, 1);
        assert_eq!(sim.agent(a).unwrap().current_name(), Some("patrol"));
    }

    #[test]
    fn revoke_request_leaves_queue() {
        let mut sim = sim(1);
        let _a = sim.spawn(fighter()).unwrap();
        let b = sim.spawn(fighter()).unwrap();
        step(&mut sim, 1);
        assert!(sim.revoke_request(b).unwrap());
        assert!(!sim.revoke_request(b).unwrap());
        assert_eq!(status(&sim, b), TokenStatus::None);
        assert!(sim.scheduler().pending().is_empty());
    }
}

// ── Run loop ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod run_tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        starts:  u32,
        holders: Vec<usize>,
        ended:   Option<SimTime>,
    }

    impl SimObserver for Recorder {
        fn on_tick_start(&mut self, _now: SimTime) {
            self.starts += 1;
        }

        fn on_tick_end(&mut self, _now: SimTime, _agents: &AgentRoster, tokens: &TokenScheduler) {
            self.holders.push(tokens.holder_count());
        }

        fn on_sim_end(&mut self, final_time: SimTime) {
            self.ended = Some(final_time);
        }
    }

    #[test]
    fn run_drives_configured_ticks() {
        let mut sim = sim(1);
        sim.spawn(fighter()).unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();

        assert_eq!(rec.starts, 8);
        assert_eq!(rec.ended, Some(t(2.0)));
        assert_eq!(sim.clock().ticks, 8);
        // Held t=0..0.5, cooldown from t=0.75, held again at t=1.75.
        assert_eq!(rec.holders, vec![1, 1, 1, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn same_seed_same_choices() {
        let trace = || {
            let mut b = TreeBuilder::new("roam");
            let left = b.behavior(Behavior::new("left"));
            let right = b.behavior(Behavior::new("right"));
            let root = b.weighted(vec![
                WeightedEntry::new(left, 1.0, 0.5).initial_weight(1.0),
                WeightedEntry::new(right, 1.0, 0.5).initial_weight(1.0),
            ]);
            let tree = b.build(root).unwrap();

            let mut sim = sim(1);
            let id = sim.spawn(AgentBuilder::new(&tree)).unwrap();
            let mut names = Vec::new();
            for _ in 0..20 {
                step(&mut sim, 1);
                names.push(sim.agent(id).unwrap().current_name().unwrap_or("-").to_string());
            }
            names
        };
        assert_eq!(trace(), trace());
    }

    #[test]
    fn every_tick_checks_pool_bookkeeping() {
        let mut sim = sim(2);
        let ids: Vec<_> = (0..5).map(|_| sim.spawn(fighter()).unwrap()).collect();
        let dt = sim.config.step();
        for n in 0..40u64 {
            match n {
                5 => sim.disrupt(ids[0]).unwrap(),
                9 => sim.suspend_for(ids[1], Duration::from_millis(700)).unwrap(),
                14 => sim.set_pool_size(1),
                20 => {
                    sim.remove(ids[2]).unwrap();
                }
                27 => sim.set_pool_size(3),
                _ => {}
            }
            assert!(sim.tick(dt, &mut NoopObserver).is_ok(), "tick {n} failed");
            sim.scheduler().check_invariants().unwrap();
        }
        assert!(sim.scheduler().holder_count() <= 3);
    }
}
