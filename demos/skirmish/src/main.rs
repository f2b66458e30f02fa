//! skirmish: a squad of melee agents circling a single player.
//!
//! Agents roam through their main tree and compete for a small pool of attack
//! tokens; only token holders may swing.  The player strikes back on a fixed
//! cadence, disrupting or knocking down a random attacker, and the pool grows
//! once the fight drags on.
//!
//! Configuration is an embedded TOML document.  Set `RUST_LOG=debug` to see
//! every grant, return and state change.

mod trees;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

use ar_agent::{AgentBuilder, AgentConfig, AgentObserver};
use ar_core::{AgentId, SimConfig, SimRng, SimTime};
use ar_sim::{AgentRoster, Sim, SimBuilder, SimObserver};
use ar_token::{TokenConfig, TokenScheduler};
use ar_tree::{AgentContext, AnimationSink};

use trees::{Distance, Health, Hits, attack_tree, main_tree};

// ── Configuration ─────────────────────────────────────────────────────────────

const CONFIG: &str = r#"
[sim]
step_secs   = 0.1
total_ticks = 400
seed        = 42

[tokens]
pool_size     = 1
cooldown_secs = 1.5

[tokens.weights]
time_weight       = 1.0
attention_weight  = 5.0
attention_damping = 0.5

[player]
strike_every_ticks = 25
strike_damage      = 6.0
knockdown_chance   = 0.3
knockdown_secs     = 2.0
enrage_at_secs     = 15.0
enraged_pool_size  = 2

[[squad]]
name     = "grunt"
count    = 4
health   = 20.0
distance = 8.0

[[squad]]
name     = "brute"
count    = 1
health   = 40.0
distance = 12.0

[squad.agent]
priority_modifier   = 2.5
token_cooldown_secs = 3.0
enable_delay_secs   = 2.0
"#;

#[derive(Deserialize)]
struct SkirmishConfig {
    sim:    SimConfig,
    tokens: TokenConfig,
    player: PlayerConfig,
    #[serde(rename = "squad")]
    squads: Vec<SquadConfig>,
}

#[derive(Deserialize)]
struct PlayerConfig {
    strike_every_ticks: u64,
    strike_damage:      f32,
    knockdown_chance:   f64,
    knockdown_secs:     f64,
    enrage_at_secs:     f64,
    enraged_pool_size:  usize,
}

#[derive(Deserialize)]
struct SquadConfig {
    name:     String,
    count:    u32,
    health:   f32,
    distance: f32,
    #[serde(default)]
    agent:    AgentConfig,
}

// ── Observers ─────────────────────────────────────────────────────────────────

type Tally = Rc<RefCell<BTreeMap<AgentId, u32>>>;

/// Counts token grants per agent.
struct GrantCounter(Tally);

impl AgentObserver for GrantCounter {
    fn on_receive_token(&mut self, agent: AgentId, now: SimTime) {
        *self.0.borrow_mut().entry(agent).or_default() += 1;
        debug!(%agent, %now, "attack token received");
    }

    fn on_state_change(&mut self, agent: AgentId, from: Option<&str>, to: Option<&str>, now: SimTime) {
        debug!(%agent, %now, from = from.unwrap_or("-"), to = to.unwrap_or("-"), "state");
    }
}

/// Forwards animation cues to the log.
struct LogAnimator;

impl AnimationSink for LogAnimator {
    fn trigger(&mut self, agent: AgentId, name: &str) {
        debug!(%agent, trigger = name, "animation");
    }

    fn play(&mut self, agent: AgentId, state: &str) {
        debug!(%agent, state, "animation");
    }
}

/// Samples the token pool at the end of every tick.
#[derive(Default)]
struct PoolSampler {
    ticks:        u64,
    busy_ticks:   u64,
    peak_holders: usize,
    peak_active:  usize,
}

impl SimObserver for PoolSampler {
    fn on_tick_end(&mut self, _now: SimTime, agents: &AgentRoster, tokens: &TokenScheduler) {
        self.ticks += 1;
        let holders = tokens.holder_count();
        if holders > 0 {
            self.busy_ticks += 1;
        }
        self.peak_holders = self.peak_holders.max(holders);
        self.peak_active = self.peak_active.max(agents.active_count());
    }

    fn on_sim_end(&mut self, final_time: SimTime) {
        info!(%final_time, ticks = self.ticks, "skirmish over");
    }
}

// ── Player ────────────────────────────────────────────────────────────────────

struct Fallen {
    id:   AgentId,
    hits: u32,
    at:   SimTime,
}

/// The player hits a random active agent: it loses health and either
/// flinches (drops its current behavior) or is knocked down for a while.
/// Returns the agent if the blow was fatal.
fn player_strike(
    sim:    &mut Sim,
    rng:    &mut SimRng,
    player: &PlayerConfig,
) -> Result<Option<Fallen>> {
    let targets: Vec<AgentId> = sim.agents().iter().filter(|a| a.is_active()).map(|a| a.id()).collect();
    if targets.is_empty() {
        return Ok(None);
    }
    let id = targets[rng.gen_range(0..targets.len())];

    let agent = sim.agent_mut(id).context("strike target vanished")?;
    let health = match agent.context_mut().get_mut::<Health>() {
        Some(h) => {
            h.0 -= player.strike_damage;
            h.0
        }
        None => 0.0,
    };
    info!(agent = %id, health, "player strikes");

    if health <= 0.0 {
        let agent = sim.remove(id)?;
        let hits = agent.context().get::<Hits>().map_or(0, |h| h.0);
        info!(agent = %id, hits, "agent defeated");
        return Ok(Some(Fallen { id, hits, at: sim.now() }));
    }

    if rng.gen_bool(player.knockdown_chance) {
        sim.suspend_for(id, Duration::from_secs_f64(player.knockdown_secs))?;
        info!(agent = %id, secs = player.knockdown_secs, "knocked down");
    } else {
        sim.disrupt(id)?;
    }
    Ok(None)
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    let cfg: SkirmishConfig = toml::from_str(CONFIG).context("parsing embedded config")?;
    let main = main_tree()?;
    let attacks = attack_tree()?;

    println!("=== skirmish: token-arbitrated melee ===");
    println!(
        "Pool: {} token(s), cooldown {:.1} s  |  Step: {:.2} s  |  Seed: {}",
        cfg.tokens.pool_size, cfg.tokens.cooldown_secs, cfg.sim.step_secs, cfg.sim.seed
    );
    println!();

    // 1. Build the sim and spawn every squad.
    let mut sim = SimBuilder::new(cfg.sim.clone()).tokens(cfg.tokens.clone()).build()?;
    let grants: Tally = Rc::default();
    let mut squad_of: BTreeMap<AgentId, String> = BTreeMap::new();

    for squad in &cfg.squads {
        for _ in 0..squad.count {
            let builder = AgentBuilder::new(&main)
                .token_tree(&attacks)
                .config(squad.agent.clone())
                .component(Health(squad.health))
                .component(Distance(squad.distance))
                .component(Hits::default())
                .attention(Box::new(|ctx: &AgentContext| {
                    // Closer agents are more urgent; saturates at the damping point.
                    ctx.get::<Distance>().map_or(0.0, |d| (1.0 - d.0 / 10.0).clamp(0.0, 1.0) * 0.5)
                }))
                .animator(Box::new(LogAnimator))
                .observer(Box::new(GrantCounter(grants.clone())));
            let id = sim.spawn(builder)?;
            squad_of.insert(id, squad.name.clone());
        }
    }
    println!("Spawned {} agents across {} squads", squad_of.len(), cfg.squads.len());

    // 2. Run, with the player fighting back between ticks.
    let mut sampler = PoolSampler::default();
    let mut rng = SimRng::new(cfg.sim.seed);
    let mut fallen = Vec::new();
    let mut enraged = false;
    let dt = cfg.sim.step();
    let strike_every = cfg.player.strike_every_ticks.max(1);

    let t0 = Instant::now();
    for tick in 1..=cfg.sim.total_ticks {
        sim.tick(dt, &mut sampler)?;

        if !enraged && sim.now().as_secs_f64() >= cfg.player.enrage_at_secs {
            sim.set_pool_size(cfg.player.enraged_pool_size);
            enraged = true;
            info!(now = %sim.now(), pool = cfg.player.enraged_pool_size, "squad enraged");
        }
        if tick % strike_every == 0 {
            if let Some(f) = player_strike(&mut sim, &mut rng, &cfg.player)? {
                fallen.push(f);
            }
        }
        if sim.agents().is_empty() {
            break;
        }
    }
    sampler.on_sim_end(sim.now());
    let elapsed = t0.elapsed();

    // 3. Summary.
    println!("Simulated {} in {:.3} ms", sim.clock(), elapsed.as_secs_f64() * 1e3);
    println!(
        "  token busy {} / {} ticks, peak holders {}, peak active {}",
        sampler.busy_ticks, sampler.ticks, sampler.peak_holders, sampler.peak_active
    );
    println!();

    let tally = grants.borrow();
    let squad = |id: &AgentId| squad_of.get(id).map_or("?", String::as_str);
    println!("{:<12} {:<8} {:<10} {:<10} {:>6} {:>5}", "Agent", "Squad", "State", "Token", "Grants", "Hits");
    println!("{}", "-".repeat(56));
    for agent in sim.agents().iter() {
        let id = agent.id();
        println!(
            "{:<12} {:<8} {:<10} {:<10} {:>6} {:>5}",
            id.to_string(),
            squad(&id),
            agent.current_name().unwrap_or("-"),
            agent.token_status().to_string(),
            tally.get(&id).copied().unwrap_or(0),
            agent.context().get::<Hits>().map_or(0, |h| h.0),
        );
    }
    for f in &fallen {
        println!(
            "{:<12} {:<8} {:<10} {:<10} {:>6} {:>5}",
            f.id.to_string(),
            squad(&f.id),
            format!("fell {}", f.at),
            "-",
            tally.get(&f.id).copied().unwrap_or(0),
            f.hits,
        );
    }

    drop(tally);

    let removed = sim.remove_all();
    println!();
    println!("Cleared {removed} agents; in combat: {}", sim.in_combat());
    Ok(())
}
