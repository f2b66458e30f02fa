//! Simulation time model.
//!
//! # Design
//!
//! Instants are a monotonically increasing `SimTime` counter of microseconds
//! since simulation start; spans are plain `std::time::Duration`s.  Using an
//! integer instant means deadline arithmetic is exact (no floating-point
//! drift), comparisons are O(1), and instants can key a `BTreeMap` directly.
//!
//! The driver advances `SimClock` by each step's `dt`.  Fixed-step runs take
//! `dt` from `SimConfig::step_secs`; hosts with their own frame clock call
//! `Sim::tick(dt)` with whatever the frame measured.

use std::fmt;
use std::time::Duration;

use crate::{ArError, ArResult};

/// Build a `Duration` from float seconds.  Negative, NaN and overflowing
/// inputs collapse to `Duration::ZERO`.
#[inline]
pub fn secs(s: f64) -> Duration {
    Duration::try_from_secs_f64(s).unwrap_or(Duration::ZERO)
}

// ── SimTime ───────────────────────────────────────────────────────────────────

/// An absolute simulation instant, in microseconds since start.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    #[inline]
    pub fn from_secs_f64(s: f64) -> SimTime {
        SimTime(secs(s).as_micros() as u64)
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Time elapsed from `earlier` to `self`, or zero if `earlier` is later.
    #[inline]
    pub fn saturating_since(self, earlier: SimTime) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }
}

impl std::ops::Add<Duration> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: Duration) -> SimTime {
        SimTime(self.0.saturating_add(rhs.as_micros() as u64))
    }
}

impl std::ops::AddAssign<Duration> for SimTime {
    #[inline]
    fn add_assign(&mut self, rhs: Duration) {
        *self = *self + rhs;
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={:.3}s", self.as_secs_f64())
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// The driver's clock: current instant plus the number of completed ticks.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// The current instant, advanced by `SimClock::advance()` each tick.
    pub now: SimTime,
    /// Completed ticks since start.
    pub ticks: u64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by one tick of length `dt`.
    #[inline]
    pub fn advance(&mut self, dt: Duration) {
        self.now += dt;
        self.ticks += 1;
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick {} ({})", self.ticks, self.now)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level driver configuration.
///
/// Typically loaded from a TOML file by the application crate and passed to
/// the simulation builder.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Seconds per fixed step.  Default: 1/60.
    pub step_secs: f64,

    /// Ticks simulated by `Sim::run`.
    pub total_ticks: u64,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            step_secs:   1.0 / 60.0,
            total_ticks: 600,
            seed:        0,
        }
    }
}

impl SimConfig {
    /// The fixed step as a `Duration`.
    #[inline]
    pub fn step(&self) -> Duration {
        secs(self.step_secs)
    }

    pub fn validate(&self) -> ArResult<()> {
        if !self.step_secs.is_finite() || self.step_secs <= 0.0 {
            return Err(ArError::Config(format!(
                "step_secs must be a positive number, got {}",
                self.step_secs
            )));
        }
        Ok(())
    }
}
