//! Fluent builder for constructing a [`Sim`].

use ar_core::SimConfig;
use ar_token::{TokenConfig, TokenScheduler};
use tracing::warn;

use crate::{Sim, SimResult};

/// Fluent builder for [`Sim`].
///
/// # Required inputs
///
/// - [`SimConfig`]: step length, tick count, seed
///
/// # Optional inputs (have defaults)
///
/// | Method             | Default                  |
/// |--------------------|--------------------------|
/// | `.tokens(c)`       | `TokenConfig::default()` |
///
/// Agents are added after construction with [`Sim::spawn`].
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config)
///     .tokens(TokenConfig { pool_size: 2, ..TokenConfig::default() })
///     .build()?;
/// let grunt = sim.spawn(AgentBuilder::new(&grunt_tree).token_tree(&attacks))?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder {
    config: SimConfig,
    tokens: TokenConfig,
}

impl SimBuilder {
    pub fn new(config: SimConfig) -> Self {
        Self { config, tokens: TokenConfig::default() }
    }

    /// Token pool configuration: size, default cooldown, priority weights.
    pub fn tokens(mut self, tokens: TokenConfig) -> Self {
        self.tokens = tokens;
        self
    }

    /// Validate both configurations and return an empty, ready-to-run [`Sim`]
    /// at time zero.
    pub fn build(self) -> SimResult<Sim> {
        if let Err(e) = self.config.validate() {
            warn!(error = %e, "simulation configuration rejected");
            return Err(e.into());
        }
        let scheduler = TokenScheduler::new(self.tokens)?;
        Ok(Sim::new(self.config, scheduler))
    }
}
