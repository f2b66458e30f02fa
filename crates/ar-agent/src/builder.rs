//! Fluent builder for [`Agent`].

use std::sync::Arc;

use ar_core::{AgentId, AgentRng, SimTime};
use ar_tree::{AgentContext, AnimationSink, Components, DecisionTree, Guard};
use tracing::warn;

use crate::observer::Observers;
use crate::{Agent, AgentConfig, AgentObserver, AgentResult, AttentionSignal};

/// Fluent builder for [`Agent`].
///
/// Trees are taken by reference and cloned, so every agent gets its own
/// weighted-branch state even when built from one authored tree.
///
/// # Optional inputs (have defaults)
///
/// | Method            | Default                               |
/// |-------------------|---------------------------------------|
/// | `.token_tree(t)`  | none: the agent never requests tokens |
/// | `.config(c)`      | `AgentConfig::default()`              |
/// | `.gate(g)`        | no extra request gates                |
/// | `.attention(s)`   | constant `0.0`                        |
/// | `.component(v)`   | empty blackboard                      |
/// | `.animator(s)`    | animation cues dropped                |
/// | `.observer(o)`    | no subscribers                        |
///
/// # Example
///
/// ```rust,ignore
/// let agent = AgentBuilder::new(&grunt_tree)
///     .token_tree(&grunt_attacks)
///     .config(AgentConfig { priority_modifier: 2.0, ..AgentConfig::default() })
///     .component(Health(30.0))
///     .build(AgentId(0), seed)?;
/// ```
pub struct AgentBuilder {
    main:       DecisionTree,
    token_tree: Option<DecisionTree>,
    config:     AgentConfig,
    gates:      Vec<Arc<dyn Guard>>,
    attention:  Option<Box<dyn AttentionSignal>>,
    components: Components,
    animator:   Option<Box<dyn AnimationSink>>,
    observers:  Vec<Box<dyn AgentObserver>>,
}

impl AgentBuilder {
    pub fn new(main: &DecisionTree) -> Self {
        Self {
            main:       main.clone(),
            token_tree: None,
            config:     AgentConfig::default(),
            gates:      Vec::new(),
            attention:  None,
            components: Components::new(),
            animator:   None,
            observers:  Vec::new(),
        }
    }

    /// Tree resolved into the current behavior whenever a token is granted.
    pub fn token_tree(mut self, tree: &DecisionTree) -> Self {
        self.token_tree = Some(tree.clone());
        self
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Extra condition that must hold for the agent to request a token.
    pub fn gate(mut self, guard: Arc<dyn Guard>) -> Self {
        self.gates.push(guard);
        self
    }

    pub fn attention(mut self, signal: Box<dyn AttentionSignal>) -> Self {
        self.attention = Some(signal);
        self
    }

    /// Seed the agent's blackboard with `value`.
    pub fn component<T: 'static>(mut self, value: T) -> Self {
        self.components.insert(value);
        self
    }

    pub fn animator(mut self, sink: Box<dyn AnimationSink>) -> Self {
        self.animator = Some(sink);
        self
    }

    /// Subscribe `observer` before the agent's first lifecycle event.
    pub fn observer(mut self, observer: Box<dyn AgentObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn agent_config(&self) -> &AgentConfig {
        &self.config
    }

    /// Validate the configuration and produce an inactive agent.
    ///
    /// `seed` is the run's global seed; the agent's RNG stream is derived from
    /// it and `id`.
    pub fn build(self, id: AgentId, seed: u64) -> AgentResult<Agent> {
        if let Err(e) = self.config.validate() {
            warn!(agent = %id, error = %e, "agent configuration rejected");
            return Err(e);
        }

        let mut ctx = AgentContext::new(id);
        *ctx.components_mut() = self.components;
        if let Some(sink) = self.animator {
            ctx.set_animator(sink);
        }

        let mut observers = Observers::default();
        for observer in self.observers {
            observers.subscribe(observer);
        }

        Ok(Agent {
            ctx,
            rng:           AgentRng::new(seed, id),
            main:          self.main,
            token_tree:    self.token_tree,
            current:       None,
            config:        self.config,
            gates:         self.gates,
            attention:     self.attention,
            observers,
            active:        false,
            last_token_at: SimTime::ZERO,
        })
    }
}
