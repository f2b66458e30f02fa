//! `AgentRoster`: the registered agents, in registration order.

use ar_agent::Agent;
use ar_core::AgentId;
use ar_token::{TokenClient, TokenRoster};
use rustc_hash::FxHashMap;

/// Registered agents in registration order, with an id → slot index.
///
/// Registration order is the tick order.  Removal keeps the relative order
/// of the survivors and rebuilds the index.
#[derive(Default)]
pub struct AgentRoster {
    agents: Vec<Agent>,
    index:  FxHashMap<AgentId, usize>,
}

impl AgentRoster {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.index.contains_key(&id)
    }

    /// Append `agent`, whose id the driver has just minted.
    pub(crate) fn push(&mut self, agent: Agent) {
        let id = agent.id();
        debug_assert!(!self.index.contains_key(&id), "{id} registered twice");
        self.index.insert(id, self.agents.len());
        self.agents.push(agent);
    }

    pub fn remove(&mut self, id: AgentId) -> Option<Agent> {
        let slot = self.index.remove(&id)?;
        let agent = self.agents.remove(slot);
        for (i, a) in self.agents.iter().enumerate().skip(slot) {
            self.index.insert(a.id(), i);
        }
        Some(agent)
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.index.get(&id).map(|&i| &self.agents[i])
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        let i = *self.index.get(&id)?;
        self.agents.get_mut(i)
    }

    pub fn ids(&self) -> Vec<AgentId> {
        self.agents.iter().map(Agent::id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.iter_mut()
    }

    /// Number of registered agents currently active.
    pub fn active_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_active()).count()
    }
}

impl TokenRoster for AgentRoster {
    fn client(&mut self, id: AgentId) -> Option<&mut dyn TokenClient> {
        self.get_mut(id).map(|a| a as &mut dyn TokenClient)
    }
}
