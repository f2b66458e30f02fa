//! Lifecycle notifications.

use ar_core::{AgentId, SimTime};

/// Callbacks fired by an [`Agent`][crate::Agent] as its lifecycle advances.
///
/// Observers are invoked synchronously, in subscription order.  All methods
/// default to no-ops.
///
/// # Example: logging grants
///
/// ```rust,ignore
/// struct GrantLog;
///
/// impl AgentObserver for GrantLog {
///     fn on_receive_token(&mut self, agent: AgentId, now: SimTime) {
///         println!("{now}: {agent} attacks");
///     }
/// }
///
/// let sub = agent.subscribe(Box::new(GrantLog));
/// ```
pub trait AgentObserver {
    fn on_activate(&mut self, _agent: AgentId, _now: SimTime) {}

    fn on_deactivate(&mut self, _agent: AgentId, _now: SimTime) {}

    fn on_receive_token(&mut self, _agent: AgentId, _now: SimTime) {}

    fn on_return_token(&mut self, _agent: AgentId, _now: SimTime) {}

    fn on_cooldown_finish(&mut self, _agent: AgentId, _now: SimTime) {}

    /// The current behavior changed.  Names are behavior names; `None` means
    /// no behavior.
    fn on_state_change(
        &mut self,
        _agent: AgentId,
        _from:  Option<&str>,
        _to:    Option<&str>,
        _now:   SimTime,
    ) {
    }
}

/// Handle returned by [`Agent::subscribe`][crate::Agent::subscribe].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct SubscriptionId(pub u32);

/// Ordered subscriber list.
#[derive(Default)]
pub(crate) struct Observers {
    next: u32,
    list: Vec<(SubscriptionId, Box<dyn AgentObserver>)>,
}

impl Observers {
    pub(crate) fn subscribe(&mut self, observer: Box<dyn AgentObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next);
        self.next += 1;
        self.list.push((id, observer));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> Option<Box<dyn AgentObserver>> {
        let pos = self.list.iter().position(|(s, _)| *s == id)?;
        Some(self.list.remove(pos).1)
    }

    pub(crate) fn len(&self) -> usize {
        self.list.len()
    }

    pub(crate) fn each(&mut self, mut f: impl FnMut(&mut dyn AgentObserver)) {
        for (_, observer) in &mut self.list {
            f(observer.as_mut());
        }
    }
}
