//! Finite-state AI for units.
//!
//! A [`StateMachine`] holds at most one active [`UnitState`]. States never
//! switch the machine themselves: `update` returns a [`Transition`] and the
//! machine applies it through [`StateMachine::set`], so exit and enter hooks
//! always run in the same order.

use std::fmt;

use crate::simulation::SimContext;
use crate::unit::Unit;

/// Outcome of a state's per-tick update.
pub enum Transition {
    /// Keep the current state.
    Stay,
    /// Replace the current state. `None` leaves the unit idle.
    Switch(Option<Box<dyn UnitState>>),
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stay => f.write_str("Stay"),
            Self::Switch(None) => f.write_str("Switch(None)"),
            Self::Switch(Some(state)) => write!(f, "Switch({})", state.name()),
        }
    }
}

/// A behavioral state.
pub trait UnitState: fmt::Debug + Send {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Called once when the state becomes active.
    fn enter(&mut self, _unit: &mut Unit, _ctx: &SimContext<'_>) {}

    /// Called once per authoritative tick while active.
    fn update(&mut self, unit: &mut Unit, ctx: &SimContext<'_>) -> Transition;

    /// Called once when the state is replaced.
    fn exit(&mut self, _unit: &mut Unit, _ctx: &SimContext<'_>) {}
}

/// Holder of a unit's current state.
///
/// An empty machine is the idle terminal: updating it does nothing.
#[derive(Debug, Default)]
pub struct StateMachine {
    current: Option<Box<dyn UnitState>>,
}

impl StateMachine {
    /// Create an idle machine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the active state.
    #[must_use]
    pub fn current_name(&self) -> Option<&'static str> {
        self.current.as_ref().map(|s| s.name())
    }

    /// Whether no state is active.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    /// Exit the active state, then enter `next` (if any).
    pub fn set(&mut self, unit: &mut Unit, ctx: &SimContext<'_>, next: Option<Box<dyn UnitState>>) {
        if let Some(mut previous) = self.current.take() {
            previous.exit(unit, ctx);
        }
        tracing::trace!(
            unit = unit.id(),
            state = next.as_ref().map_or("idle", |s| s.name()),
            "State change"
        );
        self.current = next;
        if let Some(state) = self.current.as_mut() {
            state.enter(unit, ctx);
        }
    }

    /// Run one update of the active state and apply its transition.
    pub fn update(&mut self, unit: &mut Unit, ctx: &SimContext<'_>) {
        let transition = match self.current.as_mut() {
            Some(state) => state.update(unit, ctx),
            None => return,
        };
        if let Transition::Switch(next) = transition {
            self.set(unit, ctx, next);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::components::TeamId;
    use crate::test_support::{context_fixture, dagger};

    type Log = Arc<Mutex<Vec<String>>>;

    #[derive(Debug)]
    struct Recording {
        label: &'static str,
        log: Log,
        switch_after: Option<u32>,
        updates: u32,
    }

    impl Recording {
        fn boxed(label: &'static str, log: &Log, switch_after: Option<u32>) -> Box<dyn UnitState> {
            Box::new(Self {
                label,
                log: Arc::clone(log),
                switch_after,
                updates: 0,
            })
        }

        fn push(&self, event: &str) {
            self.log.lock().unwrap().push(format!("{}:{event}", self.label));
        }
    }

    impl UnitState for Recording {
        fn name(&self) -> &'static str {
            self.label
        }

        fn enter(&mut self, _unit: &mut Unit, _ctx: &SimContext<'_>) {
            self.push("enter");
        }

        fn update(&mut self, _unit: &mut Unit, _ctx: &SimContext<'_>) -> Transition {
            self.updates += 1;
            self.push("update");
            match self.switch_after {
                Some(n) if self.updates >= n => {
                    Transition::Switch(Some(Recording::boxed("next", &self.log, None)))
                }
                _ => Transition::Stay,
            }
        }

        fn exit(&mut self, _unit: &mut Unit, _ctx: &SimContext<'_>) {
            self.push("exit");
        }
    }

    #[test]
    fn test_set_runs_exit_then_enter() {
        let fixture = context_fixture();
        let ctx = fixture.context();
        let mut unit = Unit::new(1, dagger(&fixture.registry), TeamId::SHARDED);
        let log: Log = Arc::default();
        let mut machine = StateMachine::new();

        machine.set(&mut unit, &ctx, Some(Recording::boxed("a", &log, None)));
        machine.set(&mut unit, &ctx, Some(Recording::boxed("b", &log, None)));
        machine.set(&mut unit, &ctx, None);

        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:enter", "a:exit", "b:enter", "b:exit"]
        );
        assert!(machine.is_idle());
    }

    #[test]
    fn test_idle_update_is_noop() {
        let fixture = context_fixture();
        let ctx = fixture.context();
        let mut unit = Unit::new(1, dagger(&fixture.registry), TeamId::SHARDED);
        let mut machine = StateMachine::new();
        machine.update(&mut unit, &ctx);
        assert!(machine.is_idle());
    }

    #[test]
    fn test_update_applies_returned_transition() {
        let fixture = context_fixture();
        let ctx = fixture.context();
        let mut unit = Unit::new(1, dagger(&fixture.registry), TeamId::SHARDED);
        let log: Log = Arc::default();
        let mut machine = StateMachine::new();

        machine.set(&mut unit, &ctx, Some(Recording::boxed("a", &log, Some(2))));
        machine.update(&mut unit, &ctx);
        assert_eq!(machine.current_name(), Some("a"));
        machine.update(&mut unit, &ctx);
        assert_eq!(machine.current_name(), Some("next"));

        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:enter", "a:update", "a:update", "a:exit", "next:enter"]
        );
    }
}
