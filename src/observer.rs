//! Hooks for watching a computation. The engine reports every applied transition and the
//! final halt to an `Observer` instead of printing anything itself.

use crate::types::{Halt, Transition};
use std::fmt;

/// A single applied transition, captured after the write and before the head moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepEvent {
    /// The state the transition was taken from.
    pub state: String,
    /// The symbol that was read.
    pub read: char,
    pub transition: Transition,
    /// The head position the symbol was read from.
    pub head: usize,
    /// The tape rendering after the write.
    pub tape: String,
}

impl fmt::Display for StepEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\u{03B4}({}, {}) \u{21A6} ({}, {:>2}, {})  |  {}",
            self.state,
            self.read,
            self.transition.output,
            self.transition.movement,
            self.transition.next_state,
            self.tape
        )
    }
}

/// Receives engine events. Both hooks default to doing nothing.
///
/// Observers are side channels: they cannot influence control flow.
pub trait Observer {
    fn on_step(&mut self, _event: &StepEvent) {}

    fn on_halt(&mut self, _halt: &Halt) {}
}

/// The silent observer.
impl Observer for () {}

impl<O: Observer + ?Sized> Observer for &mut O {
    fn on_step(&mut self, event: &StepEvent) {
        (**self).on_step(event)
    }

    fn on_halt(&mut self, halt: &Halt) {
        (**self).on_halt(halt)
    }
}

/// Records every event, for later inspection.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Trace {
    pub steps: Vec<StepEvent>,
    pub halt: Option<Halt>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the formatted transition lines, one per step.
    pub fn lines(&self) -> Vec<String> {
        self.steps.iter().map(ToString::to_string).collect()
    }
}

impl Observer for Trace {
    fn on_step(&mut self, event: &StepEvent) {
        self.steps.push(event.clone());
    }

    fn on_halt(&mut self, halt: &Halt) {
        self.halt = Some(halt.clone());
    }
}

/// Forwards events to `tracing`: steps at `info`, normal halts at `info`, error halts at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_step(&mut self, event: &StepEvent) {
        tracing::info!(state = %event.state, head = event.head, "{}", event);
    }

    fn on_halt(&mut self, halt: &Halt) {
        if halt.is_error() {
            tracing::warn!(state = %halt.state(), code = halt.code(), "{}", halt);
        } else {
            tracing::info!(state = %halt.state(), "{}", halt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Move;

    fn event() -> StepEvent {
        StepEvent {
            state: "q0".to_string(),
            read: '1',
            transition: Transition::new('1', '0', Move::Right, "q0"),
            head: 0,
            tape: "001".to_string(),
        }
    }

    #[test]
    fn test_step_event_display() {
        assert_eq!(
            event().to_string(),
            "\u{03B4}(q0, 1) \u{21A6} (0,  1, q0)  |  001"
        );
    }

    #[test]
    fn test_trace_records_events() {
        let mut trace = Trace::new();
        let halt = Halt::Normal {
            state: "q0".to_string(),
            tape: "001".to_string(),
        };

        trace.on_step(&event());
        trace.on_halt(&halt);

        assert_eq!(trace.steps, vec![event()]);
        assert_eq!(trace.halt, Some(halt));
        assert_eq!(trace.lines().len(), 1);
    }

    #[test]
    fn test_observer_through_mutable_reference() {
        fn feed(mut observer: impl Observer) {
            observer.on_step(&event());
        }

        let mut trace = Trace::new();
        feed(&mut trace);
        feed(&mut trace);
        assert_eq!(trace.steps.len(), 2);
    }
}
