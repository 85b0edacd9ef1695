//! This module defines `Machine`, the execution engine. It owns the registered states,
//! tracks which one is active, and drives a `Tape` one transition at a time until the
//! machine halts or the caller's budget runs out.

use crate::observer::{Observer, StepEvent};
use crate::state::State;
use crate::tape::Tape;
use crate::types::{Halt, MachineError, Step};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Where the engine is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Status {
    /// No state has been activated yet.
    #[default]
    Idle,
    /// Computing in the named state.
    Running { state: String },
    /// Stopped. Terminal until a state is activated again.
    Halted(Halt),
}

/// A limit on how long `Machine::run` may keep going before handing control back.
///
/// The budget is checked once per loop iteration. Running out of budget is not a halt:
/// the machine stays `Running` and a later call resumes where it left off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Budget {
    #[default]
    Unlimited,
    /// At most this many iterations.
    Steps(usize),
    /// Stop iterating once this much wall-clock time has passed.
    Time(Duration),
}

impl Budget {
    /// Builds a step budget where zero means unlimited.
    pub fn steps(limit: usize) -> Self {
        match limit {
            0 => Budget::Unlimited,
            n => Budget::Steps(n),
        }
    }

    fn is_exhausted(&self, steps: usize, started: Instant) -> bool {
        match *self {
            Budget::Unlimited => false,
            Budget::Steps(limit) => steps >= limit,
            Budget::Time(limit) => started.elapsed() >= limit,
        }
    }
}

/// A deterministic single-tape machine.
///
/// States are registered up front, then `activate` selects the entry point and
/// `run` (or `step`) drives a tape. The machine does not own the tape, so the same
/// machine can be activated again and run against a fresh one.
#[derive(Debug, Clone, Default)]
pub struct Machine {
    states: HashMap<String, State>,
    status: Status,
    step_count: usize,
}

impl Machine {
    /// Creates a machine with no states.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `state` under its name, returning the state it replaces, if any.
    pub fn register_state(&mut self, state: State) -> Option<State> {
        self.states.insert(state.name().to_string(), state)
    }

    /// Makes `name` the current state and starts a fresh run.
    ///
    /// Returns `false` and leaves the machine untouched if no such state is registered.
    pub fn activate(&mut self, name: &str) -> bool {
        if !self.enter(name) {
            return false;
        }

        self.step_count = 0;
        tracing::debug!(state = name, "machine activated");
        true
    }

    fn enter(&mut self, name: &str) -> bool {
        if !self.states.contains_key(name) {
            return false;
        }

        self.status = Status::Running {
            state: name.to_string(),
        };
        true
    }

    /// Executes a single iteration of the dispatch loop.
    ///
    /// Reads the symbol under the head and looks up the matching transition in the current
    /// state. Without a match the machine halts normally. Otherwise the transition is
    /// applied in order: write the output symbol, report the step, move the head, enter
    /// the next state. The first effect that fails halts the machine with that error;
    /// effects applied before it stay applied.
    ///
    /// # Returns
    ///
    /// * `Ok(Step::Continue)` if a transition was applied.
    /// * `Ok(Step::Halt(_))` if the machine halted, now or in an earlier call.
    /// * `Err(MachineError::NotActivated)` if no state was ever activated.
    pub fn step<O: Observer>(
        &mut self,
        tape: &mut Tape,
        observer: &mut O,
    ) -> Result<Step, MachineError> {
        let name = match &self.status {
            Status::Idle => return Err(MachineError::NotActivated),
            Status::Halted(halt) => return Ok(Step::Halt(halt.clone())),
            Status::Running { state } => state.clone(),
        };

        let read = tape.read();
        let transition = self
            .states
            .get(&name)
            .and_then(|s| s.transition(read))
            .cloned();

        let transition = match transition {
            Some(transition) => transition,
            None => {
                let halt = Halt::Normal {
                    state: name,
                    tape: tape.render(),
                };
                return Ok(self.halt(halt, observer));
            }
        };

        if let Err(reason) = tape.write(transition.output) {
            return Ok(self.fail(name, reason, tape, observer));
        }

        let event = StepEvent {
            state: name,
            read,
            head: tape.head(),
            tape: tape.render(),
            transition,
        };
        tracing::trace!("{}", event);
        observer.on_step(&event);
        self.step_count += 1;

        let StepEvent {
            state: name,
            transition,
            ..
        } = event;

        if let Err(reason) = tape.shift(transition.movement) {
            return Ok(self.fail(name, reason, tape, observer));
        }

        if !self.enter(&transition.next_state) {
            let reason = MachineError::UnknownState(transition.next_state);
            return Ok(self.fail(name, reason, tape, observer));
        }

        Ok(Step::Continue)
    }

    /// Runs the machine until it halts or `budget` is used up.
    ///
    /// # Returns
    ///
    /// * `Ok(Step::Halt(_))` once the machine has halted.
    /// * `Ok(Step::Continue)` if the budget ran out first; the machine is still running.
    /// * `Err(MachineError::NotActivated)` if no state was ever activated.
    pub fn run<O: Observer>(
        &mut self,
        tape: &mut Tape,
        observer: &mut O,
        budget: Budget,
    ) -> Result<Step, MachineError> {
        match &self.status {
            Status::Idle => return Err(MachineError::NotActivated),
            Status::Halted(halt) => return Ok(Step::Halt(halt.clone())),
            Status::Running { .. } => {}
        }

        let started = Instant::now();
        let mut steps = 0;

        loop {
            if budget.is_exhausted(steps, started) {
                tracing::debug!(steps, "budget exhausted before halting");
                return Ok(Step::Continue);
            }

            match self.step(tape, observer)? {
                Step::Continue => steps += 1,
                halt => return Ok(halt),
            }
        }
    }

    fn fail<O: Observer>(
        &mut self,
        state: String,
        reason: MachineError,
        tape: &Tape,
        observer: &mut O,
    ) -> Step {
        let halt = Halt::Err {
            state,
            reason,
            tape: tape.render(),
        };
        self.halt(halt, observer)
    }

    fn halt<O: Observer>(&mut self, halt: Halt, observer: &mut O) -> Step {
        tracing::debug!(
            state = halt.state(),
            code = halt.code(),
            steps = self.step_count,
            "machine halted"
        );
        observer.on_halt(&halt);
        self.status = Status::Halted(halt.clone());
        Step::Halt(halt)
    }

    /// Returns the current lifecycle status.
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Returns the state being computed in, or `None` if the machine is idle or halted.
    pub fn current_state(&self) -> Option<&State> {
        match &self.status {
            Status::Running { state } => self.states.get(state),
            _ => None,
        }
    }

    /// Returns the registered state called `name`.
    pub fn state(&self, name: &str) -> Option<&State> {
        self.states.get(name)
    }

    /// Iterates over the registered states in no particular order.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.values()
    }

    /// Returns the number of transitions applied since the last activation.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn is_halted(&self) -> bool {
        matches!(self.status, Status::Halted(_))
    }

    pub fn is_running(&self) -> bool {
        matches!(self.status, Status::Running { .. })
    }
}

impl Extend<State> for Machine {
    fn extend<I: IntoIterator<Item = State>>(&mut self, states: I) {
        for state in states {
            self.register_state(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::Trace;
    use crate::types::{Move, Transition, BLANK};

    fn flip_machine() -> Machine {
        let mut machine = Machine::new();
        machine.register_state(
            State::new("q0", vec![Transition::new('1', '0', Move::Right, "q0")]).unwrap(),
        );
        machine
    }

    fn binary_tape() -> Tape {
        Tape::new("01", 5, Some("101")).unwrap()
    }

    #[test]
    fn test_machine_creation() {
        let machine = flip_machine();

        assert_eq!(machine.status(), &Status::Idle);
        assert!(machine.current_state().is_none());
        assert_eq!(machine.step_count(), 0);
        assert_eq!(machine.states().count(), 1);
    }

    #[test]
    fn test_activate_unknown_state() {
        let mut machine = flip_machine();

        assert!(!machine.activate("q9"));
        assert_eq!(machine.status(), &Status::Idle);

        assert!(machine.activate("q0"));
        assert_eq!(machine.current_state().map(State::name), Some("q0"));
    }

    #[test]
    fn test_step_requires_activation() {
        let mut machine = flip_machine();
        let mut tape = binary_tape();

        assert_eq!(
            machine.step(&mut tape, &mut ()),
            Err(MachineError::NotActivated)
        );
        assert_eq!(
            machine.run(&mut tape, &mut (), Budget::Unlimited),
            Err(MachineError::NotActivated)
        );
    }

    #[test]
    fn test_single_step() {
        let mut machine = flip_machine();
        let mut tape = binary_tape();
        machine.activate("q0");

        let result = machine.step(&mut tape, &mut ()).unwrap();

        assert_eq!(result, Step::Continue);
        assert_eq!(tape.head(), 1);
        assert_eq!(tape.cells()[0], '0');
        assert_eq!(machine.step_count(), 1);
        assert!(machine.is_running());
    }

    #[test]
    fn test_halts_normally_without_matching_transition() {
        let mut machine = flip_machine();
        let mut tape = binary_tape();
        let mut trace = Trace::new();
        machine.activate("q0");

        let result = machine
            .run(&mut tape, &mut trace, Budget::Unlimited)
            .unwrap();

        let expected = Halt::Normal {
            state: "q0".to_string(),
            tape: format!("001{BLANK}{BLANK}"),
        };
        assert_eq!(result, Step::Halt(expected.clone()));
        assert_eq!(machine.status(), &Status::Halted(expected.clone()));
        assert!(machine.current_state().is_none());
        assert_eq!(tape.head(), 1);
        assert_eq!(trace.steps.len(), 1);
        assert_eq!(trace.halt, Some(expected));
    }

    #[test]
    fn test_halted_machine_stays_halted() {
        let mut machine = flip_machine();
        let mut tape = binary_tape();
        machine.activate("q0");

        let first = machine.run(&mut tape, &mut (), Budget::Unlimited).unwrap();
        let again = machine.step(&mut tape, &mut ()).unwrap();

        assert_eq!(first, again);
        assert_eq!(machine.step_count(), 1);
    }

    #[test]
    fn test_invalid_write_halts_with_error() {
        let mut machine = Machine::new();
        machine.register_state(
            State::new("q0", vec![Transition::new('1', 'x', Move::Right, "q0")]).unwrap(),
        );
        let mut tape = binary_tape();
        let mut trace = Trace::new();
        machine.activate("q0");

        let result = machine.step(&mut tape, &mut trace).unwrap();

        match result {
            Step::Halt(Halt::Err { state, reason, tape: rendered }) => {
                assert_eq!(state, "q0");
                assert_eq!(reason, MachineError::InvalidSymbol('x'));
                assert_eq!(rendered, tape.render());
            }
            other => panic!("Expected an invalid write halt, got {:?}", other),
        }
        assert_eq!(tape, binary_tape());
        assert!(trace.steps.is_empty());
        assert_eq!(machine.step_count(), 0);
    }

    #[test]
    fn test_head_leaving_tape_halts_with_error() {
        let mut machine = Machine::new();
        machine.register_state(
            State::new("q0", vec![Transition::new('1', '0', Move::Left, "q0")]).unwrap(),
        );
        let mut tape = binary_tape();
        let mut trace = Trace::new();
        machine.activate("q0");

        let result = machine.step(&mut tape, &mut trace).unwrap();

        assert!(matches!(
            result,
            Step::Halt(Halt::Err {
                reason: MachineError::OutOfBounds { position: -1, .. },
                ..
            })
        ));
        // The write happened and was reported before the move failed.
        assert_eq!(tape.cells()[0], '0');
        assert_eq!(tape.head(), 0);
        assert_eq!(trace.steps.len(), 1);
    }

    #[test]
    fn test_unknown_next_state_halts_with_error() {
        let mut machine = Machine::new();
        machine.register_state(
            State::new("q0", vec![Transition::new('1', '0', Move::Right, "q9")]).unwrap(),
        );
        let mut tape = binary_tape();
        machine.activate("q0");

        let result = machine.run(&mut tape, &mut (), Budget::Unlimited).unwrap();

        assert_eq!(
            result,
            Step::Halt(Halt::Err {
                state: "q0".to_string(),
                reason: MachineError::UnknownState("q9".to_string()),
                tape: format!("001{BLANK}{BLANK}"),
            })
        );
        assert_eq!(tape.head(), 1);
    }

    #[test]
    fn test_step_budget_pauses_and_resumes() {
        let mut machine = Machine::new();
        machine.register_state(
            State::new(
                "loop",
                vec![
                    Transition::new('0', '1', Move::Stay, "loop"),
                    Transition::new('1', '0', Move::Stay, "loop"),
                ],
            )
            .unwrap(),
        );
        let mut tape = Tape::new("01", 1, Some("0")).unwrap();
        machine.activate("loop");

        let result = machine.run(&mut tape, &mut (), Budget::Steps(3)).unwrap();
        assert_eq!(result, Step::Continue);
        assert!(machine.is_running());
        assert_eq!(machine.step_count(), 3);
        assert_eq!(tape.read(), '1');

        let result = machine.run(&mut tape, &mut (), Budget::Steps(2)).unwrap();
        assert_eq!(result, Step::Continue);
        assert_eq!(machine.step_count(), 5);
    }

    #[test]
    fn test_time_budget_stops_infinite_loop() {
        let mut machine = Machine::new();
        machine.register_state(
            State::new("spin", vec![Transition::new(BLANK, BLANK, Move::Stay, "spin")]).unwrap(),
        );
        let mut tape = Tape::new("", 1, None).unwrap();
        machine.activate("spin");

        let result = machine
            .run(&mut tape, &mut (), Budget::Time(Duration::from_millis(5)))
            .unwrap();

        assert_eq!(result, Step::Continue);
        assert!(machine.step_count() > 0);
    }

    #[test]
    fn test_budget_steps_zero_is_unlimited() {
        assert_eq!(Budget::steps(0), Budget::Unlimited);
        assert_eq!(Budget::steps(7), Budget::Steps(7));
    }

    #[test]
    fn test_activate_restarts_after_halt() {
        let mut machine = flip_machine();
        let mut tape = binary_tape();
        machine.activate("q0");
        machine.run(&mut tape, &mut (), Budget::Unlimited).unwrap();
        assert!(machine.is_halted());

        let mut fresh = binary_tape();
        assert!(machine.activate("q0"));
        assert_eq!(machine.step_count(), 0);

        let result = machine.run(&mut fresh, &mut (), Budget::Unlimited).unwrap();
        assert!(matches!(result, Step::Halt(Halt::Normal { .. })));
        assert_eq!(fresh, tape);
    }

    #[test]
    fn test_register_state_overwrites() {
        let mut machine = flip_machine();
        let replaced = machine.register_state(State::new("q0", Vec::new()).unwrap());

        assert!(replaced.is_some());
        assert!(machine.state("q0").unwrap().is_terminal());
    }
}
