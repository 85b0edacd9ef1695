//! This module provides functions for analyzing programs to detect common errors before
//! execution. This includes checks for tape geometry, defined and reachable states, and
//! symbols that fall outside the tape alphabet.

use crate::loader::Program;
use crate::types::{MachineError, BLANK};
use std::collections::HashSet;

/// Represents the problems analysis can find in a program.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// The initial head position is not a cell of the tape.
    InvalidHead(usize),
    /// The start state has no entry in the definition.
    InvalidStartState(String),
    /// Transitions reference states that are not defined.
    UndefinedNextStates(Vec<String>),
    /// States that cannot be reached from the start state.
    UnreachableStates(Vec<String>),
    /// Symbols read or written by transitions, or present in the input, that are not in the alphabet.
    InvalidSymbols(Vec<char>),
    /// Problems with the tape itself (zero size, oversized input).
    StructuralError(String),
}

impl From<AnalysisError> for MachineError {
    /// Converts an `AnalysisError` into a `MachineError::ValidationError`.
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::InvalidHead(pos) => {
                MachineError::ValidationError(format!("Invalid head position: {}", pos))
            }
            AnalysisError::InvalidStartState(state) => {
                MachineError::ValidationError(format!("Invalid start state: {}", state))
            }
            AnalysisError::UndefinedNextStates(transitions) => MachineError::ValidationError(
                format!("Transitions reference undefined states: {:?}", transitions),
            ),
            AnalysisError::UnreachableStates(states) => MachineError::ValidationError(format!(
                "Unreachable states detected: {:?}",
                states
            )),
            AnalysisError::InvalidSymbols(symbols) => MachineError::ValidationError(format!(
                "Symbols outside the tape alphabet: {:?}",
                symbols
            )),
            AnalysisError::StructuralError(msg) => MachineError::ValidationError(msg),
        }
    }
}

/// Analyzes a `Program` for structural and logical errors.
///
/// Every check runs; the first failure, in check order, is reported.
///
/// # Returns
///
/// * `Ok(())` if no errors are found.
/// * `Err(MachineError::ValidationError)` if any check fails.
pub fn analyze(program: &Program) -> Result<(), MachineError> {
    let errors = [
        check_structure,
        check_head,
        check_valid_start_state,
        check_undefined_next_states,
        check_unreachable_states,
        check_symbols,
    ]
    .iter()
    .filter_map(|f| f(program).err())
    .collect::<Vec<_>>();

    match errors.into_iter().next() {
        Some(first_error) => Err(first_error.into()),
        None => Ok(()),
    }
}

/// Checks that the tape has cells and that the input fits on it.
fn check_structure(program: &Program) -> Result<(), AnalysisError> {
    if program.size == 0 {
        return Err(AnalysisError::StructuralError(
            "Tape size must be at least 1".to_string(),
        ));
    }

    let input_len = program.input.chars().count();
    if input_len > program.size {
        return Err(AnalysisError::StructuralError(format!(
            "Input of {} symbols does not fit on a tape of size {}",
            input_len, program.size
        )));
    }

    Ok(())
}

/// Checks that the initial head position is a cell of the tape.
fn check_head(program: &Program) -> Result<(), AnalysisError> {
    if program.size > 0 && program.head >= program.size {
        return Err(AnalysisError::InvalidHead(program.head));
    }

    Ok(())
}

/// Checks that the start state is defined.
fn check_valid_start_state(program: &Program) -> Result<(), AnalysisError> {
    if !program.states.states.contains_key(&program.start) {
        return Err(AnalysisError::InvalidStartState(program.start.clone()));
    }

    Ok(())
}

/// Checks that every `next_state` reference names a defined state.
///
/// A dangling reference is not fatal to the engine, which halts with an error when it
/// reaches one, but in a loaded program it is almost always a typo.
fn check_undefined_next_states(program: &Program) -> Result<(), AnalysisError> {
    let rules = &program.states.states;

    let mut undefined = Vec::new();
    for (state, transitions) in rules {
        for (i, transition) in transitions.iter().enumerate() {
            if !rules.contains_key(&transition.next_state) {
                undefined.push(format!("{}[{}] -> {}", state, i, transition.next_state));
            }
        }
    }

    if !undefined.is_empty() {
        undefined.sort();
        return Err(AnalysisError::UndefinedNextStates(undefined));
    }

    Ok(())
}

/// Checks for states that cannot be reached from the start state.
fn check_unreachable_states(program: &Program) -> Result<(), AnalysisError> {
    let rules = &program.states.states;
    let mut visited = HashSet::new();
    let mut queue = vec![program.start.clone()];

    while let Some(state) = queue.pop() {
        if !visited.insert(state.clone()) {
            continue;
        }

        if let Some(transitions) = rules.get(&state) {
            queue.extend(
                transitions
                    .iter()
                    .filter(|t| !visited.contains(&t.next_state))
                    .map(|t| t.next_state.clone()),
            );
        }
    }

    let mut unreachable: Vec<String> = rules
        .keys()
        .filter(|state| !visited.contains(*state))
        .cloned()
        .collect();

    if !unreachable.is_empty() {
        unreachable.sort(); // Sort for deterministic output
        return Err(AnalysisError::UnreachableStates(unreachable));
    }

    Ok(())
}

/// Checks that the input and every symbol read or written by a transition belong to the
/// alphabet. An output symbol outside the alphabet would halt the run with an invalid write.
fn check_symbols(program: &Program) -> Result<(), AnalysisError> {
    let alphabet: HashSet<char> = program.alphabet.chars().chain([BLANK]).collect();

    let transition_symbols = program
        .states
        .states
        .values()
        .flatten()
        .flat_map(|t| [t.input, t.output]);

    let mut invalid: Vec<char> = program
        .input
        .chars()
        .chain(transition_symbols)
        .filter(|c| !alphabet.contains(c))
        .collect();

    if !invalid.is_empty() {
        invalid.sort();
        invalid.dedup();
        return Err(AnalysisError::InvalidSymbols(invalid));
    }

    Ok(())
}
