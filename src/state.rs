//! This module defines `State`, a named set of transitions keyed by the symbol they read.

use crate::types::{MachineError, Transition};
use std::collections::BTreeMap;

/// A named machine state.
///
/// A state holds at most one transition per input symbol, which keeps dispatch
/// deterministic. A state without transitions halts the machine on any symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    name: String,
    transitions: BTreeMap<char, Transition>,
}

impl State {
    /// Creates a state from a list of transitions.
    ///
    /// Structurally identical transitions are merged. Two different transitions for the
    /// same input symbol fail with `MachineError::DuplicateTransition`.
    pub fn new(
        name: impl Into<String>,
        transitions: impl IntoIterator<Item = Transition>,
    ) -> Result<Self, MachineError> {
        let mut state = Self {
            name: name.into(),
            transitions: BTreeMap::new(),
        };

        for transition in transitions {
            state.add_transition(transition)?;
        }

        Ok(state)
    }

    /// Adds a transition to this state.
    pub fn add_transition(&mut self, transition: Transition) -> Result<(), MachineError> {
        match self.transitions.get(&transition.input) {
            Some(existing) if *existing == transition => Ok(()),
            Some(_) => Err(MachineError::DuplicateTransition {
                state: self.name.clone(),
                symbol: transition.input,
            }),
            None => {
                self.transitions.insert(transition.input, transition);
                Ok(())
            }
        }
    }

    /// Returns the transition triggered by `symbol`, if any.
    pub fn transition(&self, symbol: char) -> Option<&Transition> {
        self.transitions.get(&symbol)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Iterates over the transitions ordered by input symbol.
    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.values()
    }

    /// Checks whether this state has no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        self.transitions.is_empty()
    }
}
