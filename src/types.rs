//! This module defines the core value types shared by the tape, the states and the
//! execution engine: symbols, head movements, transitions, halt records and the error type.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The reserved blank symbol. It is implicitly part of every tape alphabet.
pub const BLANK: char = '\u{25A1}';
/// The maximum accepted size for an encoded machine definition, in bytes.
pub const MAX_DEFINITION_SIZE: usize = 65536; // 64KB
/// The default number of steps the command-line front end allows before giving up.
pub const MAX_EXECUTION_STEPS: usize = 10000;

/// A head movement. Serialized as the integer offset `-1`, `0` or `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Move {
    /// Move the head one cell to the left.
    Left,
    /// Keep the head where it is.
    Stay,
    /// Move the head one cell to the right.
    Right,
}

impl Move {
    /// Returns the signed offset of this movement.
    pub fn delta(self) -> i64 {
        match self {
            Move::Left => -1,
            Move::Stay => 0,
            Move::Right => 1,
        }
    }
}

impl TryFrom<i64> for Move {
    type Error = MachineError;

    fn try_from(delta: i64) -> Result<Self, Self::Error> {
        match delta {
            -1 => Ok(Move::Left),
            0 => Ok(Move::Stay),
            1 => Ok(Move::Right),
            other => Err(MachineError::InvalidMove(other)),
        }
    }
}

impl From<Move> for i64 {
    fn from(movement: Move) -> Self {
        movement.delta()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Width and alignment flags apply to the number, so `{:>2}` lines up -1 and 1.
        fmt::Display::fmt(&self.delta(), f)
    }
}

/// A single transition rule.
///
/// When the machine reads `input` it writes `output`, moves the head by `movement`
/// and continues in `next_state`. Two transitions with identical fields are the same rule.
///
/// On the wire a transition is the 4-tuple `[input, output, move, next_state]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(char, char, Move, String)", into = "(char, char, Move, String)")]
pub struct Transition {
    /// The symbol that triggers this transition.
    pub input: char,
    /// The symbol written under the head.
    pub output: char,
    /// How the head moves after the write.
    pub movement: Move,
    /// The name of the state to continue in.
    pub next_state: String,
}

impl Transition {
    pub fn new(input: char, output: char, movement: Move, next_state: impl Into<String>) -> Self {
        Self {
            input,
            output,
            movement,
            next_state: next_state.into(),
        }
    }
}

impl From<(char, char, Move, String)> for Transition {
    fn from((input, output, movement, next_state): (char, char, Move, String)) -> Self {
        Self {
            input,
            output,
            movement,
            next_state,
        }
    }
}

impl From<Transition> for (char, char, Move, String) {
    fn from(t: Transition) -> Self {
        (t.input, t.output, t.movement, t.next_state)
    }
}

/// The outcome of driving the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The machine is still running: a transition was applied, or the budget ran out.
    Continue,
    /// The machine has halted.
    Halt(Halt),
}

/// How and where a computation stopped. Every halt carries the final tape rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Halt {
    /// No transition matched the symbol under the head.
    Normal { state: String, tape: String },
    /// Applying a matched transition violated an invariant.
    Err {
        state: String,
        reason: MachineError,
        tape: String,
    },
}

impl Halt {
    /// Returns the final tape rendering.
    pub fn tape(&self) -> &str {
        match self {
            Halt::Normal { tape, .. } | Halt::Err { tape, .. } => tape,
        }
    }

    /// Returns the state the machine was in when it stopped.
    pub fn state(&self) -> &str {
        match self {
            Halt::Normal { state, .. } | Halt::Err { state, .. } => state,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Halt::Err { .. })
    }

    /// A short machine-readable classification of the halt.
    pub fn code(&self) -> &'static str {
        match self {
            Halt::Normal { .. } => "halted",
            Halt::Err { reason, .. } => match reason {
                MachineError::InvalidSymbol(_) => "invalid-write",
                MachineError::OutOfBounds { .. } => "head-off-tape",
                MachineError::UnknownState(_) => "unknown-state",
                _ => "error",
            },
        }
    }
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Halt::Normal { tape, .. } => write!(f, "Computation terminated  |  {}", tape),
            Halt::Err {
                state,
                reason,
                tape,
            } => {
                let message = match reason {
                    MachineError::InvalidSymbol(_) => {
                        "Computation halted, invalid symbol written to tape".to_string()
                    }
                    MachineError::OutOfBounds { .. } => "Tape head moved off of tape".to_string(),
                    MachineError::UnknownState(next) => format!(
                        "Computation failed in state transition from {} to {}",
                        state, next
                    ),
                    other => format!("Computation failed in state {}: {}", state, other),
                };
                write!(f, "{}  |  {}", message, tape)
            }
        }
    }
}

/// Represents the errors raised by tapes, states, the engine and the loaders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    /// The initial tape content does not fit the tape or its alphabet.
    #[error("Invalid tape content: {0}")]
    InvalidContent(String),
    /// A symbol outside the tape alphabet was written.
    #[error("Symbol {0:?} is not in the tape alphabet")]
    InvalidSymbol(char),
    /// A head movement other than -1, 0 or 1 was requested.
    #[error("Invalid head movement {0}, expected -1, 0 or 1")]
    InvalidMove(i64),
    /// The head would leave the tape.
    #[error("Head position {position} is outside a tape of size {size}")]
    OutOfBounds { position: i64, size: usize },
    /// A transition names a state that is not registered.
    #[error("Unknown state: {0}")]
    UnknownState(String),
    /// Two different transitions of one state share an input symbol.
    #[error("State {state} already has a different transition for symbol {symbol:?}")]
    DuplicateTransition { state: String, symbol: char },
    /// The engine was driven before a start state was activated.
    #[error("No state has been activated")]
    NotActivated,
    /// The machine description could not be deserialized.
    #[error("Definition parsing error: {0}")]
    ParseError(String),
    /// The machine description bytes do not match the declared text encoding.
    #[error("Encoding error: {0}")]
    Encoding(String),
    /// The program failed static analysis.
    #[error("Program validation error: {0}")]
    ValidationError(String),
    /// Reading a definition from disk failed.
    #[error("File error: {0}")]
    FileError(String),
}

impl From<serde_json::Error> for MachineError {
    fn from(error: serde_json::Error) -> Self {
        MachineError::ParseError(error.to_string())
    }
}
