//! This module turns encoded machine descriptions into engines. It provides the `Definition`
//! and `Program` formats and the `ProgramLoader` that reads them from files or strings.

use crate::analyzer::analyze;
use crate::machine::Machine;
use crate::state::State;
use crate::tape::Tape;
use crate::types::{MachineError, Transition, MAX_DEFINITION_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A machine definition: every state name mapped to its ordered list of transitions.
///
/// The JSON form is an object of 4-tuples:
///
/// ```json
/// { "q0": [["1", "0", 1, "q0"]], "done": [] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Definition {
    pub states: BTreeMap<String, Vec<Transition>>,
}

impl Definition {
    /// Builds the states described by this definition.
    ///
    /// Fails with `MachineError::DuplicateTransition` if a state maps one input symbol to
    /// two different transitions.
    pub fn states(&self) -> Result<Vec<State>, MachineError> {
        self.states
            .iter()
            .map(|(name, transitions)| State::new(name.clone(), transitions.iter().cloned()))
            .collect()
    }

    /// Builds an idle `Machine` with every state registered.
    pub fn into_machine(self) -> Result<Machine, MachineError> {
        let mut machine = Machine::new();
        machine.extend(self.states()?);
        Ok(machine)
    }

    /// Returns the total number of transitions across all states.
    pub fn transition_count(&self) -> usize {
        self.states.values().map(Vec::len).sum()
    }
}

/// A complete, runnable machine description: the definition plus the tape to run it on
/// and the state to start in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// The name of the program.
    pub name: String,
    /// The symbols the tape accepts, blank excluded.
    pub alphabet: String,
    /// The number of tape cells.
    pub size: usize,
    /// The initial tape content, written from the left.
    #[serde(default)]
    pub input: String,
    /// The initial head position.
    #[serde(default)]
    pub head: usize,
    /// The state computation starts in.
    pub start: String,
    pub states: Definition,
}

impl Program {
    /// Creates the initial tape for this program.
    pub fn tape(&self) -> Result<Tape, MachineError> {
        self.tape_with_input(&self.input)
    }

    /// Creates an initial tape holding `input` instead of the program's own input.
    pub fn tape_with_input(&self, input: &str) -> Result<Tape, MachineError> {
        let mut tape = Tape::new(&self.alphabet, self.size, Some(input))?;
        tape.set_head(self.head)?;
        Ok(tape)
    }

    /// Builds the machine and activates the start state.
    pub fn machine(&self) -> Result<Machine, MachineError> {
        let mut machine = self.states.clone().into_machine()?;
        if !machine.activate(&self.start) {
            return Err(MachineError::UnknownState(self.start.clone()));
        }
        Ok(machine)
    }
}

/// The text encoding of an encoded description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl Encoding {
    /// Decodes `bytes` into text. A leading byte order mark is dropped.
    pub fn decode(self, bytes: &[u8]) -> Result<String, MachineError> {
        let text = match self {
            Encoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_string)
                .map_err(|e| MachineError::Encoding(e.to_string()))?,
            Encoding::Utf16Le | Encoding::Utf16Be => {
                if bytes.len() % 2 != 0 {
                    return Err(MachineError::Encoding(
                        "odd number of bytes in UTF-16 input".to_string(),
                    ));
                }

                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| match self {
                        Encoding::Utf16Le => u16::from_le_bytes([pair[0], pair[1]]),
                        _ => u16::from_be_bytes([pair[0], pair[1]]),
                    })
                    .collect();

                String::from_utf16(&units).map_err(|e| MachineError::Encoding(e.to_string()))?
            }
        };

        Ok(text
            .strip_prefix('\u{FEFF}')
            .map(str::to_string)
            .unwrap_or(text))
    }
}

/// `ProgramLoader` is a utility struct for loading definitions and programs from files
/// and strings.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a bare definition from `path`, decoding it with `encoding`.
    ///
    /// # Returns
    ///
    /// * `Ok(Definition)` if the file is read, decoded and parsed.
    /// * `Err(MachineError::FileError)` if the file cannot be read or is too large.
    /// * `Err(MachineError::Encoding)` if the bytes do not match `encoding`.
    /// * `Err(MachineError::ParseError)` if the content is not a valid definition.
    pub fn load_definition(path: &Path, encoding: Encoding) -> Result<Definition, MachineError> {
        let content = Self::read(path, encoding)?;
        Self::load_definition_from_str(&content)
    }

    /// Parses a bare definition from JSON text.
    pub fn load_definition_from_str(content: &str) -> Result<Definition, MachineError> {
        check_size(content.len())?;
        Ok(serde_json::from_str(content)?)
    }

    /// Loads a program from `path`, decoding it with `encoding`. The program is analyzed
    /// before it is returned.
    pub fn load_program(path: &Path, encoding: Encoding) -> Result<Program, MachineError> {
        let content = Self::read(path, encoding)?;
        Self::load_program_from_str(&content)
    }

    /// Parses and analyzes a program from JSON text.
    pub fn load_program_from_str(content: &str) -> Result<Program, MachineError> {
        check_size(content.len())?;
        let program: Program = serde_json::from_str(content)?;
        analyze(&program)?;
        Ok(program)
    }

    fn read(path: &Path, encoding: Encoding) -> Result<String, MachineError> {
        let bytes = fs::read(path).map_err(|e| {
            MachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        check_size(bytes.len()).map_err(|e| {
            MachineError::FileError(format!("Failed to load {}: {}", path.display(), e))
        })?;

        encoding.decode(&bytes)
    }
}

fn check_size(len: usize) -> Result<(), MachineError> {
    if len > MAX_DEFINITION_SIZE {
        return Err(MachineError::FileError(format!(
            "definition is {} bytes, the limit is {}",
            len, MAX_DEFINITION_SIZE
        )));
    }
    Ok(())
}
