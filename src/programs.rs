//! Built-in demonstration programs, embedded at compile time and parsed on first use.

use crate::loader::{Program, ProgramLoader};
use crate::types::MachineError;

// Default embedded programs
const PROGRAM_TEXTS: [&str; 4] = [
    include_str!("../machines/erase-leading-ones.json"),
    include_str!("../machines/invert.json"),
    include_str!("../machines/binary-increment.json"),
    include_str!("../machines/unary-addition.json"),
];

lazy_static::lazy_static! {
    pub static ref PROGRAMS: Vec<Program> = PROGRAM_TEXTS
        .iter()
        .filter_map(|text| match ProgramLoader::load_program_from_str(text) {
            Ok(program) => Some(program),
            Err(e) => {
                tracing::warn!("Failed to parse built-in program: {}", e);
                None
            }
        })
        .collect();
}

pub struct ProgramManager;

impl ProgramManager {
    /// Get the number of available programs
    pub fn get_program_count() -> usize {
        PROGRAMS.len()
    }

    /// Get a program by its index
    pub fn get_program_by_index(index: usize) -> Result<Program, MachineError> {
        PROGRAMS.get(index).cloned().ok_or_else(|| {
            MachineError::ValidationError(format!("Program index {} out of range", index))
        })
    }

    /// Get a program by its name, ignoring case
    pub fn get_program_by_name(name: &str) -> Result<Program, MachineError> {
        PROGRAMS
            .iter()
            .find(|program| program.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| MachineError::ValidationError(format!("Program '{}' not found", name)))
    }

    /// List all program names
    pub fn list_program_names() -> Vec<String> {
        PROGRAMS.iter().map(|program| program.name.clone()).collect()
    }

    /// Get information about a program by its index
    pub fn get_program_info(index: usize) -> Result<ProgramInfo, MachineError> {
        let program = Self::get_program_by_index(index)?;

        Ok(ProgramInfo {
            index,
            name: program.name.clone(),
            start: program.start.clone(),
            input: program.input.clone(),
            size: program.size,
            state_count: program.states.states.len(),
            transition_count: program.states.transition_count(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProgramInfo {
    pub index: usize,
    pub name: String,
    pub start: String,
    pub input: String,
    pub size: usize,
    pub state_count: usize,
    pub transition_count: usize,
}
