//! This crate provides a deterministic single-tape state machine simulator.
//! It includes the bounded tape, the states and their transitions, the execution engine
//! that drives them, loaders for JSON machine descriptions, static analysis of programs,
//! and a small collection of built-in programs.

pub mod analyzer;
pub mod loader;
pub mod machine;
pub mod observer;
pub mod programs;
pub mod state;
pub mod tape;
pub mod types;

/// Re-exports the `analyze` function and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, AnalysisError};
/// Re-exports the description formats and their loader.
pub use loader::{Definition, Encoding, Program, ProgramLoader};
/// Re-exports the execution engine and its run budget.
pub use machine::{Budget, Machine, Status};
/// Re-exports the observer hooks.
pub use observer::{Observer, StepEvent, Trace, TracingObserver};
/// Re-exports `ProgramInfo`, `ProgramManager`, and `PROGRAMS` from the programs module.
pub use programs::{ProgramInfo, ProgramManager, PROGRAMS};
pub use state::State;
pub use tape::Tape;
/// Re-exports the shared value types and the error type.
pub use types::{
    Halt, MachineError, Move, Step, Transition, BLANK, MAX_DEFINITION_SIZE, MAX_EXECUTION_STEPS,
};
