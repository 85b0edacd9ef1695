//! This module defines the `Tape`, a fixed-size sequence of symbols drawn from a closed
//! alphabet, together with a single read/write head.

use crate::types::{MachineError, Move, BLANK};
use std::collections::BTreeSet;
use std::fmt;

/// A bounded tape with a movable head.
///
/// The tape never grows or shrinks after construction. Every cell always holds a symbol
/// from the alphabet (which always contains [`BLANK`]) and the head always points at a
/// cell, so `0 <= head < size`. Operations that would break either invariant fail and
/// leave the tape untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    alphabet: BTreeSet<char>,
    cells: Vec<char>,
    head: usize,
}

impl Tape {
    /// Creates a tape of `size` cells over `alphabet`, filled with `content` from the left
    /// and padded with blanks.
    ///
    /// # Errors
    ///
    /// * `MachineError::InvalidContent` if `size` is zero, `content` is longer than `size`,
    ///   or `content` contains a symbol outside the alphabet.
    pub fn new(alphabet: &str, size: usize, content: Option<&str>) -> Result<Self, MachineError> {
        let mut symbols: BTreeSet<char> = alphabet.chars().collect();
        symbols.insert(BLANK);

        if size == 0 {
            return Err(MachineError::InvalidContent(
                "a tape needs at least one cell".to_string(),
            ));
        }

        let mut cells: Vec<char> = content.unwrap_or_default().chars().collect();
        if cells.len() > size {
            return Err(MachineError::InvalidContent(format!(
                "{} symbols do not fit on a tape of size {}",
                cells.len(),
                size
            )));
        }

        if let Some(symbol) = cells.iter().find(|c| !symbols.contains(c)) {
            return Err(MachineError::InvalidContent(format!(
                "symbol {:?} is not in the alphabet",
                symbol
            )));
        }

        cells.resize(size, BLANK);

        Ok(Self {
            alphabet: symbols,
            cells,
            head: 0,
        })
    }

    /// Returns the symbol under the head.
    pub fn read(&self) -> char {
        self.cells[self.head]
    }

    /// Replaces the symbol under the head.
    pub fn write(&mut self, symbol: char) -> Result<(), MachineError> {
        if !self.contains(symbol) {
            return Err(MachineError::InvalidSymbol(symbol));
        }

        self.cells[self.head] = symbol;
        Ok(())
    }

    /// Moves the head by `delta` cells and returns the new position.
    ///
    /// # Errors
    ///
    /// * `MachineError::InvalidMove` if `delta` is not -1, 0 or 1.
    /// * `MachineError::OutOfBounds` if the head would leave the tape.
    pub fn move_head(&mut self, delta: i64) -> Result<usize, MachineError> {
        self.shift(Move::try_from(delta)?)
    }

    /// Moves the head one step in the given direction and returns the new position.
    pub fn shift(&mut self, movement: Move) -> Result<usize, MachineError> {
        let position = self.head as i64 + movement.delta();
        let head = self.check_bounds(position)?;
        self.head = head;
        Ok(head)
    }

    /// Places the head directly on `position`.
    pub fn set_head(&mut self, position: usize) -> Result<(), MachineError> {
        self.head = self.check_bounds(i64::try_from(position).unwrap_or(i64::MAX))?;
        Ok(())
    }

    fn check_bounds(&self, position: i64) -> Result<usize, MachineError> {
        usize::try_from(position)
            .ok()
            .filter(|&p| p < self.cells.len())
            .ok_or(MachineError::OutOfBounds {
                position,
                size: self.cells.len(),
            })
    }

    /// Renders all cells in order.
    pub fn render(&self) -> String {
        self.cells.iter().collect()
    }

    /// Returns the current head position.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Returns the number of cells.
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> &[char] {
        &self.cells
    }

    /// Returns the alphabet, including the blank symbol.
    pub fn alphabet(&self) -> &BTreeSet<char> {
        &self.alphabet
    }

    /// Checks whether `symbol` may be written to this tape.
    pub fn contains(&self, symbol: char) -> bool {
        self.alphabet.contains(&symbol)
    }
}

impl fmt::Display for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
