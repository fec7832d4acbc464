//! Note patterns.

use alloc::vec::Vec;

/// Note byte that does nothing.
pub const NOTE_NONE: u8 = 0;
/// Note byte that keeps the previous note playing.
pub const NOTE_HOLD: u8 = 1;

/// A sequence of note bytes; rows outside the pattern read as hold.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pattern(pub Vec<u8>);

impl Pattern {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Note at `row`, or [`NOTE_HOLD`] outside the pattern.
    pub fn get(&self, row: isize) -> u8 {
        usize::try_from(row)
            .ok()
            .and_then(|r| self.0.get(r).copied())
            .unwrap_or(NOTE_HOLD)
    }

    /// Set the note at `row`, growing the pattern with holds.
    pub fn set(&mut self, row: usize, note: u8) {
        if self.0.len() <= row {
            self.0.resize(row + 1, NOTE_HOLD);
        }
        self.0[row] = note;
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Pattern {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}
