//! Tracks and the score.

use alloc::vec::Vec;

use crate::order::Order;
use crate::pattern::{Pattern, NOTE_HOLD};

/// One track: its own patterns and the order they play in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Track {
    /// Voices this track cycles through when triggering notes
    pub num_voices: usize,
    /// Display hint: values are effect data rather than notes
    pub effect: bool,
    /// Pattern index per song position
    pub order: Order,
    /// Patterns owned by this track
    pub patterns: Vec<Pattern>,
}

impl Track {
    pub fn new(num_voices: usize) -> Self {
        Self {
            num_voices,
            ..Self::default()
        }
    }

    /// Note at a song position and row. Missing order entries and missing
    /// patterns read as hold.
    pub fn note_at(&self, position: usize, row: usize) -> u8 {
        let index = self.order.get(position as isize);
        usize::try_from(index)
            .ok()
            .and_then(|i| self.patterns.get(i))
            .map_or(NOTE_HOLD, |p| p.get(row as isize))
    }
}

/// The tracks of a song plus its timing grid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Score {
    pub tracks: Vec<Track>,
    /// Rows in every pattern
    pub rows_per_pattern: usize,
    /// Song length in patterns
    pub length: usize,
}

impl Score {
    /// Total voices triggered by all tracks.
    pub fn num_voices(&self) -> usize {
        self.tracks.iter().map(|t| t.num_voices).sum()
    }

    /// First voice of a track: the voices of all prior tracks summed.
    pub fn first_voice_for_track(&self, track: usize) -> usize {
        self.tracks.iter().take(track).map(|t| t.num_voices).sum()
    }

    pub fn length_in_rows(&self) -> usize {
        self.rows_per_pattern * self.length
    }
}
