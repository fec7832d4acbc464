//! Error types for patch and song validation.

use alloc::string::String;

use crate::unit_type::UnitType;

/// Errors raised by patch queries and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    #[error("unknown unit type \"{0}\"")]
    UnknownUnitType(String),
    #[error("unit type {unit_type} has no parameter \"{name}\"")]
    UnknownParameter { unit_type: UnitType, name: String },
    #[error("instrument {instrument} has {units} units, the maximum is 63")]
    TooManyUnits { instrument: usize, units: usize },
    #[error("instrument {0} should have at least 1 voice")]
    NoVoices(usize),
    #[error("patch uses {0} voices, the maximum is 32")]
    TooManyVoices(usize),
    #[error("send target id 0 does not name a unit")]
    ZeroTargetId,
    #[error("could not find a unit with id {0}")]
    TargetNotFound(u32),
    #[error("voice {voice} is beyond the {num_voices} voices of the patch")]
    VoiceOutOfRange { voice: usize, num_voices: usize },
    #[error("instrument {instrument} unit {unit} ({unit_type}) needs {need} signals but the stack has {depth}")]
    StackUnderflow {
        instrument: usize,
        unit: usize,
        unit_type: UnitType,
        need: i32,
        depth: i32,
    },
    #[error("instrument {instrument} leaves {depth} signals on the stack")]
    StackNotEmpty { instrument: usize, depth: i32 },
}

/// Errors raised by song validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SongError {
    #[error("BPM should be > 0")]
    InvalidBpm,
    #[error("rows per beat should be > 0")]
    InvalidRowsPerBeat,
    #[error("rows per pattern should be > 0")]
    InvalidRowsPerPattern,
    #[error("song should have at least one track")]
    NoTracks,
    #[error("track {track} pattern {pattern} has length {len}, expected {expected}")]
    PatternLength {
        track: usize,
        pattern: usize,
        len: usize,
        expected: usize,
    },
    #[error("track {track} order list has length {len}, expected {expected}")]
    OrderLength { track: usize, len: usize, expected: usize },
    #[error("track {track} order position {position} refers to missing pattern {pattern}")]
    MissingPattern {
        track: usize,
        position: usize,
        pattern: i32,
    },
    #[error("tracks use {score} voices but the patch only has {patch}")]
    TooManyVoices { score: usize, patch: usize },
    #[error(transparent)]
    Patch(#[from] PatchError),
}
