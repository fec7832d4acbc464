//! Core IR types for the kilosynth synthesizer.
//!
//! This crate defines the patch (instruments made of stack-machine units),
//! the score (tracks of note patterns) and the song that ties them
//! together. The encoder, the song driver and the format importers all
//! operate on these types.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod error;
mod hint;
mod instrument;
mod optional;
mod order;
mod patch;
mod pattern;
mod score;
mod song;
mod unit;
mod unit_type;

pub use error::{PatchError, SongError};
pub use hint::format_param;
pub use instrument::{Instrument, MAX_UNITS};
pub use optional::OptionalInteger;
pub use order::Order;
pub use patch::{Patch, MAX_VOICES};
pub use pattern::{Pattern, NOTE_HOLD, NOTE_NONE};
pub use score::{Score, Track};
pub use song::{Song, SAMPLE_RATE};
pub use unit::{OscillatorType, Unit, MAX_PARAMS};
pub use unit_type::{UnitParameter, UnitType};
