//! Patch encoder, engine interface and song driver for kilosynth.
//!
//! The encoder turns a [`ks_ir::Patch`] into the compact command/value
//! streams a synth kernel executes. The [`Engine`] trait is the seam to
//! that kernel, and [`play`] drives any engine through a song.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod encoder;
mod engine;
mod feature_set;
pub mod player;
mod send_address;
mod silent_engine;

pub use encoder::{encode, EncodeError, EncodedPatch, SampleOffset, MAX_COMMANDS, MAX_VALUES};
pub use engine::{Engine, EngineError, Rendered, SYNC_INTERVAL};
pub use feature_set::{AllFeatures, FeatureSet, NecessaryFeatures};
pub use player::{play, render_all, PlayError, PlayOptions, PlayOutput};
pub use send_address::SendAddress;
pub use silent_engine::{SilentEngine, VoiceState};
