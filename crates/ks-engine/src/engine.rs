//! The engine interface the song driver renders through.

use alloc::boxed::Box;
use alloc::string::String;

use ks_ir::{Patch, PatchError};

use crate::encoder::EncodeError;

/// Samples between sync events; the driver sizes its sync buffer for one
/// event per interval.
pub const SYNC_INTERVAL: usize = 256;

/// Errors reported by an engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Patch(#[from] PatchError),
    #[error("engine failure: {0}")]
    Kernel(String),
}

/// What one `render` call produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rendered {
    /// Stereo frames written to the audio buffer
    pub samples: usize,
    /// Sync events written to the sync buffer
    pub syncs: usize,
    /// Song time consumed; differs from `samples` when speed is modulated
    pub time: usize,
}

/// A synth engine.
///
/// Calls must be serialised; an engine is never driven from two places at
/// once.
pub trait Engine {
    /// Replace the active patch.
    fn update(&mut self, patch: &Patch) -> Result<(), EngineError>;

    /// Start a note on a voice.
    fn trigger(&mut self, voice: usize, note: u8);

    /// Release the note on a voice.
    fn release(&mut self, voice: usize);

    /// Render into `audio` (interleaved L/R, so `audio.len() / 2` frames at
    /// most) until it is full or `max_time` has been consumed. Each sync
    /// event writes `1 + num_syncs` floats: its frame offset within this
    /// call, then one value per sync output.
    fn render(
        &mut self,
        audio: &mut [f32],
        syncs: &mut [f32],
        max_time: usize,
    ) -> Result<Rendered, EngineError>;
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn update(&mut self, patch: &Patch) -> Result<(), EngineError> {
        (**self).update(patch)
    }

    fn trigger(&mut self, voice: usize, note: u8) {
        (**self).trigger(voice, note)
    }

    fn release(&mut self, voice: usize) {
        (**self).release(voice)
    }

    fn render(
        &mut self,
        audio: &mut [f32],
        syncs: &mut [f32],
        max_time: usize,
    ) -> Result<Rendered, EngineError> {
        (**self).render(audio, syncs, max_time)
    }
}
