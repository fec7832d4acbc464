//! Headless controller for kilosynth.
//!
//! Owns a song and provides one API for importing patches, encoding them
//! and rendering the song offline, so tools don't need to wire the IR,
//! engine and format crates together themselves.

use ks_engine::{encode, AllFeatures, Engine, FeatureSet, NecessaryFeatures};

// Re-export common types so callers don't need ks-ir/ks-engine directly.
pub use ks_engine::{EncodeError, EncodedPatch, EngineError, PlayError, PlayOptions, PlayOutput};
pub use ks_formats::{FormatError, WavFormat};
pub use ks_ir::{Instrument, Patch, Score, Song};

/// Errors raised by controller operations.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Play(#[from] PlayError),
}

/// Headless controller, owns a song.
pub struct Controller {
    song: Song,
}

impl Controller {
    /// Start with an empty song at 100 BPM, 4 rows per beat, 16 rows per
    /// pattern.
    pub fn new() -> Self {
        Self {
            song: Song {
                bpm: 100,
                rows_per_beat: 4,
                score: Score {
                    rows_per_pattern: 16,
                    ..Score::default()
                },
                patch: Patch::new(),
            },
        }
    }

    // --- Song management ---

    pub fn song(&self) -> &Song {
        &self.song
    }

    pub fn song_mut(&mut self) -> &mut Song {
        &mut self.song
    }

    pub fn set_song(&mut self, song: Song) {
        self.song = song;
    }

    /// Replace the patch with a 4klang `.4kp` file.
    pub fn load_4klang_patch(&mut self, data: &[u8]) -> Result<(), ControllerError> {
        self.song.patch = ks_formats::read_4klang_patch(data)?;
        log::info!(
            "[4klang] loaded patch with {} instruments",
            self.song.patch.instruments.len()
        );
        Ok(())
    }

    /// Append a 4klang `.4ki` instrument, returning its index.
    ///
    /// Ids of the imported units start from 1 again, so they are shifted
    /// past the ids already in the patch to keep send targets unique.
    pub fn load_4klang_instrument(&mut self, data: &[u8]) -> Result<usize, ControllerError> {
        let mut instrument = ks_formats::read_4klang_instrument(data)?;
        let offset = self.max_unit_id();
        if offset > 0 {
            for unit in &mut instrument.units {
                if unit.id > 0 {
                    unit.id += offset;
                }
                let target = unit.param("target");
                if unit.unit_type == ks_ir::UnitType::Send && target > 0 {
                    let _ = unit.set("target", target + offset as i32);
                }
            }
        }
        self.song.patch.instruments.push(instrument);
        Ok(self.song.patch.instruments.len() - 1)
    }

    fn max_unit_id(&self) -> u32 {
        self.song
            .patch
            .instruments
            .iter()
            .flat_map(|i| i.units.iter().map(|u| u.id))
            .max()
            .unwrap_or(0)
    }

    // --- Encoding ---

    /// Encode with opcodes for every unit type.
    pub fn encode(&self) -> Result<EncodedPatch, ControllerError> {
        self.encode_with(&AllFeatures)
    }

    /// Encode with opcodes for only the unit types the patch uses.
    pub fn encode_minimal(&self) -> Result<(EncodedPatch, NecessaryFeatures), ControllerError> {
        let features = NecessaryFeatures::for_patch(&self.song.patch);
        let encoded = self.encode_with(&features)?;
        Ok((encoded, features))
    }

    pub fn encode_with<F: FeatureSet + ?Sized>(
        &self,
        features: &F,
    ) -> Result<EncodedPatch, ControllerError> {
        Ok(encode(&self.song.patch, features)?)
    }

    // --- Offline rendering ---

    /// Load the patch into `engine` and play the whole song.
    pub fn render_with<E: Engine + ?Sized>(
        &self,
        engine: &mut E,
        options: PlayOptions,
    ) -> Result<PlayOutput, ControllerError> {
        engine.update(&self.song.patch)?;
        Ok(ks_engine::play(engine, &self.song, options)?)
    }

    pub fn render_to_wav<E: Engine + ?Sized>(
        &self,
        engine: &mut E,
        format: WavFormat,
    ) -> Result<Vec<u8>, ControllerError> {
        let output = self.render_with(engine, PlayOptions::default())?;
        Ok(ks_formats::wav_bytes(&output.audio, format))
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}
