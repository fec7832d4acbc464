//! Reference engine that honours the render contract but outputs silence.
//!
//! Stands in wherever no DSP kernel is plugged in: it compiles the patch
//! through the encoder, tracks voice state and emits sync events, so the
//! driver and tooling can be exercised end to end.

use heapless::Vec as HVec;
use ks_ir::{Patch, PatchError, MAX_VOICES};

use crate::encoder::{encode, EncodedPatch};
use crate::engine::{Engine, EngineError, Rendered, SYNC_INTERVAL};
use crate::feature_set::AllFeatures;

/// Per-voice note state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoiceState {
    /// Last triggered note, 0 if never triggered
    pub note: u8,
    /// Key is held; cleared by release
    pub sustain: bool,
}

#[derive(Debug, Default)]
pub struct SilentEngine {
    encoded: Option<EncodedPatch>,
    voices: HVec<VoiceState, MAX_VOICES>,
    num_syncs: usize,
    /// Frames rendered since the patch was loaded
    clock: usize,
}

impl SilentEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoded form of the active patch.
    pub fn encoded(&self) -> Option<&EncodedPatch> {
        self.encoded.as_ref()
    }

    pub fn voice(&self, voice: usize) -> Option<&VoiceState> {
        self.voices.get(voice)
    }

    pub fn num_voices(&self) -> usize {
        self.voices.len()
    }
}

impl Engine for SilentEngine {
    /// Compiles the patch and resets every voice.
    fn update(&mut self, patch: &Patch) -> Result<(), EngineError> {
        let encoded = encode(patch, &AllFeatures)?;
        let num_voices = encoded.num_voices as usize;
        self.voices.clear();
        self.voices
            .resize_default(num_voices)
            .map_err(|_| PatchError::TooManyVoices(num_voices))?;
        self.num_syncs = patch.num_syncs();
        self.clock = 0;
        self.encoded = Some(encoded);
        log::debug!("[engine] loaded patch with {} voices", num_voices);
        Ok(())
    }

    fn trigger(&mut self, voice: usize, note: u8) {
        match self.voices.get_mut(voice) {
            Some(state) => {
                state.note = note;
                state.sustain = true;
            }
            None => log::warn!("[engine] trigger on missing voice {}", voice),
        }
    }

    fn release(&mut self, voice: usize) {
        if let Some(state) = self.voices.get_mut(voice) {
            state.sustain = false;
        }
    }

    fn render(
        &mut self,
        audio: &mut [f32],
        syncs: &mut [f32],
        max_time: usize,
    ) -> Result<Rendered, EngineError> {
        let frames = (audio.len() / 2).min(max_time);
        audio[..frames * 2].fill(0.0);

        let stride = 1 + self.num_syncs;
        let mut events = 0;
        if self.num_syncs > 0 {
            for frame in 0..frames {
                if (self.clock + frame) % SYNC_INTERVAL != 0 {
                    continue;
                }
                let Some(slot) = syncs.get_mut(events * stride..(events + 1) * stride) else {
                    break;
                };
                slot[0] = frame as f32;
                slot[1..].fill(0.0);
                events += 1;
            }
        }
        self.clock += frames;

        Ok(Rendered {
            samples: frames,
            syncs: events,
            time: frames,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use ks_ir::{Instrument, Unit, UnitType};

    fn patch() -> Patch {
        Patch::from(vec![
            Instrument::new("a", 2).with_unit(Unit::new(UnitType::Sync)),
            Instrument::new("b", 1),
        ])
    }

    #[test]
    fn update_resets_voices() {
        let mut engine = SilentEngine::new();
        engine.update(&patch()).unwrap();
        assert_eq!(engine.num_voices(), 3);
        engine.trigger(1, 60);
        assert_eq!(engine.voice(1), Some(&VoiceState { note: 60, sustain: true }));
        engine.release(1);
        assert!(!engine.voice(1).unwrap().sustain);
        engine.update(&patch()).unwrap();
        assert_eq!(engine.voice(1), Some(&VoiceState::default()));
        assert_eq!(engine.encoded().unwrap().num_voices, 3);
    }

    #[test]
    fn update_rejects_bad_patch() {
        let mut engine = SilentEngine::new();
        let bad = Patch::from(vec![Instrument::new("a", 0)]);
        assert!(matches!(engine.update(&bad), Err(EngineError::Encode(_))));
    }

    #[test]
    fn render_stops_at_max_time() {
        let mut engine = SilentEngine::new();
        engine.update(&patch()).unwrap();
        let mut audio = vec![1.0; 200];
        let mut syncs = vec![0.0; 9];
        let rendered = engine.render(&mut audio, &mut syncs, 30).unwrap();
        assert_eq!(rendered, Rendered { samples: 30, syncs: 1, time: 30 });
        assert!(audio[..60].iter().all(|&s| s == 0.0));
        assert!(audio[60..].iter().all(|&s| s == 1.0));
    }

    #[test]
    fn sync_events_every_interval() {
        let mut engine = SilentEngine::new();
        engine.update(&patch()).unwrap();
        let mut audio = vec![0.0; 2 * 600];
        let mut syncs = vec![-1.0; 3 * 3];
        let rendered = engine.render(&mut audio, &mut syncs, 600).unwrap();
        assert_eq!(rendered.syncs, 3);
        assert_eq!(syncs, [0.0, 0.0, 0.0, 256.0, 0.0, 0.0, 512.0, 0.0, 0.0]);

        let rendered = engine.render(&mut audio, &mut syncs, 200).unwrap();
        assert_eq!(rendered.syncs, 1);
        assert_eq!(syncs[0], 168.0);
    }
}
