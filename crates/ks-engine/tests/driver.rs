//! Integration tests: drive scripted engines through songs and check the
//! calls they receive and the buffers that come back.

use ks_engine::{
    play, render_all, Engine, EngineError, PlayError, PlayOptions, Rendered, SilentEngine,
};
use ks_ir::{Instrument, Order, Patch, Pattern, Score, Song, Track, Unit, UnitType};

#[derive(Clone, Debug, PartialEq)]
enum Call {
    Trigger(usize, u8),
    Release(usize),
    Render(usize),
}

/// Writes a constant into every frame and records every call.
struct ScriptedEngine {
    calls: Vec<Call>,
    value: f32,
    /// Frames rendered per call at most; models a slow speed unit
    chunk: usize,
    /// Sync events written at the start of each render call
    sync_each_call: bool,
    /// Frames rendered so far
    clock: usize,
    /// Trigger and release calls with the frame they happened at
    timeline: Vec<(usize, Call)>,
}

impl ScriptedEngine {
    fn new() -> Self {
        Self {
            calls: Vec::new(),
            value: 0.25,
            chunk: usize::MAX,
            sync_each_call: false,
            clock: 0,
            timeline: Vec::new(),
        }
    }

    fn notes(&self) -> Vec<Call> {
        self.calls
            .iter()
            .filter(|c| !matches!(c, Call::Render(_)))
            .cloned()
            .collect()
    }

    fn renders(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, Call::Render(_))).count()
    }
}

impl Engine for ScriptedEngine {
    fn update(&mut self, _patch: &Patch) -> Result<(), EngineError> {
        Ok(())
    }

    fn trigger(&mut self, voice: usize, note: u8) {
        self.calls.push(Call::Trigger(voice, note));
        self.timeline.push((self.clock, Call::Trigger(voice, note)));
    }

    fn release(&mut self, voice: usize) {
        self.calls.push(Call::Release(voice));
        self.timeline.push((self.clock, Call::Release(voice)));
    }

    fn render(
        &mut self,
        audio: &mut [f32],
        syncs: &mut [f32],
        max_time: usize,
    ) -> Result<Rendered, EngineError> {
        self.calls.push(Call::Render(max_time));
        let frames = (audio.len() / 2).min(max_time).min(self.chunk);
        audio[..frames * 2].fill(self.value);
        self.clock += frames;
        let mut events = 0;
        if self.sync_each_call && !syncs.is_empty() {
            syncs[0] = 0.0;
            events = 1;
        }
        Ok(Rendered {
            samples: frames,
            syncs: events,
            time: frames,
        })
    }
}

/// Never renders anything and never consumes time.
#[derive(Default)]
struct StalledEngine {
    renders: usize,
}

impl Engine for StalledEngine {
    fn update(&mut self, _patch: &Patch) -> Result<(), EngineError> {
        Ok(())
    }

    fn trigger(&mut self, _voice: usize, _note: u8) {}

    fn release(&mut self, _voice: usize) {}

    fn render(&mut self, _: &mut [f32], _: &mut [f32], _: usize) -> Result<Rendered, EngineError> {
        self.renders += 1;
        Ok(Rendered::default())
    }
}

struct FailingEngine;

impl Engine for FailingEngine {
    fn update(&mut self, _patch: &Patch) -> Result<(), EngineError> {
        Ok(())
    }

    fn trigger(&mut self, _voice: usize, _note: u8) {}

    fn release(&mut self, _voice: usize) {}

    fn render(&mut self, _: &mut [f32], _: &mut [f32], _: usize) -> Result<Rendered, EngineError> {
        Err(EngineError::Kernel("kernel crashed".into()))
    }
}

fn envelope_patch() -> Patch {
    Patch::from(vec![Instrument::new("lead", 2)
        .with_unit(
            Unit::new(UnitType::Envelope)
                .with("attack", 64)
                .with("decay", 64)
                .with("sustain", 64)
                .with("release", 80)
                .with("gain", 128),
        )
        .with_unit(Unit::new(UnitType::Envelope).with("attack", 95))
        .with_unit(Unit::new(UnitType::Out).with("stereo", 1).with("gain", 128))])
}

/// Two rows per pattern, two patterns; one two-voice track.
fn song(notes: [u8; 4]) -> Song {
    Song {
        bpm: 100,
        rows_per_beat: 4,
        score: Score {
            tracks: vec![Track {
                num_voices: 2,
                effect: false,
                order: Order::from(vec![0, 1]),
                patterns: vec![
                    Pattern::from(vec![notes[0], notes[1]]),
                    Pattern::from(vec![notes[2], notes[3]]),
                ],
            }],
            rows_per_pattern: 2,
            length: 2,
        },
        patch: envelope_patch(),
    }
}

#[test]
fn output_length_is_rows_times_samples_per_row() {
    let song = song([64, 1, 1, 0]);
    let mut engine = ScriptedEngine::new();
    let out = play(&mut engine, &song, PlayOptions::default()).unwrap();
    assert_eq!(song.samples_per_row(), 6615);
    assert_eq!(out.audio.len(), 4 * 6615 * 2);
    assert!(out.audio.iter().all(|&s| s == 0.25));
    assert!(out.syncs.is_empty());
    assert_eq!(engine.renders(), 4);
}

#[test]
fn notes_round_robin_within_track_voices() {
    let song = song([64, 65, 1, 66]);
    let mut engine = ScriptedEngine::new();
    play(&mut engine, &song, PlayOptions::default()).unwrap();
    assert_eq!(
        engine.notes(),
        [
            Call::Release(0),
            Call::Trigger(1, 64),
            Call::Release(1),
            Call::Trigger(0, 65),
            Call::Release(0),
            Call::Trigger(1, 66),
        ]
    );
}

#[test]
fn no_op_and_hold_do_nothing() {
    let song = song([0, 1, 0, 1]);
    let mut engine = ScriptedEngine::new();
    play(&mut engine, &song, PlayOptions::default()).unwrap();
    assert!(engine.notes().is_empty());
}

#[test]
fn release_all_voices_option() {
    let song = song([0, 1, 0, 1]);
    let mut engine = ScriptedEngine::new();
    let options = PlayOptions {
        release_all_voices: true,
    };
    play(&mut engine, &song, options).unwrap();
    let releases: Vec<Call> = (0..32).map(Call::Release).collect();
    assert_eq!(engine.notes(), releases);
}

#[test]
fn second_track_uses_voices_after_first() {
    let mut song = song([64, 1, 1, 1]);
    song.score.tracks.push(Track {
        num_voices: 1,
        effect: false,
        order: Order::from(vec![0, 0]),
        patterns: vec![Pattern::from(vec![70, 1])],
    });
    song.patch.instruments.push(Instrument::new("bass", 1));
    let mut engine = ScriptedEngine::new();
    play(&mut engine, &song, PlayOptions::default()).unwrap();
    assert_eq!(
        engine.notes(),
        [
            Call::Release(0),
            Call::Trigger(1, 64),
            Call::Release(2),
            Call::Trigger(2, 70),
            Call::Release(2),
            Call::Trigger(2, 70),
        ]
    );
}

#[test]
fn slow_engine_takes_several_calls_per_row() {
    let song = song([64, 1, 1, 1]);
    let mut engine = ScriptedEngine::new();
    engine.chunk = 1000;
    let out = play(&mut engine, &song, PlayOptions::default()).unwrap();
    assert_eq!(out.audio.len(), 4 * 6615 * 2);
    // 6615 = 6 * 1000 + 615
    assert_eq!(engine.renders(), 4 * 7);
    let first_row: Vec<Call> = engine
        .calls
        .iter()
        .filter(|c| matches!(c, Call::Render(_)))
        .take(7)
        .cloned()
        .collect();
    assert_eq!(
        first_row,
        [6615, 5615, 4615, 3615, 2615, 1615, 615].map(Call::Render)
    );
}

#[test]
fn sync_times_become_rows() {
    let mut song = song([64, 1, 1, 1]);
    song.patch.instruments[0]
        .units
        .push(Unit::new(UnitType::Sync));
    let mut engine = ScriptedEngine::new();
    engine.chunk = 6615 / 2 + 1;
    engine.sync_each_call = true;
    let out = play(&mut engine, &song, PlayOptions::default()).unwrap();
    // one sync unit on two voices: stride 3, two calls per row
    assert_eq!(out.syncs.len(), 4 * 2 * 3);
    let times: Vec<f32> = out.syncs.chunks(3).map(|e| e[0]).collect();
    let half = 3308.0 / 6615.0;
    let expected = [0.0, half, 1.0, 1.0 + half, 2.0, 2.0 + half, 3.0, 3.0 + half];
    for (t, e) in times.iter().zip(expected) {
        assert!((t - e).abs() < 1e-5, "{} != {}", t, e);
    }
}

#[test]
fn stalled_row_fails_after_101_attempts() {
    let song = song([64, 1, 1, 1]);
    let mut engine = StalledEngine::default();
    let err = play(&mut engine, &song, PlayOptions::default()).unwrap_err();
    assert_eq!(err, PlayError::RowStalled { position: 0, row: 0 });
    assert_eq!(engine.renders, 101);
    assert!(err.to_string().contains("pattern 0, row 0"));
}

#[test]
fn engine_errors_surface_as_is() {
    let song = song([64, 1, 1, 1]);
    let err = play(&mut FailingEngine, &song, PlayOptions::default()).unwrap_err();
    assert_eq!(err, PlayError::Engine(EngineError::Kernel("kernel crashed".into())));
}

#[test]
fn invalid_song_is_rejected_before_rendering() {
    let mut song = song([64, 1, 1, 1]);
    song.bpm = 0;
    let mut engine = ScriptedEngine::new();
    let err = play(&mut engine, &song, PlayOptions::default()).unwrap_err();
    assert_eq!(err, PlayError::Song(ks_ir::SongError::InvalidBpm));
    assert!(engine.calls.is_empty());
}

#[test]
fn boxed_engines_drive_the_same_way() {
    let song = song([64, 1, 1, 1]);
    let mut engine: Box<dyn Engine> = Box::new(SilentEngine::new());
    engine.update(&song.patch).unwrap();
    let out = play(&mut engine, &song, PlayOptions::default()).unwrap();
    assert_eq!(out.audio.len(), 4 * 6615 * 2);
    assert!(out.audio.iter().all(|&s| s == 0.0));
}

/// One voice, sixteen rows, one pattern.
fn single_envelope_song(notes: Vec<u8>) -> Song {
    let mut patch = envelope_patch();
    patch.instruments[0].num_voices = 1;
    Song {
        bpm: 100,
        rows_per_beat: 4,
        score: Score {
            tracks: vec![Track {
                num_voices: 1,
                effect: false,
                order: Order::from(vec![0]),
                patterns: vec![Pattern::from(notes)],
            }],
            rows_per_pattern: 16,
            length: 1,
        },
        patch,
    }
}

#[test]
fn single_envelope_render_with_release_halfway() {
    let song = single_envelope_song(vec![1; 16]);
    let samples_per_row = song.samples_per_row();
    let mut engine = ScriptedEngine::new();
    engine.update(&song.patch).unwrap();
    engine.trigger(0, 64);

    let mut buffer = vec![0.0f32; samples_per_row * 16 * 2];
    let (head, tail) = buffer.split_at_mut(samples_per_row * 8 * 2);
    render_all(&mut engine, head).unwrap();
    engine.release(0);
    render_all(&mut engine, tail).unwrap();

    assert_eq!(
        engine.timeline,
        [(0, Call::Trigger(0, 64)), (52920, Call::Release(0))]
    );
    assert_eq!(engine.clock, 105840);
    assert_eq!(engine.renders(), 2);
    assert!(buffer.iter().all(|&s| s == 0.25));
}

#[test]
fn played_song_retriggers_on_the_halfway_row() {
    let mut notes = vec![1; 16];
    notes[0] = 64;
    notes[8] = 66;
    let song = single_envelope_song(notes);
    let mut engine = ScriptedEngine::new();
    let out = play(&mut engine, &song, PlayOptions::default()).unwrap();

    assert_eq!(
        engine.timeline,
        [
            (0, Call::Release(0)),
            (0, Call::Trigger(0, 64)),
            (52920, Call::Release(0)),
            (52920, Call::Trigger(0, 66)),
        ]
    );
    assert_eq!(engine.clock, 105840);
    assert_eq!(out.audio.len(), 105840 * 2);
    assert!(out.audio.iter().all(|&s| s == 0.25));
}

#[test]
fn render_all_reports_short_renders() {
    let mut engine = ScriptedEngine::new();
    engine.chunk = 10;
    let mut buffer = vec![0.0f32; 64];
    let err = render_all(&mut engine, &mut buffer).unwrap_err();
    assert_eq!(
        err,
        PlayError::ShortRender {
            requested: 32,
            rendered: 10
        }
    );
}
