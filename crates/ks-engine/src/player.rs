//! Song driver.
//!
//! Walks the score row by row, fires note triggers and releases on the
//! voices of each track, and drives an [`Engine`] until every row's sample
//! quota is filled. A `speed` unit can make the engine return before the
//! quota is met, so each row may take several render calls.

use alloc::vec;
use alloc::vec::Vec;

use ks_ir::{Song, SongError, MAX_VOICES, NOTE_HOLD, NOTE_NONE};

use crate::engine::{Engine, EngineError, SYNC_INTERVAL};

/// Render calls allowed per row beyond the first before giving up.
pub const MAX_ROW_ATTEMPTS: usize = 100;

/// Errors raised while playing a song.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayError {
    #[error(transparent)]
    Song(#[from] SongError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("speed modulation likely so slow that row never advances; error at pattern {position}, row {row}")]
    RowStalled { position: usize, row: usize },
    #[error("engine rendered {rendered} samples, {requested} were requested")]
    ShortRender { requested: usize, rendered: usize },
}

/// Driver options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayOptions {
    /// Release every voice before the first row
    pub release_all_voices: bool,
}

/// Rendered song.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlayOutput {
    /// Interleaved stereo samples
    pub audio: Vec<f32>,
    /// Sync events; the first float of each is its time in rows
    pub syncs: Vec<f32>,
}

/// Play a whole song through an engine that already has the song's patch.
pub fn play<E: Engine + ?Sized>(
    engine: &mut E,
    song: &Song,
    options: PlayOptions,
) -> Result<PlayOutput, PlayError> {
    song.validate()?;
    if options.release_all_voices {
        for voice in 0..MAX_VOICES {
            engine.release(voice);
        }
    }

    let score = &song.score;
    let samples_per_row = song.samples_per_row();
    let total_rows = score.length_in_rows();
    let stride = 1 + song.patch.num_syncs();

    let mut cur_voice: Vec<usize> = (0..score.tracks.len())
        .map(|t| score.first_voice_for_track(t))
        .collect();
    let capacity = total_rows * samples_per_row * 2;
    let mut out = PlayOutput {
        audio: Vec::with_capacity(capacity),
        syncs: Vec::with_capacity(capacity),
    };
    let mut row_buffer = vec![0.0f32; samples_per_row * 2];
    let mut sync_row_buffer =
        vec![0.0f32; samples_per_row.div_ceil(SYNC_INTERVAL) * stride];

    for row in 0..total_rows {
        let position = row / score.rows_per_pattern;
        let pattern_row = row % score.rows_per_pattern;

        for (t, track) in score.tracks.iter().enumerate() {
            let note = track.note_at(position, pattern_row);
            if note == NOTE_NONE || note == NOTE_HOLD {
                continue;
            }
            engine.release(cur_voice[t]);
            let first = score.first_voice_for_track(t);
            cur_voice[t] += 1;
            if cur_voice[t] >= first + track.num_voices {
                cur_voice[t] = first;
            }
            engine.trigger(cur_voice[t], note);
        }

        let mut row_time = 0;
        let mut attempts = 0;
        while row_time < samples_per_row {
            if attempts > MAX_ROW_ATTEMPTS {
                return Err(PlayError::RowStalled {
                    position,
                    row: pattern_row,
                });
            }
            let rendered = engine.render(
                &mut row_buffer,
                &mut sync_row_buffer,
                samples_per_row - row_time,
            )?;
            attempts += 1;

            let samples = (rendered.samples * 2).min(row_buffer.len());
            out.audio.extend_from_slice(&row_buffer[..samples]);

            let events = (rendered.syncs * stride).min(sync_row_buffer.len());
            for event in sync_row_buffer[..events].chunks_mut(stride) {
                event[0] = (event[0] + row_time as f32) / samples_per_row as f32 + row as f32;
            }
            out.syncs.extend_from_slice(&sync_row_buffer[..events]);
            row_time += rendered.time;
        }
        log::trace!(
            "[play] row {} (pattern {}, row {}) rendered in {} calls",
            row,
            position,
            pattern_row,
            attempts
        );
    }

    log::info!(
        "[play] rendered {} rows, {} samples, {} sync floats",
        total_rows,
        out.audio.len() / 2,
        out.syncs.len()
    );
    Ok(out)
}

/// Fill `audio` completely with no time limit.
pub fn render_all<E: Engine + ?Sized>(engine: &mut E, audio: &mut [f32]) -> Result<(), PlayError> {
    let rendered = engine.render(audio, &mut [], usize::MAX)?;
    let requested = audio.len() / 2;
    if rendered.samples != requested {
        return Err(PlayError::ShortRender {
            requested,
            rendered: rendered.samples,
        });
    }
    Ok(())
}
