//! Songs: tempo, score and patch.

use crate::error::SongError;
use crate::patch::Patch;
use crate::score::Score;

/// Output sample rate in Hz.
pub const SAMPLE_RATE: u32 = 44100;

/// A complete song.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Song {
    pub bpm: u32,
    pub rows_per_beat: u32,
    pub score: Score,
    pub patch: Patch,
}

impl Song {
    /// Samples rendered per row at 44.1 kHz.
    ///
    /// Only meaningful for a validated song; zero tempo values yield 0.
    pub fn samples_per_row(&self) -> usize {
        let rows_per_minute = self.bpm as usize * self.rows_per_beat as usize;
        if rows_per_minute == 0 {
            return 0;
        }
        SAMPLE_RATE as usize * 60 / rows_per_minute
    }

    /// Check the song can be played.
    pub fn validate(&self) -> Result<(), SongError> {
        if self.bpm < 1 {
            return Err(SongError::InvalidBpm);
        }
        if self.rows_per_beat < 1 {
            return Err(SongError::InvalidRowsPerBeat);
        }
        if self.score.rows_per_pattern < 1 {
            return Err(SongError::InvalidRowsPerPattern);
        }
        let tracks = &self.score.tracks;
        let Some(first) = tracks.first() else {
            return Err(SongError::NoTracks);
        };

        let expected_rows = tracks.iter().find_map(|t| t.patterns.first()).map(|p| p.len());
        let expected_order = first.order.len();
        for (t, track) in tracks.iter().enumerate() {
            if let Some(expected) = expected_rows {
                if let Some((p, pattern)) = track
                    .patterns
                    .iter()
                    .enumerate()
                    .find(|(_, p)| p.len() != expected)
                {
                    return Err(SongError::PatternLength {
                        track: t,
                        pattern: p,
                        len: pattern.len(),
                        expected,
                    });
                }
            }
            if track.order.len() != expected_order {
                return Err(SongError::OrderLength {
                    track: t,
                    len: track.order.len(),
                    expected: expected_order,
                });
            }
            if let Some((position, pattern)) = track
                .order
                .iter()
                .enumerate()
                .find(|&(_, p)| p < 0 || p as usize >= track.patterns.len())
            {
                return Err(SongError::MissingPattern {
                    track: t,
                    position,
                    pattern,
                });
            }
        }

        self.patch.validate()?;
        let score_voices = self.score.num_voices();
        let patch_voices = self.patch.num_voices();
        if score_voices > patch_voices {
            return Err(SongError::TooManyVoices {
                score: score_voices,
                patch: patch_voices,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::Instrument;
    use crate::order::Order;
    use crate::pattern::Pattern;
    use crate::score::Track;
    use alloc::vec;

    fn song() -> Song {
        Song {
            bpm: 100,
            rows_per_beat: 4,
            score: Score {
                tracks: vec![
                    Track {
                        num_voices: 1,
                        effect: false,
                        order: Order::from(vec![0, 1]),
                        patterns: vec![Pattern::from(vec![64, 1, 0, 0]), Pattern::from(vec![1; 4])],
                    },
                    Track {
                        num_voices: 2,
                        effect: false,
                        order: Order::from(vec![0, 0]),
                        patterns: vec![Pattern::from(vec![60, 62, 64, 0])],
                    },
                ],
                rows_per_pattern: 4,
                length: 2,
            },
            patch: Patch::from(vec![Instrument::new("a", 1), Instrument::new("b", 2)]),
        }
    }

    #[test]
    fn samples_per_row() {
        assert_eq!(song().samples_per_row(), 6615);
        let fast = Song { bpm: 125, rows_per_beat: 4, ..song() };
        assert_eq!(fast.samples_per_row(), 5292);
    }

    #[test]
    fn valid_song_passes() {
        assert_eq!(song().validate(), Ok(()));
    }

    #[test]
    fn tempo_must_be_positive() {
        assert_eq!(Song { bpm: 0, ..song() }.validate(), Err(SongError::InvalidBpm));
        assert_eq!(
            Song { rows_per_beat: 0, ..song() }.validate(),
            Err(SongError::InvalidRowsPerBeat)
        );
        let mut s = song();
        s.score.rows_per_pattern = 0;
        assert_eq!(s.validate(), Err(SongError::InvalidRowsPerPattern));
    }

    #[test]
    fn needs_tracks() {
        let mut s = song();
        s.score.tracks.clear();
        assert_eq!(s.validate(), Err(SongError::NoTracks));
    }

    #[test]
    fn pattern_lengths_must_match() {
        let mut s = song();
        s.score.tracks[1].patterns[0].set(4, 1);
        assert_eq!(
            s.validate(),
            Err(SongError::PatternLength {
                track: 1,
                pattern: 0,
                len: 5,
                expected: 4
            })
        );
    }

    #[test]
    fn order_lengths_must_match() {
        let mut s = song();
        s.score.tracks[1].order.set(2, 0);
        assert_eq!(
            s.validate(),
            Err(SongError::OrderLength {
                track: 1,
                len: 3,
                expected: 2
            })
        );
    }

    #[test]
    fn order_must_reference_existing_patterns() {
        let mut s = song();
        s.score.tracks[0].order.set(1, 2);
        assert_eq!(
            s.validate(),
            Err(SongError::MissingPattern {
                track: 0,
                position: 1,
                pattern: 2
            })
        );
        s.score.tracks[0].order.set(1, -1);
        assert!(matches!(s.validate(), Err(SongError::MissingPattern { pattern: -1, .. })));
    }

    #[test]
    fn tracks_cannot_exceed_patch_voices() {
        let mut s = song();
        s.score.tracks[1].num_voices = 3;
        assert_eq!(
            s.validate(),
            Err(SongError::TooManyVoices { score: 4, patch: 3 })
        );
    }
}
