//! Patches: the ordered list of instruments and queries over it.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::PatchError;
use crate::hint::format_param;
use crate::instrument::Instrument;
use crate::unit::Unit;
use crate::unit_type::UnitType;

/// Maximum number of voices across a patch.
pub const MAX_VOICES: usize = 32;

/// A complete synth patch.
///
/// `Clone` is a deep copy: units reference each other by id only, so no
/// fixups are needed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Patch {
    pub instruments: Vec<Instrument>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: append an instrument.
    pub fn with_instrument(mut self, instrument: Instrument) -> Self {
        self.instruments.push(instrument);
        self
    }

    /// Total voices over all instruments.
    pub fn num_voices(&self) -> usize {
        self.instruments.iter().map(|i| i.num_voices).sum()
    }

    /// Total delay lines: every delay time of every delay unit, per voice.
    pub fn num_delay_lines(&self) -> usize {
        self.instruments
            .iter()
            .map(|instr| {
                instr
                    .units
                    .iter()
                    .filter(|u| u.unit_type == UnitType::Delay)
                    .map(|u| u.varargs.len() * instr.num_voices)
                    .sum::<usize>()
            })
            .sum()
    }

    /// Total sync outputs: one per sync unit per voice.
    pub fn num_syncs(&self) -> usize {
        self.instruments
            .iter()
            .map(|instr| {
                instr
                    .units
                    .iter()
                    .filter(|u| u.unit_type == UnitType::Sync)
                    .count()
                    * instr.num_voices
            })
            .sum()
    }

    /// Index of the first voice of an instrument. Indices past the end give
    /// the total voice count.
    pub fn first_voice_for_instrument(&self, instrument: usize) -> usize {
        self.instruments
            .iter()
            .take(instrument)
            .map(|i| i.num_voices)
            .sum()
    }

    /// Instrument that owns a voice.
    pub fn instrument_for_voice(&self, voice: usize) -> Result<usize, PatchError> {
        let mut remaining = voice;
        for (i, instr) in self.instruments.iter().enumerate() {
            if remaining < instr.num_voices {
                return Ok(i);
            }
            remaining -= instr.num_voices;
        }
        Err(PatchError::VoiceOutOfRange {
            voice,
            num_voices: self.num_voices(),
        })
    }

    /// Instrument and unit index of the first unit with the given id.
    pub fn find_send_target(&self, id: u32) -> Result<(usize, usize), PatchError> {
        if id == 0 {
            return Err(PatchError::ZeroTargetId);
        }
        self.instruments
            .iter()
            .enumerate()
            .find_map(|(i, instr)| {
                instr
                    .units
                    .iter()
                    .position(|u| u.id == id)
                    .map(|u| (i, u))
            })
            .ok_or(PatchError::TargetNotFound(id))
    }

    /// Unit at a position, if any.
    pub fn unit(&self, instrument: usize, unit: usize) -> Option<&Unit> {
        self.instruments.get(instrument)?.units.get(unit)
    }

    /// Check per-instrument limits and the total voice count.
    pub fn validate(&self) -> Result<(), PatchError> {
        for (i, instr) in self.instruments.iter().enumerate() {
            instr.validate(i)?;
        }
        let voices = self.num_voices();
        if voices > MAX_VOICES {
            return Err(PatchError::TooManyVoices(voices));
        }
        Ok(())
    }

    /// Stack-check every instrument.
    pub fn check_stack(&self) -> Result<(), PatchError> {
        self.instruments
            .iter()
            .enumerate()
            .try_for_each(|(i, instr)| instr.check_stack(i))
    }

    /// Display string for a parameter of the unit at a position.
    ///
    /// Send targets and ports are resolved against the patch, so they show
    /// the target unit and the modulated parameter by name.
    pub fn param_hint(&self, instrument: usize, unit: usize, name: &str) -> Option<String> {
        let u = self.unit(instrument, unit)?;
        u.unit_type.param(name)?;
        let value = u.param(name);
        if u.unit_type == UnitType::Send {
            match name {
                "target" => {
                    let Ok((ti, tu)) = self.find_send_target(value as u32) else {
                        return Some(String::from("none"));
                    };
                    let target = &self.instruments[ti];
                    let unit_type = target.units[tu].unit_type;
                    return Some(format!("{} {} ({})", unit_type, tu, target.name));
                }
                "port" => {
                    let port_name = self
                        .find_send_target(u.param("target") as u32)
                        .ok()
                        .and_then(|(ti, tu)| {
                            self.instruments[ti].units[tu]
                                .unit_type
                                .port_name(value as usize)
                        });
                    return Some(port_name.map_or_else(|| format!("{}", value), String::from));
                }
                _ => {}
            }
        }
        Some(format_param(u.unit_type, name, value))
    }
}

impl From<Vec<Instrument>> for Patch {
    fn from(instruments: Vec<Instrument>) -> Self {
        Self { instruments }
    }
}

impl FromIterator<Instrument> for Patch {
    fn from_iter<T: IntoIterator<Item = Instrument>>(iter: T) -> Self {
        Self {
            instruments: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn patch_1_3_2() -> Patch {
        Patch::from(vec![
            Instrument::new("kick", 1)
                .with_unit(Unit::new(UnitType::Delay).with_varargs(vec![100, 200])),
            Instrument::new("pad", 3)
                .with_unit(Unit::new(UnitType::Envelope).with_id(7))
                .with_unit(Unit::new(UnitType::Sync)),
            Instrument::new("bass", 2)
                .with_unit(Unit::new(UnitType::Sync))
                .with_unit(
                    Unit::new(UnitType::Send)
                        .with("target", 7)
                        .with("port", 4),
                )
                .with_unit(Unit::new(UnitType::Delay).with_varargs(vec![10])),
        ])
    }

    #[test]
    fn voice_counting() {
        let patch = patch_1_3_2();
        assert_eq!(patch.num_voices(), 6);
        assert_eq!(patch.first_voice_for_instrument(0), 0);
        assert_eq!(patch.first_voice_for_instrument(1), 1);
        assert_eq!(patch.first_voice_for_instrument(2), 4);
        assert_eq!(patch.first_voice_for_instrument(9), 6);
    }

    #[test]
    fn instrument_for_voice() {
        let patch = patch_1_3_2();
        assert_eq!(patch.instrument_for_voice(0), Ok(0));
        assert_eq!(patch.instrument_for_voice(1), Ok(1));
        assert_eq!(patch.instrument_for_voice(3), Ok(1));
        assert_eq!(patch.instrument_for_voice(5), Ok(2));
        assert_eq!(
            patch.instrument_for_voice(6),
            Err(PatchError::VoiceOutOfRange {
                voice: 6,
                num_voices: 6
            })
        );
    }

    #[test]
    fn delay_lines_and_syncs() {
        let patch = patch_1_3_2();
        assert_eq!(patch.num_delay_lines(), 2 + 2);
        assert_eq!(patch.num_syncs(), 3 + 2);
    }

    #[test]
    fn find_send_target() {
        let patch = patch_1_3_2();
        assert_eq!(patch.find_send_target(7), Ok((1, 0)));
        assert_eq!(patch.find_send_target(0), Err(PatchError::ZeroTargetId));
        assert_eq!(patch.find_send_target(8), Err(PatchError::TargetNotFound(8)));
    }

    #[test]
    fn copy_is_independent() {
        let patch = patch_1_3_2();
        let mut copy = patch.clone();
        copy.instruments[0].units[0].varargs[0] = 1;
        copy.instruments[1].units[0].set("attack", 12).unwrap();
        assert_eq!(patch.instruments[0].units[0].varargs[0], 100);
        assert_eq!(patch.instruments[1].units[0].param("attack"), 0);
        assert_ne!(patch, copy);
    }

    #[test]
    fn validate_total_voices() {
        let patch: Patch = (0..5).map(|_| Instrument::new("x", 7)).collect();
        assert_eq!(patch.validate(), Err(PatchError::TooManyVoices(35)));
        assert_eq!(patch_1_3_2().validate(), Ok(()));
    }

    #[test]
    fn send_hints_resolve_against_patch() {
        let patch = patch_1_3_2();
        assert_eq!(
            patch.param_hint(2, 1, "target").as_deref(),
            Some("envelope 0 (pad)")
        );
        assert_eq!(patch.param_hint(2, 1, "port").as_deref(), Some("gain"));
        assert_eq!(patch.param_hint(2, 1, "voice").as_deref(), Some("default"));
        assert_eq!(patch.param_hint(2, 1, "nonsense"), None);
        assert_eq!(patch.param_hint(5, 0, "stereo"), None);
    }
}
