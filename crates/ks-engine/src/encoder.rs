//! Patch encoder.
//!
//! Translates a [`Patch`] into the command and value streams executed by a
//! synth kernel, plus the side tables (delay times, sample offsets) and the
//! polyphony bitmask. Each unit becomes exactly one command byte; each
//! instrument ends with an advance byte (0).

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use ks_ir::{Instrument, OscillatorType, Patch, PatchError, Unit, UnitType, MAX_VOICES};

use crate::feature_set::FeatureSet;
use crate::send_address::{unresolved_bytes, SendAddress};

/// Maximum length of the command stream.
pub const MAX_COMMANDS: usize = 2048;
/// Maximum length of the value stream.
pub const MAX_VALUES: usize = 16384;

/// Errors raised while encoding a patch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error(transparent)]
    Patch(#[from] PatchError),
    #[error("the targeted kernel does not support unit type \"{0}\"")]
    UnsupportedUnit(UnitType),
    #[error("patch encodes to {0} commands, the maximum is 2048")]
    TooManyCommands(usize),
    #[error("patch encodes to {0} value bytes, the maximum is 16384")]
    TooManyValues(usize),
    #[error("delay unit starts at delay line {0}, the maximum is 255")]
    DelayOffsetOverflow(usize),
}

/// Sample playback window of a sample oscillator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SampleOffset {
    pub start: u32,
    pub loop_start: u16,
    pub loop_length: u16,
}

/// Encoded form of a patch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncodedPatch {
    /// One opcode per unit, 0 after each instrument
    pub commands: Vec<u8>,
    /// Parameter bytes consumed by the opcodes, in order
    pub values: Vec<u8>,
    /// Pool of delay line lengths shared by all delay units
    pub delay_times: Vec<u16>,
    /// Deduplicated sample windows, indexed by sample oscillators' color
    pub sample_offsets: Vec<SampleOffset>,
    /// Read MSB first, per instrument in patch order: `voices - 1` ones
    /// then a zero. The last instrument's zero is bit 0.
    pub polyphony_bitmask: u32,
    pub num_voices: u32,
}

impl EncodedPatch {
    /// Number of instruments, counted from the advance bytes.
    pub fn num_instruments(&self) -> usize {
        self.commands.iter().filter(|&&c| c == 0).count()
    }
}

/// Encode a patch for a kernel with the given opcode numbering.
pub fn encode<F: FeatureSet + ?Sized>(patch: &Patch, features: &F) -> Result<EncodedPatch, EncodeError> {
    let mut encoder = Encoder {
        patch,
        out: EncodedPatch::default(),
        sample_offsets: BTreeMap::new(),
    };
    for (i, instr) in patch.instruments.iter().enumerate() {
        encoder.instrument(i, instr, features)?;
    }
    let out = encoder.out;
    if out.num_voices as usize > MAX_VOICES {
        return Err(PatchError::TooManyVoices(out.num_voices as usize).into());
    }
    if out.commands.len() > MAX_COMMANDS {
        return Err(EncodeError::TooManyCommands(out.commands.len()));
    }
    if out.values.len() > MAX_VALUES {
        return Err(EncodeError::TooManyValues(out.values.len()));
    }
    log::debug!(
        "[encode] {} commands, {} values, {} delay times, {} samples, {} voices",
        out.commands.len(),
        out.values.len(),
        out.delay_times.len(),
        out.sample_offsets.len(),
        out.num_voices
    );
    Ok(out)
}

struct Encoder<'a> {
    patch: &'a Patch,
    out: EncodedPatch,
    sample_offsets: BTreeMap<SampleOffset, usize>,
}

impl Encoder<'_> {
    fn instrument<F: FeatureSet + ?Sized>(
        &mut self,
        index: usize,
        instr: &Instrument,
        features: &F,
    ) -> Result<(), EncodeError> {
        instr.validate(index)?;
        for unit in &instr.units {
            let opcode = features
                .opcode(unit.unit_type)
                .ok_or(EncodeError::UnsupportedUnit(unit.unit_type))?;
            self.out.commands.push(opcode + unit.param("stereo") as u8);
            self.unit_values(index, unit)?;
        }
        self.out.commands.push(0);

        self.out.num_voices += instr.num_voices as u32;
        for _ in 1..instr.num_voices {
            self.out.polyphony_bitmask = (self.out.polyphony_bitmask << 1) | 1;
        }
        self.out.polyphony_bitmask <<= 1;
        log::debug!(
            "[encode] instrument {} \"{}\": {} units, {} voices",
            index,
            instr.name,
            instr.units.len(),
            instr.num_voices
        );
        Ok(())
    }

    fn unit_values(&mut self, instr_index: usize, unit: &Unit) -> Result<(), EncodeError> {
        let color = match unit.oscillator_type() {
            Some(OscillatorType::Sample) => Some(self.sample_index(unit)),
            _ => None,
        };
        for param in unit.unit_type.encoded_params() {
            let value = match (param.name, color) {
                ("color", Some(index)) => index as i32,
                _ => unit.param(param.name),
            };
            self.out.values.push(value as u8);
        }

        match unit.unit_type {
            UnitType::Aux | UnitType::In => self.out.values.push(unit.param("channel") as u8),
            UnitType::Oscillator => {
                let mut flags = match unit.oscillator_type() {
                    Some(OscillatorType::Sine) => 0x40,
                    Some(OscillatorType::Trisaw) => 0x20,
                    Some(OscillatorType::Pulse) => 0x10,
                    Some(OscillatorType::Gate) => 0x04,
                    Some(OscillatorType::Sample) => 0x80,
                    None => 0,
                };
                if unit.param("lfo") == 1 {
                    flags |= 0x08;
                }
                flags += unit.param("unison") & 3;
                self.out.values.push(flags as u8);
            }
            UnitType::Filter => self.out.values.push(filter_flags(unit)),
            UnitType::Send => {
                let bytes = self.send_address(instr_index, unit);
                self.out.values.extend_from_slice(&bytes);
            }
            UnitType::Delay => {
                let offset = self.out.delay_times.len();
                let offset_byte =
                    u8::try_from(offset).map_err(|_| EncodeError::DelayOffsetOverflow(offset))?;
                let count = unit.varargs.len() as i32 / unit.channels();
                let count_track = (count << 1) - 1 + unit.param("notetracking");
                self.out
                    .delay_times
                    .extend(unit.varargs.iter().map(|&v| v as u16));
                self.out.values.push(offset_byte);
                self.out.values.push(count_track as u8);
            }
            _ => {}
        }
        Ok(())
    }

    fn sample_index(&mut self, unit: &Unit) -> usize {
        let loop_length = unit.param("looplength");
        let offset = SampleOffset {
            start: unit.param("samplestart") as u32,
            loop_start: unit.param("loopstart") as u16,
            loop_length: if loop_length == 0 { 1 } else { loop_length as u16 },
        };
        let next = self.out.sample_offsets.len();
        let index = *self.sample_offsets.entry(offset).or_insert(next);
        if index == next {
            self.out.sample_offsets.push(offset);
        }
        index
    }

    fn send_address(&self, instr_index: usize, unit: &Unit) -> [u8; 2] {
        let pop = unit.param("sendpop") == 1;
        let port = (unit.param("port") & 7) as u16;
        let voice = unit.param("voice").max(0) as usize;
        let target = unit.param("target") as u32;
        match self.patch.find_send_target(target) {
            Ok((ti, tu)) if ti == instr_index && voice == 0 => {
                SendAddress::local(tu as u16, port, pop).to_bytes()
            }
            Ok((ti, tu)) => {
                let first = self.patch.first_voice_for_instrument(ti);
                let absolute = first + voice.saturating_sub(1);
                SendAddress::global(absolute as u16, tu as u16, port, pop).to_bytes()
            }
            Err(err) => {
                log::warn!("[encode] instrument {}: {}; send is ignored", instr_index, err);
                unresolved_bytes(pop)
            }
        }
    }
}

fn filter_flags(unit: &Unit) -> u8 {
    let mut flags = 0;
    if unit.param("lowpass") == 1 {
        flags |= 0x40;
    }
    if unit.param("bandpass") == 1 {
        flags |= 0x20;
    }
    if unit.param("highpass") == 1 {
        flags |= 0x10;
    }
    if unit.param("negbandpass") == 1 || unit.param("bandpass") == -1 {
        flags |= 0x08;
    }
    if unit.param("neghighpass") == 1 || unit.param("highpass") == -1 {
        flags |= 0x04;
    }
    flags
}
