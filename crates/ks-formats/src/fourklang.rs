//! 4klang patch and instrument importer.
//!
//! 4klang stores each instrument as a fixed-size stack of unit records.
//! Each record is translated into one or more native units; sends address
//! their target by stack and unit position, so ids are assigned while
//! reading and sends are resolved in a second pass.

use std::collections::HashMap;

use binrw::io::Cursor;
use binrw::{BinRead, BinReaderExt};
use ks_ir::{Instrument, OptionalInteger, OscillatorType, Patch, Unit, UnitType};

use crate::FormatError;

const MAX_INSTRUMENTS: usize = 16;
const MAX_UNITS: usize = 64;
const LEGACY_MAX_UNITS: usize = 32;
const NAME_LEN: usize = 64;

/// Stack index used for the global unit block.
const GLOBAL_STACK: usize = MAX_INSTRUMENTS;
/// `dest_stack` value meaning "the sending instrument", taken as its index
/// in the imported patch rather than its stack.
const LOCAL_STACK: u8 = 255;

/// Delay lengths as numerators of a 48th of a beat.
const DELAY_FRACTIONS: [i32; 33] = [
    4, 6, 9, 8, 12, 18, 16, 24, 36, 32, 48, 72, 64, 96, 144, 128, 192, 288, 256, 384, 576, 72,
    120, 168, 216, 264, 312, 360, 144, 240, 336, 288, 288,
];

const REVERB_LEFT: [i32; 8] = [1116, 1188, 1276, 1356, 1422, 1492, 1556, 1618];
const REVERB_RIGHT: [i32; 8] = [1140, 1212, 1300, 1380, 1446, 1516, 1580, 1642];

/// Delay time used for note-tracking delays.
const NOTE_TRACKING_DELAY: i32 = 10787;

/// Send destination slots: unit type name and port names per slot, indexed
/// by the 4klang unit id. Some entries name no native type; sends into them
/// keep port 0.
const PORT_TABLE: [(&str, [&str; 8]); 12] = [
    ("", ["", "", "", "", "", "", "", ""]),
    ("envelope", ["", "", "gain", "attack", "decay", "", "release", ""]),
    ("oscillator", ["", "transpose", "detune", "", "phase", "color", "shape", "gain"]),
    ("filter", ["", "", "", "", "frequency", "resonance", "", ""]),
    ("envelope", ["", "", "drive", "frequency", "", "", "", ""]),
    ("delay", ["pregain", "feedback", "dry", "damp", "", "", "", ""]),
    ("", ["", "", "", "", "", "", "", ""]),
    ("", ["", "", "", "", "", "", "", ""]),
    ("pan", ["panning", "", "", "", "", "", "", ""]),
    ("outaux", ["auxgain", "outgain", "", "", "", "", "", ""]),
    ("", ["", "", "", "", "", "", "", ""]),
    ("load", ["value", "", "", "", "", "", "", ""]),
];

/// Distortion is split into distort + hold; its slot 3 is the hold rate.
const DISTORTION_ID: u8 = 4;
const DISTORTION_HOLD_SLOT: u8 = 3;

#[derive(BinRead, Debug)]
#[br(little, import(legacy: bool))]
struct UnitRecord {
    kind: u8,
    values: [u8; 15],
    /// Versions up to 4k13 carry 16 unused bytes per unit
    #[br(if(legacy))]
    _padding: Option<[u8; 16]>,
}

#[derive(BinRead, Debug)]
#[br(little)]
struct PatchHeader {
    _polyphony: u32,
    names: [[u8; NAME_LEN]; MAX_INSTRUMENTS],
}

/// Where a 4klang send points, before resolution.
#[derive(Clone, Copy, Debug)]
struct SendDestination {
    stack: u8,
    unit: u8,
    slot: u8,
    id: u8,
}

/// A send waiting for the second pass.
struct PendingSend {
    instrument: usize,
    unit: usize,
    stack: usize,
    dest: SendDestination,
}

/// State shared by all unit blocks of one file.
struct Importer {
    version: u32,
    next_id: u32,
    /// First native id of each (stack, unit) position that produced units
    targets: HashMap<(usize, usize), u32>,
    sends: Vec<PendingSend>,
}

/// Read a 4klang patch (`.4kp`).
///
/// Instruments whose stacks are empty are skipped; the global stack becomes
/// an instrument named "Global" if it has any units. Every instrument gets
/// one voice.
pub fn read_4klang_patch(data: &[u8]) -> Result<Patch, FormatError> {
    let mut reader = Cursor::new(data);
    let version = read_version(&mut reader)?;
    let header: PatchHeader = reader.read_le()?;

    let mut importer = Importer::new(version);
    let mut patch = Patch::new();
    for (stack, raw_name) in header.names.iter().enumerate() {
        let units = importer.read_units(&mut reader, stack, patch.instruments.len())?;
        if !units.is_empty() {
            patch.instruments.push(instrument(&decode_name(raw_name), units));
        }
    }
    let units = importer.read_units(&mut reader, GLOBAL_STACK, patch.instruments.len())?;
    if !units.is_empty() {
        patch.instruments.push(instrument("Global", units));
    }

    importer.resolve_sends(&mut patch);
    log::debug!(
        "[4klang] read v{} patch: {} instruments, {} units",
        version,
        patch.instruments.len(),
        patch.instruments.iter().map(|i| i.units.len()).sum::<usize>()
    );
    Ok(patch)
}

/// Read a 4klang instrument (`.4ki`).
pub fn read_4klang_instrument(data: &[u8]) -> Result<Instrument, FormatError> {
    let mut reader = Cursor::new(data);
    let version = read_version(&mut reader)?;
    let raw_name: [u8; NAME_LEN] = reader.read_le()?;

    let mut importer = Importer::new(version);
    let units = importer.read_units(&mut reader, 0, 0)?;
    let mut patch = Patch::from(vec![instrument(&decode_name(&raw_name), units)]);
    importer.resolve_sends(&mut patch);
    let instr = patch.instruments.remove(0);
    log::debug!(
        "[4klang] read v{} instrument \"{}\": {} units",
        version,
        instr.name,
        instr.units.len()
    );
    Ok(instr)
}

fn read_version(reader: &mut Cursor<&[u8]>) -> Result<u32, FormatError> {
    let tag: u32 = reader.read_le()?;
    match &tag.to_le_bytes() {
        b"4k11" => Ok(11),
        b"4k12" => Ok(12),
        b"4k13" => Ok(13),
        b"4k14" => Ok(14),
        _ => Err(FormatError::UnsupportedVersion(tag)),
    }
}

/// Name up to the first NUL, or all 64 bytes if there is none.
fn decode_name(raw: &[u8; NAME_LEN]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

fn instrument(name: &str, units: Vec<Unit>) -> Instrument {
    let mut instr = Instrument::new(name, 1);
    instr.units = units;
    instr
}

impl Importer {
    fn new(version: u32) -> Self {
        Self {
            version,
            next_id: 1,
            targets: HashMap::new(),
            sends: Vec::new(),
        }
    }

    /// Read one unit block. `instrument` is the index the block's units
    /// will have in the patch if the block turns out non-empty.
    fn read_units(
        &mut self,
        reader: &mut Cursor<&[u8]>,
        stack: usize,
        instrument: usize,
    ) -> Result<Vec<Unit>, FormatError> {
        let legacy = self.version <= 13;
        let count = if legacy { LEGACY_MAX_UNITS } else { MAX_UNITS };
        let mut units = Vec::new();
        for position in 0..count {
            let record: UnitRecord = reader.read_le_args((legacy,))?;
            let (converted, dest) = convert_unit(&record, self.version);
            if converted.is_empty() {
                if record.kind != 0 {
                    log::warn!(
                        "[4klang] skipping unknown unit type {} at stack {} unit {}",
                        record.kind,
                        stack,
                        position
                    );
                }
                continue;
            }
            self.targets.insert((stack, position), self.next_id);
            if let Some(dest) = dest {
                self.sends.push(PendingSend {
                    instrument,
                    unit: units.len(),
                    stack,
                    dest,
                });
            }
            for unit in converted {
                units.push(unit.with_id(self.next_id));
                self.next_id += 1;
            }
        }
        Ok(units)
    }

    fn resolve_sends(&self, patch: &mut Patch) {
        for send in &self.sends {
            let dest = send.dest;
            let stack = if dest.stack == LOCAL_STACK {
                send.instrument
            } else {
                dest.stack as usize
            };
            let mut target = self.targets.get(&(stack, dest.unit as usize)).copied();
            if target.is_none() {
                log::warn!(
                    "[4klang] send at stack {} targets empty stack {} unit {}",
                    send.stack,
                    stack,
                    dest.unit
                );
            }
            let mut port = OptionalInteger::empty();
            if (dest.id as usize) < PORT_TABLE.len() && dest.slot < 8 {
                if dest.id == DISTORTION_ID && dest.slot == DISTORTION_HOLD_SLOT {
                    target = target.map(|t| t + 1);
                    port = OptionalInteger::of(0);
                } else {
                    port = resolve_port(dest.id, dest.slot);
                }
            }

            let Some(unit) = patch
                .instruments
                .get_mut(send.instrument)
                .and_then(|i| i.units.get_mut(send.unit))
            else {
                continue;
            };
            unit.set("target", target.unwrap_or(0) as i32).ok();
            if let Some(p) = port.value() {
                unit.set("port", p).ok();
            }
        }
    }
}

/// Native port number of a 4klang (unit id, slot) send destination.
fn resolve_port(id: u8, slot: u8) -> OptionalInteger {
    let Some((type_name, slots)) = PORT_TABLE.get(id as usize) else {
        return OptionalInteger::empty();
    };
    let Some(port_name) = slots.get(slot as usize) else {
        return OptionalInteger::empty();
    };
    UnitType::from_name(type_name)
        .and_then(|t| t.port_index(port_name))
        .map(|p| p as i32)
        .into()
}

/// Translate one record. Unknown and empty records give no units.
fn convert_unit(record: &UnitRecord, version: u32) -> (Vec<Unit>, Option<SendDestination>) {
    let v = &record.values;
    let units = match record.kind {
        1 => vec![Unit::new(UnitType::Envelope)
            .with("attack", v[0] as i32)
            .with("decay", v[1] as i32)
            .with("sustain", v[2] as i32)
            .with("release", v[3] as i32)
            .with("gain", v[4] as i32)],
        2 => vec![convert_oscillator(v, version)],
        3 => vec![convert_filter(v)],
        4 => vec![
            Unit::new(UnitType::Distort)
                .with("drive", v[0] as i32)
                .with("stereo", v[2] as i32),
            Unit::new(UnitType::Hold)
                .with("holdfreq", v[1] as i32)
                .with("stereo", v[2] as i32),
        ],
        5 => vec![convert_delay(v)],
        6 => convert_fop(v[0]),
        7 => {
            let send = Unit::new(UnitType::Send)
                .with("amount", v[0] as i32)
                .with("sendpop", (v[1] & 0x40 != 0) as i32);
            let dest = SendDestination {
                stack: v[2],
                unit: v[3],
                slot: v[4],
                id: v[5],
            };
            return (vec![send], Some(dest));
        }
        8 => vec![Unit::new(UnitType::Pan).with("panning", v[0] as i32)],
        9 => vec![Unit::new(UnitType::Outaux)
            .with("stereo", 1)
            .with("outgain", v[0] as i32)
            .with("auxgain", v[1] as i32)],
        10 => vec![Unit::new(UnitType::In)
            .with("stereo", 1)
            .with("channel", if v[0] != 0 { 2 } else { 0 })],
        11 => vec![Unit::new(UnitType::Loadval).with("value", v[0] as i32)],
        _ => Vec::new(),
    };
    (units, None)
}

fn convert_oscillator(v: &[u8; 15], version: u32) -> Unit {
    let mut fields = v.iter().map(|&b| b as i32);
    let mut next = || fields.next().unwrap_or(0);
    let transpose = next();
    let detune = next();
    let phase = next();
    let gate = if version <= 11 { 0x55 } else { next() };
    let mut color = next();
    let shape = next();
    let gain = next();
    let flags = next();

    let stereo = (flags & 0x40 != 0) as i32;
    let lfo = (flags & 0x10 != 0) as i32;
    let mut kind = OscillatorType::Sine;
    if flags & 0x01 != 0 {
        if version <= 13 {
            color = 128;
        }
    } else if flags & 0x02 != 0 {
        kind = OscillatorType::Trisaw;
    } else if flags & 0x04 != 0 {
        kind = OscillatorType::Pulse;
    } else if flags & 0x08 != 0 {
        return Unit::new(UnitType::Noise)
            .with("stereo", stereo)
            .with("shape", shape)
            .with("gain", gain);
    } else if flags & 0x20 != 0 {
        kind = OscillatorType::Gate;
        color = gate;
    }
    Unit::new(UnitType::Oscillator)
        .with("stereo", stereo)
        .with("transpose", transpose)
        .with("detune", detune)
        .with("phase", phase)
        .with("color", color)
        .with("shape", shape)
        .with("gain", gain)
        .with("type", kind as i32)
        .with("lfo", lfo)
}

fn convert_filter(v: &[u8; 15]) -> Unit {
    let flags = v[2];
    let mut lowpass = 0;
    let mut bandpass = 0;
    let mut highpass = 0;
    if flags & 0x01 != 0 {
        lowpass = 1;
    }
    if flags & 0x02 != 0 {
        highpass = 1;
    }
    if flags & 0x04 != 0 {
        bandpass = 1;
    }
    if flags & 0x08 != 0 {
        lowpass = 1;
        highpass = -1;
    }
    Unit::new(UnitType::Filter)
        .with("stereo", (flags & 0x10 != 0) as i32)
        .with("frequency", v[0] as i32)
        .with("resonance", v[1] as i32)
        .with("lowpass", lowpass)
        .with("bandpass", bandpass)
        .with("highpass", highpass)
}

fn convert_delay(v: &[u8; 15]) -> Unit {
    let mut notetracking = 0;
    let times: Vec<i32> = if v[11] > 0 {
        if v[10] > 0 {
            REVERB_LEFT.to_vec()
        } else {
            REVERB_RIGHT.to_vec()
        }
    } else {
        match v[9] {
            0 => vec![v[8] as i32 * 16],
            1 => {
                notetracking = 2;
                let index = (v[8] >> 2) as usize;
                vec![DELAY_FRACTIONS.get(index).copied().unwrap_or(48)]
            }
            2 => {
                notetracking = 1;
                vec![NOTE_TRACKING_DELAY]
            }
            _ => Vec::new(),
        }
    };
    Unit::new(UnitType::Delay)
        .with("pregain", v[0] as i32)
        .with("dry", v[1] as i32)
        .with("feedback", v[2] as i32)
        .with("damp", v[3] as i32)
        .with("notetracking", notetracking)
        .with_varargs(times)
}

fn convert_fop(op: u8) -> Vec<Unit> {
    let (unit_type, stereo) = match op {
        1 => (UnitType::Pop, 0),
        2 => (UnitType::Addp, 0),
        3 => (UnitType::Mulp, 0),
        4 => (UnitType::Push, 0),
        5 => (UnitType::Xch, 0),
        6 => (UnitType::Add, 0),
        7 => (UnitType::Mul, 0),
        8 => (UnitType::Addp, 1),
        // 4klang notes are 0..1, native loadnote gives -1..1
        9 => {
            return vec![
                Unit::new(UnitType::Loadnote),
                Unit::new(UnitType::Loadval).with("value", 128),
                Unit::new(UnitType::Addp),
                Unit::new(UnitType::Gain).with("gain", 64),
            ]
        }
        _ => (UnitType::Mulp, 1),
    };
    vec![Unit::new(unit_type).with("stereo", stereo)]
}
