//! Unit type registry.
//!
//! Every unit type, its ordered parameter schema, and the ports derived
//! from the modulatable parameters. The tables are `const` data; port
//! lists are computed from them on demand, so there is no global state
//! to initialise.

use core::fmt;
use core::str::FromStr;

use alloc::string::ToString;

use crate::error::PatchError;

/// One parameter of a unit type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitParameter {
    /// Parameter name, unique within its unit type
    pub name: &'static str,
    /// Minimum value, inclusive
    pub min: i32,
    /// Maximum value, inclusive; -1 means unbounded / derived at runtime
    pub max: i32,
    /// Can be given a value in the patch
    pub can_set: bool,
    /// Has a port number that `send` units can target
    pub can_modulate: bool,
}

impl UnitParameter {
    /// Returns true if the parameter has no fixed upper bound.
    pub const fn is_unbounded(&self) -> bool {
        self.max == -1
    }
}

const fn setting(name: &'static str, min: i32, max: i32) -> UnitParameter {
    UnitParameter { name, min, max, can_set: true, can_modulate: false }
}

const fn knob(name: &'static str) -> UnitParameter {
    UnitParameter { name, min: 0, max: 128, can_set: true, can_modulate: true }
}

const fn input(name: &'static str) -> UnitParameter {
    UnitParameter { name, min: 0, max: -1, can_set: false, can_modulate: true }
}

const STEREO: UnitParameter = setting("stereo", 0, 1);

const STEREO_ONLY: &[UnitParameter] = &[STEREO];
const NO_PARAMS: &[UnitParameter] = &[];

const DISTORT: &[UnitParameter] = &[STEREO, knob("drive")];
const HOLD: &[UnitParameter] = &[STEREO, knob("holdfreq")];
const CRUSH: &[UnitParameter] = &[STEREO, knob("resolution")];
const GAIN: &[UnitParameter] = &[STEREO, knob("gain")];
const INVGAIN: &[UnitParameter] = &[STEREO, knob("invgain")];
const FILTER: &[UnitParameter] = &[
    STEREO,
    knob("frequency"),
    knob("resonance"),
    setting("lowpass", 0, 1),
    setting("bandpass", -1, 1),
    setting("highpass", -1, 1),
    setting("negbandpass", 0, 1),
    setting("neghighpass", 0, 1),
];
const PAN: &[UnitParameter] = &[STEREO, knob("panning")];
const DELAY: &[UnitParameter] = &[
    STEREO,
    knob("pregain"),
    knob("dry"),
    knob("feedback"),
    knob("damp"),
    setting("notetracking", 0, 2),
    input("delaytime"),
];
const COMPRESSOR: &[UnitParameter] = &[
    STEREO,
    knob("attack"),
    knob("release"),
    knob("invgain"),
    knob("threshold"),
    knob("ratio"),
];
const OUT: &[UnitParameter] = &[STEREO, knob("gain")];
const OUTAUX: &[UnitParameter] = &[STEREO, knob("outgain"), knob("auxgain")];
const AUX: &[UnitParameter] = &[STEREO, knob("gain"), setting("channel", 0, 6)];
const SEND: &[UnitParameter] = &[
    STEREO,
    knob("amount"),
    setting("voice", 0, 32),
    setting("target", 0, i32::MAX),
    setting("port", 0, 7),
    setting("sendpop", 0, 1),
];
const ENVELOPE: &[UnitParameter] = &[
    STEREO,
    knob("attack"),
    knob("decay"),
    knob("sustain"),
    knob("release"),
    knob("gain"),
];
const NOISE: &[UnitParameter] = &[STEREO, knob("shape"), knob("gain")];
const OSCILLATOR: &[UnitParameter] = &[
    STEREO,
    knob("transpose"),
    knob("detune"),
    knob("phase"),
    knob("color"),
    knob("shape"),
    knob("gain"),
    input("frequency"),
    setting("type", 0, 4),
    setting("lfo", 0, 1),
    setting("unison", 0, 3),
    setting("samplestart", 0, 1_720_329),
    setting("loopstart", 0, 65535),
    setting("looplength", 0, 65535),
];
const LOADVAL: &[UnitParameter] = &[STEREO, knob("value")];
const RECEIVE: &[UnitParameter] = &[STEREO, input("left"), input("right")];
const IN: &[UnitParameter] = &[STEREO, setting("channel", 0, 6)];

/// The closed set of unit types.
///
/// Variants are declared in alphabetical order of their names, so the
/// derived `Ord` matches sorting by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UnitType {
    Add,
    Addp,
    Aux,
    Clip,
    Compressor,
    Crush,
    Delay,
    Distort,
    Envelope,
    Filter,
    Gain,
    Hold,
    In,
    Invgain,
    Loadnote,
    Loadval,
    Mul,
    Mulp,
    Noise,
    Oscillator,
    Out,
    Outaux,
    Pan,
    Pop,
    Push,
    Receive,
    Send,
    Speed,
    Sync,
    Xch,
}

impl UnitType {
    /// All unit types, sorted by name.
    pub const ALL: [UnitType; 30] = [
        UnitType::Add,
        UnitType::Addp,
        UnitType::Aux,
        UnitType::Clip,
        UnitType::Compressor,
        UnitType::Crush,
        UnitType::Delay,
        UnitType::Distort,
        UnitType::Envelope,
        UnitType::Filter,
        UnitType::Gain,
        UnitType::Hold,
        UnitType::In,
        UnitType::Invgain,
        UnitType::Loadnote,
        UnitType::Loadval,
        UnitType::Mul,
        UnitType::Mulp,
        UnitType::Noise,
        UnitType::Oscillator,
        UnitType::Out,
        UnitType::Outaux,
        UnitType::Pan,
        UnitType::Pop,
        UnitType::Push,
        UnitType::Receive,
        UnitType::Send,
        UnitType::Speed,
        UnitType::Sync,
        UnitType::Xch,
    ];

    /// Lowercase tag of the unit type.
    pub const fn name(self) -> &'static str {
        match self {
            UnitType::Add => "add",
            UnitType::Addp => "addp",
            UnitType::Aux => "aux",
            UnitType::Clip => "clip",
            UnitType::Compressor => "compressor",
            UnitType::Crush => "crush",
            UnitType::Delay => "delay",
            UnitType::Distort => "distort",
            UnitType::Envelope => "envelope",
            UnitType::Filter => "filter",
            UnitType::Gain => "gain",
            UnitType::Hold => "hold",
            UnitType::In => "in",
            UnitType::Invgain => "invgain",
            UnitType::Loadnote => "loadnote",
            UnitType::Loadval => "loadval",
            UnitType::Mul => "mul",
            UnitType::Mulp => "mulp",
            UnitType::Noise => "noise",
            UnitType::Oscillator => "oscillator",
            UnitType::Out => "out",
            UnitType::Outaux => "outaux",
            UnitType::Pan => "pan",
            UnitType::Pop => "pop",
            UnitType::Push => "push",
            UnitType::Receive => "receive",
            UnitType::Send => "send",
            UnitType::Speed => "speed",
            UnitType::Sync => "sync",
            UnitType::Xch => "xch",
        }
    }

    /// Look up a unit type by its lowercase tag.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// Ordered parameter schema.
    pub const fn params(self) -> &'static [UnitParameter] {
        match self {
            UnitType::Add
            | UnitType::Addp
            | UnitType::Pop
            | UnitType::Loadnote
            | UnitType::Mul
            | UnitType::Mulp
            | UnitType::Push
            | UnitType::Xch
            | UnitType::Clip => STEREO_ONLY,
            UnitType::Speed | UnitType::Sync => NO_PARAMS,
            UnitType::Distort => DISTORT,
            UnitType::Hold => HOLD,
            UnitType::Crush => CRUSH,
            UnitType::Gain => GAIN,
            UnitType::Invgain => INVGAIN,
            UnitType::Filter => FILTER,
            UnitType::Pan => PAN,
            UnitType::Delay => DELAY,
            UnitType::Compressor => COMPRESSOR,
            UnitType::Out => OUT,
            UnitType::Outaux => OUTAUX,
            UnitType::Aux => AUX,
            UnitType::Send => SEND,
            UnitType::Envelope => ENVELOPE,
            UnitType::Noise => NOISE,
            UnitType::Oscillator => OSCILLATOR,
            UnitType::Loadval => LOADVAL,
            UnitType::Receive => RECEIVE,
            UnitType::In => IN,
        }
    }

    /// Index of a parameter in the schema.
    pub fn param_index(self, name: &str) -> Option<usize> {
        self.params().iter().position(|p| p.name == name)
    }

    /// Schema entry of a parameter.
    pub fn param(self, name: &str) -> Option<&'static UnitParameter> {
        self.params().iter().find(|p| p.name == name)
    }

    /// Returns false for the types that are always mono (`speed`, `sync`).
    pub const fn has_stereo(self) -> bool {
        !matches!(self, UnitType::Speed | UnitType::Sync)
    }

    /// Names of the modulatable parameters, in port order.
    pub fn ports(self) -> impl Iterator<Item = &'static str> {
        self.params().iter().filter(|p| p.can_modulate).map(|p| p.name)
    }

    /// Number of ports.
    pub fn num_ports(self) -> usize {
        self.ports().count()
    }

    /// Port number of a modulatable parameter.
    pub fn port_index(self, name: &str) -> Option<usize> {
        self.ports().position(|p| p == name)
    }

    /// Name of the parameter behind a port.
    pub fn port_name(self, port: usize) -> Option<&'static str> {
        self.ports().nth(port)
    }

    /// Parameter behind a port, with its index in the full schema.
    pub fn find_param_for_port(self, port: usize) -> Option<(usize, &'static UnitParameter)> {
        self.params()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.can_modulate)
            .nth(port)
    }

    /// Parameters that are written to the value stream, in order.
    pub fn encoded_params(self) -> impl Iterator<Item = &'static UnitParameter> {
        self.params().iter().filter(|p| p.can_set && p.can_modulate)
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UnitType {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| PatchError::UnknownUnitType(s.to_string()))
    }
}
