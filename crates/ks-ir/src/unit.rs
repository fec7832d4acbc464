//! Units: one instance of a unit type with its parameter values.

use alloc::string::ToString;
use alloc::vec::Vec;
use arrayvec::ArrayVec;

use crate::error::PatchError;
use crate::unit_type::{UnitParameter, UnitType};

/// Largest parameter schema of any unit type (oscillator).
pub const MAX_PARAMS: usize = 14;

/// Waveform selected by an oscillator's `type` parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OscillatorType {
    #[default]
    Sine = 0,
    Trisaw = 1,
    Pulse = 2,
    Gate = 3,
    Sample = 4,
}

impl OscillatorType {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Sine),
            1 => Some(Self::Trisaw),
            2 => Some(Self::Pulse),
            3 => Some(Self::Gate),
            4 => Some(Self::Sample),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Sine => "sine",
            Self::Trisaw => "trisaw",
            Self::Pulse => "pulse",
            Self::Gate => "gate",
            Self::Sample => "sample",
        }
    }
}

/// A unit in an instrument's chain.
///
/// Parameter values are stored in schema order; every parameter of the
/// type has a slot, unset ones read as 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unit {
    pub unit_type: UnitType,
    /// Identifier used by `send` targets; 0 means anonymous
    pub id: u32,
    values: ArrayVec<i32, MAX_PARAMS>,
    /// Extra integers; for `delay` these are the delay line lengths
    pub varargs: Vec<i32>,
}

impl Unit {
    /// Create a unit with all parameters zeroed.
    pub fn new(unit_type: UnitType) -> Self {
        Self {
            unit_type,
            id: 0,
            values: unit_type.params().iter().map(|_| 0).collect(),
            varargs: Vec::new(),
        }
    }

    /// Builder: set the id.
    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    /// Builder: set a parameter. Unknown names are ignored in release
    /// builds and panic in debug builds.
    pub fn with(mut self, name: &str, value: i32) -> Self {
        let result = self.set(name, value);
        debug_assert!(result.is_ok(), "{:?}", result);
        self
    }

    /// Builder: set the varargs.
    pub fn with_varargs(mut self, varargs: Vec<i32>) -> Self {
        self.varargs = varargs;
        self
    }

    /// Value of a parameter, 0 if the type has no such parameter.
    pub fn param(&self, name: &str) -> i32 {
        self.unit_type
            .param_index(name)
            .and_then(|i| self.values.get(i).copied())
            .unwrap_or(0)
    }

    /// Set a parameter value.
    pub fn set(&mut self, name: &str, value: i32) -> Result<(), PatchError> {
        let index = self
            .unit_type
            .param_index(name)
            .ok_or_else(|| PatchError::UnknownParameter {
                unit_type: self.unit_type,
                name: name.to_string(),
            })?;
        self.values[index] = value;
        Ok(())
    }

    /// Parameter values in schema order.
    pub fn values(&self) -> &[i32] {
        &self.values
    }

    /// Schema entries paired with their values.
    pub fn params(&self) -> impl Iterator<Item = (&'static UnitParameter, i32)> + '_ {
        self.unit_type.params().iter().zip(self.values.iter().copied())
    }

    pub fn stereo(&self) -> bool {
        self.param("stereo") == 1
    }

    /// Number of channels the unit works on.
    pub fn channels(&self) -> i32 {
        if self.stereo() {
            2
        } else {
            1
        }
    }

    /// Waveform of an oscillator, `None` for other types or invalid values.
    pub fn oscillator_type(&self) -> Option<OscillatorType> {
        match self.unit_type {
            UnitType::Oscillator => OscillatorType::from_i32(self.param("type")),
            _ => None,
        }
    }

    /// Net change of the signal stack depth when the unit runs.
    pub fn stack_change(&self) -> i32 {
        let channels = self.channels();
        match self.unit_type {
            UnitType::Addp
            | UnitType::Mulp
            | UnitType::Pop
            | UnitType::Out
            | UnitType::Outaux
            | UnitType::Aux => -channels,
            UnitType::Envelope
            | UnitType::Oscillator
            | UnitType::Push
            | UnitType::Noise
            | UnitType::Receive
            | UnitType::Loadnote
            | UnitType::Loadval
            | UnitType::In
            | UnitType::Compressor => channels,
            UnitType::Pan => {
                if self.stereo() {
                    0
                } else {
                    1
                }
            }
            UnitType::Speed => -1,
            UnitType::Send => {
                if self.param("sendpop") == 1 {
                    -channels
                } else {
                    0
                }
            }
            _ => 0,
        }
    }

    /// Minimum stack depth required before the unit runs.
    pub fn stack_need(&self) -> i32 {
        let channels = self.channels();
        match self.unit_type {
            UnitType::Envelope
            | UnitType::Oscillator
            | UnitType::Noise
            | UnitType::Receive
            | UnitType::Loadnote
            | UnitType::Loadval
            | UnitType::In => 0,
            UnitType::Mul
            | UnitType::Mulp
            | UnitType::Add
            | UnitType::Addp
            | UnitType::Xch => 2 * channels,
            UnitType::Speed => 1,
            _ => channels,
        }
    }
}
