//! Instruments: a named chain of units with a voice count.

use alloc::string::String;
use alloc::vec::Vec;
use arrayvec::ArrayString;

use crate::error::PatchError;
use crate::unit::Unit;

/// Maximum number of units in one instrument.
pub const MAX_UNITS: usize = 63;

/// An instrument definition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Instrument {
    /// Instrument name
    pub name: ArrayString<64>,
    /// Free-form comment
    pub comment: String,
    /// Number of polyphonic voices, at least 1 for a valid patch
    pub num_voices: usize,
    /// Units, executed in order
    pub units: Vec<Unit>,
}

impl Instrument {
    /// Create an empty instrument. Names are cut to 64 bytes at a char
    /// boundary.
    pub fn new(name: &str, num_voices: usize) -> Self {
        let mut inst = Self {
            num_voices,
            ..Self::default()
        };
        for c in name.chars() {
            if inst.name.try_push(c).is_err() {
                break;
            }
        }
        inst
    }

    /// Builder: append a unit.
    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.units.push(unit);
        self
    }

    /// Validate the unit count and voice count. `index` is used in errors.
    pub fn validate(&self, index: usize) -> Result<(), PatchError> {
        if self.units.len() > MAX_UNITS {
            return Err(PatchError::TooManyUnits {
                instrument: index,
                units: self.units.len(),
            });
        }
        if self.num_voices < 1 {
            return Err(PatchError::NoVoices(index));
        }
        Ok(())
    }

    /// Walk the units and check that the signal stack never underflows and
    /// is empty at the end. `index` is used in errors.
    pub fn check_stack(&self, index: usize) -> Result<(), PatchError> {
        let mut depth = 0;
        for (u, unit) in self.units.iter().enumerate() {
            let need = unit.stack_need();
            if depth < need {
                return Err(PatchError::StackUnderflow {
                    instrument: index,
                    unit: u,
                    unit_type: unit.unit_type,
                    need,
                    depth,
                });
            }
            depth += unit.stack_change();
        }
        if depth != 0 {
            return Err(PatchError::StackNotEmpty {
                instrument: index,
                depth,
            });
        }
        Ok(())
    }
}
