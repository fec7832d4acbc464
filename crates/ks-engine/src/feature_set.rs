//! Feature sets: which unit types a kernel supports and their opcodes.
//!
//! Opcode 0 is reserved for the instrument advance; every unit type gets an
//! even base opcode and its stereo variant is the next odd number.

use alloc::vec::Vec;

use ks_ir::{Patch, UnitType};

/// Opcode numbering and capabilities of a target kernel.
pub trait FeatureSet {
    /// Base opcode of a unit type, `None` if the kernel lacks it.
    fn opcode(&self, unit_type: UnitType) -> Option<u8>;

    /// Supported unit types in opcode order.
    fn instructions(&self) -> &[UnitType];

    /// Kernel handles instruments with more than one voice.
    fn supports_polyphony(&self) -> bool;

    /// Kernel handles sends into other instruments or explicit voices.
    fn supports_global_send(&self) -> bool;
}

/// Every unit type, numbered alphabetically.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllFeatures;

impl FeatureSet for AllFeatures {
    fn opcode(&self, unit_type: UnitType) -> Option<u8> {
        let rank = UnitType::ALL.iter().position(|&t| t == unit_type)?;
        Some(((rank + 1) * 2) as u8)
    }

    fn instructions(&self) -> &[UnitType] {
        &UnitType::ALL
    }

    fn supports_polyphony(&self) -> bool {
        true
    }

    fn supports_global_send(&self) -> bool {
        true
    }
}

/// Only the unit types a patch uses, numbered in order of first use.
#[derive(Clone, Debug, Default)]
pub struct NecessaryFeatures {
    instructions: Vec<UnitType>,
    polyphony: bool,
    global_send: bool,
}

impl NecessaryFeatures {
    pub fn for_patch(patch: &Patch) -> Self {
        let mut features = Self::default();
        for (i, instr) in patch.instruments.iter().enumerate() {
            for unit in &instr.units {
                if !features.instructions.contains(&unit.unit_type) {
                    features.instructions.push(unit.unit_type);
                }
                if unit.unit_type != UnitType::Send {
                    continue;
                }
                let Ok((target_instr, _)) = patch.find_send_target(unit.param("target") as u32) else {
                    continue;
                };
                if target_instr != i || unit.param("voice") > 0 {
                    features.global_send = true;
                }
            }
            if instr.num_voices > 1 {
                features.polyphony = true;
            }
        }
        features
    }
}

impl FeatureSet for NecessaryFeatures {
    fn opcode(&self, unit_type: UnitType) -> Option<u8> {
        let index = self.instructions.iter().position(|&t| t == unit_type)?;
        Some(((index + 1) * 2) as u8)
    }

    fn instructions(&self) -> &[UnitType] {
        &self.instructions
    }

    fn supports_polyphony(&self) -> bool {
        self.polyphony
    }

    fn supports_global_send(&self) -> bool {
        self.global_send
    }
}
