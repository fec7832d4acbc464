//! Two-byte send addresses.
//!
//! A send writes into a port of a unit in the kernel's workspace. Each unit
//! owns 16 slots (8 of state, then 8 ports), and slot 0 of every voice
//! holds note/release data, hence the `+1` on the unit index. Global sends
//! set the top bit and skip the 16 slots of out/aux ports before the voice
//! array; each voice takes 1024 slots.

/// Address written when a send target cannot be found. It lands on the
/// last slots of the workspace, which nothing reads.
pub const UNRESOLVED: u16 = 0xFFF7;

const GLOBAL: u16 = 0x8000;
const POP: u16 = 0x8;
const VOICE_STRIDE: u16 = 0x400;
const GLOBAL_OFFSET: u16 = 16;

/// Decoded form of a send address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SendAddress {
    /// Absolute target voice for a global send; `None` for a send into the
    /// sending voice itself
    pub voice: Option<u16>,
    /// Unit index within the target instrument, 0..63
    pub unit: u16,
    /// Port of the target unit, 0..8
    pub port: u16,
    /// Pop the sent signal off the stack
    pub pop: bool,
}

impl SendAddress {
    pub const fn local(unit: u16, port: u16, pop: bool) -> Self {
        Self { voice: None, unit, port, pop }
    }

    pub const fn global(voice: u16, unit: u16, port: u16, pop: bool) -> Self {
        Self { voice: Some(voice), unit, port, pop }
    }

    /// Pack into the 16-bit form read by the kernel.
    pub fn encode(self) -> u16 {
        let mut address = ((u32::from(self.unit) + 1) << 4) + u32::from(self.port & 7);
        if let Some(voice) = self.voice {
            address += u32::from(GLOBAL + GLOBAL_OFFSET) + u32::from(voice) * u32::from(VOICE_STRIDE);
        }
        if self.pop {
            address |= u32::from(POP);
        }
        address as u16
    }

    /// Unpack a 16-bit address. [`UNRESOLVED`] addresses decode to
    /// meaningless fields.
    pub fn decode(address: u16) -> Self {
        let pop = address & POP != 0;
        let port = address & 7;
        if address & GLOBAL != 0 {
            let rest = address.wrapping_sub(GLOBAL + GLOBAL_OFFSET);
            Self {
                voice: Some(rest / VOICE_STRIDE),
                unit: ((rest % VOICE_STRIDE) >> 4).wrapping_sub(1),
                port,
                pop,
            }
        } else {
            Self {
                voice: None,
                unit: (address >> 4).wrapping_sub(1),
                port,
                pop,
            }
        }
    }

    /// Little-endian bytes, as emitted into the value stream.
    pub fn to_bytes(self) -> [u8; 2] {
        self.encode().to_le_bytes()
    }
}

/// Address bytes of an unresolved send.
pub fn unresolved_bytes(pop: bool) -> [u8; 2] {
    let address = if pop { UNRESOLVED | POP } else { UNRESOLVED };
    address.to_le_bytes()
}
