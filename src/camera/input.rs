//! Key register decoding

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Buttons as bits of the key input register.
    ///
    /// A set bit means "pressed" once decoded with [`KeyDecoding::ActiveLow`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KeyMask: u16 {
        const A      = 0x0001;
        const B      = 0x0002;
        const SELECT = 0x0004;
        const START  = 0x0008;
        const RIGHT  = 0x0010;
        const LEFT   = 0x0020;
        const UP     = 0x0040;
        const DOWN   = 0x0080;
        const R      = 0x0100;
        const L      = 0x0200;
        /// Every bit that maps to a real button
        const ANY    = 0x03FF;
    }
}

/// How a raw key register value is turned into a [`KeyMask`].
///
/// The register is active low: a held button reads as 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyDecoding {
    /// `!register & ANY`: set bits are held buttons
    ActiveLow,
    /// `register & ANY`: set bits are released buttons
    Raw,
}

impl KeyDecoding {
    pub fn decode(self, register: u16) -> KeyMask {
        let bits = match self {
            KeyDecoding::ActiveLow => !register,
            KeyDecoding::Raw => register,
        };
        KeyMask::from_bits_truncate(bits & KeyMask::ANY.bits())
    }
}
