use core::fmt;

use serde::{Deserialize, Serialize};

/// VME address modifier code (the six AM lines driven by the master).
///
/// The raw code is kept as-is so unsupported modifiers survive long enough to be reported back to
/// whoever asked for them.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressModifier(u8);

impl AddressModifier {
    /// A32 non-privileged data access, single cycle.
    pub const A32_SC: Self = Self(0x09);
    /// A32 supervisory data access, single cycle.
    pub const A32_SUP_SC: Self = Self(0x0D);
    /// A32 non-privileged block transfer.
    pub const A32_BLT: Self = Self(0x0B);
    /// A16 non-privileged access, single cycle.
    pub const A16_SC: Self = Self(0x29);
    /// A16 supervisory access.
    pub const A16_SUP: Self = Self(0x2D);
    /// A24 non-privileged data access, single cycle.
    pub const A24_SC: Self = Self(0x39);
    /// A24 non-privileged block transfer.
    pub const A24_BLT: Self = Self(0x3B);
    /// A24 supervisory data access, single cycle.
    pub const A24_SUP_SC: Self = Self(0x3D);

    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Whether this is one of the short non-privileged single-cycle forms the bus can install.
    pub const fn is_single_cycle(self) -> bool {
        matches!(self, Self::A16_SC | Self::A24_SC | Self::A32_SC)
    }

    /// Number of address lines qualified by this modifier, for the modifiers this crate knows.
    pub const fn address_bits(self) -> Option<u8> {
        match self {
            Self::A16_SC | Self::A16_SUP => Some(16),
            Self::A24_SC | Self::A24_BLT | Self::A24_SUP_SC => Some(24),
            Self::A32_SC | Self::A32_BLT | Self::A32_SUP_SC => Some(32),
            _ => None,
        }
    }
}

impl fmt::Display for AddressModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AM{:02x}", self.0)
    }
}

/// Data transfer width of a card's handler pair.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum DataWidth {
    D8,
    D16,
    D32,
}

impl DataWidth {
    pub const fn bits(self) -> u32 {
        match self {
            Self::D8 => 8,
            Self::D16 => 16,
            Self::D32 => 32,
        }
    }

    pub const fn bytes(self) -> u32 {
        self.bits() / 8
    }
}

impl fmt::Display for DataWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{}", self.bits())
    }
}
