use thiserror::Error;

use crate::modifier::{AddressModifier, DataWidth};

pub type Result<T> = std::result::Result<T, VmeError>;

/// Errors raised while composing or starting a VME system.
///
/// Every variant is a configuration mistake. Callers are expected to abort start-up on any of
/// them; nothing here is retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VmeError {
    #[error("VME {width}: unsupported address modifier {modifier}")]
    UnsupportedAddressModifier {
        modifier: AddressModifier,
        width: DataWidth,
    },

    #[error("VME {width}: bus width {bus_width} not supported")]
    UnsupportedBusWidth { bus_width: u32, width: DataWidth },

    #[error("VME bus `{bus}`: processor `{cpu}` not found")]
    ProcessorNotFound { bus: String, cpu: String },

    #[error("VME bus `{bus}` has no address space yet")]
    AddressSpaceUnresolved { bus: String },

    #[error("invalid address range {start:#010x}..={end:#010x}")]
    InvalidRange { start: u32, end: u32 },

    #[error("unknown VME card `{name}`")]
    UnknownCard { name: String },

    #[error("duplicate device tag `{tag}`")]
    DuplicateTag { tag: String },

    #[error("slot `{slot}` is already occupied")]
    SlotOccupied { slot: String },

    #[error("invalid machine configuration: {0}")]
    InvalidConfig(String),
}
