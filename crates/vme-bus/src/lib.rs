//! VME backplane bus model.
//!
//! A [`VmeBus`] owns (or borrows from a host [`Processor`]) the address space that cards decode
//! in. Cards plug into [`VmeSlot`]s, learn their bus and slot during start-up, join the bus's
//! card list and install read/write handlers through [`VmeBus::install_device`]. Once installed,
//! host accesses go straight from the [`AddressSpace`] to the card's handlers.
//!
//! [`Machine`] ties the pieces together and runs the start-up phase; [`MachineConfig`] describes
//! a machine as JSON.

#![forbid(unsafe_code)]

pub mod bus;
pub mod card;
pub mod cards;
pub mod catalog;
pub mod config;
pub mod error;
pub mod machine;
pub mod modifier;
pub mod processor;
pub mod registry;
pub mod slot;
pub mod space;

pub use bus::{narrow_mask, BusId, VmeBus, DEFAULT_CPU_TAG, VME_A32_SPACE};
pub use card::{CardId, CardInterface, CardState, VmeCard};
pub use cards::{CardProfile, RegisterWindowCard};
pub use catalog::{create_card, find_option, CardOption, VME_SLOT_OPTIONS};
pub use config::{MachineConfig, ProcessorConfig, SlotConfig, VmeBusConfig};
pub use error::{Result, VmeError};
pub use machine::Machine;
pub use modifier::{AddressModifier, DataWidth};
pub use processor::{Processor, Processors};
pub use registry::{DeviceRef, DeviceRegistry};
pub use slot::{SlotId, VmeSlot};
pub use space::{AddressSpace, DecoderInfo, Handlers, SharedAddressSpace};
