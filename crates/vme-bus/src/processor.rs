use std::collections::BTreeMap;

use crate::space::{AddressSpace, SharedAddressSpace};

/// Host processors by tag.
pub type Processors = BTreeMap<String, Processor>;

/// A host processor that can lend its program address space to a VME bus.
///
/// Only the program space matters here; execution is out of scope.
pub struct Processor {
    tag: String,
    program: SharedAddressSpace,
}

impl Processor {
    pub fn new(tag: impl Into<String>, data_width: u32) -> Self {
        let tag = tag.into();
        let program = AddressSpace::new(format!("{tag}:program"), data_width).into_shared();
        Self { tag, program }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn program_space(&self) -> &SharedAddressSpace {
        &self.program
    }

    /// Data bus width of the program space, in bits.
    pub fn data_width(&self) -> u32 {
        self.program.borrow().data_width()
    }
}
