use std::rc::Rc;

use crate::card::CardId;
use crate::config::VmeBusConfig;
use crate::error::{Result, VmeError};
use crate::modifier::{AddressModifier, DataWidth};
use crate::processor::Processors;
use crate::space::{AddressSpace, Handlers, SharedAddressSpace};

/// Name of the address space a bus allocates for itself.
pub const VME_A32_SPACE: &str = "VME A32";

/// Processor tag a bus delegates to unless told otherwise.
pub const DEFAULT_CPU_TAG: &str = "maincpu";

/// Index of a bus inside its machine.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BusId(pub usize);

/// Narrows `mask` to a host data bus of `bus_width` bits.
///
/// Returns `None` for widths the bus cannot drive.
pub const fn narrow_mask(bus_width: u32, mask: u32) -> Option<u32> {
    match bus_width {
        16 => Some(mask & 0x0000_FFFF),
        24 => Some(mask & 0x00FF_FFFF),
        32 => Some(mask),
        _ => None,
    }
}

/// The P1 data transfer bus.
///
/// Owns (or borrows from a host processor) the address space cards decode in, and keeps the list
/// of attached cards in attachment order. The bus is only involved while decoders are installed;
/// host accesses are served by the address space directly.
pub struct VmeBus {
    tag: String,
    data_width: u32,
    alloc_spaces: bool,
    cpu_tag: String,
    space: Option<SharedAddressSpace>,
    space_width: u32,
    cards: Vec<CardId>,
}

impl VmeBus {
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        tracing::debug!("{tag}: new VME bus");
        Self {
            tag,
            data_width: 32,
            alloc_spaces: true,
            cpu_tag: DEFAULT_CPU_TAG.to_string(),
            space: None,
            space_width: 0,
            cards: Vec::new(),
        }
    }

    pub fn from_config(config: &VmeBusConfig) -> Self {
        let mut bus = Self::new(config.tag.clone());
        bus.set_data_width(config.data_width);
        bus.set_cpu_tag(config.cpu_tag.clone());
        if config.use_owner_spaces {
            bus.use_owner_spaces();
        }
        bus
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Data width of the bus's own address space. Ignored when delegating.
    pub fn set_data_width(&mut self, width: u32) {
        self.data_width = width;
    }

    /// Processor whose program space is used after [`Self::use_owner_spaces`].
    pub fn set_cpu_tag(&mut self, tag: impl Into<String>) {
        self.cpu_tag = tag.into();
    }

    pub fn cpu_tag(&self) -> &str {
        &self.cpu_tag
    }

    /// Decode in the host processor's program space instead of a space of our own.
    ///
    /// Useful when no address modifiers or arbitration are modelled: cards then sit directly in
    /// the processor's map.
    pub fn use_owner_spaces(&mut self) {
        tracing::debug!("{}: using owner address spaces", self.tag);
        self.alloc_spaces = false;
    }

    pub fn owns_space(&self) -> bool {
        self.alloc_spaces
    }

    /// Acquires the address space cards will decode in. Called once at start-up.
    pub fn resolve_address_space(&mut self, processors: &Processors) -> Result<()> {
        if self.alloc_spaces {
            tracing::debug!("{}: using own address space", self.tag);
            let space = AddressSpace::new(VME_A32_SPACE, self.data_width).into_shared();
            self.space_width = self.data_width;
            self.space = Some(space);
        } else {
            tracing::debug!("{}: using address space of {}", self.tag, self.cpu_tag);
            let cpu = processors
                .get(&self.cpu_tag)
                .ok_or_else(|| VmeError::ProcessorNotFound {
                    bus: self.tag.clone(),
                    cpu: self.cpu_tag.clone(),
                })?;
            self.space_width = cpu.data_width();
            self.space = Some(Rc::clone(cpu.program_space()));
        }
        tracing::debug!("{}: address space resolved at {} bits", self.tag, self.space_width);
        Ok(())
    }

    pub fn space(&self) -> Option<&SharedAddressSpace> {
        self.space.as_ref()
    }

    /// Native width of the resolved address space, if resolved.
    pub fn data_width(&self) -> Option<u32> {
        self.space.as_ref().map(|_| self.space_width)
    }

    pub fn attach_card(&mut self, card: CardId) {
        tracing::debug!("{}: attach card {}", self.tag, card.0);
        self.cards.push(card);
    }

    /// Attached cards in attachment order.
    pub fn cards(&self) -> &[CardId] {
        &self.cards
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    /// Forgets every attached card and returns their handles. The cards themselves are untouched.
    pub fn detach_all(&mut self) -> Vec<CardId> {
        tracing::debug!("{}: detaching {} cards", self.tag, self.cards.len());
        std::mem::take(&mut self.cards)
    }

    /// Installs a D8 handler pair at `start..=end`. Returns the mask actually registered.
    pub fn install_device8(
        &mut self,
        amod: AddressModifier,
        start: u32,
        end: u32,
        read: impl FnMut(u32) -> u8 + 'static,
        write: impl FnMut(u32, u8) + 'static,
        mask: u32,
    ) -> Result<u32> {
        self.install_device(amod, start, end, Handlers::d8(read, write), mask)
    }

    /// Installs a D16 handler pair at `start..=end`. Returns the mask actually registered.
    pub fn install_device16(
        &mut self,
        amod: AddressModifier,
        start: u32,
        end: u32,
        read: impl FnMut(u32, u16) -> u16 + 'static,
        write: impl FnMut(u32, u16, u16) + 'static,
        mask: u32,
    ) -> Result<u32> {
        self.install_device(amod, start, end, Handlers::d16(read, write), mask)
    }

    /// Installs a D32 handler pair at `start..=end`. Returns the mask actually registered.
    pub fn install_device32(
        &mut self,
        amod: AddressModifier,
        start: u32,
        end: u32,
        read: impl FnMut(u32, u32) -> u32 + 'static,
        write: impl FnMut(u32, u32, u32) + 'static,
        mask: u32,
    ) -> Result<u32> {
        self.install_device(amod, start, end, Handlers::d32(read, write), mask)
    }

    /// Installs a handler pair of any width.
    ///
    /// The modifier, the range (including D16/D32 alignment) and the bus width are all checked
    /// before the address space is touched; a failed call leaves the decoder table as it was.
    pub fn install_device(
        &mut self,
        amod: AddressModifier,
        start: u32,
        end: u32,
        handlers: Handlers,
        mask: u32,
    ) -> Result<u32> {
        let width = handlers.width();
        tracing::debug!(
            "{}: install_device {amod} {width} at {start:#010x}..={end:#010x} (bus {} bits)",
            self.tag,
            self.space_width
        );

        // TODO: block transfer and supervisory modifiers need their own cycle handling.
        if !amod.is_single_cycle() {
            return Err(VmeError::UnsupportedAddressModifier {
                modifier: amod,
                width,
            });
        }
        // Lanes are picked from the offset into the decoder, which only matches the address when
        // a wide decoder starts on a lane boundary.
        if end < start || start % width.bytes() != 0 {
            return Err(VmeError::InvalidRange { start, end });
        }
        let space = self
            .space
            .as_ref()
            .ok_or_else(|| VmeError::AddressSpaceUnresolved {
                bus: self.tag.clone(),
            })?;
        let mask = narrow_mask(self.space_width, mask).ok_or(VmeError::UnsupportedBusWidth {
            bus_width: self.space_width,
            width,
        })?;

        space
            .borrow_mut()
            .install_readwrite_handler(start, end, handlers, mask);
        Ok(mask)
    }
}

impl Drop for VmeBus {
    fn drop(&mut self) {
        if !self.cards.is_empty() {
            self.detach_all();
        }
    }
}
