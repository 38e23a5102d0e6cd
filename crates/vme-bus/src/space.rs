//! Shared address space that cards install decoders into.
//!
//! Decoders are registered once during start-up; host accesses then go straight from
//! [`AddressSpace`] to the installed handler without passing through the bus object. The space is
//! big-endian like the VME data bus: for a D16 decoder the even byte travels on D15..D8, for a D32
//! decoder byte 0 travels on D31..D24.

use std::cell::RefCell;
use std::rc::Rc;

use crate::modifier::DataWidth;

/// Handle to an address space shared between its owner (bus or processor) and the cards.
pub type SharedAddressSpace = Rc<RefCell<AddressSpace>>;

/// `(offset)`
pub type Read8 = Box<dyn FnMut(u32) -> u8>;
/// `(offset, data)`
pub type Write8 = Box<dyn FnMut(u32, u8)>;
/// `(offset, mem_mask)`
pub type Read16 = Box<dyn FnMut(u32, u16) -> u16>;
/// `(offset, data, mem_mask)`
pub type Write16 = Box<dyn FnMut(u32, u16, u16)>;
/// `(offset, mem_mask)`
pub type Read32 = Box<dyn FnMut(u32, u32) -> u32>;
/// `(offset, data, mem_mask)`
pub type Write32 = Box<dyn FnMut(u32, u32, u32)>;

/// A read/write handler pair of one data width.
///
/// Offsets are byte offsets from the start of the decoder's range, aligned down to the handler
/// width. `mem_mask` selects the byte lanes the host actually drives; a full-width access passes
/// all ones.
pub enum Handlers {
    D8 { read: Read8, write: Write8 },
    D16 { read: Read16, write: Write16 },
    D32 { read: Read32, write: Write32 },
}

impl Handlers {
    pub fn d8(
        read: impl FnMut(u32) -> u8 + 'static,
        write: impl FnMut(u32, u8) + 'static,
    ) -> Self {
        Self::D8 {
            read: Box::new(read),
            write: Box::new(write),
        }
    }

    pub fn d16(
        read: impl FnMut(u32, u16) -> u16 + 'static,
        write: impl FnMut(u32, u16, u16) + 'static,
    ) -> Self {
        Self::D16 {
            read: Box::new(read),
            write: Box::new(write),
        }
    }

    pub fn d32(
        read: impl FnMut(u32, u32) -> u32 + 'static,
        write: impl FnMut(u32, u32, u32) + 'static,
    ) -> Self {
        Self::D32 {
            read: Box::new(read),
            write: Box::new(write),
        }
    }

    pub fn width(&self) -> DataWidth {
        match self {
            Self::D8 { .. } => DataWidth::D8,
            Self::D16 { .. } => DataWidth::D16,
            Self::D32 { .. } => DataWidth::D32,
        }
    }
}

/// Summary of one installed decoder.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DecoderInfo {
    pub start: u32,
    pub end: u32,
    pub width: DataWidth,
    pub mask: u32,
}

struct Decoder {
    start: u32,
    end: u32,
    mask: u32,
    handlers: Handlers,
}

impl Decoder {
    fn contains(&self, addr: u32) -> bool {
        addr >= self.start && addr <= self.end
    }

    fn info(&self) -> DecoderInfo {
        DecoderInfo {
            start: self.start,
            end: self.end,
            width: self.handlers.width(),
            mask: self.mask,
        }
    }

    fn read8(&mut self, addr: u32) -> u8 {
        let rel = addr.wrapping_sub(self.start);
        match &mut self.handlers {
            Handlers::D8 { read, .. } => read(rel) & self.mask as u8,
            Handlers::D16 { read, .. } => {
                let mask = self.mask as u16;
                let shift = lane_shift16(rel);
                let value = read(rel & !1, (0xFF << shift) & mask) & mask;
                (value >> shift) as u8
            }
            Handlers::D32 { read, .. } => {
                let shift = lane_shift32(rel);
                let value = read(rel & !3, (0xFF << shift) & self.mask) & self.mask;
                (value >> shift) as u8
            }
        }
    }

    fn write8(&mut self, addr: u32, value: u8) {
        let rel = addr.wrapping_sub(self.start);
        match &mut self.handlers {
            Handlers::D8 { write, .. } => write(rel, value & self.mask as u8),
            Handlers::D16 { write, .. } => {
                let mask = self.mask as u16;
                let shift = lane_shift16(rel);
                write(
                    rel & !1,
                    (u16::from(value) << shift) & mask,
                    (0xFF << shift) & mask,
                );
            }
            Handlers::D32 { write, .. } => {
                let shift = lane_shift32(rel);
                write(
                    rel & !3,
                    (u32::from(value) << shift) & self.mask,
                    (0xFF << shift) & self.mask,
                );
            }
        }
    }

    /// Returns `None` for D8 decoders, which the caller splits into byte accesses.
    fn read16(&mut self, addr: u32) -> Option<u16> {
        let rel = addr.wrapping_sub(self.start);
        match &mut self.handlers {
            Handlers::D8 { .. } => None,
            Handlers::D16 { read, .. } => {
                let mask = self.mask as u16;
                Some(read(rel & !1, mask) & mask)
            }
            Handlers::D32 { read, .. } => {
                let shift = if rel & 2 == 0 { 16 } else { 0 };
                let value = read(rel & !3, (0xFFFF << shift) & self.mask) & self.mask;
                Some((value >> shift) as u16)
            }
        }
    }

    fn write16(&mut self, addr: u32, value: u16) -> bool {
        let rel = addr.wrapping_sub(self.start);
        match &mut self.handlers {
            Handlers::D8 { .. } => false,
            Handlers::D16 { write, .. } => {
                let mask = self.mask as u16;
                write(rel & !1, value & mask, mask);
                true
            }
            Handlers::D32 { write, .. } => {
                let shift = if rel & 2 == 0 { 16 } else { 0 };
                write(
                    rel & !3,
                    (u32::from(value) << shift) & self.mask,
                    (0xFFFF << shift) & self.mask,
                );
                true
            }
        }
    }

    /// Returns `None` for D8/D16 decoders, which the caller splits into narrower accesses.
    fn read32(&mut self, addr: u32) -> Option<u32> {
        let rel = addr.wrapping_sub(self.start);
        match &mut self.handlers {
            Handlers::D32 { read, .. } => Some(read(rel & !3, self.mask) & self.mask),
            _ => None,
        }
    }

    fn write32(&mut self, addr: u32, value: u32) -> bool {
        let rel = addr.wrapping_sub(self.start);
        match &mut self.handlers {
            Handlers::D32 { write, .. } => {
                write(rel & !3, value & self.mask, self.mask);
                true
            }
            _ => false,
        }
    }
}

fn lane_shift16(rel: u32) -> u32 {
    if rel & 1 == 0 {
        8
    } else {
        0
    }
}

fn lane_shift32(rel: u32) -> u32 {
    (3 - (rel & 3)) * 8
}

/// A decoder table plus the host-facing access path.
pub struct AddressSpace {
    name: String,
    data_width: u32,
    decoders: Vec<Decoder>,
}

impl AddressSpace {
    pub fn new(name: impl Into<String>, data_width: u32) -> Self {
        Self {
            name: name.into(),
            data_width,
            decoders: Vec::new(),
        }
    }

    pub fn into_shared(self) -> SharedAddressSpace {
        Rc::new(RefCell::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Native data bus width of this space in bits.
    pub fn data_width(&self) -> u32 {
        self.data_width
    }

    /// Binds `start..=end` to `handlers`.
    ///
    /// Ranges may overlap; the most recent installation wins for every address it covers.
    pub fn install_readwrite_handler(
        &mut self,
        start: u32,
        end: u32,
        handlers: Handlers,
        mask: u32,
    ) {
        debug_assert!(start <= end, "inverted decoder range {start:#x}..={end:#x}");
        tracing::trace!(
            "{}: install {} decoder {start:#010x}..={end:#010x} mask {mask:#010x}",
            self.name,
            handlers.width()
        );
        self.decoders.push(Decoder {
            start,
            end,
            mask,
            handlers,
        });
    }

    /// Installed decoders, in installation order.
    pub fn decoders(&self) -> impl Iterator<Item = DecoderInfo> + '_ {
        self.decoders.iter().map(Decoder::info)
    }

    pub fn decoder_count(&self) -> usize {
        self.decoders.len()
    }

    /// The decoder that currently answers for `addr`, if any.
    pub fn decoder_at(&self, addr: u32) -> Option<DecoderInfo> {
        self.find_index(addr).map(|idx| self.decoders[idx].info())
    }

    fn find_index(&self, addr: u32) -> Option<usize> {
        self.decoders.iter().rposition(|d| d.contains(addr))
    }

    pub fn read8(&mut self, addr: u32) -> u8 {
        match self.find_index(addr) {
            Some(idx) => self.decoders[idx].read8(addr),
            None => {
                tracing::trace!("{}: unmapped read8 at {addr:#010x}", self.name);
                0xFF
            }
        }
    }

    pub fn write8(&mut self, addr: u32, value: u8) {
        match self.find_index(addr) {
            Some(idx) => self.decoders[idx].write8(addr, value),
            None => {
                tracing::trace!(
                    "{}: unmapped write8 at {addr:#010x} = {value:#04x}",
                    self.name
                );
            }
        }
    }

    pub fn read16(&mut self, addr: u32) -> u16 {
        let Some(idx) = self.find_index(addr) else {
            tracing::trace!("{}: unmapped read16 at {addr:#010x}", self.name);
            return 0xFFFF;
        };
        match self.decoders[idx].read16(addr) {
            Some(value) => value,
            None => {
                let hi = self.read8(addr);
                let lo = self.read8(addr.wrapping_add(1));
                u16::from_be_bytes([hi, lo])
            }
        }
    }

    pub fn write16(&mut self, addr: u32, value: u16) {
        let Some(idx) = self.find_index(addr) else {
            tracing::trace!(
                "{}: unmapped write16 at {addr:#010x} = {value:#06x}",
                self.name
            );
            return;
        };
        if !self.decoders[idx].write16(addr, value) {
            let [hi, lo] = value.to_be_bytes();
            self.write8(addr, hi);
            self.write8(addr.wrapping_add(1), lo);
        }
    }

    pub fn read32(&mut self, addr: u32) -> u32 {
        let Some(idx) = self.find_index(addr) else {
            tracing::trace!("{}: unmapped read32 at {addr:#010x}", self.name);
            return 0xFFFF_FFFF;
        };
        match self.decoders[idx].read32(addr) {
            Some(value) => value,
            None => {
                let hi = self.read16(addr);
                let lo = self.read16(addr.wrapping_add(2));
                (u32::from(hi) << 16) | u32::from(lo)
            }
        }
    }

    pub fn write32(&mut self, addr: u32, value: u32) {
        let Some(idx) = self.find_index(addr) else {
            tracing::trace!(
                "{}: unmapped write32 at {addr:#010x} = {value:#010x}",
                self.name
            );
            return;
        };
        if !self.decoders[idx].write32(addr, value) {
            self.write16(addr, (value >> 16) as u16);
            self.write16(addr.wrapping_add(2), value as u16);
        }
    }
}
