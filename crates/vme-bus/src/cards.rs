//! Boards offered by the slot catalog.
//!
//! Only the bus-facing side is modelled: each board claims one register window and backs it with
//! plain storage. What the registers mean on the real hardware is left to dedicated card models.

use std::cell::RefCell;
use std::rc::Rc;

use crate::bus::VmeBus;
use crate::card::{CardInterface, VmeCard};
use crate::error::Result;
use crate::modifier::{AddressModifier, DataWidth};

/// Where and how a board decodes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CardProfile {
    pub name: &'static str,
    pub description: &'static str,
    pub modifier: AddressModifier,
    pub base: u32,
    /// Window size in bytes.
    pub size: u32,
    pub width: DataWidth,
}

impl CardProfile {
    pub const fn end(&self) -> u32 {
        self.base + self.size - 1
    }
}

pub const MZR8300: CardProfile = CardProfile {
    name: "mzr8300",
    description: "Mizar VME8300 serial I/O",
    modifier: AddressModifier::A16_SC,
    base: 0xFF00,
    size: 0x20,
    width: DataWidth::D8,
};

pub const MVME350: CardProfile = CardProfile {
    name: "mvme350",
    description: "Motorola MVME350 streaming tape controller",
    modifier: AddressModifier::A16_SC,
    base: 0x5000,
    size: 0x100,
    width: DataWidth::D16,
};

pub const FCISIO1: CardProfile = CardProfile {
    name: "fcisio1",
    description: "Force Computer SYS68K/ISIO-1 intelligent serial I/O",
    modifier: AddressModifier::A24_SC,
    base: 0x0096_0000,
    size: 0x1000,
    width: DataWidth::D16,
};

pub const FCSCSI1: CardProfile = CardProfile {
    name: "fcscsi1",
    description: "Force Computer SYS68K/SCSI-1 controller",
    modifier: AddressModifier::A24_SC,
    base: 0x00E0_0000,
    size: 0x100,
    width: DataWidth::D32,
};

type Registers = Rc<RefCell<Vec<u8>>>;

/// Big-endian load of `len` bytes. Bytes past the window read as zero.
fn load(regs: &[u8], offset: u32, len: usize) -> u32 {
    (0..len).fold(0u32, |acc, i| {
        let byte = regs.get(offset as usize + i).copied().unwrap_or(0);
        (acc << 8) | u32::from(byte)
    })
}

/// Big-endian store of the lanes selected by `mem_mask`.
fn store(regs: &mut [u8], offset: u32, len: usize, data: u32, mem_mask: u32) {
    for i in 0..len {
        let shift = 8 * (len - 1 - i);
        if (mem_mask >> shift) & 0xFF == 0 {
            continue;
        }
        if let Some(byte) = regs.get_mut(offset as usize + i) {
            *byte = (data >> shift) as u8;
        }
    }
}

/// A board exposing one storage-backed register window.
pub struct RegisterWindowCard {
    profile: &'static CardProfile,
    iface: CardInterface,
    regs: Registers,
}

impl RegisterWindowCard {
    pub fn new(profile: &'static CardProfile) -> Self {
        Self {
            profile,
            iface: CardInterface::new(),
            regs: Rc::new(RefCell::new(vec![0; profile.size as usize])),
        }
    }

    pub fn profile(&self) -> &'static CardProfile {
        self.profile
    }

    /// Copy of the register window.
    pub fn registers(&self) -> Vec<u8> {
        self.regs.borrow().clone()
    }
}

impl VmeCard for RegisterWindowCard {
    fn name(&self) -> &str {
        self.profile.name
    }

    fn interface(&self) -> &CardInterface {
        &self.iface
    }

    fn interface_mut(&mut self) -> &mut CardInterface {
        &mut self.iface
    }

    fn read8(&mut self, offset: u32) -> u8 {
        load(&self.regs.borrow(), offset, 1) as u8
    }

    fn write8(&mut self, offset: u32, value: u8) {
        store(&mut self.regs.borrow_mut(), offset, 1, u32::from(value), 0xFF);
    }

    fn install(&mut self, bus: &mut VmeBus) -> Result<()> {
        let p = self.profile;
        tracing::debug!(
            "{}: slot {} decodes {} {} at {:#010x}..={:#010x}",
            p.name,
            self.iface.slot_number(),
            p.modifier,
            p.width,
            p.base,
            p.end()
        );

        let r = Rc::clone(&self.regs);
        let w = Rc::clone(&self.regs);
        match p.width {
            DataWidth::D8 => bus.install_device8(
                p.modifier,
                p.base,
                p.end(),
                move |offset| load(&r.borrow(), offset, 1) as u8,
                move |offset, data| store(&mut w.borrow_mut(), offset, 1, u32::from(data), 0xFF),
                0xFFFF_FFFF,
            )?,
            DataWidth::D16 => bus.install_device16(
                p.modifier,
                p.base,
                p.end(),
                move |offset, _| load(&r.borrow(), offset, 2) as u16,
                move |offset, data, mem_mask| {
                    store(
                        &mut w.borrow_mut(),
                        offset,
                        2,
                        u32::from(data),
                        u32::from(mem_mask),
                    )
                },
                0xFFFF_FFFF,
            )?,
            DataWidth::D32 => bus.install_device32(
                p.modifier,
                p.base,
                p.end(),
                move |offset, _| load(&r.borrow(), offset, 4),
                move |offset, data, mem_mask| store(&mut w.borrow_mut(), offset, 4, data, mem_mask),
                0xFFFF_FFFF,
            )?,
        };
        Ok(())
    }

    fn reset(&mut self) {
        self.regs.borrow_mut().fill(0);
    }
}
