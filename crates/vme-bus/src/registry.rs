use std::collections::BTreeMap;

use crate::bus::BusId;
use crate::error::{Result, VmeError};
use crate::slot::SlotId;

/// What a registry tag refers to.
///
/// Lookups that need a specific kind of device ask for it through the `as_*` accessors instead of
/// inspecting the entry's type at runtime.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeviceRef {
    Processor,
    Bus(BusId),
    Slot(SlotId),
}

impl DeviceRef {
    pub fn as_bus(self) -> Option<BusId> {
        match self {
            Self::Bus(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_slot(self) -> Option<SlotId> {
        match self {
            Self::Slot(id) => Some(id),
            _ => None,
        }
    }
}

/// Tag to device table for one composed system.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    entries: BTreeMap<String, DeviceRef>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tag: &str, device: DeviceRef) -> Result<()> {
        if self.entries.contains_key(tag) {
            return Err(VmeError::DuplicateTag {
                tag: tag.to_string(),
            });
        }
        self.entries.insert(tag.to_string(), device);
        Ok(())
    }

    pub fn lookup(&self, tag: &str) -> Option<DeviceRef> {
        self.entries.get(tag).copied()
    }

    pub fn bus(&self, tag: &str) -> Option<BusId> {
        self.lookup(tag).and_then(DeviceRef::as_bus)
    }

    pub fn slot(&self, tag: &str) -> Option<SlotId> {
        self.lookup(tag).and_then(DeviceRef::as_slot)
    }

    pub fn tags(&self) -> impl Iterator<Item = (&str, DeviceRef)> + '_ {
        self.entries.iter().map(|(tag, dev)| (tag.as_str(), *dev))
    }
}
