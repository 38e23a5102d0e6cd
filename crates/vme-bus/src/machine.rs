use crate::bus::{BusId, VmeBus};
use crate::card::{CardId, CardState, VmeCard};
use crate::catalog;
use crate::config::MachineConfig;
use crate::error::{Result, VmeError};
use crate::processor::{Processor, Processors};
use crate::registry::{DeviceRef, DeviceRegistry};
use crate::slot::{SlotId, VmeSlot};
use crate::space::SharedAddressSpace;

/// A composed VME system: host processors, buses, slots and the registry tying tags to them.
///
/// Composition happens first (`add_*`), then [`Machine::start`] runs the start-up phase to
/// completion. After that the address spaces serve host accesses on their own.
#[derive(Default)]
pub struct Machine {
    processors: Processors,
    buses: Vec<VmeBus>,
    slots: Vec<VmeSlot>,
    registry: DeviceRegistry,
    started: bool,
    failed: Option<VmeError>,
}

impl Machine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &MachineConfig) -> Result<Self> {
        let mut machine = Self::new();
        for cpu in &config.processors {
            machine.add_processor(&cpu.tag, cpu.data_width)?;
        }
        for bus in &config.buses {
            machine.add_bus(VmeBus::from_config(bus))?;
        }
        for slot in &config.slots {
            let card = match slot.card.as_deref() {
                Some(name) => Some(catalog::create_card(name).ok_or_else(|| {
                    VmeError::UnknownCard {
                        name: name.to_string(),
                    }
                })?),
                None => None,
            };
            machine.add_slot(&slot.tag, &slot.bus, card)?;
        }
        Ok(machine)
    }

    pub fn add_processor(&mut self, tag: &str, data_width: u32) -> Result<()> {
        self.registry.register(tag, DeviceRef::Processor)?;
        self.processors
            .insert(tag.to_string(), Processor::new(tag, data_width));
        Ok(())
    }

    pub fn add_bus(&mut self, bus: VmeBus) -> Result<BusId> {
        let id = BusId(self.buses.len());
        self.registry.register(bus.tag(), DeviceRef::Bus(id))?;
        self.buses.push(bus);
        Ok(id)
    }

    /// Adds a slot on `bus_tag`, optionally with a card already plugged in.
    ///
    /// Slots are numbered from 1 per bus in the order they are added. The bus does not have to
    /// exist; a card in such a slot simply never attaches.
    pub fn add_slot(
        &mut self,
        tag: &str,
        bus_tag: &str,
        card: Option<Box<dyn VmeCard>>,
    ) -> Result<SlotId> {
        let id = SlotId(self.slots.len());
        self.registry.register(tag, DeviceRef::Slot(id))?;

        let number = self
            .slots
            .iter()
            .filter(|slot| slot.bus_tag() == Some(bus_tag))
            .count() as u32
            + 1;
        let mut slot = VmeSlot::new(tag, number);
        slot.configure(bus_tag, tag);
        if let Some(card) = card {
            slot.plug(card);
        }
        self.slots.push(slot);
        Ok(id)
    }

    /// Plugs a card into an empty slot.
    pub fn plug(&mut self, slot_tag: &str, card: Box<dyn VmeCard>) -> Result<()> {
        let slot = self
            .slot_mut(slot_tag)
            .ok_or_else(|| VmeError::InvalidConfig(format!("no slot `{slot_tag}`")))?;
        if !slot.is_empty() {
            return Err(VmeError::SlotOccupied {
                slot: slot_tag.to_string(),
            });
        }
        slot.plug(card);
        Ok(())
    }

    /// Runs start-up: resolve every bus's address space, start every slot, then attach each card
    /// and let it install its decoders.
    ///
    /// Stops at the first error, which is then returned by every later call. A second call after
    /// a successful start does nothing.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }
        let result = self.run_start();
        match &result {
            Ok(()) => self.started = true,
            Err(err) => {
                tracing::debug!("machine start failed: {err}");
                self.failed = Some(err.clone());
            }
        }
        result
    }

    fn run_start(&mut self) -> Result<()> {
        tracing::debug!(
            "machine start: {} processors, {} buses, {} slots",
            self.processors.len(),
            self.buses.len(),
            self.slots.len()
        );

        for bus in &mut self.buses {
            bus.resolve_address_space(&self.processors)?;
        }

        for (index, slot) in self.slots.iter_mut().enumerate() {
            slot.on_start();
            let Some(card) = slot.card_mut() else {
                continue;
            };
            let Some(bus) =
                card.interface_mut()
                    .resolve_and_attach(CardId(index), &self.registry, &mut self.buses)
            else {
                continue;
            };
            card.install(&mut self.buses[bus.0])?;
        }
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// The error that aborted start-up, if it did.
    pub fn start_error(&self) -> Option<&VmeError> {
        self.failed.as_ref()
    }

    /// Empties every bus's card list. Cards stay in their slots, marked detached.
    pub fn teardown(&mut self) {
        for bus in &mut self.buses {
            for card in bus.detach_all() {
                if let Some(card) = self.slots.get_mut(card.0).and_then(VmeSlot::card_mut) {
                    card.interface_mut().detach();
                }
            }
        }
    }

    /// Resets every plugged card.
    pub fn reset(&mut self) {
        for card in self.slots.iter_mut().filter_map(VmeSlot::card_mut) {
            card.reset();
        }
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn processor(&self, tag: &str) -> Option<&Processor> {
        self.processors.get(tag)
    }

    pub fn buses(&self) -> &[VmeBus] {
        &self.buses
    }

    pub fn bus(&self, tag: &str) -> Option<&VmeBus> {
        self.registry.bus(tag).and_then(|id| self.buses.get(id.0))
    }

    pub fn bus_mut(&mut self, tag: &str) -> Option<&mut VmeBus> {
        let id = self.registry.bus(tag)?;
        self.buses.get_mut(id.0)
    }

    pub fn slots(&self) -> &[VmeSlot] {
        &self.slots
    }

    pub fn slot(&self, tag: &str) -> Option<&VmeSlot> {
        self.registry.slot(tag).and_then(|id| self.slots.get(id.0))
    }

    pub fn slot_mut(&mut self, tag: &str) -> Option<&mut VmeSlot> {
        let id = self.registry.slot(tag)?;
        self.slots.get_mut(id.0)
    }

    pub fn card(&self, id: CardId) -> Option<&dyn VmeCard> {
        self.slots.get(id.0).and_then(VmeSlot::card)
    }

    /// Lifecycle state of the card in `slot_tag`, if the slot holds one.
    pub fn card_state(&self, slot_tag: &str) -> Option<CardState> {
        self.slot(slot_tag)
            .and_then(VmeSlot::card)
            .map(|card| card.interface().state())
    }

    /// Cards attached to `bus_tag`, in attachment order.
    pub fn cards_on(&self, bus_tag: &str) -> Vec<&dyn VmeCard> {
        let Some(bus) = self.bus(bus_tag) else {
            return Vec::new();
        };
        bus.cards().iter().filter_map(|id| self.card(*id)).collect()
    }

    /// The address space `bus_tag` decodes in, once resolved.
    pub fn space(&self, bus_tag: &str) -> Option<SharedAddressSpace> {
        self.bus(bus_tag).and_then(|bus| bus.space().cloned())
    }
}

impl Drop for Machine {
    fn drop(&mut self) {
        self.teardown();
    }
}
