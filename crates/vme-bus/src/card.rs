use crate::bus::{BusId, VmeBus};
use crate::error::Result;
use crate::registry::DeviceRegistry;

/// Handle to a card inside its machine.
///
/// Cards live in slots and a slot holds at most one card, so the handle is the index of the slot
/// the card is plugged into.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct CardId(pub usize);

/// Where a card is in its life on the bus.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CardState {
    /// Built from the catalog; no identifiers yet.
    Constructed,
    /// Knows its bus and slot tags.
    Configured,
    /// Bus resolved and the card is in the bus's card list.
    Attached,
    /// Dropped from the bus's card list at teardown.
    Detached,
}

/// Bus bookkeeping every card carries.
#[derive(Clone, Debug)]
pub struct CardInterface {
    bus_tag: Option<String>,
    slot_tag: Option<String>,
    bus: Option<BusId>,
    slot_number: u32,
    state: CardState,
}

impl Default for CardInterface {
    fn default() -> Self {
        Self::new()
    }
}

impl CardInterface {
    pub fn new() -> Self {
        Self {
            bus_tag: None,
            slot_tag: None,
            bus: None,
            slot_number: 0,
            state: CardState::Constructed,
        }
    }

    /// Records which bus and slot this card belongs to.
    pub fn configure(&mut self, bus_tag: &str, slot_tag: &str) {
        tracing::debug!("card in {slot_tag}: configured for bus {bus_tag}");
        self.bus_tag = Some(bus_tag.to_string());
        self.slot_tag = Some(slot_tag.to_string());
        if self.state == CardState::Constructed {
            self.state = CardState::Configured;
        }
    }

    /// Looks the configured bus up and joins its card list.
    ///
    /// A missing bus is not an error: the card stays [`CardState::Configured`] and nothing retries.
    pub fn resolve_and_attach(
        &mut self,
        card: CardId,
        registry: &DeviceRegistry,
        buses: &mut [VmeBus],
    ) -> Option<BusId> {
        let tag = self.bus_tag.as_deref()?;
        let Some(id) = registry.bus(tag) else {
            tracing::trace!("card {}: bus {tag} not found, staying unattached", card.0);
            return None;
        };
        let bus = buses.get_mut(id.0)?;
        self.bus = Some(id);
        bus.attach_card(card);
        self.state = CardState::Attached;
        Some(id)
    }

    pub fn detach(&mut self) {
        if self.state == CardState::Attached {
            self.state = CardState::Detached;
        }
    }

    pub fn bus_tag(&self) -> Option<&str> {
        self.bus_tag.as_deref()
    }

    pub fn slot_tag(&self) -> Option<&str> {
        self.slot_tag.as_deref()
    }

    /// The resolved bus. `None` until [`Self::resolve_and_attach`] succeeds.
    pub fn bus(&self) -> Option<BusId> {
        self.bus
    }

    pub fn slot_number(&self) -> u32 {
        self.slot_number
    }

    pub fn set_slot_number(&mut self, slot: u32) {
        self.slot_number = slot;
    }

    pub fn state(&self) -> CardState {
        self.state
    }
}

/// A board that plugs into a VME slot.
///
/// Implementors only override what they decode: the byte-wide entry points default to a card
/// that reads as zero and ignores writes.
pub trait VmeCard {
    /// Catalog name, e.g. `"fcisio1"`.
    fn name(&self) -> &str;

    fn interface(&self) -> &CardInterface;

    fn interface_mut(&mut self) -> &mut CardInterface;

    fn read8(&mut self, offset: u32) -> u8 {
        tracing::trace!("{}: read8 at {offset:#010x}", self.name());
        0
    }

    fn write8(&mut self, offset: u32, value: u8) {
        tracing::trace!("{}: write8 at {offset:#010x} = {value:#04x}", self.name());
    }

    /// Installs the card's decoders. Only called once the card is attached to `bus`.
    fn install(&mut self, _bus: &mut VmeBus) -> Result<()> {
        Ok(())
    }

    /// Reset the card back to its power-on state.
    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DeviceRef;

    #[derive(Default)]
    struct BlankCard {
        iface: CardInterface,
    }

    impl VmeCard for BlankCard {
        fn name(&self) -> &str {
            "blank"
        }

        fn interface(&self) -> &CardInterface {
            &self.iface
        }

        fn interface_mut(&mut self) -> &mut CardInterface {
            &mut self.iface
        }
    }

    #[test]
    fn default_byte_handlers_are_inert() {
        let mut card = BlankCard::default();
        card.write8(0x10, 0xAA);
        assert_eq!(card.read8(0x10), 0);
        assert_eq!(card.install(&mut VmeBus::new("vme")), Ok(()));
    }

    #[test]
    fn lifecycle_walks_configured_attached_detached() {
        let mut registry = DeviceRegistry::new();
        registry.register("vme", DeviceRef::Bus(BusId(0))).unwrap();
        let mut buses = vec![VmeBus::new("vme")];

        let mut iface = CardInterface::new();
        assert_eq!(iface.state(), CardState::Constructed);

        iface.configure("vme", "slot1");
        assert_eq!(iface.state(), CardState::Configured);
        assert_eq!(iface.bus(), None);

        assert_eq!(
            iface.resolve_and_attach(CardId(0), &registry, &mut buses),
            Some(BusId(0))
        );
        assert_eq!(iface.state(), CardState::Attached);
        assert_eq!(buses[0].cards(), &[CardId(0)]);

        iface.detach();
        assert_eq!(iface.state(), CardState::Detached);
    }

    #[test]
    fn missing_bus_leaves_card_configured() {
        let mut registry = DeviceRegistry::new();
        registry.register("vme", DeviceRef::Bus(BusId(0))).unwrap();
        registry.register("maincpu", DeviceRef::Processor).unwrap();
        let mut buses = vec![VmeBus::new("vme")];

        for tag in ["vme2", "maincpu"] {
            let mut iface = CardInterface::new();
            iface.configure(tag, "slot1");
            assert_eq!(iface.resolve_and_attach(CardId(0), &registry, &mut buses), None);
            assert_eq!(iface.state(), CardState::Configured);
            assert_eq!(iface.bus(), None);
        }
        assert_eq!(buses[0].card_count(), 0);
    }

    #[test]
    fn unconfigured_card_cannot_attach() {
        let registry = DeviceRegistry::new();
        let mut iface = CardInterface::new();
        assert_eq!(iface.resolve_and_attach(CardId(0), &registry, &mut []), None);
        assert_eq!(iface.state(), CardState::Constructed);
    }
}
