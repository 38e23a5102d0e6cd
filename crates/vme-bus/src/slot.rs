use crate::card::VmeCard;

/// Index of a slot inside its machine.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SlotId(pub usize);

/// A backplane position holding at most one card.
pub struct VmeSlot {
    tag: String,
    number: u32,
    bus_tag: Option<String>,
    slot_tag: Option<String>,
    card: Option<Box<dyn VmeCard>>,
}

impl VmeSlot {
    /// `number` is the 1-based backplane position.
    pub fn new(tag: impl Into<String>, number: u32) -> Self {
        Self {
            tag: tag.into(),
            number,
            bus_tag: None,
            slot_tag: None,
            card: None,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Records the bus and slot identity handed to the card at start-up.
    pub fn configure(&mut self, bus_tag: &str, slot_tag: &str) {
        tracing::debug!("{}: slot {slot_tag} on bus {bus_tag}", self.tag);
        self.bus_tag = Some(bus_tag.to_string());
        self.slot_tag = Some(slot_tag.to_string());
    }

    pub fn bus_tag(&self) -> Option<&str> {
        self.bus_tag.as_deref()
    }

    pub fn slot_tag(&self) -> Option<&str> {
        self.slot_tag.as_deref()
    }

    /// Plugs `card` in, returning whatever was there before.
    pub fn plug(&mut self, mut card: Box<dyn VmeCard>) -> Option<Box<dyn VmeCard>> {
        card.interface_mut().set_slot_number(self.number);
        self.card.replace(card)
    }

    pub fn card(&self) -> Option<&dyn VmeCard> {
        self.card.as_deref()
    }

    pub fn card_mut(&mut self) -> Option<&mut (dyn VmeCard + 'static)> {
        self.card.as_deref_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.card.is_none()
    }

    /// Hands the slot's bus/slot identity to the plugged card, if any.
    pub fn on_start(&mut self) {
        let Some(card) = self.card.as_deref_mut() else {
            tracing::trace!("{}: empty", self.tag);
            return;
        };
        let (Some(bus_tag), Some(slot_tag)) = (self.bus_tag.as_deref(), self.slot_tag.as_deref())
        else {
            tracing::trace!("{}: not configured, card left as is", self.tag);
            return;
        };
        tracing::debug!("{}: start, card {} on {bus_tag}:{slot_tag}", self.tag, card.name());
        card.interface_mut().configure(bus_tag, slot_tag);
    }

    /// P1 D8 read, forwarded to the plugged card.
    pub fn read8(&mut self, offset: u32) -> u8 {
        match self.card.as_deref_mut() {
            Some(card) => card.read8(offset),
            None => 0,
        }
    }

    /// P1 D8 write, forwarded to the plugged card.
    pub fn write8(&mut self, offset: u32, value: u8) {
        if let Some(card) = self.card.as_deref_mut() {
            card.write8(offset, value);
        }
    }
}
