use crate::card::VmeCard;
use crate::cards::{RegisterWindowCard, FCISIO1, FCSCSI1, MVME350, MZR8300};

/// One pluggable board type.
pub struct CardOption {
    pub name: &'static str,
    pub description: &'static str,
    pub create: fn() -> Box<dyn VmeCard>,
}

fn mzr8300() -> Box<dyn VmeCard> {
    Box::new(RegisterWindowCard::new(&MZR8300))
}

fn mvme350() -> Box<dyn VmeCard> {
    Box::new(RegisterWindowCard::new(&MVME350))
}

fn fcisio1() -> Box<dyn VmeCard> {
    Box::new(RegisterWindowCard::new(&FCISIO1))
}

fn fcscsi1() -> Box<dyn VmeCard> {
    Box::new(RegisterWindowCard::new(&FCSCSI1))
}

/// Boards that can sit in a non-controller slot.
pub static VME_SLOT_OPTIONS: &[CardOption] = &[
    CardOption {
        name: "mzr8300",
        description: MZR8300.description,
        create: mzr8300,
    },
    CardOption {
        name: "mvme350",
        description: MVME350.description,
        create: mvme350,
    },
    CardOption {
        name: "fcisio1",
        description: FCISIO1.description,
        create: fcisio1,
    },
    CardOption {
        name: "fcscsi1",
        description: FCSCSI1.description,
        create: fcscsi1,
    },
];

pub fn find_option(name: &str) -> Option<&'static CardOption> {
    VME_SLOT_OPTIONS.iter().find(|opt| opt.name == name)
}

pub fn create_card(name: &str) -> Option<Box<dyn VmeCard>> {
    find_option(name).map(|opt| (opt.create)())
}
