use vme_bus::{
    create_card, CardState, DataWidth, Machine, MachineConfig, VmeBus, VmeError, VME_A32_SPACE,
};

const BACKPLANE: &str = r#"{
    "processors": [{ "tag": "maincpu", "data_width": 32 }],
    "buses": [{ "tag": "vme" }],
    "slots": [
        { "tag": "slot1", "bus": "vme", "card": "mzr8300" },
        { "tag": "slot2", "bus": "vme", "card": "fcscsi1" },
        { "tag": "slot3", "bus": "vme9", "card": "mvme350" },
        { "tag": "slot4", "bus": "vme" }
    ]
}"#;

fn started(json: &str) -> Machine {
    let cfg = MachineConfig::from_json(json).unwrap();
    let mut machine = Machine::from_config(&cfg).unwrap();
    machine.start().unwrap();
    machine
}

#[test]
fn cards_attach_in_slot_order_and_decode_in_the_bus_space() {
    let machine = started(BACKPLANE);

    let names: Vec<_> = machine.cards_on("vme").iter().map(|c| c.name().to_string()).collect();
    assert_eq!(names, ["mzr8300", "fcscsi1"]);
    assert_eq!(machine.card_state("slot1"), Some(CardState::Attached));
    assert_eq!(machine.card_state("slot2"), Some(CardState::Attached));
    assert_eq!(machine.card_state("slot4"), None);

    let space = machine.space("vme").unwrap();
    let mut space = space.borrow_mut();
    assert_eq!(space.name(), VME_A32_SPACE);
    assert_eq!(space.decoder_count(), 2);

    // D32 board: full-width accesses pass straight through, bytes come out big-endian.
    space.write32(0x00E0_0010, 0x1122_3344);
    assert_eq!(space.read32(0x00E0_0010), 0x1122_3344);
    assert_eq!(space.read8(0x00E0_0011), 0x22);
    assert_eq!(space.read16(0x00E0_0012), 0x3344);

    // D8 board: a 16-bit host access is split into two byte cycles.
    space.write16(0xFF04, 0xABCD);
    assert_eq!(space.read8(0xFF04), 0xAB);
    assert_eq!(space.read8(0xFF05), 0xCD);

    // Nothing decodes here.
    assert_eq!(space.read16(0x1000), 0xFFFF);
}

#[test]
fn card_on_a_missing_bus_stays_configured() {
    let machine = started(BACKPLANE);

    assert_eq!(machine.card_state("slot3"), Some(CardState::Configured));
    let card = machine.slot("slot3").unwrap().card().unwrap();
    assert_eq!(card.interface().bus_tag(), Some("vme9"));
    assert_eq!(card.interface().bus(), None);
    assert_eq!(machine.bus("vme").unwrap().card_count(), 2);
}

#[test]
fn teardown_empties_card_lists_and_leaves_cards_in_their_slots() {
    let mut machine = started(BACKPLANE);

    machine.teardown();

    assert_eq!(machine.bus("vme").unwrap().card_count(), 0);
    assert!(machine.cards_on("vme").is_empty());
    assert_eq!(machine.card_state("slot1"), Some(CardState::Detached));
    assert_eq!(machine.card_state("slot2"), Some(CardState::Detached));
    assert_eq!(machine.card_state("slot3"), Some(CardState::Configured));
    assert!(!machine.slot("slot1").unwrap().is_empty());

    // A second teardown has nothing left to detach.
    machine.teardown();
    assert_eq!(machine.card_state("slot1"), Some(CardState::Detached));
}

#[test]
fn delegating_bus_installs_into_the_processor_program_space() {
    let machine = started(
        r#"{
            "processors": [{ "tag": "maincpu", "data_width": 16 }],
            "buses": [{ "tag": "vme", "use_owner_spaces": true }],
            "slots": [{ "tag": "slot1", "bus": "vme", "card": "mvme350" }]
        }"#,
    );

    let program = machine.processor("maincpu").unwrap().program_space().clone();
    assert!(std::rc::Rc::ptr_eq(&program, &machine.space("vme").unwrap()));
    assert_eq!(machine.bus("vme").unwrap().data_width(), Some(16));

    let program = program.borrow();
    let decoder = program.decoder_at(0x5000).unwrap();
    assert_eq!(decoder.width, DataWidth::D16);
    assert_eq!(decoder.mask, 0x0000_FFFF);
}

#[test]
fn unsupported_processor_width_aborts_start_up() {
    let cfg = MachineConfig::from_json(
        r#"{
            "processors": [{ "tag": "maincpu", "data_width": 8 }],
            "buses": [{ "tag": "vme", "use_owner_spaces": true }],
            "slots": [{ "tag": "slot1", "bus": "vme", "card": "fcisio1" }]
        }"#,
    )
    .unwrap();
    let mut machine = Machine::from_config(&cfg).unwrap();

    let err = machine.start().unwrap_err();
    assert_eq!(
        err,
        VmeError::UnsupportedBusWidth {
            bus_width: 8,
            width: DataWidth::D16
        }
    );
    assert_eq!(err.to_string(), "VME D16: bus width 8 not supported");
    assert!(!machine.is_started());
    assert_eq!(
        machine.processor("maincpu").unwrap().program_space().borrow().decoder_count(),
        0
    );
}

#[test]
fn hand_composed_machine_matches_the_configured_one() {
    let mut machine = Machine::new();
    machine.add_bus(VmeBus::new("vme")).unwrap();
    machine.add_slot("slot1", "vme", None).unwrap();
    machine.plug("slot1", create_card("fcisio1").unwrap()).unwrap();
    machine.start().unwrap();

    assert_eq!(machine.slot("slot1").unwrap().number(), 1);
    let space = machine.space("vme").unwrap();
    let mut space = space.borrow_mut();
    space.write16(0x0096_0002, 0x0102);
    assert_eq!(space.read16(0x0096_0002), 0x0102);
}

#[test]
fn reset_clears_every_card() {
    let mut machine = started(BACKPLANE);
    let space = machine.space("vme").unwrap();
    space.borrow_mut().write8(0xFF00, 0x77);

    machine.reset();

    assert_eq!(space.borrow_mut().read8(0xFF00), 0);
}
