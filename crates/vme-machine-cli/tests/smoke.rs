#![cfg(not(target_arch = "wasm32"))]

use std::path::Path;
use std::process::{Command, Output};

const CONFIG: &str = r#"{
    "buses": [{ "tag": "vme" }],
    "slots": [
        { "tag": "slot1", "bus": "vme", "card": "mzr8300" },
        { "tag": "slot2", "bus": "vme", "card": "fcscsi1" }
    ]
}"#;

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vme-machine"))
        .args(args)
        .output()
        .expect("failed to run vme-machine CLI")
}

fn write_config(dir: &Path, json: &str) -> String {
    let path = dir.join("machine.json");
    std::fs::write(&path, json).expect("failed to write config");
    path.to_str().expect("config path should be UTF-8").to_string()
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "vme-machine failed.\nstderr:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn lists_the_slot_catalog() {
    let stdout = stdout_of(&run(&["--list-cards"]));
    for name in ["mzr8300", "mvme350", "fcisio1", "fcscsi1"] {
        assert!(stdout.contains(name), "missing {name} in:\n{stdout}");
    }
}

#[test]
fn prints_decoders_and_round_trips_a_poke() {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let config = write_config(tmp.path(), CONFIG);

    let stdout = stdout_of(&run(&[
        "--config",
        &config,
        "--width",
        "d32",
        "--poke",
        "0xE00004=0xCAFEF00D",
        "--peek",
        "0xE00004",
        "--peek",
        "0x1000",
    ]));

    assert!(stdout.contains("vme: VME A32 (32 bits)"), "{stdout}");
    assert!(stdout.contains("slot 1  mzr8300"), "{stdout}");
    assert!(stdout.contains("slot 2  fcscsi1"), "{stdout}");
    assert!(stdout.contains("0x0000ff00..=0x0000ff1f D8"), "{stdout}");
    assert!(stdout.contains("0x00e00004 = 0xcafef00d"), "{stdout}");
    assert!(stdout.contains("0x00001000 = 0xffffffff"), "{stdout}");
}

#[test]
fn rejects_an_unknown_card() {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let config = write_config(
        tmp.path(),
        r#"{ "buses": [{ "tag": "vme" }],
             "slots": [{ "tag": "slot1", "bus": "vme", "card": "mzr8105" }] }"#,
    );

    let output = run(&["--config", &config]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown VME card `mzr8105`"), "{stderr}");
}

#[test]
fn rejects_a_poke_wider_than_the_access() {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let config = write_config(tmp.path(), CONFIG);

    let output = run(&["--config", &config, "--poke", "0xFF00=0x1FF"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("value does not fit a D8 access"), "{stderr}");

    let output = run(&[
        "--config", &config, "--width", "d16", "--poke", "0xFF00=0x1FFFF",
    ]);
    assert!(!output.status.success());

    let stdout = stdout_of(&run(&[
        "--config", &config, "--width", "d16", "--poke", "0xFF00=0x1234", "--peek", "0xFF00",
    ]));
    assert!(stdout.contains("0x0000ff00 = 0x1234"), "{stdout}");
}
