use serde::{Deserialize, Serialize};

use crate::bus::DEFAULT_CPU_TAG;
use crate::error::{Result, VmeError};

fn default_bus_width() -> u32 {
    32
}

fn default_cpu_tag() -> String {
    DEFAULT_CPU_TAG.to_string()
}

/// Host processor description.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessorConfig {
    pub tag: String,
    /// Data bus width of the program space in bits.
    pub data_width: u32,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VmeBusConfig {
    pub tag: String,
    /// Width of the bus's own address space. Ignored with `use_owner_spaces`.
    #[serde(default = "default_bus_width")]
    pub data_width: u32,
    /// Decode in `cpu_tag`'s program space instead of allocating one.
    #[serde(default)]
    pub use_owner_spaces: bool,
    #[serde(default = "default_cpu_tag")]
    pub cpu_tag: String,
}

impl VmeBusConfig {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            data_width: default_bus_width(),
            use_owner_spaces: false,
            cpu_tag: default_cpu_tag(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlotConfig {
    pub tag: String,
    /// Tag of the bus the slot sits on.
    pub bus: String,
    /// Catalog name of the plugged card; `None` leaves the slot empty.
    #[serde(default)]
    pub card: Option<String>,
}

/// Everything needed to compose a [`crate::Machine`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineConfig {
    #[serde(default)]
    pub processors: Vec<ProcessorConfig>,
    #[serde(default)]
    pub buses: Vec<VmeBusConfig>,
    #[serde(default)]
    pub slots: Vec<SlotConfig>,
}

impl MachineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| VmeError::InvalidConfig(err.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|err| VmeError::InvalidConfig(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_filled_in() {
        let cfg = MachineConfig::from_json(
            r#"{
                "buses": [{ "tag": "vme" }],
                "slots": [{ "tag": "slot1", "bus": "vme" }]
            }"#,
        )
        .unwrap();

        assert!(cfg.processors.is_empty());
        assert_eq!(cfg.buses, vec![VmeBusConfig::new("vme")]);
        assert_eq!(cfg.slots[0].card, None);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = MachineConfig::from_json(r#"{ "busses": [] }"#).unwrap_err();
        assert!(matches!(err, VmeError::InvalidConfig(_)), "{err}");
    }

    #[test]
    fn json_round_trip_preserves_the_description() {
        let cfg = MachineConfig {
            processors: vec![ProcessorConfig {
                tag: "maincpu".to_string(),
                data_width: 16,
            }],
            buses: vec![VmeBusConfig {
                use_owner_spaces: true,
                ..VmeBusConfig::new("vme")
            }],
            slots: vec![SlotConfig {
                tag: "slot1".to_string(),
                bus: "vme".to_string(),
                card: Some("mzr8300".to_string()),
            }],
        };
        let json = cfg.to_json_pretty().unwrap();
        assert_eq!(MachineConfig::from_json(&json).unwrap(), cfg);
    }
}
