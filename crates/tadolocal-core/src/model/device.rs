// ── Device domain types ──

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::EntityId;

/// Display names for known device-type tags.
const MODEL_NAMES: &[(&str, &str)] = &[
    ("internet_bridge", "Internet Bridge"),
    ("thermostat", "Smart Thermostat"),
    ("smart_ac_control", "Smart AC Control"),
    ("radiator_valve", "Radiator Thermostat"),
    ("extension_kit", "Extension Kit"),
    ("zone_control", "Zone Control"),
    ("hot_water", "Hot Water"),
];

/// A physical controller or sensor unit, optionally attached to a zone.
///
/// The zone association is just that -- an association, not ownership;
/// devices outlive zone membership changes across polls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: EntityId,
    /// Serial number; synthesized as `Unknown_<id>` when the bridge
    /// doesn't report one.
    pub serial: String,
    /// Raw device-type tag as reported. See [`display_model`].
    pub device_type: Option<String>,
    pub zone_id: Option<EntityId>,
    pub state: DeviceState,
}

impl Device {
    /// Human-readable model name for this device.
    pub fn model_name(&self) -> String {
        display_model(self.device_type.as_deref().unwrap_or(""))
    }
}

/// Mutable device state. Replaced wholesale, like zone state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_low: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceState {
    /// Whether the device reports a low battery. Unreported means no.
    pub fn is_battery_low(&self) -> bool {
        self.battery_low.unwrap_or(false)
    }
}

/// Human-readable model name for a raw device-type tag.
///
/// Known tags map through the lookup table; unknown tags are humanized
/// (`smart_strip` -> `Smart Strip`); empty input falls back to a
/// generic label.
pub fn display_model(raw: &str) -> String {
    if raw.is_empty() {
        return "Unknown Device".to_owned();
    }
    if let Some((_, name)) = MODEL_NAMES.iter().find(|(tag, _)| *tag == raw) {
        return (*name).to_owned();
    }
    humanize(raw)
}

fn humanize(raw: &str) -> String {
    raw.split('_')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect()
            })
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_use_the_lookup_table() {
        assert_eq!(display_model("radiator_valve"), "Radiator Thermostat");
        assert_eq!(display_model("internet_bridge"), "Internet Bridge");
        assert_eq!(display_model("hot_water"), "Hot Water");
    }

    #[test]
    fn unknown_tags_are_humanized() {
        assert_eq!(display_model("smart_strip"), "Smart Strip");
        assert_eq!(display_model("BOILER_relay"), "Boiler Relay");
    }

    #[test]
    fn empty_tag_falls_back() {
        assert_eq!(display_model(""), "Unknown Device");
    }

    #[test]
    fn battery_low_defaults_to_false() {
        let state = DeviceState::default();
        assert!(!state.is_battery_low());

        let state: DeviceState =
            serde_json::from_str(r#"{"battery_low": true, "rssi": -60}"#).unwrap();
        assert!(state.is_battery_low());
        assert_eq!(state.extra["rssi"], -60);
    }
}
