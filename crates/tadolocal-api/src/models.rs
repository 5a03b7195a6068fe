// ── Wire-level types ──
//
// The bridge is loose about shapes: listings arrive bare or wrapped,
// identifiers may be integers or strings and may live under an
// entity-specific field or a generic `id`. These types absorb that
// looseness; `tadolocal-core` normalizes them into the domain model.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

// ── Identifiers ─────────────────────────────────────────────────────

/// A zone or device identifier exactly as the bridge sends it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

// ── Listings ────────────────────────────────────────────────────────

/// One zone record from `GET /zones`.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneRecord {
    #[serde(default)]
    pub zone_id: Option<RawId>,
    #[serde(default)]
    pub id: Option<RawId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub zone_type: Option<String>,
    #[serde(default)]
    pub state: Option<Value>,
}

impl ZoneRecord {
    /// The effective identifier: `zone_id` wins over `id`.
    pub fn ident(&self) -> Option<&RawId> {
        self.zone_id.as_ref().or(self.id.as_ref())
    }
}

/// One device record from `GET /devices`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceRecord {
    #[serde(default)]
    pub device_id: Option<RawId>,
    #[serde(default)]
    pub id: Option<RawId>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub zone_id: Option<RawId>,
    #[serde(default)]
    pub state: Option<Value>,
}

impl DeviceRecord {
    /// The effective identifier: `device_id` wins over `id`.
    pub fn ident(&self) -> Option<&RawId> {
        self.device_id.as_ref().or(self.id.as_ref())
    }
}

/// `GET /zones` body: either a bare array or wrapped under `"zones"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ZoneListing {
    Bare(Vec<ZoneRecord>),
    Wrapped { zones: Vec<ZoneRecord> },
}

impl ZoneListing {
    pub(crate) fn into_zones(self) -> Vec<ZoneRecord> {
        match self {
            Self::Bare(zones) | Self::Wrapped { zones } => zones,
        }
    }
}

/// `GET /devices` body: either a bare array or wrapped under `"devices"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum DeviceListing {
    Bare(Vec<DeviceRecord>),
    Wrapped { devices: Vec<DeviceRecord> },
}

impl DeviceListing {
    pub(crate) fn into_devices(self) -> Vec<DeviceRecord> {
        match self {
            Self::Bare(devices) | Self::Wrapped { devices } => devices,
        }
    }
}

// ── Hot-water detail ────────────────────────────────────────────────

/// `GET /hot_water/{id}` body. Only the `state` member is merged back
/// into the zone; everything else the endpoint sends is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct HotWaterDetail {
    #[serde(default)]
    pub state: Option<Value>,
}

// ── Push events ─────────────────────────────────────────────────────

/// One push event from the `/events` stream, discriminated by `type`.
///
/// The state payload is kept raw here; typing happens when the event is
/// merged into the domain model.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PushEvent {
    Zone { zone_id: RawId, state: Value },
    Device { device_id: RawId, state: Value },
    /// Any `type` tag we don't recognize. Parses cleanly so the reader
    /// can drop it instead of treating it as a malformed frame.
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn zone_listing_bare_and_wrapped_normalize_identically() {
        let bare = r#"[{"zone_id": 1, "name": "Living Room"}]"#;
        let wrapped = r#"{"zones": [{"zone_id": 1, "name": "Living Room"}]}"#;

        let a: ZoneListing = serde_json::from_str(bare).unwrap();
        let b: ZoneListing = serde_json::from_str(wrapped).unwrap();

        let a = a.into_zones();
        let b = b.into_zones();
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        assert_eq!(a[0].name.as_deref(), Some("Living Room"));
        assert_eq!(b[0].name.as_deref(), Some("Living Room"));
    }

    #[test]
    fn zone_ident_prefers_zone_id_over_id() {
        let record: ZoneRecord =
            serde_json::from_str(r#"{"zone_id": "z1", "id": "other"}"#).unwrap();
        assert_eq!(record.ident(), Some(&RawId::Text("z1".into())));
    }

    #[test]
    fn zone_ident_falls_back_to_id() {
        let record: ZoneRecord = serde_json::from_str(r#"{"id": 7}"#).unwrap();
        assert_eq!(record.ident(), Some(&RawId::Int(7)));
    }

    #[test]
    fn raw_id_accepts_int_and_string() {
        let int: RawId = serde_json::from_str("3").unwrap();
        let text: RawId = serde_json::from_str(r#""3""#).unwrap();
        assert_eq!(int, RawId::Int(3));
        assert_eq!(text, RawId::Text("3".into()));
        assert_eq!(int.to_string(), text.to_string());
    }

    #[test]
    fn push_event_zone_variant() {
        let json = r#"{"type": "zone", "zone_id": "z1", "state": {"cur_temp_c": 21.0}}"#;
        let event: PushEvent = serde_json::from_str(json).unwrap();
        match event {
            PushEvent::Zone { zone_id, state } => {
                assert_eq!(zone_id, RawId::Text("z1".into()));
                assert_eq!(state["cur_temp_c"], 21.0);
            }
            other => panic!("expected zone event, got {other:?}"),
        }
    }

    #[test]
    fn push_event_unknown_type_parses_as_unknown() {
        let json = r#"{"type": "weather", "outside_temp_c": 9.5}"#;
        let event: PushEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, PushEvent::Unknown));
    }

    #[test]
    fn push_event_missing_state_is_a_parse_error() {
        let json = r#"{"type": "device", "device_id": 4}"#;
        assert!(serde_json::from_str::<PushEvent>(json).is_err());
    }
}
