// ── Wire → domain conversion ──
//
// All ingestion normalization lives here: dual-field identifier
// resolution, name and serial fallbacks, kind tagging, and state payload
// typing. Records without a usable identifier are dropped -- they could
// never be addressed by a push event or a command.

use serde_json::Value;
use tracing::debug;

use tadolocal_api::models::{DeviceRecord, PushEvent, ZoneRecord};

use crate::model::{Device, DeviceState, EntityId, Event, Zone, ZoneKind, ZoneState};

const HOT_WATER_TAG: &str = "HOT_WATER";

/// Normalize one zone record. Returns `None` when no identifier can be
/// determined.
pub(crate) fn zone_from_record(record: ZoneRecord) -> Option<Zone> {
    let id = EntityId::from(record.ident()?);
    let kind = if record.zone_type.as_deref() == Some(HOT_WATER_TAG) {
        ZoneKind::HotWater
    } else {
        ZoneKind::Standard
    };
    let name = record.name.filter(|n| !n.is_empty()).unwrap_or_else(|| match kind {
        ZoneKind::HotWater => format!("Hot Water {id}"),
        ZoneKind::Standard => format!("Zone {id}"),
    });
    let state = record.state.map(zone_state_from_value).unwrap_or_default();

    Some(Zone {
        id,
        name,
        kind,
        state,
    })
}

/// Normalize one device record. Returns `None` when no identifier can be
/// determined.
pub(crate) fn device_from_record(record: DeviceRecord) -> Option<Device> {
    let id = EntityId::from(record.ident()?);
    let serial = record
        .serial_number
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("Unknown_{id}"));
    let state = record.state.map(device_state_from_value).unwrap_or_default();

    Some(Device {
        id,
        serial,
        device_type: record.device_type,
        zone_id: record.zone_id.map(EntityId::from),
        state,
    })
}

/// Normalize a wire push event into a domain event.
///
/// Unknown types and unusable payloads collapse to `None`; the caller
/// treats that as a no-op. A usable payload is a non-empty JSON object:
/// an event without actual state must not wipe what a poll populated.
pub(crate) fn event_from_push(push: PushEvent) -> Option<Event> {
    match push {
        PushEvent::Zone { zone_id, state } => Some(Event::Zone {
            id: EntityId::from(zone_id),
            state: typed_payload(state)?,
        }),
        PushEvent::Device { device_id, state } => Some(Event::Device {
            id: EntityId::from(device_id),
            state: typed_payload(state)?,
        }),
        PushEvent::Unknown => None,
    }
}

fn zone_state_from_value(value: Value) -> ZoneState {
    serde_json::from_value(value).unwrap_or_else(|e| {
        debug!(error = %e, "unusable zone state payload, storing empty state");
        ZoneState::default()
    })
}

fn device_state_from_value(value: Value) -> DeviceState {
    serde_json::from_value(value).unwrap_or_else(|e| {
        debug!(error = %e, "unusable device state payload, storing empty state");
        DeviceState::default()
    })
}

fn typed_payload<T: serde::de::DeserializeOwned>(value: Value) -> Option<T> {
    match &value {
        Value::Object(map) if !map.is_empty() => serde_json::from_value(value).ok(),
        _ => None,
    }
}
