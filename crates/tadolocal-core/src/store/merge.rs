// ── Incremental event application ──
//
// Pure merge of one push event into the aggregate. Full-state
// replacement: the event payload becomes the entity's entire state
// sub-object, never a field-level merge. Events never create entities;
// an unknown identifier is a no-op, picked up by the next poll instead.

use super::SyncState;
use crate::model::Event;

/// Apply `event` to `state` in place.
///
/// Returns `true` when the addressed entity exists and its state was
/// replaced -- equal content still counts, the caller decides whether
/// to republish.
pub(crate) fn apply_event(state: &mut SyncState, event: &Event) -> bool {
    match event {
        Event::Zone { id, state: next } => {
            if let Some(zone) = state.zones.iter_mut().find(|z| z.id == *id) {
                zone.state = next.clone();
                true
            } else {
                false
            }
        }
        Event::Device { id, state: next } => {
            if let Some(device) = state.devices.iter_mut().find(|d| d.id == *id) {
                device.state = next.clone();
                true
            } else {
                false
            }
        }
    }
}
