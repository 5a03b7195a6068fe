// ── Domain push events ──

use super::device::DeviceState;
use super::id::EntityId;
use super::zone::ZoneState;

/// An incremental update pushed by the bridge, normalized from the wire.
///
/// Carries the complete replacement state for one entity. Consumed once
/// by the merge, never retained.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Zone { id: EntityId, state: ZoneState },
    Device { id: EntityId, state: DeviceState },
}

impl Event {
    /// The identifier of the entity this event addresses.
    pub fn id(&self) -> &EntityId {
        match self {
            Self::Zone { id, .. } | Self::Device { id, .. } => id,
        }
    }
}
