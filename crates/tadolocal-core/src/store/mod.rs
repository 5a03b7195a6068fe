// ── Canonical synchronized state ──
//
// One aggregate, replaced wholesale by polls and copy-on-write patched
// by push events. Reads are snapshot reads: consumers hold an `Arc` and
// are never blocked by an in-flight write.

pub(crate) mod merge;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::model::{Device, DeviceState, EntityId, Event, HotWaterState, Zone, ZoneState};

/// The canonical aggregate of all zones and devices.
///
/// Published as one atomic unit: a snapshot either reflects a complete
/// poll cycle or a complete poll cycle plus whole-state event patches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    pub zones: Vec<Zone>,
    pub devices: Vec<Device>,
}

impl SyncState {
    pub fn zone(&self, id: &EntityId) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == *id)
    }

    pub fn device(&self, id: &EntityId) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == *id)
    }

    // ── Read-only projections ────────────────────────────────────────
    // Presentation entities hold only an identifier and ask for current
    // sub-state here; they never keep their own copy of shared state.

    pub fn zone_state(&self, id: &EntityId) -> Option<&ZoneState> {
        self.zone(id).map(|z| &z.state)
    }

    pub fn hot_water_state(&self, id: &EntityId) -> Option<&HotWaterState> {
        self.zone_state(id)?.hot_water.as_ref()
    }

    pub fn device_state(&self, id: &EntityId) -> Option<&DeviceState> {
        self.device(id).map(|d| &d.state)
    }
}

/// Reactive holder for the canonical state.
///
/// Single-writer discipline: only the coordinator mutates, through
/// [`replace`](Self::replace) and [`apply_event`](Self::apply_event).
/// Subscribers receive `Arc` snapshots through a `watch` channel.
pub(crate) struct StateStore {
    state: watch::Sender<Arc<SyncState>>,
    last_full_refresh: watch::Sender<Option<DateTime<Utc>>>,
    last_push_event: watch::Sender<Option<DateTime<Utc>>>,
}

impl StateStore {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(Arc::new(SyncState::default()));
        let (last_full_refresh, _) = watch::channel(None);
        let (last_push_event, _) = watch::channel(None);

        Self {
            state,
            last_full_refresh,
            last_push_event,
        }
    }

    /// The current snapshot (cheap `Arc` clone).
    pub(crate) fn current(&self) -> Arc<SyncState> {
        self.state.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<SyncState>> {
        self.state.subscribe()
    }

    /// Replace the aggregate wholesale. Polls always republish, even
    /// when the new snapshot equals the previous one.
    pub(crate) fn replace(&self, next: SyncState) {
        self.state.send_replace(Arc::new(next));
        self.last_full_refresh.send_replace(Some(Utc::now()));
    }

    /// Apply one push event copy-on-write. Publishes and returns `true`
    /// only when the merge changed something.
    pub(crate) fn apply_event(&self, event: &Event) -> bool {
        let mut next = SyncState::clone(&self.current());
        if !merge::apply_event(&mut next, event) {
            return false;
        }
        self.state.send_replace(Arc::new(next));
        self.last_push_event.send_replace(Some(Utc::now()));
        true
    }

    pub(crate) fn last_full_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_full_refresh.borrow()
    }

    pub(crate) fn last_push_event(&self) -> Option<DateTime<Utc>> {
        *self.last_push_event.borrow()
    }
}
