// ── Unified domain model ──
//
// Every type in this module is the canonical representation of a bridge
// entity. Wire looseness (dual identifier fields, bare-or-wrapped
// listings, free-form tags) is normalized away before these types are
// constructed; consumers depend only on this interface.

pub mod device;
pub mod event;
pub mod id;
pub mod zone;

// ── Re-exports ──────────────────────────────────────────────────────
// Flat access: `use tadolocal_core::model::*` gives you everything.

pub use device::{Device, DeviceState, display_model};
pub use event::Event;
pub use id::EntityId;
pub use zone::{HotWaterOperation, HotWaterState, ModeValue, Zone, ZoneKind, ZoneState};
