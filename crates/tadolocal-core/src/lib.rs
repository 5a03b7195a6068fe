// tadolocal-core: synchronization engine between tadolocal-api and consumers.

pub mod command;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod store;
pub mod stream;

mod convert;
mod snapshot;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, HotWaterMode, ZoneSetting};
pub use config::SyncConfig;
pub use coordinator::{Coordinator, Readiness};
pub use error::CoreError;
pub use store::SyncState;
pub use stream::StateStream;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Device, DeviceState, EntityId, Event, HotWaterOperation, HotWaterState, ModeValue, Zone,
    ZoneKind, ZoneState,
};
