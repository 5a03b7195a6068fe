// ── Command API ──
//
// All write operations flow through a unified `Command` enum, routed by
// the coordinator's processor task. A successful write triggers an
// out-of-band refresh so the cached state converges ahead of the next
// scheduled poll.

use crate::error::CoreError;
use crate::model::EntityId;

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<(), CoreError>>,
}

/// Write operations against the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Change a standard zone's setpoint or scheduling mode.
    SetZone { id: EntityId, setting: ZoneSetting },

    /// Change a hot-water zone's operation and/or target temperature.
    SetHotWater {
        id: EntityId,
        mode: Option<HotWaterMode>,
        temperature: Option<f64>,
    },
}

/// Desired setting for a standard zone.
///
/// Encoded on the wire as a single temperature parameter: 0 switches
/// off, -1 resumes the schedule, anything else is the target in °C.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoneSetting {
    Off,
    Auto,
    Heat(f64),
}

impl ZoneSetting {
    pub(crate) fn temperature_param(self) -> f64 {
        match self {
            Self::Off => 0.0,
            Self::Auto => -1.0,
            Self::Heat(target) => target,
        }
    }
}

/// Hot-water operation modes accepted by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotWaterMode {
    Heat,
    Auto,
    Off,
}

impl HotWaterMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heat => "heat",
            Self::Auto => "auto",
            Self::Off => "off",
        }
    }
}
