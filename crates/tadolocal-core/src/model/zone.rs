// ── Zone domain types ──

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::EntityId;

/// Default settable range when the bridge doesn't report one.
const DEFAULT_MIN_TEMP_C: f64 = 30.0;
const DEFAULT_MAX_TEMP_C: f64 = 80.0;

/// Zone kind. Fixed at creation; a zone never changes kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneKind {
    Standard,
    HotWater,
}

/// Operating mode as the bridge reports it: numeric or symbolic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModeValue {
    Number(i64),
    Name(String),
}

impl ModeValue {
    /// True when this mode means "off": numeric 0 or the literal name.
    pub fn is_off(&self) -> bool {
        match self {
            Self::Number(n) => *n == 0,
            Self::Name(s) => s.eq_ignore_ascii_case("off"),
        }
    }
}

/// A logical controllable heating area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: EntityId,
    pub name: String,
    pub kind: ZoneKind,
    pub state: ZoneState,
}

/// Mutable zone state.
///
/// Replaced wholesale by polls and push events -- never field-merged --
/// so it always reflects exactly one bridge message. Fields the bridge
/// sends that we don't model are preserved in `extra`, which keeps the
/// replacement observable field-for-field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cur_temp_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_temp_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hum_perc: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cur_heating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ModeValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hot_water: Option<HotWaterState>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ZoneState {
    /// Whether the zone is currently calling for heat.
    pub fn heating_active(&self) -> bool {
        self.cur_heating.unwrap_or(0.0) > 0.0
    }

    /// Whether the reported mode means "off".
    pub fn is_off(&self) -> bool {
        self.mode.as_ref().is_some_and(ModeValue::is_off)
    }
}

/// Hot-water sub-state, present only on hot-water zones. Populated by
/// the per-zone enrichment fetch and by push events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HotWaterState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ModeValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_temp_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_temp_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_temp_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_temperature: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Interpreted hot-water operation, derived from the free-form mode tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotWaterOperation {
    Off,
    Auto,
    Heat,
}

impl HotWaterState {
    /// Interpret the reported mode.
    ///
    /// An absent mode means the zone follows its schedule. Schedule-like
    /// names (`auto`, `schedule`, `smart_schedule`) map to Auto; `off`
    /// and numeric 0 to Off; anything else means actively heating.
    pub fn operation(&self) -> HotWaterOperation {
        match &self.mode {
            None => HotWaterOperation::Auto,
            Some(mode) if mode.is_off() => HotWaterOperation::Off,
            Some(ModeValue::Name(name)) => match name.to_ascii_lowercase().as_str() {
                "auto" | "schedule" | "smart_schedule" => HotWaterOperation::Auto,
                _ => HotWaterOperation::Heat,
            },
            Some(ModeValue::Number(_)) => HotWaterOperation::Heat,
        }
    }

    /// Lowest settable temperature; some firmwares omit it.
    pub fn min_temp(&self) -> f64 {
        self.min_temp_c.unwrap_or(DEFAULT_MIN_TEMP_C)
    }

    /// Highest settable temperature; some firmwares omit it.
    pub fn max_temp(&self) -> f64 {
        self.max_temp_c.unwrap_or(DEFAULT_MAX_TEMP_C)
    }

    /// Whether a target temperature can be set at all. Only an explicit
    /// `false` from the bridge disables it.
    pub fn can_set_temperature(&self) -> bool {
        self.supports_temperature != Some(false)
    }
}
