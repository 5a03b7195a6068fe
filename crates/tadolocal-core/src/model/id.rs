// ── Core identity ──
//
// Zone and device identifiers arrive from the bridge as integers or
// strings, under either an entity-specific field (`zone_id`/`device_id`)
// or a generic `id`. Normalization into this canonical type happens once
// at ingestion; every downstream lookup compares only `EntityId`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use tadolocal_api::models::RawId;

/// Canonical identifier for a zone or device.
///
/// Transparently wraps either an integer or a string identifier.
/// Consumers never care which; a numeric string parses to the integer
/// form so `"3"` and `3` address the same entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Text(String),
}

impl EntityId {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Int(_) => None,
        }
    }

    /// The wire form of this identifier, for URL construction.
    pub fn to_raw(&self) -> RawId {
        match self {
            Self::Int(n) => RawId::Int(*n),
            Self::Text(s) => RawId::Text(s.clone()),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<RawId> for EntityId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Int(n) => Self::Int(n),
            RawId::Text(s) => Self::from(s),
        }
    }
}

impl From<&RawId> for EntityId {
    fn from(raw: &RawId) -> Self {
        Self::from(raw.clone())
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        match s.parse::<i64>() {
            Ok(n) => Self::Int(n),
            Err(_) => Self::Text(s),
        }
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn numeric_string_normalizes_to_int() {
        let id = EntityId::from("42");
        assert_eq!(id, EntityId::Int(42));
        assert_eq!(id, EntityId::from(RawId::Int(42)));
        assert_eq!(id, EntityId::from(RawId::Text("42".into())));
    }

    #[test]
    fn non_numeric_string_stays_text() {
        let id = EntityId::from("living-room");
        assert_eq!(id.as_text(), Some("living-room"));
    }

    #[test]
    fn display_matches_wire_form() {
        assert_eq!(EntityId::Int(7).to_string(), "7");
        assert_eq!(EntityId::Text("z1".into()).to_string(), "z1");
        assert_eq!(EntityId::Int(7).to_raw().to_string(), "7");
    }

    #[test]
    fn from_str_is_infallible() {
        let id: EntityId = "z1".parse().unwrap();
        assert_eq!(id, EntityId::Text("z1".into()));
    }
}
