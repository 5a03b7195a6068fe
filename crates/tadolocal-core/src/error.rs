// ── Core error types ──
//
// Consumer-facing errors from tadolocal-core. These are NOT
// transport-specific -- consumers never see reqwest or serde failures
// directly. The `From<tadolocal_api::Error>` impl translates api-layer
// errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach bridge at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Bridge returned HTTP {status} for {endpoint}")]
    UpstreamStatus { status: u16, endpoint: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Synchronizer is not connected")]
    NotConnected,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Zone not found: {id}")]
    ZoneNotFound { id: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from api-layer errors ─────────────────────────────────

impl From<tadolocal_api::Error> for CoreError {
    fn from(err: tadolocal_api::Error) -> Self {
        match err {
            tadolocal_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                }
            }
            tadolocal_api::Error::Status { status, endpoint } => {
                CoreError::UpstreamStatus { status, endpoint }
            }
            tadolocal_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid URL: {e}"),
            },
            tadolocal_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("deserialization error: {message}"))
            }
        }
    }
}
