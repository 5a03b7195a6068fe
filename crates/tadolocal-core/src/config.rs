// ── Runtime connection configuration ──
//
// Describes how to reach one bridge. Built by the consumer (CLI or
// platform glue) from externally validated parameters; the core never
// reads config files.

use std::time::Duration;

use url::Url;

use tadolocal_api::transport::TransportConfig;

use crate::error::CoreError;

/// Default bridge port.
pub const DEFAULT_PORT: u16 = 4407;

/// Default full-poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Configuration for one synchronized bridge connection.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Bridge base URL (e.g. `http://192.168.1.50:4407`).
    pub base_url: Url,
    /// Full-poll interval. Zero disables the periodic poll.
    pub poll_interval: Duration,
    /// Total wall-clock budget for one poll cycle (all of its requests
    /// together); also the per-request ceiling for command writes.
    pub request_timeout: Duration,
    /// Ceiling for the one-off reachability probe.
    pub probe_timeout: Duration,
    /// Delay between event-stream failures and reconnect attempts.
    pub stream_reconnect_delay: Duration,
    /// Enable the push event stream.
    pub stream_enabled: bool,
}

impl SyncConfig {
    /// Build a config for `http://{host}:{port}` with default tuning.
    pub fn for_host(host: &str, port: u16) -> Result<Self, CoreError> {
        let base_url = format!("http://{host}:{port}")
            .parse()
            .map_err(|e| CoreError::Config {
                message: format!("invalid host/port: {e}"),
            })?;
        Ok(Self::for_base_url(base_url))
    }

    /// Build a config for an already-parsed base URL with default tuning.
    pub fn for_base_url(base_url: Url) -> Self {
        Self {
            base_url,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: Duration::from_secs(15),
            probe_timeout: Duration::from_secs(5),
            stream_reconnect_delay: Duration::from_secs(10),
            stream_enabled: true,
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            timeout: self.request_timeout,
            probe_timeout: self.probe_timeout,
            ..TransportConfig::default()
        }
    }
}
