// Shared transport configuration for building reqwest::Client instances.
//
// Poll-cycle requests and control writes share one client with a
// per-request timeout; the total budget for a whole poll cycle is
// enforced by the caller around the cycle, not here. The event stream
// needs a separate client without a request timeout: the streaming GET
// is expected to stay open indefinitely, and liveness is the reader's
// responsibility.

use std::time::Duration;

use crate::error::Error;

const USER_AGENT: &str = concat!("tadolocal/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Ceiling applied to each individual request. Callers that issue
    /// several requests per cycle put their own total budget on top.
    pub timeout: Duration,
    /// Shorter ceiling for the one-off reachability probe.
    pub probe_timeout: Duration,
    /// Connect-phase ceiling, applied to every client (streaming included).
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            probe_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl TransportConfig {
    /// Build the request/response client used for polls and commands.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(Error::Transport)
    }

    /// Build the streaming client. No total-request timeout: `/events`
    /// stays open for the life of the connection.
    pub fn build_stream_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(Error::Transport)
    }
}
