//! Push event stream with auto-reconnect.
//!
//! Connects to the bridge's `/events` endpoint and streams parsed push
//! events through a [`tokio::sync::broadcast`] channel. The endpoint is
//! line-oriented server-push: frames prefixed `data:` carry a JSON body.
//! On any transport failure, non-success status, or stream end, the loop
//! waits a fixed delay and reconnects; only cancellation stops it.
//!
//! # Example
//!
//! ```rust,ignore
//! use tadolocal_api::events::{EventStreamConfig, EventStreamHandle};
//! use tadolocal_api::transport::TransportConfig;
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let cancel = CancellationToken::new();
//! let base: Url = "http://192.168.1.50:4407".parse()?;
//!
//! let handle = EventStreamHandle::spawn(
//!     &base,
//!     &TransportConfig::default(),
//!     EventStreamConfig::default(),
//!     cancel.clone(),
//! )?;
//! let mut rx = handle.subscribe();
//!
//! while let Ok(event) = rx.recv().await {
//!     println!("{event:?}");
//! }
//!
//! handle.shutdown();
//! ```

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::models::PushEvent;
use crate::transport::TransportConfig;

const EVENT_CHANNEL_CAPACITY: usize = 256;
const FRAME_PREFIX: &str = "data:";

// ── EventStreamConfig ────────────────────────────────────────────────

/// Reconnect behavior for the event stream.
///
/// The delay is flat: no exponential growth, no jitter. The stream talks
/// to a single bridge on the local network, so reconnection storms from
/// many clients are not a concern here.
#[derive(Debug, Clone)]
pub struct EventStreamConfig {
    /// Delay between a stream failure and the next connection attempt.
    pub reconnect_delay: Duration,
}

impl Default for EventStreamConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(10),
        }
    }
}

// ── EventStreamHandle ────────────────────────────────────────────────

/// Handle to a running event stream.
///
/// Subscribe for events, or cancel the shared token to tear the
/// background task down.
pub struct EventStreamHandle {
    event_rx: broadcast::Receiver<PushEvent>,
    cancel: CancellationToken,
}

impl EventStreamHandle {
    /// Spawn the reconnection loop against `{base_url}/events`.
    ///
    /// Returns immediately once the background task is spawned; the
    /// first connection attempt happens asynchronously.
    pub fn spawn(
        base_url: &Url,
        transport: &TransportConfig,
        config: EventStreamConfig,
        cancel: CancellationToken,
    ) -> Result<Self, Error> {
        let url = base_url.join("/events")?;
        let http = transport.build_stream_client()?;
        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            stream_loop(http, url, event_tx, config, task_cancel).await;
        });

        Ok(Self { event_rx, cancel })
    }

    /// Get a new broadcast receiver for the event stream.
    ///
    /// Multiple consumers can subscribe concurrently. A consumer that
    /// falls behind receives [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.event_rx.resubscribe()
    }

    /// Signal the background task to shut down.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect, read until the stream drops, back off, repeat.
///
/// Never terminates on its own; durability over the process lifetime is
/// indefinite retry with a constant delay.
async fn stream_loop(
    http: reqwest::Client,
    url: Url,
    event_tx: broadcast::Sender<PushEvent>,
    config: EventStreamConfig,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = connect_and_read(&http, &url, &event_tx, &cancel) => {
                match result {
                    Ok(()) => tracing::info!("event stream ended, reconnecting"),
                    Err(e) => tracing::warn!(error = %e, "event stream failed"),
                }

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(config.reconnect_delay) => {}
                }
            }
        }
    }
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one streaming connection and read line frames until it
/// drops. `Ok(())` means the server closed the stream (or we were
/// cancelled); the caller decides whether to reconnect.
async fn connect_and_read(
    http: &reqwest::Client,
    url: &Url,
    event_tx: &broadcast::Sender<PushEvent>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::debug!(url = %url, "connecting to event stream");

    let resp = http
        .get(url.clone())
        .send()
        .await
        .map_err(Error::Transport)?;

    let status = resp.status();
    if !status.is_success() {
        return Err(Error::Status {
            status: status.as_u16(),
            endpoint: "/events".into(),
        });
    }

    tracing::info!("event stream connected");

    let mut body = resp.bytes_stream();
    let mut buf: Vec<u8> = Vec::new();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            chunk = body.next() => {
                match chunk {
                    Some(Ok(bytes)) => {
                        buf.extend_from_slice(&bytes);
                        for line in drain_lines(&mut buf) {
                            handle_line(&line, event_tx);
                        }
                    }
                    Some(Err(e)) => return Err(Error::Transport(e)),
                    None => return Ok(()),
                }
            }
        }
    }
}

// ── Frame handling ───────────────────────────────────────────────────

/// Split complete newline-terminated lines off the front of `buf`,
/// leaving any partial trailing line in place for the next chunk.
fn drain_lines(buf: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
        let rest = buf.split_off(pos + 1);
        let mut line = std::mem::replace(buf, rest);
        line.pop();
        lines.push(String::from_utf8_lossy(&line).into_owned());
    }
    lines
}

/// Handle one raw line. Only `data:`-prefixed frames carry events.
/// Parse failures are expected noise (keep-alives, comments, truncated
/// payloads), dropped without surfacing an error.
fn handle_line(raw: &str, event_tx: &broadcast::Sender<PushEvent>) {
    let line = raw.trim();
    let Some(payload) = line.strip_prefix(FRAME_PREFIX) else {
        return;
    };

    match serde_json::from_str::<PushEvent>(payload.trim()) {
        Ok(PushEvent::Unknown) => {
            tracing::debug!("ignoring push event with unknown type");
        }
        Ok(event) => {
            // Send errors just mean no active subscribers right now.
            let _ = event_tx.send(event);
        }
        Err(e) => {
            tracing::debug!(error = %e, "dropping malformed event frame");
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::RawId;

    fn channel() -> (broadcast::Sender<PushEvent>, broadcast::Receiver<PushEvent>) {
        broadcast::channel(16)
    }

    #[test]
    fn data_frame_is_parsed_and_broadcast() {
        let (tx, mut rx) = channel();

        handle_line(
            r#"data: {"type": "zone", "zone_id": "z1", "state": {"cur_temp_c": 21.5}}"#,
            &tx,
        );

        let event = rx.try_recv().unwrap();
        match event {
            PushEvent::Zone { zone_id, state } => {
                assert_eq!(zone_id, RawId::Text("z1".into()));
                assert_eq!(state["cur_temp_c"], 21.5);
            }
            other => panic!("expected zone event, got {other:?}"),
        }
    }

    #[test]
    fn device_frame_is_parsed_and_broadcast() {
        let (tx, mut rx) = channel();

        handle_line(
            r#"data: {"type": "device", "device_id": 4, "state": {"battery_low": true}}"#,
            &tx,
        );

        let event = rx.try_recv().unwrap();
        assert!(matches!(event, PushEvent::Device { .. }));
    }

    #[test]
    fn malformed_payload_is_dropped_silently() {
        let (tx, mut rx) = channel();

        handle_line("data: {not json", &tx);
        handle_line("data: 42", &tx);
        handle_line(r#"data: {"type": "zone"}"#, &tx);

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unknown_event_type_is_ignored() {
        let (tx, mut rx) = channel();

        handle_line(r#"data: {"type": "weather", "outside_temp_c": 3.0}"#, &tx);

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn non_data_lines_are_ignored() {
        let (tx, mut rx) = channel();

        handle_line("", &tx);
        handle_line(": keep-alive", &tx);
        handle_line("event: update", &tx);

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn frame_prefix_without_space_is_accepted() {
        let (tx, mut rx) = channel();

        handle_line(
            r#"data:{"type": "zone", "zone_id": 1, "state": {"mode": 0}}"#,
            &tx,
        );

        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn drain_lines_keeps_partial_tail() {
        let mut buf = b"data: one\ndata: tw".to_vec();

        let lines = drain_lines(&mut buf);
        assert_eq!(lines, vec!["data: one".to_owned()]);
        assert_eq!(buf, b"data: tw".to_vec());

        buf.extend_from_slice(b"o\n");
        let lines = drain_lines(&mut buf);
        assert_eq!(lines, vec!["data: two".to_owned()]);
        assert!(buf.is_empty());
    }

    #[test]
    fn drain_lines_handles_crlf() {
        let mut buf = b"data: x\r\n\r\n".to_vec();

        let lines = drain_lines(&mut buf);
        assert_eq!(lines.len(), 2);
        // The carriage return survives draining; handle_line trims it.
        assert_eq!(lines[0].trim(), "data: x");
    }

    #[test]
    fn default_config_uses_flat_ten_second_delay() {
        let config = EventStreamConfig::default();
        assert_eq!(config.reconnect_delay, Duration::from_secs(10));
    }
}
