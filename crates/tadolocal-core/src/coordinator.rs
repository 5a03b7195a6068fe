// ── Synchronization coordinator ──
//
// Owns the canonical state and its lifetime: the blocking first
// refresh, the periodic poll, push-event merging, command routing, and
// teardown. Two independent update sources write to one shared state;
// both funnel through the store's single-writer surface, and refreshes
// are serialized to at most one in flight.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tadolocal_api::LocalClient;
use tadolocal_api::events::{EventStreamConfig, EventStreamHandle};
use tadolocal_api::models::PushEvent;

use crate::command::{Command, CommandEnvelope, HotWaterMode};
use crate::config::SyncConfig;
use crate::convert;
use crate::error::CoreError;
use crate::model::HotWaterState;
use crate::snapshot;
use crate::store::{StateStore, SyncState};
use crate::stream::StateStream;

const COMMAND_CHANNEL_SIZE: usize = 16;

// ── Readiness ────────────────────────────────────────────────────────

/// Coordinator readiness, observable by consumers.
///
/// `Ready` is entered exactly once per `connect()`, after the blocking
/// first refresh has produced a complete snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Uninitialized,
    Ready,
}

// ── Coordinator ──────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc`. [`connect()`](Self::connect) performs
/// the blocking first refresh and spawns the background tasks;
/// [`shutdown()`](Self::shutdown) tears them down together.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: SyncConfig,
    client: LocalClient,
    store: StateStore,
    readiness: watch::Sender<Readiness>,
    /// Last poll failure, `None` again after a successful cycle.
    refresh_error: watch::Sender<Option<String>>,
    /// Serializes refresh attempts: at most one in flight.
    refresh_lock: Mutex<()>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Coordinator {
    /// Create a new coordinator from configuration. Does NOT connect --
    /// call [`connect()`](Self::connect) to perform the first refresh
    /// and start background tasks.
    pub fn new(config: SyncConfig) -> Result<Self, CoreError> {
        let client = LocalClient::new(config.base_url.clone(), &config.transport())?;
        let (readiness, _) = watch::channel(Readiness::Uninitialized);
        let (refresh_error, _) = watch::channel(None);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        Ok(Self {
            inner: Arc::new(CoordinatorInner {
                config,
                client,
                store: StateStore::new(),
                readiness,
                refresh_error,
                refresh_lock: Mutex::new(()),
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Access the coordinator configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Connect to the bridge.
    ///
    /// Blocks on the first refresh, then spawns the background tasks
    /// (periodic poll, event stream + merge, command processor). A
    /// first-refresh failure is fatal: nothing is published, no tasks
    /// are spawned, and the error propagates to the caller.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let first =
            snapshot::fetch_snapshot(&self.inner.client, self.inner.config.request_timeout)
                .await?;
        info!(
            zones = first.zones.len(),
            devices = first.devices.len(),
            "first refresh complete"
        );
        self.inner.store.replace(first);
        self.inner.readiness.send_replace(Readiness::Ready);

        let mut handles = self.inner.task_handles.lock().await;

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let coordinator = self.clone();
            handles.push(tokio::spawn(command_processor_task(coordinator, rx)));
        }

        if !self.inner.config.poll_interval.is_zero() {
            let coordinator = self.clone();
            let cancel = self.inner.cancel.clone();
            handles.push(tokio::spawn(poll_task(coordinator, cancel)));
        }

        if self.inner.config.stream_enabled {
            let stream = EventStreamHandle::spawn(
                &self.inner.config.base_url,
                &self.inner.config.transport(),
                EventStreamConfig {
                    reconnect_delay: self.inner.config.stream_reconnect_delay,
                },
                self.inner.cancel.clone(),
            )?;
            let events = stream.subscribe();
            let coordinator = self.clone();
            handles.push(tokio::spawn(event_merge_task(coordinator, events)));
        }

        Ok(())
    }

    /// Tear down background tasks. The cached state stays readable.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        self.inner.readiness.send_replace(Readiness::Uninitialized);
        debug!("coordinator shut down");
    }

    // ── Refresh ──────────────────────────────────────────────────────

    /// Run one full refresh now.
    ///
    /// At most one refresh is ever in flight: when another caller (or
    /// the poll timer) is already mid-cycle, this call is skipped. A
    /// failed cycle leaves the previously published state untouched and
    /// records the failure for observers.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let Ok(_guard) = self.inner.refresh_lock.try_lock() else {
            debug!("refresh already in flight, skipping");
            return Ok(());
        };

        let budget = self.inner.config.request_timeout;
        match snapshot::fetch_snapshot(&self.inner.client, budget).await {
            Ok(next) => {
                self.inner.store.replace(next);
                self.inner.refresh_error.send_replace(None);
                Ok(())
            }
            Err(err) => {
                self.inner.refresh_error.send_replace(Some(err.to_string()));
                Err(err)
            }
        }
    }

    /// Reachability probe with the short setup-time ceiling. Usable
    /// before `connect()`.
    pub async fn probe(&self) -> Result<(), CoreError> {
        Ok(self.inner.client.probe().await?)
    }

    // ── State observation ────────────────────────────────────────────

    /// Snapshot read of the canonical state. Never blocks on in-flight
    /// writes.
    pub fn state(&self) -> Arc<SyncState> {
        self.inner.store.current()
    }

    /// Subscribe to state publications.
    pub fn subscribe(&self) -> StateStream {
        StateStream::new(self.inner.store.subscribe())
    }

    /// Subscribe to readiness changes.
    pub fn readiness(&self) -> watch::Receiver<Readiness> {
        self.inner.readiness.subscribe()
    }

    /// Subscribe to poll-failure reports. `None` means the last cycle
    /// succeeded.
    pub fn refresh_errors(&self) -> watch::Receiver<Option<String>> {
        self.inner.refresh_error.subscribe()
    }

    pub fn last_full_refresh(&self) -> Option<DateTime<Utc>> {
        self.inner.store.last_full_refresh()
    }

    pub fn last_push_event(&self) -> Option<DateTime<Utc>> {
        self.inner.store.last_push_event()
    }

    // ── Command execution ────────────────────────────────────────────

    /// Execute a write command against the bridge and await its result.
    ///
    /// Sends the command through the internal channel to the processor
    /// task; a successful write requests an immediate refresh before
    /// the result is returned.
    pub async fn execute(&self, command: Command) -> Result<(), CoreError> {
        if *self.inner.readiness.borrow() != Readiness::Ready {
            return Err(CoreError::NotConnected);
        }

        let (tx, rx) = tokio::sync::oneshot::channel();

        self.inner
            .command_tx
            .send(CommandEnvelope {
                command,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::NotConnected)?;

        rx.await.map_err(|_| CoreError::NotConnected)?
    }

    // ── One-shot convenience ─────────────────────────────────────────

    /// One-shot: connect, run closure, shut down.
    ///
    /// Optimized for CLI use: disables the event stream and the
    /// periodic poll since only a single request-response cycle is
    /// needed.
    pub async fn oneshot<F, Fut, T>(config: SyncConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Coordinator) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.poll_interval = Duration::ZERO;
        cfg.stream_enabled = false;

        let coordinator = Coordinator::new(cfg)?;
        coordinator.connect().await?;
        let result = f(coordinator.clone()).await;
        coordinator.shutdown().await;
        result
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Periodic poll. The immediate first tick is consumed; the blocking
/// first refresh in `connect` already covered it.
async fn poll_task(coordinator: Coordinator, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(coordinator.inner.config.poll_interval);
    interval.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = coordinator.refresh().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
}

/// Merge push events into the canonical state, republishing only when a
/// merge actually changed something.
async fn event_merge_task(coordinator: Coordinator, mut events: broadcast::Receiver<PushEvent>) {
    let cancel = coordinator.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            received = events.recv() => {
                match received {
                    Ok(push) => {
                        if let Some(event) = convert::event_from_push(push) {
                            if coordinator.inner.store.apply_event(&event) {
                                debug!(id = %event.id(), "applied push event");
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "event consumer lagged, push events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

/// Process commands from the mpsc channel, routing each to the
/// appropriate bridge call.
async fn command_processor_task(
    coordinator: Coordinator,
    mut rx: mpsc::Receiver<CommandEnvelope>,
) {
    let cancel = coordinator.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&coordinator, envelope.command).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

// ── Command routing ──────────────────────────────────────────────────

/// Route a command to the bridge. A failed write surfaces to the caller
/// and never touches the cached state; a successful one requests an
/// immediate refresh.
async fn route_command(coordinator: &Coordinator, command: Command) -> Result<(), CoreError> {
    let client = &coordinator.inner.client;

    match command {
        Command::SetZone { id, setting } => {
            client
                .set_zone(&id.to_raw(), setting.temperature_param())
                .await?;
        }
        Command::SetHotWater {
            id,
            mode,
            temperature,
        } => {
            // Zones that report no temperature support only take a mode.
            let supports = coordinator
                .inner
                .store
                .current()
                .hot_water_state(&id)
                .is_none_or(HotWaterState::can_set_temperature);
            let temperature = if supports { temperature } else { None };

            client
                .set_hot_water(&id.to_raw(), mode.map(HotWaterMode::as_str), temperature)
                .await?;
        }
    }

    // Converge ahead of the next scheduled poll. A refresh failure here
    // doesn't undo a write that already succeeded.
    if let Err(e) = coordinator.refresh().await {
        warn!(error = %e, "post-command refresh failed");
    }

    Ok(())
}
