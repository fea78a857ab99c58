use crate::endpoints::Endpoints;
use crate::feed::ServerEvent;
use crate::prelude::{ConnectionPhase, SyncConfig, SyncError, SyncResult};
use crate::store::{Listeners, Snapshot, Subscription};
use crate::sync::transport::{Connector, InboundFrames, WsConnector};
use crate::telemetry::{ChannelLog, MetricsSnapshot, SyncMetrics};
use futures::StreamExt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Keeps one logical connection to the backend's event feed and folds every
/// inbound envelope into an immutable [`Snapshot`].
///
/// A session starts with [`connect`](Self::connect) and runs on a spawned
/// tokio task: open, pump frames until the channel closes, wait a fixed
/// delay, open again. It only ends through [`disconnect`](Self::disconnect),
/// cancellation of the returned token, or dropping the synchronizer.
///
/// The synchronizer is the only writer of its snapshot; consumers read it
/// through [`state`](Self::state), [`subscribe`](Self::subscribe) or
/// [`watch`](Self::watch).
pub struct Synchronizer {
    shared: Arc<Shared>,
}

struct Shared {
    connector: Arc<dyn Connector>,
    retry_delay: Duration,
    lifecycle: Mutex<Lifecycle>,
    state: watch::Sender<Arc<Snapshot>>,
    listeners: Listeners,
    metrics: SyncMetrics,
    log: ChannelLog,
}

/// Guarded by one mutex so a retired session can never write again.
#[derive(Default)]
struct Lifecycle {
    phase: ConnectionPhase,
    /// Bumped whenever a session starts or is torn down from outside.
    generation: u64,
    session: Option<CancellationToken>,
}

enum SessionEnd {
    Closed(String),
    Cancelled,
}

impl Synchronizer {
    pub fn new(connector: Arc<dyn Connector>, retry_delay: Duration) -> Self {
        let log = ChannelLog::new(connector.describe());
        let (state, _) = watch::channel(Arc::new(Snapshot::default()));
        Self {
            shared: Arc::new(Shared {
                connector,
                retry_delay,
                lifecycle: Mutex::new(Lifecycle::default()),
                state,
                listeners: Listeners::new(),
                metrics: SyncMetrics::new(),
                log,
            }),
        }
    }

    /// Websocket synchronizer for the configured backend.
    pub fn from_config(config: &SyncConfig) -> SyncResult<Self> {
        let endpoints = Endpoints::from_config(config)?;
        let connector = WsConnector::new(endpoints.events_url());
        Ok(Self::new(Arc::new(connector), config.retry_delay()))
    }

    /// Starts a session unless one is already live, in which case the live
    /// session's token is returned and nothing else happens.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(&self) -> SyncResult<CancellationToken> {
        let runtime = Handle::try_current().map_err(|_| SyncError::NoRuntime)?;
        let mut lifecycle = self.shared.lifecycle();
        if let Some(token) = lifecycle.session.as_ref().filter(|t| !t.is_cancelled()) {
            self.shared.log.record("connect ignored: session already live");
            return Ok(token.clone());
        }

        lifecycle.generation += 1;
        let generation = lifecycle.generation;
        let token = CancellationToken::new();
        lifecycle.session = Some(token.clone());
        lifecycle.phase = ConnectionPhase::Connecting;
        drop(lifecycle);

        runtime.spawn(run_session(self.shared.clone(), generation, token.clone()));
        Ok(token)
    }

    /// Closes the active connection without scheduling a reconnect.
    pub fn disconnect(&self) {
        let changed = {
            let mut lifecycle = self.shared.lifecycle();
            let Some(token) = lifecycle.session.take() else {
                return;
            };
            token.cancel();
            lifecycle.generation += 1;
            lifecycle.phase = ConnectionPhase::Disconnected;
            self.shared.mark_connected(false)
        };
        self.shared.log.record("session closed by consumer");
        if changed {
            self.shared.publish();
        }
    }

    pub fn state(&self) -> Arc<Snapshot> {
        self.shared.state.borrow().clone()
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.shared.lifecycle().phase
    }

    /// Registers a callback invoked on every snapshot change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.shared.listeners.subscribe(listener)
    }

    /// Async alternative to [`subscribe`](Self::subscribe).
    pub fn watch(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.shared.state.subscribe()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    pub fn retry_delay(&self) -> Duration {
        self.shared.retry_delay
    }
}

impl Drop for Synchronizer {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl Shared {
    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mark_connected(&self, connected: bool) -> bool {
        self.state.send_if_modified(|snapshot| {
            snapshot.connected != connected && Arc::make_mut(snapshot).set_connected(connected)
        })
    }

    fn publish(&self) {
        let snapshot = self.state.borrow().clone();
        self.listeners.notify(&snapshot);
    }

    /// Moves a live session to `phase`. Returns `false` once the session has
    /// been retired, telling the task to stop.
    fn transition(&self, generation: u64, phase: ConnectionPhase) -> bool {
        let changed = {
            let mut lifecycle = self.lifecycle();
            if lifecycle.generation != generation {
                return false;
            }
            lifecycle.phase = phase;
            self.mark_connected(phase.is_connected())
        };
        if changed {
            self.publish();
        }
        true
    }

    fn retire(&self, generation: u64) {
        let changed = {
            let mut lifecycle = self.lifecycle();
            if lifecycle.generation != generation {
                return;
            }
            lifecycle.session = None;
            lifecycle.phase = ConnectionPhase::Disconnected;
            self.mark_connected(false)
        };
        if changed {
            self.publish();
        }
    }

    fn dispatch(&self, generation: u64, text: &str) {
        match ServerEvent::decode(text) {
            Ok(Some(event)) => self.apply(generation, event),
            Ok(None) => {
                self.metrics.record_ignored();
                self.log.ignored(text);
            }
            Err(err) => {
                self.metrics.record_dropped();
                self.log.dropped(&err);
            }
        }
    }

    fn apply(&self, generation: u64, event: ServerEvent) {
        let changed = {
            let lifecycle = self.lifecycle();
            if lifecycle.generation != generation {
                return;
            }
            self.state
                .send_if_modified(|snapshot| Arc::make_mut(snapshot).apply(event))
        };
        if changed {
            self.metrics.record_applied();
            self.publish();
        }
    }

    async fn pump(
        &self,
        generation: u64,
        token: &CancellationToken,
        mut frames: InboundFrames,
    ) -> SessionEnd {
        loop {
            let frame = tokio::select! {
                biased;
                _ = token.cancelled() => return SessionEnd::Cancelled,
                frame = frames.next() => frame,
            };
            match frame {
                Some(Ok(text)) => self.dispatch(generation, &text),
                Some(Err(err)) => return SessionEnd::Closed(err.to_string()),
                None => return SessionEnd::Closed("peer closed the channel".into()),
            }
        }
    }
}

async fn run_session(shared: Arc<Shared>, generation: u64, token: CancellationToken) {
    loop {
        if !shared.transition(generation, ConnectionPhase::Connecting) {
            break;
        }
        let attempt = shared.metrics.record_attempt();
        let opened = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            opened = shared.connector.open() => opened,
        };

        match opened {
            Ok(frames) => {
                if !shared.transition(generation, ConnectionPhase::Connected) {
                    break;
                }
                shared.log.opened(attempt);
                match shared.pump(generation, &token, frames).await {
                    SessionEnd::Cancelled => break,
                    SessionEnd::Closed(reason) => shared.log.closed(&reason),
                }
            }
            Err(err) => shared.log.open_failed(&err),
        }

        if !shared.transition(generation, ConnectionPhase::Disconnected) {
            break;
        }
        shared.log.retry_scheduled(shared.retry_delay);
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(shared.retry_delay) => {}
        }
    }
    shared.retire(generation);
}
