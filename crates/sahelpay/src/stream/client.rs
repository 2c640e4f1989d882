use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use url::Url;

use super::event::{GatewayConfigEvent, GatewayEventType};
use super::frame::FrameDecoder;
use super::listeners::{ListenerError, ListenerRegistry};
use super::transport::{ChunkSource, ReqwestTransport, StreamError, StreamTransport};
use crate::config::StreamConfig;
use crate::constants::{GATEWAY_STREAM_PATH, MAX_RECONNECT_DELAY};
use crate::error::SahelPayError;

/// Delay before reconnect number `attempt` (0-based): `base * 2^attempt`,
/// capped at 30 seconds.
pub fn reconnect_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(MAX_RECONNECT_DELAY)
}

/// Lifecycle of a [`GatewayStream`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StreamState {
    /// Not running: never connected, or stopped by `disconnect()`.
    #[default]
    Idle,
    Connecting,
    Connected,
    /// Waiting out the backoff delay after a failure.
    Reconnecting,
    /// Gave up after `max_reconnect_attempts`; call `connect()` to start over.
    Exhausted,
}

#[derive(Debug, Clone, Copy, Default)]
struct Snapshot {
    /// Session allowed to publish; bumped on every connect and disconnect.
    generation: u64,
    state: StreamState,
    attempts: u32,
}

/// State readable by the caller without touching the session lock.
///
/// Only the current session's driver may write it. A driver that outlives
/// its session (aborted while a listener blocks) publishes nothing.
#[derive(Debug, Default)]
struct Status {
    inner: StdMutex<Snapshot>,
}

impl Status {
    fn snapshot(&self) -> Snapshot {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, f: impl FnOnce(&mut Snapshot)) {
        let mut snapshot = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *snapshot);
    }

    /// Open a new session and return its generation.
    fn begin(&self) -> u64 {
        let mut generation = 0;
        self.update(|s| {
            s.generation += 1;
            s.state = StreamState::Connecting;
            s.attempts = 0;
            generation = s.generation;
        });
        generation
    }

    /// Stop accepting writes from the current session.
    fn retire(&self) {
        self.update(|s| {
            s.generation += 1;
            s.state = StreamState::Idle;
        });
    }

    /// Record `state` if `generation` is still the current session.
    fn publish(&self, generation: u64, state: StreamState, attempts: u32) -> bool {
        let mut published = false;
        self.update(|s| {
            if s.generation == generation {
                s.state = state;
                s.attempts = attempts;
                published = true;
            }
        });
        published
    }
}

/// One run of the background loop, from `connect()` to `disconnect()`.
struct Session {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Live gateway-configuration stream.
///
/// Holds one long-lived SSE connection to
/// `<base_url>/admin/gateways/stream`, decodes its events and hands them to
/// the registered listeners. Failures are retried with exponential backoff
/// (`reconnect_interval * 2^attempt`, at most 30s) until
/// `max_reconnect_attempts` is reached.
///
/// Listeners run on the stream's background task, one after another; keep
/// them short.
///
/// ```no_run
/// use sahelpay::{GatewayEventType, GatewayStream, StreamConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), sahelpay::SahelPayError> {
/// let stream = GatewayStream::new(StreamConfig::new("https://api.sahelpay.ml", "admin_token"))?;
/// stream.on_event(GatewayEventType::GatewaySwitched, |event| {
///     println!("gateway changed: {:?}", event.data());
///     Ok(())
/// });
/// stream.connect().await;
/// # stream.disconnect().await;
/// # Ok(())
/// # }
/// ```
pub struct GatewayStream<T: StreamTransport = ReqwestTransport> {
    config: StreamConfig,
    url: Url,
    transport: Arc<T>,
    listeners: Arc<ListenerRegistry>,
    status: Arc<Status>,
    session: Mutex<Option<Session>>,
}

impl GatewayStream<ReqwestTransport> {
    pub fn new(config: StreamConfig) -> Result<Self, SahelPayError> {
        let transport = ReqwestTransport::new(config.connect_timeout)
            .map_err(|e| SahelPayError::Config(e.to_string()))?;
        Self::with_transport(config, transport)
    }
}

impl<T: StreamTransport> GatewayStream<T> {
    pub fn with_transport(config: StreamConfig, transport: T) -> Result<Self, SahelPayError> {
        let url = stream_url(&config)?;
        Ok(Self {
            config,
            url,
            transport: Arc::new(transport),
            listeners: Arc::new(ListenerRegistry::new()),
            status: Arc::new(Status::default()),
            session: Mutex::new(None),
        })
    }

    /// Listen for one event type.
    pub fn on_event<F>(&self, kind: GatewayEventType, listener: F)
    where
        F: Fn(&GatewayConfigEvent) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.listeners.on_event(kind, listener);
    }

    /// Listen for every event, after the type-specific listeners.
    pub fn on_all<F>(&self, listener: F)
    where
        F: Fn(&GatewayConfigEvent) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.listeners.on_all(listener);
    }

    pub fn is_connected(&self) -> bool {
        self.state() == StreamState::Connected
    }

    /// Reconnect attempts since the last successful connection.
    pub fn attempts(&self) -> u32 {
        self.status.snapshot().attempts
    }

    pub fn state(&self) -> StreamState {
        self.status.snapshot().state
    }

    /// Start streaming in the background and return immediately.
    ///
    /// A running session is fully disconnected first, so at most one
    /// connection is ever open per client.
    pub async fn connect(&self) {
        let mut session = self.session.lock().await;
        if let Some(previous) = session.take() {
            self.status.retire();
            self.shutdown(previous).await;
        }

        let (stop, stop_rx) = watch::channel(false);
        let generation = self.status.begin();

        let driver = Driver {
            generation,
            url: self.url.clone(),
            reconnect_interval: self.config.reconnect_interval,
            max_reconnect_attempts: self.config.max_reconnect_attempts,
            connect_timeout: self.config.connect_timeout,
            read_timeout: self.config.read_timeout,
            transport: self.transport.clone(),
            listeners: self.listeners.clone(),
            status: self.status.clone(),
            stop: stop_rx,
        };
        let handle = tokio::spawn(driver.run());

        tracing::info!(url = %redacted(&self.url), "gateway stream started");
        *session = Some(Session { stop, handle });
    }

    /// Stop streaming and wait (bounded by `shutdown_timeout`) for the
    /// background task to finish. No listener is invoked after this returns.
    pub async fn disconnect(&self) {
        let mut session = self.session.lock().await;
        self.status.retire();
        if let Some(current) = session.take() {
            self.shutdown(current).await;
            tracing::info!("gateway stream stopped");
        }
    }

    async fn shutdown(&self, session: Session) {
        let Session { stop, mut handle } = session;
        stop.send_replace(true);
        if tokio::time::timeout(self.config.shutdown_timeout, &mut handle)
            .await
            .is_err()
        {
            tracing::warn!(
                timeout = ?self.config.shutdown_timeout,
                "gateway stream task did not stop in time, aborting"
            );
            handle.abort();
        }
    }
}

impl<T: StreamTransport> Drop for GatewayStream<T> {
    fn drop(&mut self) {
        if let Some(session) = self.session.get_mut().take() {
            session.stop.send_replace(true);
            session.handle.abort();
        }
    }
}

impl<T: StreamTransport> std::fmt::Debug for GatewayStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayStream")
            .field("url", &redacted(&self.url))
            .field("state", &self.state())
            .field("attempts", &self.attempts())
            .field("listeners", &self.listeners)
            .finish()
    }
}

fn stream_url(config: &StreamConfig) -> Result<Url, SahelPayError> {
    let raw = format!("{}{}", config.base_url.trim_end_matches('/'), GATEWAY_STREAM_PATH);
    let mut url = Url::parse(&raw)
        .map_err(|e| SahelPayError::Config(format!("invalid stream URL {raw}: {e}")))?;
    url.query_pairs_mut().append_pair("token", &config.token);
    Ok(url)
}

/// The stream URL with the token hidden, for logs.
fn redacted(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(Some("token=[REDACTED]"));
    shown.to_string()
}

/// Background task state. Owns everything it touches except the shared
/// listener table and status counters.
struct Driver<T: StreamTransport> {
    generation: u64,
    url: Url,
    reconnect_interval: Duration,
    max_reconnect_attempts: Option<u32>,
    connect_timeout: Duration,
    read_timeout: Duration,
    transport: Arc<T>,
    listeners: Arc<ListenerRegistry>,
    status: Arc<Status>,
    stop: watch::Receiver<bool>,
}

impl<T: StreamTransport> Driver<T> {
    fn stopped(&self) -> bool {
        // A dropped sender means the owning client is gone.
        *self.stop.borrow() || self.stop.has_changed().is_err()
    }

    fn publish(&self, state: StreamState, attempts: u32) {
        self.status.publish(self.generation, state, attempts);
    }

    async fn run(self) {
        let mut stop = self.stop.clone();
        let mut attempt = 0;

        loop {
            if self.stopped() {
                break;
            }
            self.publish(StreamState::Connecting, attempt);

            let result = tokio::select! {
                biased;
                _ = stop.wait_for(|s| *s) => break,
                r = self.stream_once(&mut attempt) => r,
            };

            if self.stopped() {
                break;
            }
            match result {
                Ok(()) => break,
                Err(e) => tracing::warn!(error = %e, "gateway stream connection lost"),
            }

            if let Some(max) = self.max_reconnect_attempts {
                if attempt >= max {
                    tracing::error!(attempts = attempt, "gateway stream giving up after max reconnect attempts");
                    self.publish(StreamState::Exhausted, attempt);
                    return;
                }
            }

            let delay = reconnect_delay(self.reconnect_interval, attempt);
            self.publish(StreamState::Reconnecting, attempt);
            tracing::info!(attempt = attempt + 1, delay = ?delay, "reconnecting to gateway stream");

            tokio::select! {
                biased;
                _ = stop.wait_for(|s| *s) => break,
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }

        self.publish(StreamState::Idle, attempt);
    }

    /// One connection: open, dispatch until the stream fails. Returns `Ok`
    /// only when stopped.
    async fn stream_once(&self, attempt: &mut u32) -> Result<(), StreamError> {
        let mut body = tokio::time::timeout(self.connect_timeout, self.transport.open(&self.url))
            .await
            .map_err(|_| StreamError::Timeout("connect"))??;

        *attempt = 0;
        self.publish(StreamState::Connected, 0);
        tracing::info!("connected to gateway stream");
        self.dispatch(&GatewayConfigEvent::connected_now());

        let mut decoder = FrameDecoder::new();
        loop {
            if self.stopped() {
                return Ok(());
            }
            let chunk = tokio::time::timeout(self.read_timeout, body.next_chunk())
                .await
                .map_err(|_| StreamError::Timeout("read"))??;
            let Some(chunk) = chunk else {
                return Err(StreamError::Closed);
            };
            for event in decoder.push(&chunk) {
                self.dispatch(&event);
            }
        }
    }

    fn dispatch(&self, event: &GatewayConfigEvent) {
        tracing::debug!(event = %event.type_name(), "gateway stream event");
        self.listeners.emit_while(event, || !self.stopped());
    }
}
