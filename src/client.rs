//! Lobby client: connection lifecycle and the notification dispatch loop.
//!
//! [`LobbyClient`] owns the membership store and at most one connection.
//! [`LobbyClient::connect`] spawns a background task that opens the
//! transport, then decodes, routes and applies every inbound frame in arrival
//! order. Lifecycle and notification events are emitted on a bounded channel
//! ([`tokio::sync::mpsc::Receiver<LobbyEvent>`]) returned from `connect`.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut client = LobbyClient::new(LobbyConfig::from_env());
//! let connector = WebSocketConnector::from_base_url("https://demo.example.com")?;
//! let mut events = client.connect(connector, AccessToken::new(token))?;
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         LobbyEvent::Session(_) => {
//!             for session in client.list_all_sessions().await { /* … */ }
//!         }
//!         LobbyEvent::Closed { kind: CloseKind::ReauthenticationRequired, .. } => { /* log in again */ }
//!         LobbyEvent::Closed { .. } => break,
//!         _ => {}
//!     }
//! }
//! ```

use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::close_codes::{CloseEvent, NORMAL};
use crate::codec::decode_payload;
use crate::envelope::{decode_frame, NotificationKind};
use crate::error::{DecodeError, LobbyError, Result};
use crate::event::LobbyEvent;
use crate::protocol::{Member, SessionEvent};
use crate::router::route;
use crate::store::{SessionDirectory, SessionSnapshot};
use crate::transport::{AccessToken, Connector, Inbound, Transport};

/// Default capacity of the bounded event channel.
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default timeout for the graceful shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Default timeout for opening the connection.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable overriding [`LobbyConfig::event_channel_capacity`].
pub const ENV_EVENT_CHANNEL_CAPACITY: &str = "LOBBY_EVENT_CHANNEL_CAPACITY";
/// Environment variable overriding [`LobbyConfig::shutdown_timeout`], in milliseconds.
pub const ENV_SHUTDOWN_TIMEOUT_MS: &str = "LOBBY_SHUTDOWN_TIMEOUT_MS";
/// Environment variable overriding [`LobbyConfig::connect_timeout`], in milliseconds.
pub const ENV_CONNECT_TIMEOUT_MS: &str = "LOBBY_CONNECT_TIMEOUT_MS";

// ── Configuration ───────────────────────────────────────────────────

/// Configuration for a [`LobbyClient`].
///
/// # Example
///
/// ```
/// use lobby_session_sync::LobbyConfig;
/// use std::time::Duration;
///
/// let config = LobbyConfig::new()
///     .with_event_channel_capacity(512)
///     .with_connect_timeout(Duration::from_secs(5));
/// assert_eq!(config.event_channel_capacity, 512);
/// ```
#[derive(Debug, Clone)]
pub struct LobbyConfig {
    /// Capacity of the bounded event channel.
    ///
    /// When the driver cannot keep up, events are dropped (with a warning
    /// logged) so the dispatch loop never blocks. The store is updated
    /// regardless, and the `Closed` event is always delivered.
    ///
    /// Defaults to **256**. Values below 1 are clamped to 1.
    pub event_channel_capacity: usize,
    /// Time given to the dispatch loop to close the transport on
    /// [`LobbyClient::shutdown`] before the task is aborted.
    ///
    /// Defaults to **1 second**.
    pub shutdown_timeout: Duration,
    /// Time allowed for [`Connector::open`] before the attempt is abandoned.
    ///
    /// Defaults to **10 seconds**.
    pub connect_timeout: Duration,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl LobbyConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, overridden by `LOBBY_EVENT_CHANNEL_CAPACITY`,
    /// `LOBBY_SHUTDOWN_TIMEOUT_MS` and `LOBBY_CONNECT_TIMEOUT_MS` when set.
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(capacity) = parse_setting::<usize>(&lookup, ENV_EVENT_CHANNEL_CAPACITY) {
            config = config.with_event_channel_capacity(capacity);
        }
        if let Some(ms) = parse_setting::<u64>(&lookup, ENV_SHUTDOWN_TIMEOUT_MS) {
            config.shutdown_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_setting::<u64>(&lookup, ENV_CONNECT_TIMEOUT_MS) {
            config.connect_timeout = Duration::from_millis(ms);
        }
        config
    }

    /// Set the capacity of the bounded event channel.
    ///
    /// Defaults to **256**. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    /// Set the timeout for the graceful shutdown.
    ///
    /// A zero timeout aborts the dispatch loop immediately.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Set the timeout for opening the connection.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

fn parse_setting<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring invalid configuration value");
            None
        }
    }
}

// ── Connection state ────────────────────────────────────────────────

/// Lifecycle of the client's single connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// `connect` has not been called.
    Disconnected = 0,
    /// The transport is being opened.
    Connecting = 1,
    /// Frames are being dispatched.
    Connected = 2,
    /// The connection ended. Terminal.
    Closed = 3,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Disconnected,
            1 => Self::Connecting,
            2 => Self::Connected,
            _ => Self::Closed,
        }
    }
}

/// Connection state shared between the client handle and the dispatch loop.
#[derive(Debug)]
struct SharedState(AtomicU8);

impl SharedState {
    fn new() -> Self {
        Self(AtomicU8::new(ConnectionState::Disconnected as u8))
    }

    fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: ConnectionState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

// ── Client handle ───────────────────────────────────────────────────

/// Session-membership client for the lobby notification stream.
///
/// Owns the membership store for its whole lifetime: the store outlives the
/// connection and is not cleared when it closes, so the last known
/// membership stays queryable.
pub struct LobbyClient {
    config: LobbyConfig,
    state: Arc<SharedState>,
    sessions: SessionDirectory,
    /// Handle to the background dispatch task.
    task: Option<tokio::task::JoinHandle<()>>,
    /// Oneshot sender to signal the dispatch task to shut down gracefully.
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl LobbyClient {
    /// Create a disconnected client with an empty membership store.
    pub fn new(config: LobbyConfig) -> Self {
        Self {
            config,
            state: Arc::new(SharedState::new()),
            sessions: SessionDirectory::new(),
            task: None,
            shutdown_tx: None,
        }
    }

    /// Open the connection and start dispatching notifications.
    ///
    /// Moves the client to [`ConnectionState::Connecting`] and spawns the
    /// dispatch task on the current tokio runtime. The returned receiver
    /// yields [`LobbyEvent::Opened`] once the transport is open and ends with
    /// exactly one [`LobbyEvent::Closed`].
    ///
    /// # Errors
    ///
    /// Returns [`LobbyError::AlreadyStarted`] if `connect` was already called
    /// on this client.
    pub fn connect<C: Connector>(
        &mut self,
        connector: C,
        credential: AccessToken,
    ) -> Result<mpsc::Receiver<LobbyEvent>> {
        if self.state.get() != ConnectionState::Disconnected || self.task.is_some() {
            return Err(LobbyError::AlreadyStarted);
        }
        self.state.set(ConnectionState::Connecting);

        // Clamp capacity to at least 1 (tokio panics on 0).
        let capacity = self.config.event_channel_capacity.max(1);
        let (event_tx, event_rx) = mpsc::channel::<LobbyEvent>(capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let ctx = LoopContext {
            event_tx,
            state: Arc::clone(&self.state),
            sessions: self.sessions.clone(),
        };
        self.task = Some(tokio::spawn(run_connection(
            connector,
            credential,
            self.config.connect_timeout,
            ctx,
            shutdown_rx,
        )));
        self.shutdown_tx = Some(shutdown_tx);

        Ok(event_rx)
    }

    /// Close the connection and stop the dispatch task.
    ///
    /// The transport is closed with a normal (`1000`) close and a final
    /// [`LobbyEvent::Closed`] is emitted. The membership store is kept.
    pub async fn shutdown(&mut self) {
        debug!("LobbyClient: shutdown requested");

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        // Await the dispatch task with a timeout. If it doesn't exit in time,
        // abort it so the task cannot detach and run indefinitely.
        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.config.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!("dispatch loop terminated with join error: {join_err}");
                }
                Err(_) => {
                    warn!("dispatch loop did not exit within timeout; aborting task");
                    task.abort();
                    if let Err(join_err) = task.await {
                        debug!("dispatch loop aborted: {join_err}");
                    }
                }
            }
        }

        if self.state.get() != ConnectionState::Disconnected {
            self.state.set(ConnectionState::Closed);
        }
    }

    // ── State accessors ─────────────────────────────────────────────

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Returns `true` while notifications are being dispatched.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// A read-only handle to the membership store.
    pub fn sessions(&self) -> SessionDirectory {
        self.sessions.clone()
    }

    /// Every tracked session with its members.
    pub async fn list_all_sessions(&self) -> Vec<SessionSnapshot> {
        self.sessions.list_all_sessions().await
    }

    /// Members of one session (or of all sessions when `session_id` is
    /// `None`), optionally filtered by status.
    pub async fn list_session_members(
        &self,
        session_id: Option<&str>,
        status: Option<&str>,
    ) -> Vec<Member> {
        self.sessions.list_session_members(session_id, status).await
    }
}

impl std::fmt::Debug for LobbyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LobbyClient")
            .field("state", &self.state())
            .field("has_task", &self.task.is_some())
            .finish()
    }
}

impl Drop for LobbyClient {
    fn drop(&mut self) {
        // `Drop` cannot await the close handshake, so the task is aborted
        // instead of signalled.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ── Dispatch loop ───────────────────────────────────────────────────

/// Everything the dispatch task needs besides the transport.
struct LoopContext {
    event_tx: mpsc::Sender<LobbyEvent>,
    state: Arc<SharedState>,
    sessions: SessionDirectory,
}

/// Open the transport, then dispatch frames until the connection closes.
async fn run_connection<C: Connector>(
    connector: C,
    credential: AccessToken,
    connect_timeout: Duration,
    ctx: LoopContext,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    debug!("opening lobby connection");

    let opened = tokio::select! {
        result = tokio::time::timeout(connect_timeout, connector.open(&credential)) => {
            result.unwrap_or(Err(LobbyError::Timeout))
        }
        _ = &mut shutdown_rx => {
            debug!("shutdown requested while connecting");
            emit_closed(&ctx, CloseEvent::new(NORMAL, "client shut down")).await;
            return;
        }
    };

    let transport = match opened {
        Ok(transport) => transport,
        Err(e) => {
            error!("failed to open lobby connection: {e}");
            emit_event(&ctx.event_tx, LobbyEvent::Error {
                message: e.to_string(),
            });
            emit_closed(&ctx, CloseEvent::abnormal(format!("connect failed: {e}"))).await;
            return;
        }
    };

    ctx.state.set(ConnectionState::Connected);
    info!("lobby connection open");
    emit_event(&ctx.event_tx, LobbyEvent::Opened);

    dispatch_loop(transport, &ctx, shutdown_rx).await;
    debug!("dispatch loop exited");
}

/// Read frames one at a time. Each frame is fully decoded, routed and applied
/// before the next one is read.
async fn dispatch_loop(
    mut transport: impl Transport,
    ctx: &LoopContext,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                debug!("shutdown signal received");
                if let Err(e) = transport.close().await {
                    warn!("failed to close transport: {e}");
                }
                emit_closed(ctx, CloseEvent::new(NORMAL, "client shut down")).await;
                break;
            }

            incoming = transport.recv() => {
                match incoming {
                    Some(Ok(Inbound::Text(text))) => {
                        if let Some(event) = dispatch_frame(&text, &ctx.sessions).await {
                            emit_event(&ctx.event_tx, event);
                        }
                    }
                    Some(Ok(Inbound::Closed(close))) => {
                        emit_closed(ctx, close).await;
                        break;
                    }
                    Some(Err(e)) => {
                        // Errors alone do not end the connection; a close follows if it is gone.
                        error!("transport receive error: {e}");
                        emit_event(&ctx.event_tx, LobbyEvent::Error {
                            message: e.to_string(),
                        });
                    }
                    None => {
                        debug!("transport ended without a close frame");
                        emit_closed(ctx, CloseEvent::abnormal("connection dropped")).await;
                        break;
                    }
                }
            }
        }
    }
}

/// Decode one frame and apply it. Returns the event to surface, if any.
///
/// Never fails: decode errors become [`LobbyEvent::DecodeFailed`] and
/// unrecognized kinds are logged and dropped.
pub(crate) async fn dispatch_frame(raw: &str, sessions: &SessionDirectory) -> Option<LobbyEvent> {
    let envelope = match decode_frame(raw) {
        Ok(envelope) => envelope,
        Err(e) => return Some(decode_failed(&e)),
    };

    match envelope.kind {
        NotificationKind::Connect => {
            info!(lobby_session_id = ?envelope.lobby_session_id, "lobby connection ready");
            Some(LobbyEvent::LobbyReady {
                lobby_session_id: envelope.lobby_session_id,
            })
        }
        NotificationKind::Message => Some(handle_message(envelope.topic, envelope.payload)),
        NotificationKind::SessionMessage => {
            // `decode_frame` rejects session notifications without these.
            let (Some(topic), Some(payload)) = (envelope.topic, envelope.payload) else {
                return None;
            };
            let event = match decode_payload(&payload)
                .and_then(|value| SessionEvent::from_topic(&topic, value))
            {
                Ok(event) => event,
                Err(e) => return Some(decode_failed(&e)),
            };

            let outcome = {
                let mut store = sessions.store().write().await;
                route(&event, &mut store)
            };
            debug!(topic = %topic, ?outcome, "session notification applied");
            Some(LobbyEvent::Session(event))
        }
        NotificationKind::Unrecognized(kind) => {
            warn!(kind = %kind, "dropping unrecognized lobby notification");
            None
        }
    }
}

fn handle_message(topic: Option<String>, payload: Option<String>) -> LobbyEvent {
    let Some(encoded) = payload else {
        info!(topic = ?topic, "lobby message without payload");
        return LobbyEvent::Message {
            topic,
            payload: None,
        };
    };

    match decode_payload(&encoded) {
        Ok(value) => {
            info!(topic = ?topic, "lobby message: {value}");
            log_match_teams(&value);
            LobbyEvent::Message {
                topic,
                payload: Some(value),
            }
        }
        Err(e) => decode_failed(&e),
    }
}

/// Matchmaking results carry `Teams[].UserIDs`; log them per team.
fn log_match_teams(value: &serde_json::Value) {
    let Some(teams) = value.get("Teams").and_then(serde_json::Value::as_array) else {
        return;
    };
    for (team, entry) in teams.iter().enumerate() {
        let user_ids = entry
            .get("UserIDs")
            .or_else(|| entry.get("userIDs"))
            .map_or_else(|| "none".to_string(), ToString::to_string);
        info!(team, user_ids = %user_ids, "match team");
    }
}

fn decode_failed(e: &DecodeError) -> LobbyEvent {
    warn!(raw = %e.raw(), "dropping undecodable frame: {e}");
    LobbyEvent::DecodeFailed {
        reason: e.to_string(),
        raw: e.raw().to_string(),
    }
}

/// Emit an event to the event channel. If the channel is full, log a warning
/// and drop the event to avoid blocking the dispatch loop.
fn emit_event(event_tx: &mpsc::Sender<LobbyEvent>, event: LobbyEvent) {
    match event_tx.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(dropped)) => {
            warn!(
                "event channel full, dropping event: {:?}",
                std::mem::discriminant(&dropped)
            );
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!("event channel closed, receiver dropped");
        }
    }
}

/// Mark the connection closed and emit the final [`LobbyEvent::Closed`].
///
/// Uses `send().await` instead of `try_send` because `Closed` is always the
/// last event on the channel and must never be silently dropped.
async fn emit_closed(ctx: &LoopContext, close: CloseEvent) {
    ctx.state.set(ConnectionState::Closed);
    let event = LobbyEvent::closed(close);
    if let LobbyEvent::Closed { close, kind } = &event {
        info!(code = close.code, %kind, "lobby connection closed: {}", kind.description());
    }
    if ctx.event_tx.send(event).await.is_err() {
        debug!("event channel closed, receiver dropped");
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::close_codes::CloseKind;
    use crate::codec::encode_payload;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::{HashMap, VecDeque};

    // ── Mock transport ──────────────────────────────────────────────

    /// A mock transport that replays scripted frames.
    struct MockTransport {
        incoming: VecDeque<Option<std::result::Result<Inbound, LobbyError>>>,
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn recv(&mut self) -> Option<std::result::Result<Inbound, LobbyError>> {
            match self.incoming.pop_front() {
                Some(item) => item,
                // Hang so the loop stays alive until shutdown.
                None => std::future::pending().await,
            }
        }

        async fn close(&mut self) -> std::result::Result<(), LobbyError> {
            Ok(())
        }
    }

    struct MockConnector {
        incoming: std::sync::Mutex<Option<Vec<Option<std::result::Result<Inbound, LobbyError>>>>>,
    }

    impl MockConnector {
        fn new(incoming: Vec<Option<std::result::Result<Inbound, LobbyError>>>) -> Self {
            Self {
                incoming: std::sync::Mutex::new(Some(incoming)),
            }
        }
    }

    #[async_trait]
    impl Connector for MockConnector {
        type Transport = MockTransport;

        async fn open(
            &self,
            _credential: &AccessToken,
        ) -> std::result::Result<MockTransport, LobbyError> {
            let incoming = self.incoming.lock().unwrap().take().unwrap_or_default();
            Ok(MockTransport {
                incoming: VecDeque::from(incoming),
            })
        }
    }

    fn session_frame(topic: &str, payload: serde_json::Value) -> String {
        format!(
            "type: messageSessionNotif\ntopic: {topic}\npayload: {}",
            encode_payload(&payload)
        )
    }

    // ── Frame dispatch ──────────────────────────────────────────────

    #[tokio::test]
    async fn dispatch_applies_session_joined() {
        let sessions = SessionDirectory::new();
        let frame = session_frame(
            "OnSessionJoined",
            json!({"SessionID": "S1", "Members": [{"ID": "U1", "StatusV2": "JOINED"}]}),
        );

        let event = dispatch_frame(&frame, &sessions).await.unwrap();
        assert!(matches!(event, LobbyEvent::Session(SessionEvent::SessionJoined(_))));
        assert_eq!(
            sessions.list_session_members(Some("S1"), None).await,
            vec![Member::new("U1", "JOINED")]
        );
    }

    #[tokio::test]
    async fn dispatch_reports_bad_payload_without_touching_store() {
        let sessions = SessionDirectory::new();
        let event = dispatch_frame(
            "type: messageSessionNotif\ntopic: OnSessionJoined\npayload: %%%",
            &sessions,
        )
        .await
        .unwrap();
        let LobbyEvent::DecodeFailed { raw, .. } = event else {
            panic!("expected DecodeFailed, got {event:?}");
        };
        assert_eq!(raw, "%%%");
        assert_eq!(sessions.session_count().await, 0);
    }

    #[tokio::test]
    async fn dispatch_reports_schema_mismatch() {
        let sessions = SessionDirectory::new();
        let frame = session_frame("OnSessionJoined", json!({"Members": []}));
        let event = dispatch_frame(&frame, &sessions).await.unwrap();
        assert!(matches!(event, LobbyEvent::DecodeFailed { .. }));
        assert_eq!(sessions.session_count().await, 0);
    }

    #[tokio::test]
    async fn dispatch_drops_unrecognized_kind() {
        let sessions = SessionDirectory::new();
        assert!(dispatch_frame("type: partyNotif\ntopic: x", &sessions)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn dispatch_connect_notif() {
        let sessions = SessionDirectory::new();
        let event = dispatch_frame("type: connectNotif\nlobbySessionID: L42", &sessions)
            .await
            .unwrap();
        assert_eq!(
            event,
            LobbyEvent::LobbyReady {
                lobby_session_id: Some("L42".into())
            }
        );
    }

    #[tokio::test]
    async fn dispatch_message_decodes_payload() {
        let sessions = SessionDirectory::new();
        let payload = json!({"Teams": [{"UserIDs": ["U1", "U2"]}]});
        let frame = format!(
            "type: messageNotif\ntopic: OnMatchFound\npayload: {}",
            encode_payload(&payload)
        );
        let event = dispatch_frame(&frame, &sessions).await.unwrap();
        assert_eq!(
            event,
            LobbyEvent::Message {
                topic: Some("OnMatchFound".into()),
                payload: Some(payload),
            }
        );
    }

    #[tokio::test]
    async fn dispatch_message_without_payload() {
        let sessions = SessionDirectory::new();
        let event = dispatch_frame("type: messageNotif", &sessions).await.unwrap();
        assert_eq!(
            event,
            LobbyEvent::Message {
                topic: None,
                payload: None
            }
        );
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    #[tokio::test]
    async fn connect_moves_through_states() {
        let mut client = LobbyClient::new(LobbyConfig::new());
        assert_eq!(client.state(), ConnectionState::Disconnected);

        let mut events = client
            .connect(
                MockConnector::new(vec![Some(Ok(Inbound::Closed(CloseEvent::new(1000, ""))))]),
                AccessToken::new("t"),
            )
            .unwrap();

        assert_eq!(events.recv().await.unwrap(), LobbyEvent::Opened);
        let closed = events.recv().await.unwrap();
        assert!(matches!(
            closed,
            LobbyEvent::Closed {
                kind: CloseKind::Normal,
                ..
            }
        ));
        assert_eq!(client.state(), ConnectionState::Closed);
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn connect_twice_is_rejected() {
        let mut client = LobbyClient::new(LobbyConfig::new());
        let _events = client
            .connect(MockConnector::new(vec![]), AccessToken::new("t"))
            .unwrap();
        let second = client.connect(MockConnector::new(vec![]), AccessToken::new("t"));
        assert!(matches!(second, Err(LobbyError::AlreadyStarted)));
        client.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_closes_normally() {
        let mut client = LobbyClient::new(LobbyConfig::new());
        let mut events = client
            .connect(MockConnector::new(vec![]), AccessToken::new("t"))
            .unwrap();
        assert_eq!(events.recv().await.unwrap(), LobbyEvent::Opened);
        assert!(client.is_connected());

        client.shutdown().await;

        let closed = events.recv().await.unwrap();
        let LobbyEvent::Closed { close, kind } = closed else {
            panic!("expected Closed, got {closed:?}");
        };
        assert_eq!(close.code, 1000);
        assert_eq!(kind, CloseKind::Normal);
        assert_eq!(client.state(), ConnectionState::Closed);
    }

    // ── Configuration ───────────────────────────────────────────────

    #[test]
    fn config_defaults() {
        let config = LobbyConfig::new();
        assert_eq!(config.event_channel_capacity, 256);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(1));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn config_capacity_is_clamped() {
        assert_eq!(
            LobbyConfig::new()
                .with_event_channel_capacity(0)
                .event_channel_capacity,
            1
        );
    }

    #[test]
    fn config_from_lookup_overrides_and_ignores_garbage() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_EVENT_CHANNEL_CAPACITY, "32"),
            (ENV_SHUTDOWN_TIMEOUT_MS, "250"),
            (ENV_CONNECT_TIMEOUT_MS, "soon"),
        ]);
        let config = LobbyConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.event_channel_capacity, 32);
        assert_eq!(config.shutdown_timeout, Duration::from_millis(250));
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }
}
