#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing,
    dead_code
)]
//! Shared test utilities for lobby-session-sync integration tests.
//!
//! Provides a scripted [`MockTransport`], a [`MockConnector`] that hands it
//! out, and helpers for building lobby frames.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use lobby_session_sync::codec::encode_payload;
use lobby_session_sync::{AccessToken, CloseEvent, Connector, Inbound, LobbyError, Transport};
use serde_json::{json, Value};

pub type Scripted = Option<Result<Inbound, LobbyError>>;

// ── MockTransport ───────────────────────────────────────────────────

/// A mock transport replaying scripted frames.
///
/// Scripted items are consumed in order by `recv()`. Once exhausted,
/// `recv()` hangs so the dispatch loop stays alive until shutdown.
pub struct MockTransport {
    incoming: VecDeque<Scripted>,
    /// Whether `close()` has been called.
    pub closed: Arc<AtomicBool>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn recv(&mut self) -> Option<Result<Inbound, LobbyError>> {
        if let Some(item) = self.incoming.pop_front() {
            item
        } else {
            std::future::pending().await
        }
    }

    async fn close(&mut self) -> Result<(), LobbyError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

// ── MockConnector ───────────────────────────────────────────────────

/// Hands out one [`MockTransport`] and records the credential it was given.
pub struct MockConnector {
    incoming: StdMutex<Option<Vec<Scripted>>>,
    /// Delay before `open` completes.
    open_delay: Option<Duration>,
    /// Fail `open` with this message instead of connecting.
    fail_with: Option<String>,
    pub credential: Arc<StdMutex<Option<String>>>,
    pub closed: Arc<AtomicBool>,
}

impl MockConnector {
    pub fn new(incoming: Vec<Scripted>) -> Self {
        Self {
            incoming: StdMutex::new(Some(incoming)),
            open_delay: None,
            fail_with: None,
            credential: Arc::new(StdMutex::new(None)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::new(vec![])
        }
    }

    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = Some(delay);
        self
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Transport = MockTransport;

    async fn open(&self, credential: &AccessToken) -> Result<MockTransport, LobbyError> {
        *self.credential.lock().unwrap() = Some(credential.expose().to_string());
        if let Some(delay) = self.open_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.fail_with {
            return Err(LobbyError::Connect(message.clone()));
        }
        let incoming = self.incoming.lock().unwrap().take().unwrap_or_default();
        Ok(MockTransport {
            incoming: VecDeque::from(incoming),
            closed: Arc::clone(&self.closed),
        })
    }
}

// ── Frame helpers ───────────────────────────────────────────────────

/// A text frame, scripted.
pub fn text(frame: impl Into<String>) -> Scripted {
    Some(Ok(Inbound::Text(frame.into())))
}

/// A close frame, scripted.
pub fn close(code: u16, reason: &str) -> Scripted {
    Some(Ok(Inbound::Closed(CloseEvent::new(code, reason))))
}

/// A session notification frame carrying `payload` for `topic`.
pub fn session_frame(topic: &str, payload: &Value) -> String {
    format!(
        "type: messageSessionNotif\nid: {topic}-1\ntopic: {topic}\npayload: {}\n",
        encode_payload(payload)
    )
}

/// `{SessionID, Members}` payload with every member in `status`.
pub fn members_payload(session_id: &str, members: &[(&str, &str)]) -> Value {
    let members: Vec<Value> = members
        .iter()
        .map(|(id, status)| json!({"ID": id, "StatusV2": status}))
        .collect();
    json!({"SessionID": session_id, "Members": members})
}

pub fn connect_frame(lobby_session_id: &str) -> String {
    format!("type: connectNotif\nlobbySessionID: {lobby_session_id}\n")
}
