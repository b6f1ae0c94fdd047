//! Events delivered to the driver of a [`LobbyClient`](crate::LobbyClient).

use crate::close_codes::{CloseEvent, CloseKind};
use crate::protocol::SessionEvent;

/// Lifecycle and notification events emitted by the dispatch loop.
///
/// `Closed` is always the last event and is never dropped; the others are
/// dropped (with a warning) if the driver falls behind and the channel fills.
#[derive(Debug, Clone, PartialEq)]
pub enum LobbyEvent {
    /// The transport opened; the client is now `Connected`.
    Opened,

    /// The lobby greeted the connection (`connectNotif`).
    LobbyReady {
        /// Lobby session ID assigned to this connection, if announced.
        lobby_session_id: Option<String>,
    },

    /// A generic lobby message (`messageNotif`).
    Message {
        topic: Option<String>,
        /// Decoded payload, `None` when the frame carried none.
        payload: Option<serde_json::Value>,
    },

    /// A session or party notification, after it was applied to the store.
    Session(SessionEvent),

    /// A frame or payload could not be decoded and was skipped.
    DecodeFailed {
        reason: String,
        /// The offending input.
        raw: String,
    },

    /// A transport error while connected. The connection stays up until a
    /// close follows.
    Error { message: String },

    /// The connection closed. Terminal.
    Closed { close: CloseEvent, kind: CloseKind },
}

impl LobbyEvent {
    /// Build a `Closed` event, classifying the close code.
    pub fn closed(close: CloseEvent) -> Self {
        let kind = close.kind();
        Self::Closed { close, kind }
    }

    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }
}

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

    #[test]
    fn closed_classifies_code() {
        let event = LobbyEvent::closed(CloseEvent::new(4020, "expired"));
        assert!(event.is_terminal());
        assert!(matches!(
            event,
            LobbyEvent::Closed {
                kind: CloseKind::ReauthenticationRequired,
                ..
            }
        ));
    }

    #[test]
    fn only_closed_is_terminal() {
        assert!(!LobbyEvent::Opened.is_terminal());
        assert!(!LobbyEvent::Error {
            message: "boom".into()
        }
        .is_terminal());
    }
}
