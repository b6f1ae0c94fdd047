//! Error types for the lobby session sync client.

use thiserror::Error;

/// Errors that can occur when using the lobby client.
#[derive(Debug, Error)]
pub enum LobbyError {
    /// Failed to receive a frame from the transport.
    #[error("transport receive error: {0}")]
    TransportReceive(String),

    /// The close handshake with the lobby service failed.
    #[error("transport close error: {0}")]
    TransportClose(String),

    /// The connection to the lobby service could not be opened.
    #[error("connect error: {0}")]
    Connect(String),

    /// The access credential cannot be presented to the lobby service
    /// (e.g. it contains characters that are not valid in an HTTP header).
    #[error("invalid access credential")]
    InvalidCredential,

    /// [`connect`](crate::LobbyClient::connect) was called on a client that
    /// has already been started. Each client owns exactly one connection.
    #[error("client already started")]
    AlreadyStarted,

    /// An operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized [`Result`] type for lobby client operations.
pub type Result<T> = std::result::Result<T, LobbyError>;

/// Failure to turn an inbound frame into a typed notification.
///
/// Every variant keeps the raw input it failed on so the diagnostic can be
/// logged next to the offending data. Decode failures are never fatal: the
/// dispatcher logs them and drops the frame.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The frame itself could not be parsed into an envelope.
    #[error("malformed frame: {reason}")]
    Frame {
        /// What was wrong with the frame.
        reason: String,
        /// The raw frame text.
        raw: String,
    },

    /// A session notification arrived without a required field.
    #[error("{kind} frame is missing `{field}`")]
    MissingField {
        /// Wire name of the notification kind.
        kind: &'static str,
        /// Name of the missing field.
        field: &'static str,
        /// The raw frame text.
        raw: String,
    },

    /// The payload is not valid base64.
    #[error("invalid base64 payload: {source}")]
    Base64 {
        #[source]
        source: base64::DecodeError,
        /// The encoded payload as received.
        raw: String,
    },

    /// The base64-decoded payload is not a valid JSON document.
    #[error("invalid JSON payload: {source}")]
    Json {
        #[source]
        source: serde_json::Error,
        /// The encoded payload as received.
        raw: String,
    },

    /// The JSON payload does not match the schema of a known topic.
    #[error("payload for {topic} does not match its schema: {source}")]
    Schema {
        /// The topic whose schema was violated.
        topic: String,
        #[source]
        source: serde_json::Error,
        /// The decoded JSON document, re-serialized.
        raw: String,
    },
}

impl DecodeError {
    /// Returns the raw input this error was produced from.
    pub fn raw(&self) -> &str {
        match self {
            Self::Frame { raw, .. }
            | Self::MissingField { raw, .. }
            | Self::Base64 { raw, .. }
            | Self::Json { raw, .. }
            | Self::Schema { raw, .. } => raw,
        }
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
    fn raw_is_kept_for_every_variant() {
        let err = DecodeError::MissingField {
            kind: "messageSessionNotif",
            field: "topic",
            raw: "type: messageSessionNotif".into(),
        };
        assert_eq!(err.raw(), "type: messageSessionNotif");
        assert_eq!(
            err.to_string(),
            "messageSessionNotif frame is missing `topic`"
        );
    }
}
