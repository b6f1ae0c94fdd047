//! Transport abstraction for the lobby notification stream.
//!
//! The [`Transport`] trait is a one-way text frame stream from the lobby
//! service to the client, plus the close handshake. The [`Connector`] trait
//! opens a transport using an access credential, so the client can own the
//! `Connecting → Connected` transition while staying independent of the
//! underlying protocol.
//!
//! # Implementing a Custom Transport
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use lobby_session_sync::error::LobbyError;
//! use lobby_session_sync::transport::{Inbound, Transport};
//!
//! struct MyTransport { /* ... */ }
//!
//! #[async_trait]
//! impl Transport for MyTransport {
//!     async fn recv(&mut self) -> Option<Result<Inbound, LobbyError>> {
//!         // Return the next text frame, or the close frame
//!         unimplemented!()
//!     }
//!
//!     async fn close(&mut self) -> Result<(), LobbyError> {
//!         // Send a normal (1000) close
//!         unimplemented!()
//!     }
//! }
//! ```

use std::fmt;

use async_trait::async_trait;

use crate::close_codes::CloseEvent;
use crate::error::LobbyError;

/// Something received from the lobby service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// One complete text frame.
    Text(String),
    /// The peer sent a close frame.
    Closed(CloseEvent),
}

/// An inbound text frame stream from the lobby service.
///
/// # Cancel Safety
///
/// [`recv`](Transport::recv) **MUST** be cancel-safe because it is polled
/// inside `tokio::select!`. Channel-based implementations are naturally
/// cancel-safe.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Receive the next frame.
    ///
    /// Returns:
    /// - `Some(Ok(Inbound::Text(_)))`: a complete text frame
    /// - `Some(Ok(Inbound::Closed(_)))`: the peer closed the connection
    /// - `Some(Err(e))`: a transport error; the stream may continue
    /// - `None`: the stream ended without a close frame
    async fn recv(&mut self) -> Option<Result<Inbound, LobbyError>>;

    /// Close the connection with a normal (`1000`) close frame.
    ///
    /// # Errors
    ///
    /// Returns [`LobbyError::TransportClose`] if the close handshake fails.
    async fn close(&mut self) -> Result<(), LobbyError>;
}

/// Opens a [`Transport`] to the lobby service.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Transport: Transport;

    /// Open a connection, presenting `credential` to the service.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or the
    /// credential cannot be presented.
    async fn open(&self, credential: &AccessToken) -> Result<Self::Transport, LobbyError>;
}

/// An opaque access token issued by the authentication service.
///
/// The client never inspects it. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for presenting to the service.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

impl From<String> for AccessToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for AccessToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
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
    fn access_token_debug_is_redacted() {
        let token = AccessToken::new("super-secret");
        assert_eq!(format!("{token:?}"), "AccessToken(<redacted>)");
        assert_eq!(token.expose(), "super-secret");
    }

    #[test]
    fn transport_is_object_safe() {
        fn assert_object_safe(_: Option<Box<dyn Transport>>) {}
        assert_object_safe(None);
    }
}
