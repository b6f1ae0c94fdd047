//! # Lobby Session Sync
//!
//! Async client that keeps a local, queryable view of multiplayer session
//! membership in sync with a lobby service's push notification stream.
//!
//! The lobby pushes text frames over a long-lived connection. Each frame is
//! decoded, its base64 JSON payload parsed into a typed [`SessionEvent`], and
//! the event applied to an in-memory membership store that callers query at
//! any time.
//!
//! ## Features
//!
//! - **Transport-agnostic**: implement the [`Transport`] and [`Connector`] traits for any backend
//! - **WebSocket built-in**: default `transport-websocket` feature provides [`WebSocketConnector`]
//! - **Event-driven**: receive typed [`LobbyEvent`]s via a channel
//! - **Graceful degradation**: malformed frames are reported and skipped, never fatal
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lobby_session_sync::{AccessToken, LobbyClient, LobbyConfig, LobbyEvent, WebSocketConnector};
//!
//! let connector = WebSocketConnector::from_base_url("https://demo.example.com")?;
//! let mut client = LobbyClient::new(LobbyConfig::from_env());
//! let mut events = client.connect(connector, AccessToken::new(token))?;
//!
//! while let Some(event) = events.recv().await {
//!     if let LobbyEvent::Closed { kind, .. } = event {
//!         println!("closed: {kind}");
//!         break;
//!     }
//!     println!("{:?}", client.list_session_members(Some("S1"), Some("JOINED")).await);
//! }
//! ```

pub mod client;
pub mod close_codes;
pub mod codec;
pub mod envelope;
pub mod error;
pub mod event;
pub mod protocol;
pub mod router;
pub mod store;
pub mod transport;
pub mod transports;

// Re-export primary types for ergonomic imports.
pub use client::{ConnectionState, LobbyClient, LobbyConfig};
pub use close_codes::{CloseEvent, CloseKind};
pub use error::{DecodeError, LobbyError, Result};
pub use event::LobbyEvent;
pub use protocol::{Member, SessionEvent, Topic};
pub use store::{SessionDirectory, SessionSnapshot};
pub use transport::{AccessToken, Connector, Inbound, Transport};

#[cfg(feature = "transport-websocket")]
pub use transports::{WebSocketConnector, WebSocketTransport};
