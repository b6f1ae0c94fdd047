//! # Session Watch Example
//!
//! Connects to a lobby service and prints session membership as it changes:
//!
//! 1. Open the lobby WebSocket with an access token
//! 2. Apply every session notification to the local store
//! 3. Print the tracked sessions after each change
//! 4. Shut down on Ctrl+C, or exit when the lobby closes the connection
//!
//! ## Running
//!
//! ```sh
//! AB_BASE_URL=https://demo.example.com AB_ACCESS_TOKEN=... \
//!     cargo run --example session_watch
//!
//! # Or point at the lobby endpoint directly:
//! LOBBY_URL=ws://localhost:8080/lobby/ AB_ACCESS_TOKEN=... \
//!     cargo run --example session_watch
//! ```

use lobby_session_sync::protocol::status;
use lobby_session_sync::{
    AccessToken, CloseKind, LobbyClient, LobbyConfig, LobbyEvent, WebSocketConnector,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    // Set `RUST_LOG=debug` for per-frame output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // ── Configuration ───────────────────────────────────────────────
    let connector = match std::env::var("LOBBY_URL") {
        Ok(url) => WebSocketConnector::new(url),
        Err(_) => WebSocketConnector::from_base_url(&std::env::var("AB_BASE_URL")?)?,
    };
    let token = AccessToken::new(std::env::var("AB_ACCESS_TOKEN")?);
    tracing::info!("Connecting to {}", connector.url());

    // ── Connect ─────────────────────────────────────────────────────
    let mut client = LobbyClient::new(LobbyConfig::from_env());
    let mut event_rx = client.connect(connector, token)?;

    // ── Event loop ──────────────────────────────────────────────────
    loop {
        tokio::select! {
            event = event_rx.recv() => {
                let Some(event) = event else {
                    tracing::info!("Event channel closed, exiting");
                    break;
                };

                match event {
                    LobbyEvent::Opened => tracing::info!("Connected, waiting for notifications"),
                    LobbyEvent::LobbyReady { lobby_session_id } => {
                        tracing::info!("Lobby ready (session {lobby_session_id:?})");
                    }
                    LobbyEvent::Session(event) => {
                        println!("{event}");
                        for session in client.list_all_sessions().await {
                            let members: Vec<String> =
                                session.members.iter().map(ToString::to_string).collect();
                            println!("  {}: {}", session.session_id, members.join(", "));
                        }
                        let joined = client.list_session_members(None, Some(status::JOINED)).await;
                        println!("  {} member(s) joined across all sessions", joined.len());
                    }
                    LobbyEvent::Message { topic, payload } => {
                        tracing::info!("Lobby message {topic:?}: {payload:?}");
                    }
                    LobbyEvent::DecodeFailed { reason, .. } => {
                        tracing::warn!("Skipped frame: {reason}");
                    }
                    LobbyEvent::Error { message } => tracing::error!("Transport error: {message}"),
                    LobbyEvent::Closed { close, kind } => {
                        match kind {
                            CloseKind::ReauthenticationRequired => {
                                tracing::warn!("Token expired ({close}); log in again to continue");
                            }
                            CloseKind::Normal => tracing::info!("Lobby closed the connection"),
                            CloseKind::Unexpected => tracing::error!("Connection lost: {close}"),
                        }
                        break;
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, shutting down…");
                break;
            }
        }
    }

    // ── Shutdown ────────────────────────────────────────────────────
    client.shutdown().await;
    tracing::info!("Client shut down");

    Ok(())
}
