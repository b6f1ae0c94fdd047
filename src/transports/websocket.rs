//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! [`WebSocketConnector`] opens the lobby connection, presenting the access
//! token as a bearer token on the upgrade request. [`WebSocketTransport`]
//! turns the resulting stream into [`Inbound`] frames, surfacing the lobby's
//! close code instead of swallowing it.
//!
//! # Feature gate
//!
//! This module is only available when the `transport-websocket` feature is enabled
//! (it is enabled by default).
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), lobby_session_sync::LobbyError> {
//! use lobby_session_sync::{AccessToken, Connector, WebSocketConnector};
//!
//! let connector = WebSocketConnector::from_base_url("https://demo.example.com")?;
//! let transport = connector.open(&AccessToken::new("token")).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, Message};

use crate::close_codes::CloseEvent;
use crate::error::LobbyError;
use crate::transport::{AccessToken, Connector, Inbound, Transport};

/// Path of the lobby WebSocket endpoint below the service base URL.
const LOBBY_PATH: &str = "/lobby/";

/// Type alias for the underlying WebSocket stream.
///
/// Made public so that callers can construct a [`WebSocketTransport`] from an
/// existing stream via [`WebSocketTransport::from_stream`].
pub type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// A [`Transport`] backed by a WebSocket connection.
///
/// # Cancel Safety
///
/// The [`recv`](Transport::recv) method is cancel-safe. Dropping the future
/// returned by `recv` before it completes will not consume or lose any messages,
/// making it safe to use inside `tokio::select!`.
#[derive(Debug)]
pub struct WebSocketTransport {
    stream: WsStream,
    closed: bool,
}

impl WebSocketTransport {
    /// Open a WebSocket connection to `url`, sending `credential` as a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`LobbyError::InvalidCredential`] if the token cannot be used as
    /// a header value, and [`LobbyError::Io`] if the URL is invalid or the
    /// connection cannot be established. When the underlying error is an I/O
    /// error its [`ErrorKind`](std::io::ErrorKind) is preserved.
    pub async fn connect(url: &str, credential: &AccessToken) -> Result<Self, LobbyError> {
        tracing::debug!(url = %url, "connecting to lobby WebSocket");

        let mut request = url.into_client_request().map_err(to_io_error)?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))
            .map_err(|_| LobbyError::InvalidCredential)?;
        request.headers_mut().insert(AUTHORIZATION, bearer);

        let (stream, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(to_io_error)?;

        tracing::info!(url = %url, "lobby WebSocket connection established");

        Ok(Self::from_stream(stream))
    }

    /// Create a [`WebSocketTransport`] from an already-established WebSocket stream.
    ///
    /// Useful for custom TLS configuration, proxies, or extra headers.
    pub fn from_stream(stream: WsStream) -> Self {
        Self {
            stream,
            closed: false,
        }
    }
}

fn to_io_error(e: tokio_tungstenite::tungstenite::Error) -> LobbyError {
    let kind = match &e {
        tokio_tungstenite::tungstenite::Error::Io(io) => io.kind(),
        _ => std::io::ErrorKind::Other,
    };
    LobbyError::Io(std::io::Error::new(kind, e))
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn recv(&mut self) -> Option<Result<Inbound, LobbyError>> {
        loop {
            let msg = match self.stream.next().await {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => {
                    return Some(Err(LobbyError::TransportReceive(e.to_string())));
                }
                None => return None,
            };

            match msg {
                Message::Text(text) => return Some(Ok(Inbound::Text(text.to_string()))),
                Message::Close(frame) => {
                    tracing::debug!(?frame, "received WebSocket close frame");
                    let close = match frame {
                        Some(frame) => CloseEvent::new(u16::from(frame.code), frame.reason.as_str()),
                        // A close frame without a status code.
                        None => CloseEvent::new(1005, ""),
                    };
                    return Some(Ok(Inbound::Closed(close)));
                }
                Message::Ping(_) => {
                    // tungstenite auto-queues a Pong reply.
                    tracing::debug!("received WebSocket ping");
                }
                Message::Pong(_) => {
                    tracing::debug!("received WebSocket pong (ignored)");
                }
                Message::Binary(_) => {
                    tracing::warn!("received unexpected binary WebSocket frame, skipping");
                }
                Message::Frame(_) => {
                    // Never produced by the read half; kept for exhaustiveness.
                    tracing::debug!("received raw WebSocket frame, skipping");
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), LobbyError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "client shut down".into(),
        };
        self.stream
            .close(Some(frame))
            .await
            .map_err(|e| LobbyError::TransportClose(e.to_string()))
    }
}

/// Opens [`WebSocketTransport`]s to a fixed lobby URL.
///
/// The connect timeout is applied by the client
/// (see [`LobbyConfig::connect_timeout`](crate::LobbyConfig::connect_timeout)).
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    url: String,
}

impl WebSocketConnector {
    /// A connector for the given `ws://` or `wss://` lobby URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Derive the lobby endpoint from the service base URL, e.g.
    /// `https://demo.example.com` → `wss://demo.example.com/lobby/`.
    ///
    /// # Errors
    ///
    /// Returns [`LobbyError::Connect`] if the URL scheme is not one of
    /// `http`, `https`, `ws` or `wss`.
    pub fn from_base_url(base_url: &str) -> Result<Self, LobbyError> {
        let base = base_url.trim().trim_end_matches('/');
        let (scheme, rest) = base
            .split_once("://")
            .ok_or_else(|| LobbyError::Connect(format!("base URL has no scheme: {base_url}")))?;
        let ws_scheme = match scheme {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            other => {
                return Err(LobbyError::Connect(format!(
                    "unsupported URL scheme: {other}"
                )))
            }
        };
        Ok(Self::new(format!("{ws_scheme}://{rest}{LOBBY_PATH}")))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    type Transport = WebSocketTransport;

    async fn open(&self, credential: &AccessToken) -> Result<WebSocketTransport, LobbyError> {
        WebSocketTransport::connect(&self.url, credential).await
    }
}

#[cfg(test)]
#[cfg(feature = "transport-websocket")]
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
    use futures_util::SinkExt;
    use std::sync::{Arc, Mutex as StdMutex};
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

    #[test]
    fn websocket_transport_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<WebSocketTransport>();
    }

    #[test]
    fn base_url_is_mapped_to_lobby_endpoint() {
        let c = WebSocketConnector::from_base_url("https://demo.example.com/").unwrap();
        assert_eq!(c.url(), "wss://demo.example.com/lobby/");
        let c = WebSocketConnector::from_base_url("http://localhost:8080").unwrap();
        assert_eq!(c.url(), "ws://localhost:8080/lobby/");
    }

    #[test]
    fn base_url_requires_known_scheme() {
        assert!(matches!(
            WebSocketConnector::from_base_url("ftp://x"),
            Err(LobbyError::Connect(_))
        ));
        assert!(matches!(
            WebSocketConnector::from_base_url("demo.example.com"),
            Err(LobbyError::Connect(_))
        ));
    }

    #[tokio::test]
    async fn connect_fails_with_invalid_url() {
        let result = WebSocketTransport::connect("not-a-valid-url", &AccessToken::new("t")).await;
        assert!(matches!(result.unwrap_err(), LobbyError::Io(_)));
    }

    #[tokio::test]
    async fn credential_with_newline_is_rejected() {
        let result =
            WebSocketTransport::connect("ws://127.0.0.1:1", &AccessToken::new("bad\ntoken")).await;
        assert!(matches!(result.unwrap_err(), LobbyError::InvalidCredential));
    }

    #[tokio::test]
    async fn connect_fails_with_unreachable_host() {
        let result = WebSocketTransport::connect("ws://127.0.0.1:1", &AccessToken::new("t")).await;
        assert!(matches!(result.unwrap_err(), LobbyError::Io(_)));
    }

    // ── Mock-server helpers ─────────────────────────────────────────

    /// Start a local WebSocket server that records the `Authorization`
    /// header and runs `handler` on the accepted connection.
    async fn start_mock_server<F, Fut>(handler: F) -> (String, Arc<StdMutex<Option<String>>>)
    where
        F: FnOnce(tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>) -> Fut
            + Send
            + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let auth = Arc::new(StdMutex::new(None));
        let seen = Arc::clone(&auth);

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                *seen.lock().unwrap() = req
                    .headers()
                    .get(AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                Ok(resp)
            };
            let ws = tokio_tungstenite::accept_hdr_async(tcp, callback)
                .await
                .unwrap();
            handler(ws).await;
        });

        (format!("ws://{addr}"), auth)
    }

    #[tokio::test]
    async fn connector_sends_bearer_token() {
        let (url, auth) = start_mock_server(|mut ws| async move {
            ws.close(None).await.unwrap();
        })
        .await;

        let connector = WebSocketConnector::new(url);
        let _transport = connector.open(&AccessToken::new("abc123")).await.unwrap();
        assert_eq!(auth.lock().unwrap().as_deref(), Some("Bearer abc123"));
    }

    #[tokio::test]
    async fn recv_yields_text_then_close_code() {
        let (url, _) = start_mock_server(|mut ws| async move {
            ws.send(Message::Text("type: connectNotif".into()))
                .await
                .unwrap();
            ws.close(Some(CloseFrame {
                code: CloseCode::from(4020),
                reason: "token expired".into(),
            }))
            .await
            .unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url, &AccessToken::new("t"))
            .await
            .unwrap();

        let first = transport.recv().await.unwrap().unwrap();
        assert_eq!(first, Inbound::Text("type: connectNotif".into()));

        let second = transport.recv().await.unwrap().unwrap();
        assert_eq!(
            second,
            Inbound::Closed(CloseEvent::new(4020, "token expired"))
        );
    }

    #[tokio::test]
    async fn recv_skips_binary_frames() {
        let (url, _) = start_mock_server(|mut ws| async move {
            ws.send(Message::Binary(vec![0xDE, 0xAD].into()))
                .await
                .unwrap();
            ws.send(Message::Text("after_binary".into())).await.unwrap();
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url, &AccessToken::new("t"))
            .await
            .unwrap();
        let msg = transport.recv().await.unwrap().unwrap();
        assert_eq!(msg, Inbound::Text("after_binary".into()));
    }

    #[tokio::test]
    async fn double_close_is_idempotent() {
        let (url, _) =
            start_mock_server(|mut ws| async move { while let Some(Ok(_)) = ws.next().await {} })
                .await;

        let mut transport = WebSocketTransport::connect(&url, &AccessToken::new("t"))
            .await
            .unwrap();
        transport.close().await.unwrap();
        transport.close().await.unwrap();
    }
}
