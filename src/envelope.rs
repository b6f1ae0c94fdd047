//! Envelope decoding for inbound lobby frames.
//!
//! The lobby service sends text frames in its own line format, one
//! `key: value` pair per line:
//!
//! ```text
//! type: messageSessionNotif
//! id: 6f0e1c2d
//! topic: OnSessionJoined
//! payload: eyJTZXNzaW9uSUQiOiJTMSJ9
//! ```
//!
//! Some gateways relay the same keys as a JSON object instead, so a frame
//! whose first non-whitespace character is `{` is read as JSON. Unknown keys
//! are ignored in both forms.

use serde::{Deserialize, Deserializer};

use crate::error::DecodeError;

/// Wire name of the greeting sent right after the connection opens.
pub const CONNECT_NOTIF: &str = "connectNotif";
/// Wire name of a generic lobby message.
pub const MESSAGE_NOTIF: &str = "messageNotif";
/// Wire name of a session or party notification.
pub const SESSION_NOTIF: &str = "messageSessionNotif";

/// The kind of an inbound notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    /// `connectNotif`: the lobby accepted the connection.
    Connect,
    /// `messageNotif`: a generic message, optionally with a payload.
    Message,
    /// `messageSessionNotif`: a session or party event with topic and payload.
    SessionMessage,
    /// Any other `type`. Logged and dropped by the dispatcher.
    Unrecognized(String),
}

impl NotificationKind {
    fn from_wire(kind: &str) -> Self {
        match kind {
            CONNECT_NOTIF => Self::Connect,
            MESSAGE_NOTIF => Self::Message,
            SESSION_NOTIF => Self::SessionMessage,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub kind: NotificationKind,
    /// Message ID assigned by the lobby, if any.
    pub id: Option<String>,
    /// Topic of the notification (required for session notifications).
    pub topic: Option<String>,
    /// Base64-encoded JSON payload (required for session notifications).
    pub payload: Option<String>,
    /// Lobby session ID announced by `connectNotif`.
    pub lobby_session_id: Option<String>,
}

/// The JSON form of a frame.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonFrame {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    id: Option<String>,
    topic: Option<String>,
    payload: Option<String>,
    #[serde(alias = "lobbySessionID")]
    lobby_session_id: Option<String>,
}

/// Decode one raw text frame into an [`Envelope`].
///
/// Never panics. A session notification without `topic` or `payload` is
/// reported as [`DecodeError::MissingField`]; an unknown `type` decodes to
/// [`NotificationKind::Unrecognized`].
///
/// # Errors
///
/// Returns [`DecodeError::Frame`] if the frame is empty, has no `type`, or is
/// a JSON document that is not an object with string fields.
pub fn decode_frame(raw: &str) -> Result<Envelope, DecodeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(frame_error("empty frame", raw));
    }

    let frame = if trimmed.starts_with('{') {
        serde_json::from_str::<JsonFrame>(trimmed)
            .map_err(|e| frame_error(&format!("invalid JSON frame: {e}"), raw))?
    } else {
        parse_lines(trimmed)
    };

    let Some(kind) = frame.kind.filter(|k| !k.is_empty()) else {
        return Err(frame_error("frame has no `type`", raw));
    };

    let envelope = Envelope {
        kind: NotificationKind::from_wire(&kind),
        id: non_empty(frame.id),
        topic: non_empty(frame.topic),
        payload: non_empty(frame.payload),
        lobby_session_id: non_empty(frame.lobby_session_id),
    };

    if envelope.kind == NotificationKind::SessionMessage {
        if envelope.topic.is_none() {
            return Err(missing(SESSION_NOTIF, "topic", raw));
        }
        if envelope.payload.is_none() {
            return Err(missing(SESSION_NOTIF, "payload", raw));
        }
    }

    Ok(envelope)
}

/// Parse the lobby's `key: value` line format. Lines without a colon are skipped.
fn parse_lines(text: &str) -> JsonFrame {
    let mut frame = JsonFrame {
        kind: None,
        id: None,
        topic: None,
        payload: None,
        lobby_session_id: None,
    };
    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = Some(value.trim().to_string());
        match key.trim() {
            "type" => frame.kind = value,
            "id" => frame.id = value,
            "topic" => frame.topic = value,
            "payload" => frame.payload = value,
            "lobbySessionID" | "lobbySessionId" => frame.lobby_session_id = value,
            _ => {}
        }
    }
    frame
}

/// The message ID is informational: numbers are stringified, other
/// non-string values are dropped instead of failing the frame.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(id) => Some(id),
        serde_json::Value::Number(id) => Some(id.to_string()),
        _ => None,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn frame_error(reason: &str, raw: &str) -> DecodeError {
    DecodeError::Frame {
        reason: reason.to_string(),
        raw: raw.to_string(),
    }
}

fn missing(kind: &'static str, field: &'static str, raw: &str) -> DecodeError {
    DecodeError::MissingField {
        kind,
        field,
        raw: raw.to_string(),
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
    fn line_format_session_notification() {
        let env = decode_frame(
            "type: messageSessionNotif\nid: abc\ntopic: OnSessionJoined\npayload: e30=\nsentAt: 2024-01-01T00:00:00Z",
        )
        .unwrap();
        assert_eq!(env.kind, NotificationKind::SessionMessage);
        assert_eq!(env.id.as_deref(), Some("abc"));
        assert_eq!(env.topic.as_deref(), Some("OnSessionJoined"));
        assert_eq!(env.payload.as_deref(), Some("e30="));
    }

    #[test]
    fn line_format_tolerates_crlf_and_padding() {
        let env = decode_frame("  type: connectNotif\r\nlobbySessionID: L1\r\n").unwrap();
        assert_eq!(env.kind, NotificationKind::Connect);
        assert_eq!(env.lobby_session_id.as_deref(), Some("L1"));
    }

    #[test]
    fn json_format_is_accepted() {
        let env = decode_frame(
            r#"{"type":"messageSessionNotif","topic":"OnSessionEnded","payload":"e30=","extra":1}"#,
        )
        .unwrap();
        assert_eq!(env.kind, NotificationKind::SessionMessage);
        assert_eq!(env.topic.as_deref(), Some("OnSessionEnded"));
    }

    #[test]
    fn json_id_of_any_type_does_not_fail_the_frame() {
        let env = decode_frame(r#"{"type":"connectNotif","id":7}"#).unwrap();
        assert_eq!(env.id.as_deref(), Some("7"));

        let env = decode_frame(r#"{"type":"connectNotif","id":{"seq":7}}"#).unwrap();
        assert_eq!(env.id, None);

        let env = decode_frame(r#"{"type":"connectNotif","id":null}"#).unwrap();
        assert_eq!(env.id, None);
    }

    #[test]
    fn message_without_payload_is_valid() {
        let env = decode_frame("type: messageNotif\ntopic: matchmaking").unwrap();
        assert_eq!(env.kind, NotificationKind::Message);
        assert!(env.payload.is_none());
    }

    #[test]
    fn unknown_kind_is_unrecognized_not_an_error() {
        let env = decode_frame("type: friendsNotif").unwrap();
        assert_eq!(
            env.kind,
            NotificationKind::Unrecognized("friendsNotif".into())
        );
    }

    #[test]
    fn session_notification_without_topic_is_missing_field() {
        let err = decode_frame("type: messageSessionNotif\npayload: e30=").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MissingField { field: "topic", .. }
        ));
    }

    #[test]
    fn session_notification_with_empty_payload_is_missing_field() {
        let err = decode_frame("type: messageSessionNotif\ntopic: OnSessionEnded\npayload:")
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MissingField {
                field: "payload",
                ..
            }
        ));
    }

    #[test]
    fn malformed_frames_are_errors() {
        for raw in ["", "   ", "hello world", "id: 1", "{not json", "{\"type\": 5}"] {
            let err = decode_frame(raw).unwrap_err();
            assert!(matches!(err, DecodeError::Frame { .. }), "{raw:?}");
            assert_eq!(err.raw(), raw);
        }
    }
}
