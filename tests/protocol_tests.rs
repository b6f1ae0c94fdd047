#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Wire-format tests for lobby-session-sync.
//!
//! Verifies frame envelopes in both wire forms, the base64 payload codec,
//! and typed decoding of every known topic against JSON fixtures shaped like
//! real lobby output.

use lobby_session_sync::codec::{decode_payload, encode_payload};
use lobby_session_sync::envelope::{decode_frame, Envelope, NotificationKind};
use lobby_session_sync::protocol::status::{INVITED, JOINED};
use lobby_session_sync::{CloseEvent, CloseKind, DecodeError, Member, SessionEvent, Topic};
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};

// ════════════════════════════════════════════════════════════════════
// Helper
// ════════════════════════════════════════════════════════════════════

/// Run a full frame through envelope, codec and topic decoding.
fn decode_session_frame(frame: &str) -> Result<SessionEvent, DecodeError> {
    let envelope = decode_frame(frame)?;
    assert_eq!(envelope.kind, NotificationKind::SessionMessage);
    let topic = envelope.topic.expect("topic");
    let value = decode_payload(&envelope.payload.expect("payload"))?;
    SessionEvent::from_topic(&topic, value)
}

fn frame(topic: &str, payload: &Value) -> String {
    format!(
        "type: messageSessionNotif\nid: 0a1b2c\ntopic: {topic}\npayload: {}\n",
        encode_payload(payload)
    )
}

// ════════════════════════════════════════════════════════════════════
// Envelopes
// ════════════════════════════════════════════════════════════════════

#[test]
fn line_frame_fields() {
    let envelope = assert_ok!(decode_frame(
        "type: messageSessionNotif\nid: 42\ntopic: OnSessionEnded\npayload: e30=\n"
    ));
    assert_eq!(
        envelope,
        Envelope {
            kind: NotificationKind::SessionMessage,
            id: Some("42".into()),
            topic: Some("OnSessionEnded".into()),
            payload: Some("e30=".into()),
            lobby_session_id: None,
        }
    );
}

#[test]
fn line_frame_tolerates_crlf_and_unknown_keys() {
    let envelope = assert_ok!(decode_frame(
        "type: connectNotif\r\nlobbySessionID: abc\r\nsequence: 9\r\n"
    ));
    assert_eq!(envelope.kind, NotificationKind::Connect);
    assert_eq!(envelope.lobby_session_id.as_deref(), Some("abc"));
}

#[test]
fn json_frame_matches_line_frame() {
    let lines = assert_ok!(decode_frame(
        "type: messageSessionNotif\ntopic: OnSessionKicked\npayload: e30="
    ));
    let object = assert_ok!(decode_frame(
        r#"{"type":"messageSessionNotif","topic":"OnSessionKicked","payload":"e30="}"#
    ));
    assert_eq!(lines, object);
}

#[test]
fn message_notif_payload_is_optional() {
    let envelope = assert_ok!(decode_frame("type: messageNotif\ntopic: OnMatchFound"));
    assert_eq!(envelope.kind, NotificationKind::Message);
    assert!(envelope.payload.is_none());
}

#[test]
fn unknown_kind_is_preserved() {
    let envelope = assert_ok!(decode_frame("type: friendsNotif"));
    assert_eq!(
        envelope.kind,
        NotificationKind::Unrecognized("friendsNotif".into())
    );
}

#[test]
fn session_frame_without_payload_is_rejected() {
    let err = assert_err!(decode_frame(
        "type: messageSessionNotif\ntopic: OnSessionJoined"
    ));
    assert!(matches!(err, DecodeError::MissingField { field: "payload", .. }));
}

#[test]
fn frame_without_type_is_rejected() {
    let err = assert_err!(decode_frame("topic: OnSessionJoined\npayload: e30="));
    assert!(matches!(err, DecodeError::Frame { .. }));
    assert_eq!(err.raw(), "topic: OnSessionJoined\npayload: e30=");
}

#[test]
fn json_array_frame_is_rejected() {
    assert_err!(decode_frame("[1, 2, 3]"));
    assert_err!(decode_frame(r#"{"type": 7}"#));
}

// ════════════════════════════════════════════════════════════════════
// Payload codec
// ════════════════════════════════════════════════════════════════════

#[test]
fn payload_from_known_base64() {
    // {"SessionID":"S1"}
    let value = assert_ok!(decode_payload("eyJTZXNzaW9uSUQiOiJTMSJ9"));
    assert_eq!(value, json!({"SessionID": "S1"}));
}

#[test]
fn payload_base64_and_json_failures_are_distinct() {
    assert!(matches!(
        assert_err!(decode_payload("not base64!")),
        DecodeError::Base64 { .. }
    ));
    // "not json"
    assert!(matches!(
        assert_err!(decode_payload("bm90IGpzb24=")),
        DecodeError::Json { .. }
    ));
}

// ════════════════════════════════════════════════════════════════════
// Topic decoding
// ════════════════════════════════════════════════════════════════════

#[test]
fn session_joined_fixture() {
    let payload = json!({
        "SessionID": "b6a3f5e0",
        "JoinerID": "U2",
        "Members": [
            {"ID": "U1", "Status": "JOINED", "StatusV2": "JOINED"},
            {"ID": "U2", "Status": "INVITED", "StatusV2": "CONNECTED", "PlatformID": "steam"}
        ]
    });
    let event = assert_ok!(decode_session_frame(&frame("OnSessionJoined", &payload)));
    let SessionEvent::SessionJoined(joined) = event else {
        panic!("expected SessionJoined, got {event:?}");
    };
    assert_eq!(joined.session_id, "b6a3f5e0");
    assert_eq!(joined.joiner_id.as_deref(), Some("U2"));
    assert_eq!(
        joined.members,
        vec![Member::new("U1", JOINED), Member::new("U2", "CONNECTED")]
    );
}

#[test]
fn members_missing_decodes_as_empty() {
    let event = assert_ok!(decode_session_frame(&frame(
        "OnSessionMembersChanged",
        &json!({"SessionID": "S1"})
    )));
    let SessionEvent::SessionMembersChanged(changed) = event else {
        panic!("expected SessionMembersChanged, got {event:?}");
    };
    assert!(changed.members.is_empty());
}

#[test]
fn legacy_status_is_used_when_status_v2_absent() {
    let event = assert_ok!(decode_session_frame(&frame(
        "OnSessionJoined",
        &json!({"SessionID": "S1", "Members": [{"ID": "U1", "Status": "INVITED"}]})
    )));
    let SessionEvent::SessionJoined(joined) = event else {
        panic!("expected SessionJoined, got {event:?}");
    };
    assert_eq!(joined.members, vec![Member::new("U1", INVITED)]);
}

#[test]
fn session_id_missing_is_a_schema_error() {
    let err = assert_err!(decode_session_frame(&frame(
        "OnSessionJoined",
        &json!({"Members": []})
    )));
    let DecodeError::Schema { topic, .. } = err else {
        panic!("expected Schema, got {err:?}");
    };
    assert_eq!(topic, "OnSessionJoined");
}

#[test]
fn invite_fixture() {
    let event = assert_ok!(decode_session_frame(&frame(
        "OnSessionInvited",
        &json!({"SessionID": "S1", "SenderID": "U9", "ExpiredAt": 1_760_000_000})
    )));
    let SessionEvent::SessionInvited(invite) = event else {
        panic!("expected SessionInvited, got {event:?}");
    };
    assert_eq!(invite.sender_id.as_deref(), Some("U9"));
    assert_eq!(invite.expired_at, Some(1_760_000_000));
}

#[test]
fn game_session_updated_fixture() {
    let event = assert_ok!(decode_session_frame(&frame(
        "OnGameSessionUpdated",
        &json!({
            "ID": "G1",
            "Version": 3,
            "Configuration": {"Name": "ranked-4v4", "Joinability": "OPEN"},
            "Members": [{"ID": "U1", "StatusV2": "JOINED"}]
        })
    )));
    let SessionEvent::GameSessionUpdated(update) = event else {
        panic!("expected GameSessionUpdated, got {event:?}");
    };
    assert_eq!(update.session_id, "G1");
    assert_eq!(update.members.len(), 1);
}

#[test]
fn party_fixture() {
    let event = assert_ok!(decode_session_frame(&frame(
        "OnPartyMembersChanged",
        &json!({"PartyID": "P1", "LeaderID": "U1", "Members": [{"ID": "U1", "StatusV2": "JOINED"}]})
    )));
    assert_eq!(event.known_topic(), Some(Topic::PartyMembersChanged));
    assert_eq!(event.topic(), "OnPartyMembersChanged");
}

#[test]
fn every_known_topic_decodes_its_minimal_payload() {
    for topic in Topic::ALL {
        let payload = match topic {
            Topic::GameSessionUpdated => json!({"ID": "S1"}),
            Topic::PartyCreated | Topic::PartyMembersChanged | Topic::PartyJoined => {
                json!({"PartyID": "P1"})
            }
            _ => json!({"SessionID": "S1"}),
        };
        let event = assert_ok!(SessionEvent::from_topic(topic.as_str(), payload));
        assert_eq!(event.known_topic(), Some(topic), "{topic}");
        assert!(!event.to_string().is_empty());
    }
}

#[test]
fn unknown_topic_keeps_raw_payload() {
    let raw = json!({"SessionID": "S1", "Anything": [1, 2]});
    let event = assert_ok!(SessionEvent::from_topic("OnSessionReticulated", raw.clone()));
    assert_eq!(
        event,
        SessionEvent::Unrecognized {
            topic: "OnSessionReticulated".into(),
            raw
        }
    );
    assert_eq!(event.known_topic(), None);
}

// ════════════════════════════════════════════════════════════════════
// Close codes
// ════════════════════════════════════════════════════════════════════

#[test]
fn close_kinds() {
    assert_eq!(CloseKind::from_code(4020), CloseKind::ReauthenticationRequired);
    assert_eq!(CloseKind::from_code(1000), CloseKind::Normal);
    assert_eq!(CloseKind::from_code(1001), CloseKind::Unexpected);
    assert_eq!(CloseEvent::abnormal("gone").kind(), CloseKind::Unexpected);
}
