#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Integration-style client tests for lobby-session-sync.
//!
//! Uses the shared `MockConnector` from `tests/common` to script lobby frames
//! and verify that `LobbyClient` applies them to the membership store,
//! classifies closes, and delivers events in order.

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use lobby_session_sync::protocol::status::JOINED;
use lobby_session_sync::{
    AccessToken, CloseKind, ConnectionState, LobbyClient, LobbyConfig, LobbyError, LobbyEvent,
    Member, SessionEvent,
};
use serde_json::json;
use tokio::sync::mpsc::Receiver;

use common::{
    close, connect_frame, members_payload, session_frame, text, MockConnector, Scripted,
};

// ════════════════════════════════════════════════════════════════════
// Helpers
// ════════════════════════════════════════════════════════════════════

fn start_client(incoming: Vec<Scripted>) -> (LobbyClient, Receiver<LobbyEvent>) {
    let mut client = LobbyClient::new(LobbyConfig::new());
    let events = client
        .connect(MockConnector::new(incoming), AccessToken::new("token-123"))
        .expect("connect");
    (client, events)
}

async fn next_event(events: &mut Receiver<LobbyEvent>) -> LobbyEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Consume events up to and including `Closed`, returning everything seen.
async fn drain_until_closed(events: &mut Receiver<LobbyEvent>) -> Vec<LobbyEvent> {
    let mut seen = Vec::new();
    loop {
        let ev = next_event(events).await;
        let done = ev.is_terminal();
        seen.push(ev);
        if done {
            return seen;
        }
    }
}

fn closed_kind(events: &[LobbyEvent]) -> (u16, CloseKind) {
    match events.last() {
        Some(LobbyEvent::Closed { close, kind }) => (close.code, *kind),
        other => panic!("expected Closed last, got {other:?}"),
    }
}

// ════════════════════════════════════════════════════════════════════
// Membership flow
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn join_change_end_scenario() {
    let (client, mut events) = start_client(vec![
        text(connect_frame("L1")),
        text(session_frame(
            "OnSessionJoined",
            &members_payload("S1", &[("U1", JOINED)]),
        )),
        text(session_frame(
            "OnSessionMembersChanged",
            &members_payload("S1", &[("U1", JOINED), ("U2", JOINED)]),
        )),
        text(session_frame("OnSessionEnded", &json!({"SessionID": "S1"}))),
        close(1000, ""),
    ]);

    assert_eq!(next_event(&mut events).await, LobbyEvent::Opened);
    assert_eq!(
        next_event(&mut events).await,
        LobbyEvent::LobbyReady {
            lobby_session_id: Some("L1".into())
        }
    );

    let ev = next_event(&mut events).await;
    assert!(matches!(ev, LobbyEvent::Session(SessionEvent::SessionJoined(_))));

    let ev = next_event(&mut events).await;
    let LobbyEvent::Session(SessionEvent::SessionMembersChanged(payload)) = ev else {
        panic!("expected SessionMembersChanged, got {ev:?}");
    };
    assert_eq!(payload.members.len(), 2);

    let ev = next_event(&mut events).await;
    assert!(matches!(ev, LobbyEvent::Session(SessionEvent::SessionEnded(_))));

    let rest = drain_until_closed(&mut events).await;
    assert_eq!(closed_kind(&rest), (1000, CloseKind::Normal));

    assert!(client.list_all_sessions().await.is_empty());
    assert!(client.list_session_members(Some("S1"), None).await.is_empty());
}

#[tokio::test]
async fn store_reflects_latest_snapshot() {
    let (mut client, mut events) = start_client(vec![
        text(session_frame(
            "OnSessionJoined",
            &members_payload("S1", &[("U1", JOINED)]),
        )),
        text(session_frame(
            "OnSessionMembersChanged",
            &members_payload("S1", &[("U1", JOINED), ("U2", JOINED)]),
        )),
    ]);

    assert_eq!(next_event(&mut events).await, LobbyEvent::Opened);
    next_event(&mut events).await;
    next_event(&mut events).await;

    assert_eq!(
        client.list_session_members(Some("S1"), None).await,
        vec![Member::new("U1", JOINED), Member::new("U2", JOINED)]
    );

    client.shutdown().await;
}

#[tokio::test]
async fn null_members_replace_snapshot_with_empty_list() {
    let (mut client, mut events) = start_client(vec![
        text(session_frame(
            "OnSessionJoined",
            &members_payload("S1", &[("U1", JOINED), ("U2", JOINED)]),
        )),
        text(session_frame(
            "OnSessionMembersChanged",
            &json!({"SessionID": "S1", "Members": null}),
        )),
    ]);

    assert_eq!(next_event(&mut events).await, LobbyEvent::Opened);
    next_event(&mut events).await;
    let ev = next_event(&mut events).await;
    assert!(
        matches!(ev, LobbyEvent::Session(SessionEvent::SessionMembersChanged(_))),
        "{ev:?}"
    );

    let sessions = client.list_all_sessions().await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].session_id, "S1");
    assert!(sessions[0].members.is_empty());

    client.shutdown().await;
}

#[tokio::test]
async fn members_filtered_by_status() {
    let (mut client, mut events) = start_client(vec![
        text(session_frame(
            "OnSessionJoined",
            &members_payload("S1", &[("U1", JOINED), ("U2", "LEFT"), ("U3", "CONNECTED")]),
        )),
        text(session_frame(
            "OnSessionJoined",
            &members_payload("S2", &[("U4", JOINED)]),
        )),
    ]);

    next_event(&mut events).await;
    next_event(&mut events).await;
    next_event(&mut events).await;

    assert_eq!(
        client.list_session_members(Some("S1"), Some(JOINED)).await,
        vec![Member::new("U1", JOINED)]
    );
    assert!(client
        .list_session_members(Some("S1"), Some("KICKED"))
        .await
        .is_empty());

    let mut everyone_joined = client.list_session_members(None, Some(JOINED)).await;
    everyone_joined.sort_by(|a, b| a.id.cmp(&b.id));
    assert_eq!(
        everyone_joined,
        vec![Member::new("U1", JOINED), Member::new("U4", JOINED)]
    );

    let mut sessions = client.list_all_sessions().await;
    sessions.sort_by(|a, b| a.session_id.cmp(&b.session_id));
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].session_id, "S1");
    assert_eq!(sessions[0].members.len(), 3);

    client.shutdown().await;
}

#[tokio::test]
async fn redelivered_notification_is_idempotent() {
    let frame = session_frame(
        "OnSessionMembersChanged",
        &members_payload("S1", &[("U1", JOINED), ("U2", JOINED)]),
    );
    let (mut client, mut events) = start_client(vec![text(frame.clone()), text(frame)]);

    next_event(&mut events).await;
    next_event(&mut events).await;
    let after_once = client.list_all_sessions().await;
    next_event(&mut events).await;

    assert_eq!(client.list_all_sessions().await, after_once);
    client.shutdown().await;
}

#[tokio::test]
async fn status_falls_back_to_legacy_field() {
    let (mut client, mut events) = start_client(vec![text(session_frame(
        "OnSessionJoined",
        &json!({"SessionID": "S1", "Members": [{"ID": "U1", "Status": "INVITED"}]}),
    ))]);

    next_event(&mut events).await;
    next_event(&mut events).await;

    assert_eq!(
        client.list_session_members(Some("S1"), None).await,
        vec![Member::new("U1", "INVITED")]
    );
    client.shutdown().await;
}

#[tokio::test]
async fn json_frames_are_accepted() {
    let payload = lobby_session_sync::codec::encode_payload(&members_payload("S9", &[("U1", JOINED)]));
    let frame = json!({
        "type": "messageSessionNotif",
        "topic": "OnSessionJoined",
        "payload": payload,
    })
    .to_string();
    let (mut client, mut events) = start_client(vec![text(frame)]);

    next_event(&mut events).await;
    let ev = next_event(&mut events).await;
    assert!(matches!(ev, LobbyEvent::Session(SessionEvent::SessionJoined(_))));
    assert_eq!(client.sessions().session_count().await, 1);

    client.shutdown().await;
}

// ════════════════════════════════════════════════════════════════════
// Graceful degradation
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn malformed_payload_is_skipped_and_loop_continues() {
    let (mut client, mut events) = start_client(vec![
        text("type: messageSessionNotif\ntopic: OnSessionJoined\npayload: !!!not-base64!!!"),
        text(session_frame(
            "OnSessionJoined",
            &members_payload("S1", &[("U1", JOINED)]),
        )),
    ]);

    assert_eq!(next_event(&mut events).await, LobbyEvent::Opened);

    let ev = next_event(&mut events).await;
    let LobbyEvent::DecodeFailed { raw, .. } = ev else {
        panic!("expected DecodeFailed, got {ev:?}");
    };
    assert_eq!(raw, "!!!not-base64!!!");

    let ev = next_event(&mut events).await;
    assert!(matches!(ev, LobbyEvent::Session(SessionEvent::SessionJoined(_))));
    assert_eq!(client.list_all_sessions().await.len(), 1);
    assert_eq!(client.state(), ConnectionState::Connected);

    client.shutdown().await;
}

#[tokio::test]
async fn garbage_frames_do_not_disturb_the_store() {
    let (mut client, mut events) = start_client(vec![
        text(session_frame(
            "OnSessionJoined",
            &members_payload("S1", &[("U1", JOINED)]),
        )),
        text("   "),
        text("{not json"),
        text("type: messageSessionNotif\ntopic: OnSessionJoined"),
        text(format!(
            "type: messageSessionNotif\ntopic: OnSessionJoined\npayload: {}",
            lobby_session_sync::codec::encode_payload(&json!({"Members": "nope"}))
        )),
    ]);

    next_event(&mut events).await;
    next_event(&mut events).await;
    let before = client.list_all_sessions().await;

    for _ in 0..4 {
        let ev = next_event(&mut events).await;
        assert!(matches!(ev, LobbyEvent::DecodeFailed { .. }), "{ev:?}");
    }

    assert_eq!(client.list_all_sessions().await, before);
    client.shutdown().await;
}

#[tokio::test]
async fn unknown_topic_is_surfaced_but_not_applied() {
    let (mut client, mut events) = start_client(vec![text(session_frame(
        "OnSessionSomethingNew",
        &json!({"SessionID": "S1", "Members": [{"ID": "U1", "StatusV2": "JOINED"}]}),
    ))]);

    next_event(&mut events).await;
    let ev = next_event(&mut events).await;
    let LobbyEvent::Session(SessionEvent::Unrecognized { topic, .. }) = ev else {
        panic!("expected Unrecognized, got {ev:?}");
    };
    assert_eq!(topic, "OnSessionSomethingNew");
    assert!(client.list_all_sessions().await.is_empty());

    client.shutdown().await;
}

#[tokio::test]
async fn unknown_notification_kind_is_dropped() {
    let (mut client, mut events) = start_client(vec![
        text("type: chatNotif\ntopic: hello"),
        text(connect_frame("L2")),
    ]);

    assert_eq!(next_event(&mut events).await, LobbyEvent::Opened);
    // The chat frame produces no event; the greeting comes next.
    assert!(matches!(
        next_event(&mut events).await,
        LobbyEvent::LobbyReady { .. }
    ));
    client.shutdown().await;
}

#[tokio::test]
async fn transport_error_does_not_close() {
    let (mut client, mut events) = start_client(vec![
        Some(Err(LobbyError::TransportReceive("glitch".into()))),
        text(connect_frame("L3")),
    ]);

    assert_eq!(next_event(&mut events).await, LobbyEvent::Opened);
    let ev = next_event(&mut events).await;
    let LobbyEvent::Error { message } = ev else {
        panic!("expected Error, got {ev:?}");
    };
    assert!(message.contains("glitch"));
    assert!(matches!(
        next_event(&mut events).await,
        LobbyEvent::LobbyReady { .. }
    ));
    assert_eq!(client.state(), ConnectionState::Connected);

    client.shutdown().await;
}

// ════════════════════════════════════════════════════════════════════
// Close classification
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn close_4020_requires_reauthentication() {
    let (client, mut events) = start_client(vec![close(4020, "token expired")]);
    let seen = drain_until_closed(&mut events).await;
    assert_eq!(
        closed_kind(&seen),
        (4020, CloseKind::ReauthenticationRequired)
    );
    assert_eq!(client.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn close_1000_is_normal() {
    let (_client, mut events) = start_client(vec![close(1000, "bye")]);
    let seen = drain_until_closed(&mut events).await;
    assert_eq!(closed_kind(&seen), (1000, CloseKind::Normal));
}

#[tokio::test]
async fn other_close_codes_are_unexpected() {
    for code in [1001, 1006, 1011, 4000, 4999] {
        let (_client, mut events) = start_client(vec![close(code, "")]);
        let seen = drain_until_closed(&mut events).await;
        assert_eq!(closed_kind(&seen), (code, CloseKind::Unexpected), "code {code}");
    }
}

#[tokio::test]
async fn stream_end_without_close_is_abnormal() {
    let (_client, mut events) = start_client(vec![None]);
    let seen = drain_until_closed(&mut events).await;
    let Some(LobbyEvent::Closed { close, kind }) = seen.last() else {
        panic!("expected Closed, got {seen:?}");
    };
    assert_eq!(close.code, 1006);
    assert!(!close.was_clean);
    assert_eq!(*kind, CloseKind::Unexpected);
}

#[tokio::test]
async fn store_survives_close() {
    let (client, mut events) = start_client(vec![
        text(session_frame(
            "OnSessionJoined",
            &members_payload("S1", &[("U1", JOINED)]),
        )),
        close(4020, "token expired"),
    ]);

    drain_until_closed(&mut events).await;
    assert_eq!(client.state(), ConnectionState::Closed);
    assert_eq!(
        client.list_session_members(Some("S1"), None).await,
        vec![Member::new("U1", JOINED)]
    );
}

#[tokio::test]
async fn closed_is_the_last_event() {
    let (_client, mut events) = start_client(vec![close(1000, ""), text(connect_frame("late"))]);
    drain_until_closed(&mut events).await;
    assert!(events.recv().await.is_none());
}

// ════════════════════════════════════════════════════════════════════
// Connection lifecycle
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn credential_is_presented_to_connector() {
    let connector = MockConnector::new(vec![]);
    let credential = std::sync::Arc::clone(&connector.credential);
    let mut client = LobbyClient::new(LobbyConfig::new());
    let mut events = client
        .connect(connector, AccessToken::new("secret-token"))
        .expect("connect");

    assert_eq!(next_event(&mut events).await, LobbyEvent::Opened);
    assert_eq!(credential.lock().unwrap().as_deref(), Some("secret-token"));
    client.shutdown().await;
}

#[tokio::test]
async fn connect_twice_fails() {
    let (mut client, _events) = start_client(vec![]);
    let err = client
        .connect(MockConnector::new(vec![]), AccessToken::new("t"))
        .unwrap_err();
    assert!(matches!(err, LobbyError::AlreadyStarted));
    client.shutdown().await;
}

#[tokio::test]
async fn connect_after_close_fails() {
    let (mut client, mut events) = start_client(vec![close(1000, "")]);
    drain_until_closed(&mut events).await;
    let err = client
        .connect(MockConnector::new(vec![]), AccessToken::new("t"))
        .unwrap_err();
    assert!(matches!(err, LobbyError::AlreadyStarted));
}

#[tokio::test]
async fn failed_open_reports_error_then_closes() {
    let mut client = LobbyClient::new(LobbyConfig::new());
    let mut events = client
        .connect(MockConnector::failing("refused"), AccessToken::new("t"))
        .expect("connect");

    let ev = next_event(&mut events).await;
    let LobbyEvent::Error { message } = ev else {
        panic!("expected Error, got {ev:?}");
    };
    assert!(message.contains("refused"));

    let seen = drain_until_closed(&mut events).await;
    assert_eq!(closed_kind(&seen), (1006, CloseKind::Unexpected));
    assert_eq!(client.state(), ConnectionState::Closed);
}

#[tokio::test(start_paused = true)]
async fn open_times_out() {
    let mut client = LobbyClient::new(
        LobbyConfig::new().with_connect_timeout(Duration::from_millis(100)),
    );
    let mut events = client
        .connect(
            MockConnector::new(vec![]).with_open_delay(Duration::from_secs(60)),
            AccessToken::new("t"),
        )
        .expect("connect");

    assert_eq!(client.state(), ConnectionState::Connecting);

    let ev = events.recv().await.expect("event");
    let LobbyEvent::Error { message } = ev else {
        panic!("expected Error, got {ev:?}");
    };
    assert!(message.contains("timed out"));
    let ev = events.recv().await.expect("event");
    assert!(ev.is_terminal());
    assert_eq!(client.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn shutdown_closes_transport_normally() {
    let connector = MockConnector::new(vec![]);
    let closed = std::sync::Arc::clone(&connector.closed);
    let mut client = LobbyClient::new(LobbyConfig::new());
    let mut events = client
        .connect(connector, AccessToken::new("t"))
        .expect("connect");

    assert_eq!(next_event(&mut events).await, LobbyEvent::Opened);
    assert!(client.is_connected());

    client.shutdown().await;

    let seen = drain_until_closed(&mut events).await;
    assert_eq!(closed_kind(&seen), (1000, CloseKind::Normal));
    assert!(closed.load(Ordering::Relaxed));
    assert_eq!(client.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn shutdown_before_connect_is_a_no_op() {
    let mut client = LobbyClient::new(LobbyConfig::new());
    client.shutdown().await;
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn shutdown_while_connecting() {
    let mut client = LobbyClient::new(LobbyConfig::new());
    let mut events = client
        .connect(
            MockConnector::new(vec![]).with_open_delay(Duration::from_secs(60)),
            AccessToken::new("t"),
        )
        .expect("connect");

    client.shutdown().await;

    let seen = drain_until_closed(&mut events).await;
    assert_eq!(seen.len(), 1);
    assert_eq!(closed_kind(&seen), (1000, CloseKind::Normal));
}

#[tokio::test]
async fn full_channel_drops_events_but_keeps_store_current() {
    let mut incoming: Vec<Scripted> = (0..8)
        .map(|i| {
            text(session_frame(
                "OnSessionJoined",
                &members_payload(&format!("S{i}"), &[("U1", JOINED)]),
            ))
        })
        .collect();
    incoming.push(close(1000, ""));

    let mut client = LobbyClient::new(LobbyConfig::new().with_event_channel_capacity(1));
    let mut events = client
        .connect(MockConnector::new(incoming), AccessToken::new("t"))
        .expect("connect");

    // Let the loop run ahead of the receiver.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let seen = drain_until_closed(&mut events).await;
    assert!(seen.len() < 10, "some events should have been dropped");
    assert_eq!(closed_kind(&seen), (1000, CloseKind::Normal));
    assert_eq!(client.list_all_sessions().await.len(), 8);
}
