//! Topic routing: applies decoded notifications to the membership store.
//!
//! Session joins and membership changes replace the stored snapshot, session
//! ends remove it, and every other topic (invites, storage, DS status,
//! parties, ...) only produces a projection. Parties are rendered once per
//! event and never tracked.

use tracing::{debug, info, warn};

use crate::protocol::{SessionEvent, SessionId, SessionMembersPayload};
use crate::store::MembershipStore;

/// What routing a notification did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The session's member list was replaced (or created).
    MembersReplaced { session_id: SessionId, count: usize },
    /// The session was dropped from the store. `existed` is `false` when the
    /// session was not tracked.
    SessionRemoved { session_id: SessionId, existed: bool },
    /// Informational or party topic: the store was not touched.
    Projected,
    /// Unknown topic: logged and ignored.
    Ignored,
}

impl RouteOutcome {
    /// Whether the store was (potentially) modified.
    pub fn mutated_store(&self) -> bool {
        matches!(
            self,
            Self::MembersReplaced { .. } | Self::SessionRemoved { existed: true, .. }
        )
    }
}

/// Apply one notification.
///
/// Handlers are idempotent: delivering the same event twice leaves the store
/// as if it had been delivered once. No deduplication is attempted.
pub fn route(event: &SessionEvent, store: &mut MembershipStore) -> RouteOutcome {
    match event {
        SessionEvent::SessionJoined(payload) | SessionEvent::SessionMembersChanged(payload) => {
            replace_members(event.topic(), payload, store)
        }
        SessionEvent::SessionEnded(payload) => {
            let existed = store.remove(&payload.session_id);
            info!(session_id = %payload.session_id, existed, "{event}");
            RouteOutcome::SessionRemoved {
                session_id: payload.session_id.clone(),
                existed,
            }
        }
        SessionEvent::SessionInvited(_)
        | SessionEvent::SessionRejected(_)
        | SessionEvent::SessionKicked(_)
        | SessionEvent::InviteTimeout(_)
        | SessionEvent::InviteCancelled(_)
        | SessionEvent::StorageChanged(_)
        | SessionEvent::NativePlatformSynced(_)
        | SessionEvent::JoinedSecret(_)
        | SessionEvent::GameSessionUpdated(_)
        | SessionEvent::DsStatusChanged(_) => {
            info!(topic = %event.topic(), "{event}");
            RouteOutcome::Projected
        }
        SessionEvent::PartyCreated(_)
        | SessionEvent::PartyMembersChanged(_)
        | SessionEvent::PartyJoined(_) => {
            info!(topic = %event.topic(), "party: {event}");
            RouteOutcome::Projected
        }
        SessionEvent::Unrecognized { topic, raw } => {
            warn!(topic = %topic, raw = %raw, "unhandled session notification topic");
            RouteOutcome::Ignored
        }
    }
}

fn replace_members(
    topic: &str,
    payload: &SessionMembersPayload,
    store: &mut MembershipStore,
) -> RouteOutcome {
    let count = payload.members.len();
    store.upsert(payload.session_id.clone(), payload.members.clone());
    debug!(topic, session_id = %payload.session_id, count, "membership snapshot replaced");
    info!(
        topic,
        "session {} members: {}",
        payload.session_id,
        payload
            .members
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    RouteOutcome::MembersReplaced {
        session_id: payload.session_id.clone(),
        count,
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
    use crate::protocol::status::JOINED;
    use crate::protocol::Member;
    use serde_json::json;

    fn event(topic: &str, value: serde_json::Value) -> SessionEvent {
        SessionEvent::from_topic(topic, value).unwrap()
    }

    fn joined(session: &str, ids: &[&str]) -> serde_json::Value {
        let members: Vec<_> = ids
            .iter()
            .map(|id| json!({"ID": id, "StatusV2": JOINED}))
            .collect();
        json!({"SessionID": session, "Members": members})
    }

    #[test]
    fn join_then_change_then_end() {
        let mut store = MembershipStore::new();

        let outcome = route(&event("OnSessionJoined", joined("S1", &["U1"])), &mut store);
        assert_eq!(
            outcome,
            RouteOutcome::MembersReplaced {
                session_id: "S1".into(),
                count: 1
            }
        );
        assert_eq!(store.list_for("S1", None), vec![Member::new("U1", JOINED)]);

        route(
            &event("OnSessionMembersChanged", joined("S1", &["U1", "U2"])),
            &mut store,
        );
        assert_eq!(
            store.list_for("S1", None),
            vec![Member::new("U1", JOINED), Member::new("U2", JOINED)]
        );

        let outcome = route(&event("OnSessionEnded", json!({"SessionID": "S1"})), &mut store);
        assert!(outcome.mutated_store());
        assert!(!store.contains("S1"));
        assert!(store.list_for("S1", None).is_empty());
    }

    #[test]
    fn null_members_clear_the_snapshot() {
        let mut store = MembershipStore::new();
        route(&event("OnSessionJoined", joined("S1", &["U1", "U2"])), &mut store);
        let outcome = route(
            &event(
                "OnSessionMembersChanged",
                json!({"SessionID": "S1", "Members": null}),
            ),
            &mut store,
        );
        assert_eq!(
            outcome,
            RouteOutcome::MembersReplaced {
                session_id: "S1".into(),
                count: 0
            }
        );
        assert!(store.contains("S1"));
        assert!(store.list_for("S1", None).is_empty());
    }

    #[test]
    fn members_changed_replaces_rather_than_merges() {
        let mut store = MembershipStore::new();
        route(&event("OnSessionJoined", joined("S1", &["U1", "U2"])), &mut store);
        route(
            &event(
                "OnSessionMembersChanged",
                json!({"SessionID": "S1", "Members": [{"ID": "U2", "StatusV2": "LEFT"}]}),
            ),
            &mut store,
        );
        assert_eq!(store.list_for("S1", None), vec![Member::new("U2", "LEFT")]);
    }

    #[test]
    fn members_changed_without_prior_join_creates_entry() {
        let mut store = MembershipStore::new();
        route(
            &event("OnSessionMembersChanged", joined("S7", &["U1"])),
            &mut store,
        );
        assert!(store.contains("S7"));
    }

    #[test]
    fn redelivery_is_idempotent() {
        let mut once = MembershipStore::new();
        let mut twice = MembershipStore::new();
        let ev = event("OnSessionMembersChanged", joined("S1", &["U1", "U2"]));

        route(&ev, &mut once);
        route(&ev, &mut twice);
        route(&ev, &mut twice);

        assert_eq!(once.list_all(), twice.list_all());
    }

    #[test]
    fn ending_an_untracked_session_is_harmless() {
        let mut store = MembershipStore::new();
        let outcome = route(&event("OnSessionEnded", json!({"SessionID": "ghost"})), &mut store);
        assert_eq!(
            outcome,
            RouteOutcome::SessionRemoved {
                session_id: "ghost".into(),
                existed: false
            }
        );
        assert!(!outcome.mutated_store());
    }

    #[test]
    fn informational_and_party_topics_leave_store_alone() {
        let mut store = MembershipStore::new();
        route(&event("OnSessionJoined", joined("S1", &["U1"])), &mut store);
        let before = store.list_all();

        let informational = [
            event("OnSessionInvited", json!({"SessionID": "S1", "SenderID": "U9"})),
            event("OnSessionRejected", json!({"SessionID": "S1", "RejectedID": "U9"})),
            event("OnSessionKicked", json!({"SessionID": "S1"})),
            event("OnGameSessionInviteTimeout", json!({"SessionID": "S1"})),
            event("OnGameSessionInviteCancelled", json!({"SessionID": "S1"})),
            event("OnSessionStorageChanged", json!({"SessionID": "S1"})),
            event("OnSessionNativePlatformSynced", json!({"SessionID": "S1"})),
            event("OnSessionJoinedSecret", json!({"SessionID": "S1", "Secret": "x"})),
            event("OnGameSessionUpdated", json!({"ID": "S1", "Members": []})),
            event("OnDSStatusChanged", json!({"SessionID": "S1"})),
            event("OnPartyCreated", json!({"PartyID": "P1"})),
            event("OnPartyMembersChanged", json!({"PartyID": "P1", "Members": []})),
            event("OnPartyJoined", json!({"PartyID": "P1"})),
        ];
        for ev in &informational {
            assert_eq!(route(ev, &mut store), RouteOutcome::Projected, "{ev:?}");
        }

        assert_eq!(store.list_all(), before);
    }

    #[test]
    fn unknown_topic_is_ignored() {
        let mut store = MembershipStore::new();
        let outcome = route(&event("OnSomethingFuture", json!({"SessionID": "S1"})), &mut store);
        assert_eq!(outcome, RouteOutcome::Ignored);
        assert!(store.is_empty());
    }
}
