//! Typed payloads for lobby session and party notifications.
//!
//! Field names follow the lobby service's PascalCase JSON. Every struct
//! ignores fields it does not know about; only the fields the client acts on
//! (or prints) are modeled.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DecodeError;

/// Opaque session identifier assigned by the lobby service.
pub type SessionId = String;

/// Opaque party identifier assigned by the lobby service.
pub type PartyId = String;

/// Membership statuses reported in `StatusV2`.
///
/// The lobby reports other values too (`CONNECTED`, `LEFT`, `KICKED`, ...);
/// statuses are kept as strings and compared verbatim.
pub mod status {
    pub const INVITED: &str = "INVITED";
    pub const JOINED: &str = "JOINED";
}

// ── Members ─────────────────────────────────────────────────────────

/// One participant's membership status inside a session or party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireMember")]
pub struct Member {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "StatusV2")]
    pub status: String,
}

impl Member {
    pub fn new(id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: status.into(),
        }
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.id, self.status)
    }
}

/// Member as sent on the wire. Older payloads only carry `Status`.
#[derive(Deserialize)]
struct WireMember {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "StatusV2", default)]
    status_v2: Option<String>,
    #[serde(rename = "Status", default)]
    status: Option<String>,
}

impl From<WireMember> for Member {
    fn from(wire: WireMember) -> Self {
        let status = wire
            .status_v2
            .filter(|s| !s.is_empty())
            .or(wire.status)
            .unwrap_or_default();
        Self {
            id: wire.id,
            status,
        }
    }
}

/// `Members` may be absent or `null`; both mean no members.
fn members_or_empty<'de, D>(deserializer: D) -> Result<Vec<Member>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Member>>::deserialize(deserializer)?.unwrap_or_default())
}

// ── Session payloads ────────────────────────────────────────────────

/// Payload shared by `OnSessionJoined` and `OnSessionMembersChanged`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionMembersPayload {
    #[serde(rename = "SessionID")]
    pub session_id: SessionId,
    #[serde(default, deserialize_with = "members_or_empty")]
    pub members: Vec<Member>,
    #[serde(rename = "JoinerID", default, skip_serializing_if = "Option::is_none")]
    pub joiner_id: Option<String>,
    #[serde(rename = "LeaverID", default, skip_serializing_if = "Option::is_none")]
    pub leaver_id: Option<String>,
}

/// Payload of `OnSessionEnded`, `OnSessionKicked` and `OnGameSessionInviteTimeout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRef {
    #[serde(rename = "SessionID")]
    pub session_id: SessionId,
}

/// Payload of `OnSessionInvited`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInvitedPayload {
    #[serde(rename = "SessionID")]
    pub session_id: SessionId,
    #[serde(rename = "SenderID", default)]
    pub sender_id: Option<String>,
    /// Unix timestamp after which the invitation can no longer be accepted.
    #[serde(rename = "ExpiredAt", default)]
    pub expired_at: Option<i64>,
}

/// Payload of `OnSessionRejected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRejectedPayload {
    #[serde(rename = "SessionID")]
    pub session_id: SessionId,
    #[serde(rename = "RejectedID", default)]
    pub rejected_id: Option<String>,
    #[serde(rename = "Members", default, deserialize_with = "members_or_empty")]
    pub members: Vec<Member>,
}

/// Payload of `OnGameSessionInviteCancelled`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteCancelledPayload {
    #[serde(rename = "SessionID")]
    pub session_id: SessionId,
    #[serde(rename = "SenderID", default)]
    pub sender_id: Option<String>,
    #[serde(rename = "Reason", default)]
    pub reason: Option<String>,
}

/// Payload of `OnSessionStorageChanged`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageChangedPayload {
    #[serde(rename = "SessionID")]
    pub session_id: SessionId,
    #[serde(rename = "ActorUserID", default)]
    pub actor_user_id: Option<String>,
    #[serde(rename = "IsLeader", default)]
    pub is_leader: Option<bool>,
}

/// Payload of `OnSessionNativePlatformSynced`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSyncedPayload {
    #[serde(rename = "SessionID")]
    pub session_id: SessionId,
    #[serde(rename = "PlatformName", default)]
    pub platform_name: Option<String>,
}

/// Payload of `OnSessionJoinedSecret`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedSecretPayload {
    #[serde(rename = "SessionID")]
    pub session_id: SessionId,
    #[serde(rename = "Secret", default)]
    pub secret: Option<String>,
}

/// Session configuration summary carried by `OnGameSessionUpdated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfiguration {
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Joinability", default)]
    pub joinability: Option<String>,
}

/// Payload of `OnGameSessionUpdated`: the full game session document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSessionUpdatedPayload {
    #[serde(rename = "ID")]
    pub session_id: SessionId,
    #[serde(rename = "Version", default)]
    pub version: Option<i64>,
    #[serde(rename = "Configuration", default)]
    pub configuration: Option<SessionConfiguration>,
    #[serde(rename = "Members", default, deserialize_with = "members_or_empty")]
    pub members: Vec<Member>,
}

/// Dedicated server state carried by `OnDSStatusChanged`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameServerInfo {
    #[serde(rename = "Status", alias = "status", default)]
    pub status: Option<String>,
}

/// Payload of `OnDSStatusChanged`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DsStatusChangedPayload {
    #[serde(rename = "SessionID")]
    pub session_id: SessionId,
    #[serde(rename = "GameServer", default)]
    pub game_server: Option<GameServerInfo>,
    #[serde(rename = "Error", default)]
    pub error: Option<String>,
}

// ── Party payloads ──────────────────────────────────────────────────

/// Payload of `OnPartyCreated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyCreatedPayload {
    #[serde(rename = "PartyID")]
    pub party_id: PartyId,
    #[serde(rename = "CreatedBy", default)]
    pub created_by: Option<String>,
    #[serde(rename = "Code", default)]
    pub code: Option<String>,
}

/// Payload shared by `OnPartyMembersChanged` and `OnPartyJoined`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyMembersPayload {
    #[serde(rename = "PartyID")]
    pub party_id: PartyId,
    #[serde(rename = "Members", default, deserialize_with = "members_or_empty")]
    pub members: Vec<Member>,
    #[serde(rename = "JoinerID", default)]
    pub joiner_id: Option<String>,
    #[serde(rename = "LeaderID", default)]
    pub leader_id: Option<String>,
}

// ── Topics ──────────────────────────────────────────────────────────

/// Topics the client understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    SessionJoined,
    SessionMembersChanged,
    SessionEnded,
    SessionInvited,
    SessionRejected,
    SessionKicked,
    InviteTimeout,
    InviteCancelled,
    StorageChanged,
    NativePlatformSynced,
    JoinedSecret,
    GameSessionUpdated,
    DsStatusChanged,
    PartyCreated,
    PartyMembersChanged,
    PartyJoined,
}

impl Topic {
    /// Every known topic.
    pub const ALL: [Topic; 16] = [
        Topic::SessionJoined,
        Topic::SessionMembersChanged,
        Topic::SessionEnded,
        Topic::SessionInvited,
        Topic::SessionRejected,
        Topic::SessionKicked,
        Topic::InviteTimeout,
        Topic::InviteCancelled,
        Topic::StorageChanged,
        Topic::NativePlatformSynced,
        Topic::JoinedSecret,
        Topic::GameSessionUpdated,
        Topic::DsStatusChanged,
        Topic::PartyCreated,
        Topic::PartyMembersChanged,
        Topic::PartyJoined,
    ];

    /// Wire name of the topic.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SessionJoined => "OnSessionJoined",
            Self::SessionMembersChanged => "OnSessionMembersChanged",
            Self::SessionEnded => "OnSessionEnded",
            Self::SessionInvited => "OnSessionInvited",
            Self::SessionRejected => "OnSessionRejected",
            Self::SessionKicked => "OnSessionKicked",
            Self::InviteTimeout => "OnGameSessionInviteTimeout",
            Self::InviteCancelled => "OnGameSessionInviteCancelled",
            Self::StorageChanged => "OnSessionStorageChanged",
            Self::NativePlatformSynced => "OnSessionNativePlatformSynced",
            Self::JoinedSecret => "OnSessionJoinedSecret",
            Self::GameSessionUpdated => "OnGameSessionUpdated",
            Self::DsStatusChanged => "OnDSStatusChanged",
            Self::PartyCreated => "OnPartyCreated",
            Self::PartyMembersChanged => "OnPartyMembersChanged",
            Self::PartyJoined => "OnPartyJoined",
        }
    }

    /// Look up a topic by wire name. Returns `None` for unknown topics.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Events ──────────────────────────────────────────────────────────

/// A decoded session or party notification.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SessionJoined(SessionMembersPayload),
    SessionMembersChanged(SessionMembersPayload),
    SessionEnded(SessionRef),
    SessionInvited(SessionInvitedPayload),
    SessionRejected(SessionRejectedPayload),
    SessionKicked(SessionRef),
    InviteTimeout(SessionRef),
    InviteCancelled(InviteCancelledPayload),
    StorageChanged(StorageChangedPayload),
    NativePlatformSynced(PlatformSyncedPayload),
    JoinedSecret(JoinedSecretPayload),
    /// Boxed to reduce enum size.
    GameSessionUpdated(Box<GameSessionUpdatedPayload>),
    DsStatusChanged(DsStatusChangedPayload),
    PartyCreated(PartyCreatedPayload),
    PartyMembersChanged(PartyMembersPayload),
    PartyJoined(PartyMembersPayload),
    /// A topic this client does not know. Kept so it can be logged.
    Unrecognized {
        topic: String,
        raw: serde_json::Value,
    },
}

impl SessionEvent {
    /// Build a typed event from a topic name and its decoded payload.
    ///
    /// Unknown topics never fail; they become [`SessionEvent::Unrecognized`].
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Schema`] when a known topic's payload lacks a
    /// required field or has a field of the wrong type.
    pub fn from_topic(topic: &str, value: serde_json::Value) -> Result<Self, DecodeError> {
        let Some(known) = Topic::from_name(topic) else {
            return Ok(Self::Unrecognized {
                topic: topic.to_string(),
                raw: value,
            });
        };

        let event = match known {
            Topic::SessionJoined => Self::SessionJoined(parse(known, &value)?),
            Topic::SessionMembersChanged => Self::SessionMembersChanged(parse(known, &value)?),
            Topic::SessionEnded => Self::SessionEnded(parse(known, &value)?),
            Topic::SessionInvited => Self::SessionInvited(parse(known, &value)?),
            Topic::SessionRejected => Self::SessionRejected(parse(known, &value)?),
            Topic::SessionKicked => Self::SessionKicked(parse(known, &value)?),
            Topic::InviteTimeout => Self::InviteTimeout(parse(known, &value)?),
            Topic::InviteCancelled => Self::InviteCancelled(parse(known, &value)?),
            Topic::StorageChanged => Self::StorageChanged(parse(known, &value)?),
            Topic::NativePlatformSynced => Self::NativePlatformSynced(parse(known, &value)?),
            Topic::JoinedSecret => Self::JoinedSecret(parse(known, &value)?),
            Topic::GameSessionUpdated => {
                Self::GameSessionUpdated(Box::new(parse(known, &value)?))
            }
            Topic::DsStatusChanged => Self::DsStatusChanged(parse(known, &value)?),
            Topic::PartyCreated => Self::PartyCreated(parse(known, &value)?),
            Topic::PartyMembersChanged => Self::PartyMembersChanged(parse(known, &value)?),
            Topic::PartyJoined => Self::PartyJoined(parse(known, &value)?),
        };
        Ok(event)
    }

    /// Wire name of this event's topic.
    pub fn topic(&self) -> &str {
        match self {
            Self::Unrecognized { topic, .. } => topic,
            other => other.known_topic().map_or("", Topic::as_str),
        }
    }

    /// The known topic of this event, `None` for unrecognized ones.
    pub fn known_topic(&self) -> Option<Topic> {
        let topic = match self {
            Self::SessionJoined(_) => Topic::SessionJoined,
            Self::SessionMembersChanged(_) => Topic::SessionMembersChanged,
            Self::SessionEnded(_) => Topic::SessionEnded,
            Self::SessionInvited(_) => Topic::SessionInvited,
            Self::SessionRejected(_) => Topic::SessionRejected,
            Self::SessionKicked(_) => Topic::SessionKicked,
            Self::InviteTimeout(_) => Topic::InviteTimeout,
            Self::InviteCancelled(_) => Topic::InviteCancelled,
            Self::StorageChanged(_) => Topic::StorageChanged,
            Self::NativePlatformSynced(_) => Topic::NativePlatformSynced,
            Self::JoinedSecret(_) => Topic::JoinedSecret,
            Self::GameSessionUpdated(_) => Topic::GameSessionUpdated,
            Self::DsStatusChanged(_) => Topic::DsStatusChanged,
            Self::PartyCreated(_) => Topic::PartyCreated,
            Self::PartyMembersChanged(_) => Topic::PartyMembersChanged,
            Self::PartyJoined(_) => Topic::PartyJoined,
            Self::Unrecognized { .. } => return None,
        };
        Some(topic)
    }
}

fn parse<T: DeserializeOwned>(topic: Topic, value: &serde_json::Value) -> Result<T, DecodeError> {
    T::deserialize(value).map_err(|source| DecodeError::Schema {
        topic: topic.as_str().to_string(),
        source,
        raw: value.to_string(),
    })
}

// ── Projection ──────────────────────────────────────────────────────

struct MemberList<'a>(&'a [Member]);

impl fmt::Display for MemberList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, member) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{member}")?;
        }
        f.write_str("]")
    }
}

fn or_unknown(value: Option<&str>) -> &str {
    value.unwrap_or("?")
}

/// One-line projection of the notification, for logs and display.
impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionJoined(p) => write!(
                f,
                "joined session {} members={}",
                p.session_id,
                MemberList(&p.members)
            ),
            Self::SessionMembersChanged(p) => write!(
                f,
                "session {} members changed members={}",
                p.session_id,
                MemberList(&p.members)
            ),
            Self::SessionEnded(p) => write!(f, "session {} ended", p.session_id),
            Self::SessionInvited(p) => {
                write!(
                    f,
                    "invited to session {} by {}",
                    p.session_id,
                    or_unknown(p.sender_id.as_deref())
                )?;
                if let Some(expired_at) = p.expired_at {
                    write!(f, " (expires at {expired_at})")?;
                }
                Ok(())
            }
            Self::SessionRejected(p) => write!(
                f,
                "{} rejected session {}",
                or_unknown(p.rejected_id.as_deref()),
                p.session_id
            ),
            Self::SessionKicked(p) => write!(f, "kicked from session {}", p.session_id),
            Self::InviteTimeout(p) => write!(f, "invite to session {} timed out", p.session_id),
            Self::InviteCancelled(p) => {
                write!(f, "invite to session {} cancelled", p.session_id)?;
                if let Some(reason) = &p.reason {
                    write!(f, ": {reason}")?;
                }
                Ok(())
            }
            Self::StorageChanged(p) => write!(
                f,
                "session {} storage changed by {}",
                p.session_id,
                or_unknown(p.actor_user_id.as_deref())
            ),
            Self::NativePlatformSynced(p) => write!(
                f,
                "session {} synced to {}",
                p.session_id,
                or_unknown(p.platform_name.as_deref())
            ),
            Self::JoinedSecret(p) => write!(
                f,
                "received join secret for session {} ({})",
                p.session_id,
                if p.secret.is_some() { "present" } else { "empty" }
            ),
            Self::GameSessionUpdated(p) => {
                let config = p.configuration.as_ref();
                write!(
                    f,
                    "session {} updated version={} config={} joinability={} members={}",
                    p.session_id,
                    p.version.map_or_else(|| "?".to_string(), |v| v.to_string()),
                    or_unknown(config.and_then(|c| c.name.as_deref())),
                    or_unknown(config.and_then(|c| c.joinability.as_deref())),
                    MemberList(&p.members)
                )
            }
            Self::DsStatusChanged(p) => {
                write!(
                    f,
                    "session {} DS status {}",
                    p.session_id,
                    or_unknown(p.game_server.as_ref().and_then(|g| g.status.as_deref()))
                )?;
                if let Some(error) = p.error.as_deref().filter(|e| !e.is_empty()) {
                    write!(f, " error={error}")?;
                }
                Ok(())
            }
            Self::PartyCreated(p) => write!(
                f,
                "party {} created by {} code={}",
                p.party_id,
                or_unknown(p.created_by.as_deref()),
                or_unknown(p.code.as_deref())
            ),
            Self::PartyMembersChanged(p) => write!(
                f,
                "party {} members changed leader={} members={}",
                p.party_id,
                or_unknown(p.leader_id.as_deref()),
                MemberList(&p.members)
            ),
            Self::PartyJoined(p) => write!(
                f,
                "joined party {} members={}",
                p.party_id,
                MemberList(&p.members)
            ),
            Self::Unrecognized { topic, raw } => write!(f, "unrecognized topic {topic}: {raw}"),
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
    use serde_json::json;

    #[test]
    fn every_topic_name_resolves_back() {
        for topic in Topic::ALL {
            assert_eq!(Topic::from_name(topic.as_str()), Some(topic));
        }
        assert_eq!(Topic::from_name("OnSomethingFuture"), None);
    }

    #[test]
    fn session_joined_decodes_members_in_order() {
        let event = SessionEvent::from_topic(
            "OnSessionJoined",
            json!({
                "SessionID": "S1",
                "Members": [
                    {"ID": "U2", "StatusV2": "JOINED", "PlatformID": "steam"},
                    {"ID": "U1", "StatusV2": "INVITED"}
                ],
                "JoinerID": "U2",
                "Namespace": "game"
            }),
        )
        .unwrap();
        let SessionEvent::SessionJoined(payload) = event else {
            panic!("expected SessionJoined, got {event:?}");
        };
        assert_eq!(payload.session_id, "S1");
        assert_eq!(
            payload.members,
            vec![Member::new("U2", "JOINED"), Member::new("U1", "INVITED")]
        );
        assert_eq!(payload.joiner_id.as_deref(), Some("U2"));
    }

    #[test]
    fn member_status_falls_back_to_legacy_field() {
        let member: Member = serde_json::from_value(json!({"ID": "U1", "Status": "JOINED"})).unwrap();
        assert_eq!(member, Member::new("U1", "JOINED"));

        let member: Member =
            serde_json::from_value(json!({"ID": "U1", "Status": "JOINED", "StatusV2": "CONNECTED"}))
                .unwrap();
        assert_eq!(member.status, "CONNECTED");

        let member: Member = serde_json::from_value(json!({"ID": "U1"})).unwrap();
        assert_eq!(member.status, "");
    }

    #[test]
    fn members_default_to_empty() {
        let event =
            SessionEvent::from_topic("OnSessionMembersChanged", json!({"SessionID": "S1"})).unwrap();
        assert!(matches!(
            event,
            SessionEvent::SessionMembersChanged(SessionMembersPayload { ref members, .. }) if members.is_empty()
        ));
    }

    #[test]
    fn null_members_decode_as_empty() {
        let event = SessionEvent::from_topic(
            "OnSessionMembersChanged",
            json!({"SessionID": "S1", "Members": null}),
        )
        .unwrap();
        let SessionEvent::SessionMembersChanged(payload) = event else {
            panic!("expected SessionMembersChanged, got {event:?}");
        };
        assert!(payload.members.is_empty());

        for (topic, value) in [
            ("OnSessionRejected", json!({"SessionID": "S1", "Members": null})),
            ("OnGameSessionUpdated", json!({"ID": "S1", "Members": null})),
            ("OnPartyJoined", json!({"PartyID": "P1", "Members": null})),
        ] {
            assert!(SessionEvent::from_topic(topic, value).is_ok(), "{topic}");
        }
    }

    #[test]
    fn missing_session_id_is_a_schema_error() {
        let err = SessionEvent::from_topic("OnSessionEnded", json!({"Foo": 1})).unwrap_err();
        let DecodeError::Schema { topic, raw, .. } = &err else {
            panic!("expected Schema error, got {err:?}");
        };
        assert_eq!(topic, "OnSessionEnded");
        assert_eq!(raw, r#"{"Foo":1}"#);
    }

    #[test]
    fn unknown_topic_is_kept_raw() {
        let event = SessionEvent::from_topic("OnSomethingFuture", json!({"X": 1})).unwrap();
        assert_eq!(event.topic(), "OnSomethingFuture");
        assert_eq!(event.known_topic(), None);
        assert_eq!(
            event.to_string(),
            r#"unrecognized topic OnSomethingFuture: {"X":1}"#
        );
    }

    #[test]
    fn known_topic_round_trips_through_event() {
        let event =
            SessionEvent::from_topic("OnDSStatusChanged", json!({"SessionID": "S9", "GameServer": {"status": "READY"}}))
                .unwrap();
        assert_eq!(event.known_topic(), Some(Topic::DsStatusChanged));
        assert_eq!(event.topic(), "OnDSStatusChanged");
        assert_eq!(event.to_string(), "session S9 DS status READY");
    }

    #[test]
    fn invitation_projection() {
        let event = SessionEvent::from_topic(
            "OnSessionInvited",
            json!({"SessionID": "S1", "SenderID": "U9", "ExpiredAt": 1700000000}),
        )
        .unwrap();
        assert_eq!(
            event.to_string(),
            "invited to session S1 by U9 (expires at 1700000000)"
        );
    }

    #[test]
    fn party_projection() {
        let event = SessionEvent::from_topic(
            "OnPartyMembersChanged",
            json!({
                "PartyID": "P1",
                "LeaderID": "U1",
                "Members": [{"ID": "U1", "StatusV2": "JOINED"}, {"ID": "U2", "StatusV2": "JOINED"}]
            }),
        )
        .unwrap();
        assert_eq!(
            event.to_string(),
            "party P1 members changed leader=U1 members=[U1(JOINED), U2(JOINED)]"
        );
    }

    #[test]
    fn game_session_updated_projection() {
        let event = SessionEvent::from_topic(
            "OnGameSessionUpdated",
            json!({
                "ID": "S1",
                "Version": 3,
                "Configuration": {"Name": "duel", "Joinability": "OPEN"},
                "Members": []
            }),
        )
        .unwrap();
        assert_eq!(
            event.to_string(),
            "session S1 updated version=3 config=duel joinability=OPEN members=[]"
        );
    }
}
