//! Session membership store.
//!
//! [`MembershipStore`] maps each tracked session to its latest membership
//! snapshot. Snapshots are full replacements: a new member list overwrites
//! the old one, so re-applying the same notification leaves the store
//! unchanged. Only the event router mutates the store; everything outside the
//! crate reads it through a [`SessionDirectory`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::protocol::{Member, SessionId};

/// One tracked session and its current members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    /// Members in the order the lobby service reported them.
    pub members: Vec<Member>,
}

/// Session ID → latest membership snapshot.
#[derive(Debug, Default)]
pub struct MembershipStore {
    sessions: HashMap<SessionId, Vec<Member>>,
}

impl MembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the member list of `session_id`, creating the entry if needed.
    pub(crate) fn upsert(&mut self, session_id: impl Into<SessionId>, members: Vec<Member>) {
        self.sessions.insert(session_id.into(), members);
    }

    /// Forget `session_id`. Returns whether it was tracked.
    pub(crate) fn remove(&mut self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    /// Every tracked session. Order is unspecified.
    pub fn list_all(&self) -> Vec<SessionSnapshot> {
        self.sessions
            .iter()
            .map(|(session_id, members)| SessionSnapshot {
                session_id: session_id.clone(),
                members: members.clone(),
            })
            .collect()
    }

    /// Members of `session_id`, optionally only those whose status equals
    /// `status`. Empty when the session is not tracked.
    pub fn list_for(&self, session_id: &str, status: Option<&str>) -> Vec<Member> {
        self.sessions
            .get(session_id)
            .map(|members| filter_by_status(members, status))
            .unwrap_or_default()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

fn filter_by_status(members: &[Member], status: Option<&str>) -> Vec<Member> {
    members
        .iter()
        .filter(|m| status.is_none_or(|s| m.status == s))
        .cloned()
        .collect()
}

/// Shared, read-only handle to a client's [`MembershipStore`].
///
/// Cheap to clone. Reads take the store's read lock, so a query never
/// observes a half-applied notification.
#[derive(Debug, Clone, Default)]
pub struct SessionDirectory {
    inner: Arc<RwLock<MembershipStore>>,
}

impl SessionDirectory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Write access for the dispatch loop.
    pub(crate) fn store(&self) -> &RwLock<MembershipStore> {
        &self.inner
    }

    /// Every tracked session with its members. Order is unspecified.
    pub async fn list_all_sessions(&self) -> Vec<SessionSnapshot> {
        self.inner.read().await.list_all()
    }

    /// Members of one session, or of every tracked session when `session_id`
    /// is `None`, optionally filtered by exact `status`.
    ///
    /// Returns an empty list for an untracked session.
    pub async fn list_session_members(
        &self,
        session_id: Option<&str>,
        status: Option<&str>,
    ) -> Vec<Member> {
        let store = self.inner.read().await;
        match session_id {
            Some(id) => store.list_for(id, status),
            None => store
                .sessions
                .values()
                .flat_map(|members| filter_by_status(members, status))
                .collect(),
        }
    }

    /// Number of tracked sessions.
    pub async fn session_count(&self) -> usize {
        self.inner.read().await.len()
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
    use crate::protocol::status::{INVITED, JOINED};

    fn members(list: &[(&str, &str)]) -> Vec<Member> {
        list.iter().map(|(id, s)| Member::new(*id, *s)).collect()
    }

    #[test]
    fn upsert_creates_then_replaces() {
        let mut store = MembershipStore::new();
        store.upsert("S1", members(&[("U1", JOINED), ("U2", INVITED)]));
        store.upsert("S1", members(&[("U3", JOINED)]));

        assert_eq!(store.len(), 1);
        assert_eq!(store.list_for("S1", None), members(&[("U3", JOINED)]));
    }

    #[test]
    fn upsert_keeps_service_order() {
        let mut store = MembershipStore::new();
        store.upsert("S1", members(&[("Z", JOINED), ("A", JOINED), ("M", JOINED)]));
        let ids: Vec<_> = store
            .list_for("S1", None)
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, ["Z", "A", "M"]);
    }

    #[test]
    fn remove_absent_session_is_a_no_op() {
        let mut store = MembershipStore::new();
        assert!(!store.remove("missing"));
        store.upsert("S1", vec![]);
        assert!(store.remove("S1"));
        assert!(store.is_empty());
    }

    #[test]
    fn untracked_session_has_no_members() {
        let store = MembershipStore::new();
        assert!(store.list_for("nope", None).is_empty());
        assert!(store.list_for("nope", Some(JOINED)).is_empty());
        assert!(store.list_all().is_empty());
    }

    #[test]
    fn status_filter_is_exact() {
        let mut store = MembershipStore::new();
        store.upsert("S1", members(&[("U1", JOINED), ("U2", INVITED), ("U3", JOINED)]));
        assert_eq!(
            store.list_for("S1", Some(JOINED)),
            members(&[("U1", JOINED), ("U3", JOINED)])
        );
        assert!(store.list_for("S1", Some("joined")).is_empty());
    }

    #[test]
    fn list_all_returns_every_session() {
        let mut store = MembershipStore::new();
        store.upsert("S1", members(&[("U1", JOINED)]));
        store.upsert("S2", members(&[("U2", JOINED)]));
        let mut ids: Vec<_> = store.list_all().into_iter().map(|s| s.session_id).collect();
        ids.sort();
        assert_eq!(ids, ["S1", "S2"]);
    }

    #[tokio::test]
    async fn directory_reads_through_the_lock() {
        let directory = SessionDirectory::new();
        assert!(directory.list_all_sessions().await.is_empty());
        assert!(directory.list_session_members(None, None).await.is_empty());

        {
            let mut store = directory.store().write().await;
            store.upsert("S1", members(&[("U1", JOINED), ("U2", INVITED)]));
            store.upsert("S2", members(&[("U3", JOINED)]));
        }

        assert_eq!(directory.session_count().await, 2);
        assert_eq!(
            directory.list_session_members(Some("S1"), None).await,
            members(&[("U1", JOINED), ("U2", INVITED)])
        );

        let mut joined: Vec<_> = directory
            .list_session_members(None, Some(JOINED))
            .await
            .into_iter()
            .map(|m| m.id)
            .collect();
        joined.sort();
        assert_eq!(joined, ["U1", "U3"]);
    }

    #[tokio::test]
    async fn clones_share_the_same_store() {
        let directory = SessionDirectory::new();
        let view = directory.clone();
        directory
            .store()
            .write()
            .await
            .upsert("S1", members(&[("U1", JOINED)]));
        assert_eq!(view.session_count().await, 1);
    }
}
