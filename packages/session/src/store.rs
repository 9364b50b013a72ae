//! In-memory session registry shared across server workers.

use std::{collections::BTreeMap, sync::Arc};

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::Session;

/// A session handle. Holding the lock serializes that visitor's requests.
pub type SharedSession = Arc<Mutex<Session>>;

/// Maps session ids to live sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<BTreeMap<Uuid, SharedSession>>,
}

impl SessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session for `id`, creating a new one when `id` is absent
    /// or unknown.
    ///
    /// The returned id is the one the caller should use from now on; it
    /// differs from `id` whenever a session was created.
    pub async fn get_or_create(&self, id: Option<Uuid>) -> (Uuid, SharedSession) {
        let mut sessions = self.sessions.lock().await;

        if let Some(id) = id
            && let Some(session) = sessions.get(&id)
        {
            return (id, Arc::clone(session));
        }

        let session = Session::new();
        let new_id = session.id();
        log::debug!("Created session {new_id}");
        let shared = Arc::new(Mutex::new(session));
        sessions.insert(new_id, Arc::clone(&shared));
        (new_id, shared)
    }

    /// Returns the session for `id` without creating one.
    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions.lock().await.get(&id).cloned()
    }

    /// Returns the registered session for `id`, or a transient one that is
    /// never stored when `id` is absent or unknown.
    ///
    /// Read-only requests use this so that visitors without a session do
    /// not grow the store. The id is `Some` only for a registered session.
    pub async fn get_or_transient(&self, id: Option<Uuid>) -> (Option<Uuid>, SharedSession) {
        if let Some(id) = id
            && let Some(session) = self.get(id).await
        {
            return (Some(id), session);
        }

        (None, Arc::new(Mutex::new(Session::new())))
    }

    /// Drops the session for `id`. Returns whether it existed.
    pub async fn end(&self, id: Uuid) -> bool {
        let removed = self.sessions.lock().await.remove(&id).is_some();
        if removed {
            log::debug!("Ended session {id}");
        }
        removed
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Whether no session is live.
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_session_when_id_missing() {
        let store = SessionStore::new();
        let (id, session) = store.get_or_create(None).await;

        assert_eq!(session.lock().await.id(), id);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn known_id_returns_same_session() {
        let store = SessionStore::new();
        let (id, first) = store.get_or_create(None).await;
        let (again, second) = store.get_or_create(Some(id)).await;

        assert_eq!(id, again);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_id_gets_fresh_session() {
        let store = SessionStore::new();
        let stale = Uuid::new_v4();
        let (id, _) = store.get_or_create(Some(stale)).await;

        assert_ne!(id, stale);
        assert!(store.get(stale).await.is_none());
    }

    #[tokio::test]
    async fn transient_session_is_not_registered() {
        let store = SessionStore::new();

        for id in [None, Some(Uuid::new_v4())] {
            let (registered, session) = store.get_or_transient(id).await;
            assert_eq!(registered, None);
            assert!(session.lock().await.custom_places().is_empty());
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn known_id_is_not_transient() {
        let store = SessionStore::new();
        let (id, created) = store.get_or_create(None).await;
        let (registered, found) = store.get_or_transient(Some(id)).await;

        assert_eq!(registered, Some(id));
        assert!(Arc::ptr_eq(&created, &found));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn end_removes_session() {
        let store = SessionStore::new();
        let (id, _) = store.get_or_create(None).await;

        assert!(store.end(id).await);
        assert!(!store.end(id).await);
        assert!(store.is_empty().await);
    }
}
