//! In-memory session store.
//!
//! Sessions expire after an idle period. Expired sessions are dropped when
//! they are next touched, by [`InMemorySessionStore::evict_expired`], or when
//! the store reaches capacity. At capacity with nothing expired, the least
//! recently seen tenth is evicted.

use crate::error::Result;
use crate::providers::SessionStore;
use crate::state::SessionId;
use dashmap::DashMap;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default idle lifetime of a session.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default maximum number of live sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 100_000;

#[derive(Debug)]
struct SessionEntry {
    values: HashMap<String, String>,
    last_seen: Instant,
}

#[derive(Debug)]
struct Sessions {
    entries: DashMap<SessionId, SessionEntry>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl Sessions {
    fn is_live(&self, entry: &SessionEntry) -> bool {
        entry.last_seen.elapsed() < self.idle_ttl
    }

    fn drop_if_expired(&self, session_id: SessionId) {
        self.entries
            .remove_if(&session_id, |_, entry| !self.is_live(entry));
    }

    fn get(&self, session_id: SessionId, key: &str) -> Option<String> {
        if let Some(mut entry) = self.entries.get_mut(&session_id) {
            if self.is_live(&entry) {
                entry.last_seen = Instant::now();
                return entry.values.get(key).cloned();
            }
        }
        self.drop_if_expired(session_id);
        None
    }

    fn set(&self, session_id: SessionId, key: String, value: String) {
        self.drop_if_expired(session_id);

        if !self.entries.contains_key(&session_id) && self.entries.len() >= self.max_sessions {
            self.make_room();
        }

        let mut entry = self.entries.entry(session_id).or_insert_with(|| SessionEntry {
            values: HashMap::new(),
            last_seen: Instant::now(),
        });
        entry.last_seen = Instant::now();
        entry.values.insert(key, value);
    }

    fn remove(&self, session_id: SessionId, key: &str) -> Option<String> {
        self.drop_if_expired(session_id);

        let removed = self
            .entries
            .get_mut(&session_id)
            .and_then(|mut entry| entry.values.remove(key));

        self.entries
            .remove_if(&session_id, |_, entry| entry.values.is_empty());
        removed
    }

    fn evict_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| self.is_live(entry));
        before.saturating_sub(self.entries.len())
    }

    fn make_room(&self) {
        if self.evict_expired() > 0 {
            return;
        }

        let mut by_age: Vec<(SessionId, Instant)> = self
            .entries
            .iter()
            .map(|entry| (*entry.key(), entry.last_seen))
            .collect();
        by_age.sort_by_key(|(_, last_seen)| *last_seen);

        let count = (self.max_sessions / 10).max(1);
        for (session_id, _) in by_age.into_iter().take(count) {
            self.entries.remove(&session_id);
        }
    }
}

/// Session store backed by a process-local concurrent map.
#[derive(Debug, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<Sessions>,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_IDLE_TTL, DEFAULT_MAX_SESSIONS)
    }
}

impl InMemorySessionStore {
    /// Create a store with the default idle TTL and capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with an explicit idle TTL and capacity.
    #[must_use]
    pub fn with_limits(idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(Sessions {
                entries: DashMap::new(),
                idle_ttl,
                max_sessions: max_sessions.max(1),
            }),
        }
    }

    /// Drop every expired session, returning how many were removed.
    pub fn evict_expired(&self) -> usize {
        self.sessions.evict_expired()
    }

    /// Number of sessions currently held (expired ones included until evicted).
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.entries.len()
    }

    /// `true` if no sessions are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.entries.is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(
        &self,
        session_id: SessionId,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>>> + Send {
        let sessions = Arc::clone(&self.sessions);
        let key = key.to_string();

        async move { Ok(sessions.get(session_id, &key)) }
    }

    fn set(
        &self,
        session_id: SessionId,
        key: &str,
        value: String,
    ) -> impl Future<Output = Result<()>> + Send {
        let sessions = Arc::clone(&self.sessions);
        let key = key.to_string();

        async move {
            sessions.set(session_id, key, value);
            Ok(())
        }
    }

    fn remove(
        &self,
        session_id: SessionId,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>>> + Send {
        let sessions = Arc::clone(&self.sessions);
        let key = key.to_string();

        async move { Ok(sessions.remove(session_id, &key)) }
    }

    fn destroy(&self, session_id: SessionId) -> impl Future<Output = Result<()>> + Send {
        let sessions = Arc::clone(&self.sessions);

        async move {
            sessions.entries.remove(&session_id);
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new();

        assert_eq!(store.get(id, "k").await.unwrap(), None);

        store.set(id, "k", "v".to_string()).await.unwrap();
        assert_eq!(store.get(id, "k").await.unwrap(), Some("v".to_string()));

        assert_eq!(store.remove(id, "k").await.unwrap(), Some("v".to_string()));
        assert_eq!(store.get(id, "k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = InMemorySessionStore::new();
        let a = SessionId::new();
        let b = SessionId::new();

        store.set(a, "k", "a".to_string()).await.unwrap();
        assert_eq!(store.get(b, "k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_destroy_clears_all_keys() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new();

        store.set(id, "a", "1".to_string()).await.unwrap();
        store.set(id, "b", "2".to_string()).await.unwrap();
        store.destroy(id).await.unwrap();

        assert_eq!(store.get(id, "a").await.unwrap(), None);
        assert_eq!(store.get(id, "b").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_reads_and_removes_never_create_sessions() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new();

        store.get(id, "k").await.unwrap();
        store.remove(id, "k").await.unwrap();

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_emptied_session_is_dropped() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new();

        store.set(id, "k", "v".to_string()).await.unwrap();
        store.remove(id, "k").await.unwrap();

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_idle_session_expires() {
        let store = InMemorySessionStore::with_limits(Duration::from_millis(5), 10);
        let id = SessionId::new();

        store.set(id, "k", "v".to_string()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(store.get(id, "k").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_evict_expired_sweeps_untouched_sessions() {
        let store = InMemorySessionStore::with_limits(Duration::from_millis(5), 10);
        for _ in 0..3 {
            store.set(SessionId::new(), "k", "v".to_string()).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(store.evict_expired(), 3);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_seen() {
        let store = InMemorySessionStore::with_limits(DEFAULT_IDLE_TTL, 3);
        let oldest = SessionId::new();

        store.set(oldest, "k", "v".to_string()).await.unwrap();
        for _ in 0..2 {
            tokio::time::sleep(Duration::from_millis(2)).await;
            store.set(SessionId::new(), "k", "v".to_string()).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
        let newest = SessionId::new();
        store.set(newest, "k", "v".to_string()).await.unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.get(oldest, "k").await.unwrap(), None);
        assert_eq!(store.get(newest, "k").await.unwrap(), Some("v".to_string()));
    }
}
