use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Saves between two sweeps of expired entries.
const SWEEP_EVERY: u64 = 1024;

struct Entry {
    record: SessionRecord,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Single-process session store. Expired entries are never returned; they are
/// dropped on access and by a sweep every [`SWEEP_EVERY`] saves, so nothing
/// has to poll.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: DashMap<SessionId, Entry>,
    saves: AtomicU64,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live entries only.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.value().is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(
        &self,
        session_id: &SessionId,
        record: &SessionRecord,
        ttl: Duration,
    ) -> Result<(), AuthError> {
        let now = Instant::now();
        if self.saves.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.entries.retain(|_, e| e.is_live(now));
        }
        self.entries.insert(
            session_id.clone(),
            Entry {
                record: record.clone(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, session_id: &SessionId) -> Result<Option<SessionRecord>, AuthError> {
        let now = Instant::now();
        {
            let entry = self.entries.get(session_id);
            match entry {
                Some(e) if e.is_live(now) => return Ok(Some(e.record.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }
        self.entries.remove_if(session_id, |_, e| !e.is_live(now));
        Ok(None)
    }

    async fn delete(&self, session_id: &SessionId) -> Result<(), AuthError> {
        self.entries.remove(session_id);
        Ok(())
    }

    async fn take(&self, session_id: &SessionId) -> Result<Option<SessionRecord>, AuthError> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(session_id)
            .filter(|(_, e)| e.is_live(now))
            .map(|(_, e)| e.record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record() -> SessionRecord {
        SessionRecord {
            user_id: UserId::new_v4(),
            refresh_token: RefreshToken("rt".to_string()),
        }
    }

    #[tokio::test]
    async fn save_get_delete() {
        let store = MemorySessionStore::new();
        let sid = SessionId::generate();
        let rec = record();

        store.save(&sid, &rec, Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get(&sid).await.unwrap(), Some(rec));

        store.delete(&sid).await.unwrap();
        assert_eq!(store.get(&sid).await.unwrap(), None);
        store.delete(&sid).await.unwrap();
    }

    #[tokio::test]
    async fn save_overwrites() {
        let store = MemorySessionStore::new();
        let sid = SessionId::generate();
        store.save(&sid, &record(), Duration::from_secs(60)).await.unwrap();
        let newer = record();
        store.save(&sid, &newer, Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get(&sid).await.unwrap(), Some(newer));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let store = MemorySessionStore::new();
        let sid = SessionId::generate();
        store.save(&sid, &record(), Duration::from_millis(30)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(store.get(&sid).await.unwrap(), None);
        assert_eq!(store.take(&sid).await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn expired_entries_are_swept_periodically() {
        let store = MemorySessionStore::new();
        let stale = SessionId::generate();
        store.save(&stale, &record(), Duration::from_millis(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        for _ in 0..SWEEP_EVERY - 2 {
            store
                .save(&SessionId::generate(), &record(), Duration::from_secs(60))
                .await
                .unwrap();
        }
        assert!(store.entries.contains_key(&stale));

        store
            .save(&SessionId::generate(), &record(), Duration::from_secs(60))
            .await
            .unwrap();
        assert!(!store.entries.contains_key(&stale));
        assert_eq!(store.entries.len() as u64, SWEEP_EVERY - 1);
    }

    #[tokio::test]
    async fn take_hands_the_record_to_one_caller() {
        let store = Arc::new(MemorySessionStore::new());
        let sid = SessionId::generate();
        store.save(&sid, &record(), Duration::from_secs(60)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            let sid = sid.clone();
            handles.push(tokio::spawn(async move { store.take(&sid).await.unwrap() }));
        }
        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(store.get(&sid).await.unwrap(), None);
    }
}
