use crate::application_port::*;
use crate::domain_model::*;
use std::time::Duration;

/// TTL-backed cache of live refresh sessions.
///
/// Entries must disappear on their own once `ttl` elapses; callers never
/// assume a record outlives it. Every operation touches a single key.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Upsert `record` under `session_id`, replacing any previous value.
    async fn save(
        &self,
        session_id: &SessionId,
        record: &SessionRecord,
        ttl: Duration,
    ) -> Result<(), AuthError>;

    /// `Ok(None)` means there is no live session, which is not an error.
    async fn get(&self, session_id: &SessionId) -> Result<Option<SessionRecord>, AuthError>;

    /// Idempotent: deleting a missing key succeeds.
    async fn delete(&self, session_id: &SessionId) -> Result<(), AuthError>;

    /// Atomically fetch and remove. Of two concurrent callers at most one
    /// observes the record.
    async fn take(&self, session_id: &SessionId) -> Result<Option<SessionRecord>, AuthError>;
}
