use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use redis::aio::ConnectionManager;
use redis::{
    AsyncCommands, FromRedisValue, RedisError, RedisResult, RedisWrite, ToRedisArgs, Value,
};
use std::time::Duration;

/// Session store on Redis. Expiry is Redis' own (`PSETEX`), and `take` is a
/// single `GETDEL`.
pub struct RedisSessionStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisSessionStore {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, session_id: &SessionId) -> String {
        format!("{}:{}", self.prefix, session_id)
    }

    fn ttl_millis(ttl: Duration) -> u64 {
        u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
    }
}

impl ToRedisArgs for SessionRecord {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        // Serializing plain strings and a uuid cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        out.write_arg(&json)
    }
}

impl FromRedisValue for SessionRecord {
    fn from_redis_value(v: &Value) -> RedisResult<Self> {
        let s: String = redis::from_redis_value(v)?;
        serde_json::from_str(&s).map_err(|e| {
            RedisError::from((
                redis::ErrorKind::TypeError,
                "invalid session record",
                e.to_string(),
            ))
        })
    }
}

#[async_trait::async_trait]
impl SessionStore for RedisSessionStore {
    async fn save(
        &self,
        session_id: &SessionId,
        record: &SessionRecord,
        ttl: Duration,
    ) -> Result<(), AuthError> {
        let key = self.key(session_id);
        let mut conn = self.conn.clone();
        let _: () = conn
            .pset_ex(&key, record, Self::ttl_millis(ttl))
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, session_id: &SessionId) -> Result<Option<SessionRecord>, AuthError> {
        let key = self.key(session_id);
        let mut conn = self.conn.clone();
        let val: Option<SessionRecord> = conn
            .get(&key)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(val)
    }

    async fn delete(&self, session_id: &SessionId) -> Result<(), AuthError> {
        let key = self.key(session_id);
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(&key)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }

    async fn take(&self, session_id: &SessionId) -> Result<Option<SessionRecord>, AuthError> {
        let key = self.key(session_id);
        let mut conn = self.conn.clone();
        let val: Option<SessionRecord> = redis::cmd("GETDEL")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(val)
    }
}
