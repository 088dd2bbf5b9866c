use crate::domain_model::UserId;
use nanoid::nanoid;
use serde::{Deserialize, Serialize};
use std::fmt;

const SESSION_ID_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken(pub String);

/// Opaque handle of one refresh-eligible session. Valid for at most one
/// rotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        SessionId(nanoid!(SESSION_ID_LEN))
    }

    /// Empty values mean the caller presented nothing.
    pub fn from_presented(raw: Option<String>) -> Option<Self> {
        raw.map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(SessionId)
    }

    /// Whether the value could have been produced by [`SessionId::generate`].
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == SESSION_ID_LEN
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix that is safe to put in logs.
    pub fn log_prefix(&self) -> &str {
        let end = self.0.len().min(6);
        self.0.get(..end).unwrap_or_default()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the credential store keeps per live session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: UserId,
    pub refresh_token: RefreshToken,
}
