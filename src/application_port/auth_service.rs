use crate::domain_model::*;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user already exists")]
    UserExists,
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("forbidden")]
    Forbidden,
    #[error("session id is missing")]
    MissingSession,
    #[error("session not found")]
    SessionNotFound,
    #[error("store error: {0}")]
    Store(String),
    #[error("hashing error: {0}")]
    Hashing(String),
    #[error("token issue error: {0}")]
    Issue(String),
}

impl AuthError {
    /// Infrastructure failures, as opposed to the caller's fault.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::Store(_) | AuthError::Hashing(_) | AuthError::Issue(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("malformed token")]
    Malformed,
    #[error("token issue failed: {0}")]
    Issue(String),
}

impl From<TokenError> for AuthError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Issue(e) => AuthError::Issue(e),
            TokenError::Expired | TokenError::InvalidSignature | TokenError::Malformed => {
                AuthError::Unauthenticated
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignupInput {
    pub name: String,
    pub login: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

/// Result of sign-in and refresh. The transport decides how `session_id`
/// reaches the caller.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub user_id: UserId,
    pub tokens: AuthTokens,
    pub session_id: SessionId,
}

#[async_trait::async_trait]
pub trait TokenCodec: Send + Sync {
    async fn issue_access_token(
        &self,
        user: UserId,
    ) -> Result<(AccessToken, DateTime<Utc>), TokenError>;
    async fn issue_refresh_token(
        &self,
        user: UserId,
    ) -> Result<(RefreshToken, DateTime<Utc>), TokenError>;
    async fn verify_access_token(&self, token: &AccessToken) -> Result<UserId, TokenError>;
    async fn verify_refresh_token(&self, token: &RefreshToken) -> Result<UserId, TokenError>;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    /// `Ok(false)` on a plain mismatch; errors only when the digest is unusable.
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
    /// Digest under the current work factor that matches no real account.
    /// Verifying against it costs as much as a real mismatch.
    fn decoy_hash(&self) -> &str;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_up(&self, request: SignupInput) -> Result<UserProfile, AuthError>;
    async fn sign_in(&self, request: LoginInput) -> Result<IssuedSession, AuthError>;
    /// `subject` must come from an already authenticated access token.
    async fn refresh(
        &self,
        session_id: Option<SessionId>,
        subject: UserId,
    ) -> Result<IssuedSession, AuthError>;
    /// Best effort; never fails from the caller's point of view.
    async fn log_out(&self, session_id: Option<SessionId>);
}
