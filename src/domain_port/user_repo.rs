use crate::application_port::*;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `AuthError::UserExists` when the login is taken.
    async fn create(&self, record: &UserRecord) -> Result<(), AuthError>;

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, AuthError>;

    /// `login` is expected in normalized (trimmed, lower-case) form.
    async fn find_by_login(&self, login: &str) -> Result<Option<UserRecord>, AuthError>;

    /// Oldest first.
    async fn list_page(&self, offset: u64, limit: u32) -> Result<Vec<UserRecord>, AuthError>;
}
