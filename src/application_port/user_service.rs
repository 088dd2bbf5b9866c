use crate::application_port::AuthError;
use crate::domain_model::{PageQuery, UserProfile};

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Read-only listing for staff; callers enforce the role check first.
    async fn list_users(&self, query: PageQuery) -> Result<Vec<UserProfile>, AuthError>;
}
