use crate::application_port::{AuthError, TokenCodec};
use crate::domain_model::{AccessToken, Role, UserRecord};
use crate::domain_port::UserRepo;
use crate::logger::*;
use std::sync::Arc;

/// Resolves the caller behind an access token. The resolved user is handed
/// back to the transport, which passes it on to the protected operation.
pub struct AccessGuard {
    token_codec: Arc<dyn TokenCodec>,
    user_repo: Arc<dyn UserRepo>,
}

impl AccessGuard {
    pub fn new(token_codec: Arc<dyn TokenCodec>, user_repo: Arc<dyn UserRepo>) -> Self {
        Self {
            token_codec,
            user_repo,
        }
    }

    pub async fn authenticate(&self, token: &str) -> Result<UserRecord, AuthError> {
        let user_id = self
            .token_codec
            .verify_access_token(&AccessToken(token.to_string()))
            .await
            .map_err(|e| {
                debug!(reason = %e, "access token rejected");
                AuthError::Unauthenticated
            })?;

        match self.user_repo.find_by_id(user_id).await? {
            Some(user) => Ok(user),
            None => {
                debug!(%user_id, "access token subject no longer exists");
                Err(AuthError::Unauthenticated)
            }
        }
    }
}

/// Membership test of the caller's role against `allowed`.
pub fn authorize(user: &UserRecord, allowed: &[Role]) -> Result<(), AuthError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        debug!(user_id = %user.user_id, role = %user.role, "role not permitted");
        Err(AuthError::Forbidden)
    }
}
