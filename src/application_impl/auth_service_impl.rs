use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const MIN_PASSWORD_LEN: usize = 8;

/// Sign-in, refresh rotation and logout over the session store.
///
/// Session ids move through `absent -> active -> (rotated | revoked | expired)
/// -> absent`; an id is consumed by the first refresh that reaches the store.
pub struct RealAuthService {
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
    session_store: Arc<dyn SessionStore>,
    store_timeout: Duration,
}

impl RealAuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
        session_store: Arc<dyn SessionStore>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            user_repo,
            credential_hasher,
            token_codec,
            session_store,
            store_timeout,
        }
    }

    fn validate_signup(
        name: &str,
        login: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<(), AuthError> {
        if name.trim().is_empty() {
            return Err(AuthError::Validation("name is required".to_string()));
        }
        if !looks_like_email(login) {
            return Err(AuthError::Validation("login must be an email address".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if password != password_confirm {
            return Err(AuthError::Validation("passwords do not match".to_string()));
        }
        Ok(())
    }

    fn ttl_until(until: DateTime<Utc>) -> Duration {
        (until - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO)
            .max(Duration::from_secs(1))
    }

    async fn timed<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = Result<T, AuthError>>,
    ) -> Result<T, AuthError> {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(op, timeout = ?self.store_timeout, "session store timed out");
                Err(AuthError::Store(format!("{op} timed out")))
            }
        }
    }

    /// Mint both tokens and persist them under a fresh session id.
    async fn issue_session(&self, user_id: UserId) -> Result<IssuedSession, AuthError> {
        let (access_token, access_exp) = self.token_codec.issue_access_token(user_id).await?;
        let (refresh_token, refresh_exp) = self.token_codec.issue_refresh_token(user_id).await?;

        let session_id = SessionId::generate();
        let record = SessionRecord {
            user_id,
            refresh_token: refresh_token.clone(),
        };
        let ttl = Self::ttl_until(refresh_exp);
        self.timed("save", self.session_store.save(&session_id, &record, ttl))
            .await?;

        debug!(%user_id, session = session_id.log_prefix(), "session issued");
        Ok(IssuedSession {
            user_id,
            tokens: AuthTokens {
                access_token,
                refresh_token,
                access_token_expires_at: access_exp,
                refresh_token_expires_at: refresh_exp,
            },
            session_id,
        })
    }
}

fn normalize_login(login: &str) -> String {
    login.trim().to_lowercase()
}

fn looks_like_email(login: &str) -> bool {
    if login.chars().any(char::is_whitespace) {
        return false;
    }
    match login.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn sign_up(&self, request: SignupInput) -> Result<UserProfile, AuthError> {
        let SignupInput {
            name,
            login,
            password,
            password_confirm,
        } = request;
        let login = normalize_login(&login);

        Self::validate_signup(&name, &login, &password, &password_confirm)?;

        if self.user_repo.find_by_login(&login).await?.is_some() {
            return Err(AuthError::UserExists);
        }

        let password_hash = self.credential_hasher.hash_password(&password).await?;
        let record = UserRecord {
            user_id: UserId::new_v4(),
            login,
            name: name.trim().to_string(),
            role: Role::User,
            password_hash,
            created_at: Utc::now(),
        };
        self.user_repo.create(&record).await?;

        info!(user_id = %record.user_id, "user signed up");
        Ok(UserProfile::from(&record))
    }

    async fn sign_in(&self, request: LoginInput) -> Result<IssuedSession, AuthError> {
        let LoginInput { login, password } = request;
        let login = normalize_login(&login);
        if login.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "login and password are required".to_string(),
            ));
        }

        // Unknown login and wrong password look the same to the caller,
        // including in how long the answer takes.
        let Some(user) = self.user_repo.find_by_login(&login).await? else {
            self.credential_hasher
                .verify_password(&password, self.credential_hasher.decoy_hash())
                .await?;
            debug!("sign-in for unknown login");
            return Err(AuthError::InvalidCredentials);
        };

        let ok = self
            .credential_hasher
            .verify_password(&password, &user.password_hash)
            .await?;
        if !ok {
            debug!(user_id = %user.user_id, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.issue_session(user.user_id).await?;
        info!(user_id = %user.user_id, "signed in");
        Ok(issued)
    }

    async fn refresh(
        &self,
        session_id: Option<SessionId>,
        subject: UserId,
    ) -> Result<IssuedSession, AuthError> {
        let session_id = session_id.ok_or(AuthError::MissingSession)?;
        if !session_id.is_well_formed() {
            debug!(user_id = %subject, "malformed session id presented");
            return Err(AuthError::SessionNotFound);
        }

        // Consume before issuing: a racing refresh with the same id misses.
        let record = self
            .timed("take", self.session_store.take(&session_id))
            .await?
            .ok_or_else(|| {
                debug!(
                    user_id = %subject,
                    session = session_id.log_prefix(),
                    "session not found"
                );
                AuthError::SessionNotFound
            })?;

        if record.user_id != subject {
            warn!(
                user_id = %subject,
                owner = %record.user_id,
                "session presented by a different user"
            );
            return Err(AuthError::SessionNotFound);
        }
        match self
            .token_codec
            .verify_refresh_token(&record.refresh_token)
            .await
        {
            Ok(owner) if owner == subject => {}
            Ok(_) | Err(_) => {
                warn!(user_id = %subject, "stored refresh token no longer valid");
                return Err(AuthError::SessionNotFound);
            }
        }

        let issued = self.issue_session(subject).await?;
        info!(user_id = %subject, "session rotated");
        Ok(issued)
    }

    async fn log_out(&self, session_id: Option<SessionId>) {
        let Some(session_id) = session_id else {
            return;
        };
        if !session_id.is_well_formed() {
            return;
        }
        match self
            .timed("delete", self.session_store.delete(&session_id))
            .await
        {
            Ok(()) => debug!(session = session_id.log_prefix(), "session revoked"),
            Err(e) => warn!(error = %e, "logout could not remove session"),
        }
    }
}
