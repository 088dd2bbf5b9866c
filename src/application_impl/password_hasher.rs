use crate::application_port::{AuthError, CredentialHasher};
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

/// Argon2id work factor.
#[derive(Debug, Clone, Copy)]
pub struct Argon2Config {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

const DECOY_PASSWORD: &str = "gatehouse-decoy";

pub struct Argon2PasswordHasher {
    params: Params,
    decoy_hash: String,
}

impl Argon2PasswordHasher {
    pub fn new(config: Argon2Config) -> Result<Self, AuthError> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| AuthError::Hashing(format!("invalid argon2 params: {e}")))?;
        let decoy_hash = hash_with(&argon2_for(&params), DECOY_PASSWORD)?;
        Ok(Self { params, decoy_hash })
    }

    fn argon2(&self) -> Argon2<'static> {
        argon2_for(&self.params)
    }
}

fn argon2_for(params: &Params) -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone())
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

// Hashing is CPU heavy on purpose, so it runs on the blocking pool.
#[async_trait::async_trait]
impl CredentialHasher for Argon2PasswordHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let argon2 = self.argon2();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hash_with(&argon2, &password))
            .await
            .map_err(|e| AuthError::Hashing(format!("hashing task failed: {e}")))?
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let argon2 = self.argon2();
        let password = password.to_owned();
        let password_hash = password_hash.to_owned();
        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&password_hash)
                .map_err(|e| AuthError::Hashing(format!("invalid PHC hash: {e}")))?;

            // Parameters are read back from the PHC string, so digests made
            // under an older work factor still verify.
            match argon2.verify_password(password.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(AuthError::Hashing(format!("verify error: {e}"))),
            }
        })
        .await
        .map_err(|e| AuthError::Hashing(format!("verify task failed: {e}")))?
    }

    fn decoy_hash(&self) -> &str {
        &self.decoy_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_hasher() -> Argon2PasswordHasher {
        Argon2PasswordHasher::new(Argon2Config {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn same_password_hashes_differently() {
        let hasher = cheap_hasher();
        let a = hasher.hash_password("p").await.unwrap();
        let b = hasher.hash_password("p").await.unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn verifies_matching_and_rejects_other_passwords() {
        let hasher = cheap_hasher();
        let digest = hasher.hash_password("correct horse").await.unwrap();
        assert!(hasher.verify_password("correct horse", &digest).await.unwrap());
        assert!(!hasher.verify_password("wrong horse", &digest).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_digest_is_an_error() {
        let hasher = cheap_hasher();
        let err = hasher.verify_password("p", "not-a-phc-string").await;
        assert!(matches!(err, Err(AuthError::Hashing(_))));
    }

    #[tokio::test]
    async fn decoy_uses_configured_work_factor_and_matches_nothing() {
        let hasher = cheap_hasher();
        assert!(hasher.decoy_hash().contains("m=8,t=1,p=1"));
        assert!(!hasher.verify_password("p", hasher.decoy_hash()).await.unwrap());
    }

    #[test]
    fn rejects_impossible_work_factor() {
        let res = Argon2PasswordHasher::new(Argon2Config {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(matches!(res, Err(AuthError::Hashing(_))));
    }
}
