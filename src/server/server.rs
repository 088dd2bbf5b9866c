use crate::api::v1::CookiePolicy;
use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use sqlx::{MySql, Pool};
use std::sync::Arc;

/// Every component, built once from settings and shared by the routes.
pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pub access_guard: Arc<AccessGuard>,
    pub cookie_policy: CookiePolicy,
    pool: Option<Pool<MySql>>,
}

pub fn argon2_config(settings: &Settings) -> Argon2Config {
    Argon2Config {
        memory_kib: settings.password.memory_kib,
        iterations: settings.password.iterations,
        parallelism: settings.password.parallelism,
    }
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let session_store: Arc<dyn SessionStore> = match settings.session.backend.as_str() {
            "memory" => Arc::new(MemorySessionStore::new()),
            "redis" => {
                let redis_client = redis::Client::open(settings.session.redis_url.as_str())?;
                let redis_manager = redis_client.get_connection_manager().await?;
                Arc::new(RedisSessionStore::new(
                    redis_manager,
                    settings.session.key_prefix.clone(),
                ))
            }
            other => return Err(anyhow::anyhow!("Unknown session backend: {}", other)),
        };

        let (user_repo, pool): (Arc<dyn UserRepo>, Option<Pool<MySql>>) =
            match settings.user.backend.as_str() {
                "memory" => (Arc::new(MemoryUserRepo::new()), None),
                "mysql" => {
                    let pool = Pool::<MySql>::connect(&settings.user.mysql_url).await?;
                    (Arc::new(MySqlUserRepo::new(pool.clone())), Some(pool))
                }
                other => return Err(anyhow::anyhow!("Unknown user backend: {}", other)),
            };

        let mut server = Self::assemble(settings, user_repo, session_store)?;
        server.pool = pool;

        info!(
            session_backend = %settings.session.backend,
            user_backend = %settings.user.backend,
            "server started"
        );
        Ok(server)
    }

    /// Wire the services over already constructed stores.
    pub fn assemble(
        settings: &Settings,
        user_repo: Arc<dyn UserRepo>,
        session_store: Arc<dyn SessionStore>,
    ) -> anyhow::Result<Self> {
        let credential_hasher: Arc<dyn CredentialHasher> =
            Arc::new(Argon2PasswordHasher::new(argon2_config(settings))?);

        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(JwtConfig {
            issuer: settings.auth.issuer.clone(),
            access_ttl: settings.auth.access_ttl(),
            refresh_ttl: settings.auth.refresh_ttl(),
            access_secret: settings.auth.access_secret.clone().into_bytes(),
            refresh_secret: settings.auth.refresh_secret.clone().into_bytes(),
        }));

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            user_repo.clone(),
            credential_hasher,
            token_codec.clone(),
            session_store,
            settings.session.store_timeout(),
        ));
        let user_service: Arc<dyn UserService> = Arc::new(RealUserService::new(user_repo.clone()));
        let access_guard = Arc::new(AccessGuard::new(token_codec, user_repo));

        let cookie_policy = CookiePolicy {
            access_max_age: settings.auth.access_ttl(),
            session_max_age: settings.auth.refresh_ttl(),
            secure: settings.http.secure_cookies,
        };

        Ok(Self {
            auth_service,
            user_service,
            access_guard,
            cookie_policy,
            pool: None,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
