use anyhow::{Result, anyhow, ensure};
use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub http: Http,
    pub log: Log,
    pub password: Password,
    pub session: Session,
    pub user: User,
}

/// One year; longer lifetimes are a configuration mistake.
const MAX_TTL_MINUTES: u64 = 366 * 24 * 60;

#[derive(Deserialize)]
pub struct Auth {
    pub issuer: String,
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_ttl_minutes: u64,
    pub refresh_token_ttl_minutes: u64,
}

impl Auth {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_ttl_minutes.saturating_mul(60))
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_ttl_minutes.saturating_mul(60))
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("issuer", &self.issuer)
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_token_ttl_minutes", &self.access_token_ttl_minutes)
            .field("refresh_token_ttl_minutes", &self.refresh_token_ttl_minutes)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    #[serde(default)]
    pub secure_cookies: bool,
    #[serde(default)]
    pub tls: Option<Tls>,
}

#[derive(Debug, Deserialize)]
pub struct Tls {
    pub cert_path: String,
    pub key_path: String,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

/// Argon2id work factor.
#[derive(Debug, Deserialize)]
pub struct Password {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Deserialize)]
pub struct Session {
    pub backend: String, // "redis" or "memory"
    #[serde(default)]
    pub redis_url: String,
    pub key_prefix: String,
    pub store_timeout_ms: u64,
}

impl Session {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub backend: String, // "mysql" or "memory"
    #[serde(default)]
    pub mysql_url: String,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let auth = &self.auth;
        ensure!(!auth.access_secret.is_empty(), "auth.access_secret is empty");
        ensure!(!auth.refresh_secret.is_empty(), "auth.refresh_secret is empty");
        ensure!(
            auth.access_secret != auth.refresh_secret,
            "auth.access_secret and auth.refresh_secret must differ"
        );
        ensure!(
            auth.access_token_ttl_minutes > 0,
            "auth.access_token_ttl_minutes must be positive"
        );
        ensure!(
            auth.refresh_token_ttl_minutes <= MAX_TTL_MINUTES,
            "auth.refresh_token_ttl_minutes must not exceed {MAX_TTL_MINUTES}"
        );
        ensure!(
            auth.refresh_token_ttl_minutes >= auth.access_token_ttl_minutes,
            "auth.refresh_token_ttl_minutes must not be shorter than the access lifetime"
        );
        ensure!(
            self.session.store_timeout_ms > 0,
            "session.store_timeout_ms must be positive"
        );
        Ok(())
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

const ENV_PREFIX: &str = "GATEHOUSE";

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Settings> {
    let settings: Settings = builder
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;
    settings.validate()?;
    Ok(settings)
}

/// Load the TOML file at `path` (or the build profile default), overlaid by
/// `GATEHOUSE__SECTION__KEY` environment variables.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    finish(
        Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__")),
    )
}

/// Same as [`parse_settings`] but from an in-memory TOML document and without
/// the environment overlay.
pub fn parse_settings_str(toml: &str) -> Result<Settings> {
    finish(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
}
