#![allow(dead_code)]

use chrono::Utc;
use gatehouse::application_impl::{Argon2Config, Argon2PasswordHasher};
use gatehouse::application_port::CredentialHasher;
use gatehouse::domain_model::{Role, UserId, UserRecord};
use gatehouse::domain_port::UserRepo;
use gatehouse::infra_memory::{MemorySessionStore, MemoryUserRepo};
use gatehouse::server::Server;
use gatehouse::settings::{Settings, parse_settings_str};
use std::sync::Arc;

pub const SETTINGS: &str = r#"
[http]
address = "127.0.0.1:0"

[log]
filter = "debug"

[auth]
issuer = "gatehouse-test"
access_secret = "access-secret-for-tests"
refresh_secret = "refresh-secret-for-tests"
access_token_ttl_minutes = 15
refresh_token_ttl_minutes = 60

[password]
memory_kib = 8
iterations = 1
parallelism = 1

[session]
backend = "memory"
key_prefix = "test:session"
store_timeout_ms = 500

[user]
backend = "memory"
"#;

pub fn settings() -> Settings {
    parse_settings_str(SETTINGS).unwrap()
}

pub struct Fixture {
    pub server: Arc<Server>,
    pub users: Arc<MemoryUserRepo>,
    pub sessions: Arc<MemorySessionStore>,
}

pub fn fixture() -> Fixture {
    let users = Arc::new(MemoryUserRepo::new());
    let sessions = Arc::new(MemorySessionStore::new());
    let server = Server::assemble(&settings(), users.clone(), sessions.clone()).unwrap();
    Fixture {
        server: Arc::new(server),
        users,
        sessions,
    }
}

/// Store a user directly, bypassing sign-up rules.
pub async fn seed_user(users: &MemoryUserRepo, login: &str, password: &str, role: Role) -> UserId {
    let hasher = Argon2PasswordHasher::new(Argon2Config {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap();
    let record = UserRecord {
        user_id: UserId::new_v4(),
        login: login.to_string(),
        name: login.split('@').next().unwrap_or(login).to_string(),
        role,
        password_hash: hasher.hash_password(password).await.unwrap(),
        created_at: Utc::now(),
    };
    users.create(&record).await.unwrap();
    record.user_id
}
