//! Reads a password from stdin and prints its Argon2id digest, using the
//! work factor from the settings file.
//!
//! $ echo -n 'secret' | cargo run --bin hash_password -- --settings=settings/dev.toml

use gatehouse::application_impl::Argon2PasswordHasher;
use gatehouse::application_port::CredentialHasher;
use gatehouse::server::argon2_config;
use gatehouse::settings::*;
use tokio::io::{self, AsyncReadExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = parse_settings(cli.settings.as_deref())?;

    let mut password = String::new();
    io::stdin().read_to_string(&mut password).await?;
    let password = password.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(anyhow::anyhow!("no password on stdin"));
    }

    let hasher = Argon2PasswordHasher::new(argon2_config(&settings))?;
    println!("{}", hasher.hash_password(password).await?);
    Ok(())
}
