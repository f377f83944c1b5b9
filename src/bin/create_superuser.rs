//! CLI tool to create a staff superuser account.
//!
//! Usage: `cargo run --bin create-superuser -- <username> <email> <password>`
//!
//! Uses the same `config.yml` and `CONDUIT_*` overrides as the server.

use anyhow::{bail, Result};
use std::path::Path;

use conduit::{
    config::Config,
    db::{
        self,
        repositories::{SqlxProfileRepository, SqlxUserRepository},
    },
    services::{RegisterInput, TokenService, UserService},
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "conduit=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [username, email, password] = args.as_slice() else {
        bail!("usage: create-superuser <username> <email> <password>");
    };

    let config = Config::load_with_env(Path::new("config.yml"))?;
    let pool = db::create_pool(&config.database).await?;
    db::migrations::run_migrations(&pool).await?;

    let service = UserService::new(
        SqlxUserRepository::boxed(pool.clone()),
        SqlxProfileRepository::boxed(pool.clone()),
        TokenService::from_config(&config.auth),
    );
    let account = service
        .create_superuser(RegisterInput::new(username, email, password))
        .await?;

    println!("Created superuser {} <{}>", account.user.username, account.user.email);
    pool.close().await;
    Ok(())
}
