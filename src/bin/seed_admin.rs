//! Creates or resets an admin credential.
//!
//! `ADMIN_EMAIL=me@site.dev ADMIN_PASSWORD=... DATABASE_URL=... cargo run --bin seed_admin`

use anyhow::Context;
use portfolio_cms::auth::{
    claims::Role,
    password::hash_password,
    repo::{CredentialStore, PgCredentialStore},
};
use portfolio_cms::db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "seed_admin=info,sqlx=warn".into()),
        )
        .init();

    let email = std::env::var("ADMIN_EMAIL").context("ADMIN_EMAIL must be set")?;
    let password = std::env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD must be set")?;
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let email = email.trim().to_lowercase();
    if email.is_empty() || password.len() < 8 {
        anyhow::bail!("ADMIN_EMAIL must be non-empty and ADMIN_PASSWORD at least 8 characters");
    }

    let pool = db::connect(&database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let hash = hash_password(&password).context("hash admin password")?;
    let admin = PgCredentialStore::new(pool)
        .upsert(&email, &hash, Role::Admin)
        .await?;

    tracing::info!(id = %admin.id, email = %admin.email, "admin credential ready");
    Ok(())
}
