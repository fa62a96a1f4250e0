//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! optica-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string for storefront
//!
//! # Migration Files
//!
//! Storefront migrations: `crates/storefront/migrations/`

use secrecy::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Read `STOREFRONT_DATABASE_URL`, loading `.env` first.
///
/// # Errors
///
/// Returns `MigrationError::MissingEnvVar` when the variable is unset.
pub fn database_url() -> Result<SecretString, MigrationError> {
    dotenvy::dotenv().ok();
    std::env::var("STOREFRONT_DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("STOREFRONT_DATABASE_URL"))
}

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn storefront() -> Result<(), MigrationError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to storefront database...");
    let pool = optica_storefront::db::create_pool(&database_url).await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
