//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! stashbox-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `ACCOUNTS_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! `crates/accounts/migrations/`, embedded into the binary at build time.

use secrecy::SecretString;
use thiserror::Error;

use stashbox_accounts::directory::postgres::{MIGRATOR, create_pool};

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed to apply.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run the directory migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails,
/// or a migration fails to apply.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("ACCOUNTS_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| MigrationError::MissingEnvVar("ACCOUNTS_DATABASE_URL"))?;

    tracing::info!("Connecting to accounts database...");
    let pool = create_pool(&SecretString::from(database_url)).await?;

    tracing::info!("Running directory migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Directory migrations complete!");
    Ok(())
}
