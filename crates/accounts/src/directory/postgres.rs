//! `PostgreSQL` backend.
//!
//! # Table: `directory.user_record`
//!
//! One row per user, unique on `email`. Migrations are stored in
//! `crates/accounts/migrations/` and run via:
//! ```bash
//! stashbox-cli migrate
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use stashbox_core::{Email, UserRecordId};

use super::{DirectoryError, DirectoryStore, DocumentList};
use crate::models::{NewUserRecord, UserRecord};

/// Embedded migrations for the directory schema.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Directory stored in `directory.user_record`.
#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    /// Create a directory over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRecordRow {
    id: String,
    full_name: String,
    email: String,
    avatar: String,
    account_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRecordRow> for UserRecord {
    type Error = DirectoryError;

    fn try_from(r: UserRecordRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| {
            DirectoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: r.id,
            full_name: r.full_name,
            email,
            avatar: r.avatar,
            account_id: r.account_id,
            created_at: Some(r.created_at),
        })
    }
}

#[async_trait]
impl DirectoryStore for PgDirectory {
    async fn list_by_email(&self, email: &Email) -> Result<DocumentList, DirectoryError> {
        let rows: Vec<UserRecordRow> = sqlx::query_as(
            r"
            SELECT id, full_name, email, avatar, account_id, created_at
            FROM directory.user_record
            WHERE email = $1
            ORDER BY created_at, id
            ",
        )
        .bind(email.as_str())
        .fetch_all(&self.pool)
        .await?;

        let documents = rows
            .into_iter()
            .map(UserRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DocumentList {
            total: documents.len() as u64,
            documents,
        })
    }

    async fn create(
        &self,
        id: &UserRecordId,
        record: NewUserRecord,
    ) -> Result<UserRecord, DirectoryError> {
        let row: UserRecordRow = sqlx::query_as(
            r"
            INSERT INTO directory.user_record (id, full_name, email, avatar, account_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, full_name, email, avatar, account_id, created_at
            ",
        )
        .bind(id.as_str())
        .bind(record.full_name.as_str())
        .bind(record.email.as_str())
        .bind(record.avatar.as_str())
        .bind(record.account_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return DirectoryError::Conflict("email already exists".to_owned());
            }
            DirectoryError::Database(e)
        })?;

        UserRecord::try_from(row)
    }

    async fn ping(&self) -> Result<(), DirectoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
