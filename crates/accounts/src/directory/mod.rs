//! User directory: where user records live and how they are found.
//!
//! The directory is an external document store. Everything the provisioning
//! flow needs from it fits in [`DirectoryStore`]:
//!
//! - list the records whose `email` equals a given value
//! - create a record under a caller-chosen ID
//!
//! # Backends
//!
//! - [`appwrite::AppwriteDirectory`] - Appwrite Databases collection (production)
//! - [`postgres::PgDirectory`] - `directory.user_record` table, unique on email
//! - [`memory::InMemoryDirectory`] - process-local, for development and tests
//!
//! Email uniqueness is a convention kept by looking up before creating.
//! Backends that can enforce it report a violation as
//! [`DirectoryError::Conflict`].

pub mod appwrite;
pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::instrument;

use stashbox_core::{Email, UserRecordId};

use crate::appwrite::{AppwriteClient, AppwriteError};
use crate::config::{AccountsConfig, DirectoryBackend};
use crate::models::{NewUserRecord, UserRecord};

pub use appwrite::AppwriteDirectory;
pub use memory::InMemoryDirectory;
pub use postgres::PgDirectory;

/// Errors that can occur during directory operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Appwrite API error.
    #[error("appwrite error: {0}")]
    Appwrite(#[from] AppwriteError),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored record has no usable email.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., a record for this email already exists).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Backend-specific configuration is missing.
    #[error("directory misconfigured: {0}")]
    Misconfigured(String),
}

/// Result of listing records.
#[derive(Debug, Clone, Default)]
pub struct DocumentList {
    /// Total number of matching records in the store.
    pub total: u64,
    /// The matching records returned by this call.
    pub documents: Vec<UserRecord>,
}

/// A document store holding user records.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// List records whose email equals `email` exactly.
    async fn list_by_email(&self, email: &Email) -> Result<DocumentList, DirectoryError>;

    /// Create a record under `id`.
    async fn create(
        &self,
        id: &UserRecordId,
        record: NewUserRecord,
    ) -> Result<UserRecord, DirectoryError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), DirectoryError>;
}

/// Read/write access to user records by email.
pub struct UserDirectory<'a> {
    store: &'a dyn DirectoryStore,
}

impl<'a> UserDirectory<'a> {
    /// Create a new user directory over `store`.
    #[must_use]
    pub const fn new(store: &'a dyn DirectoryStore) -> Self {
        Self { store }
    }

    /// Find the user record for an email.
    ///
    /// Returns the first match, or `None` if there is none. No validation
    /// beyond what [`Email`] already guarantees.
    ///
    /// # Errors
    ///
    /// Store errors are returned unchanged.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, DirectoryError> {
        let list = self.store.list_by_email(email).await?;

        if list.total > 1 {
            tracing::warn!(
                email = %email,
                total = list.total,
                "multiple user records share one email, using the first"
            );
        }

        Ok(list.documents.into_iter().next())
    }

    /// Create a user record under a freshly generated ID.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Conflict` if the backend enforces email
    /// uniqueness and a record already exists, or any other store error.
    #[instrument(skip_all, fields(email = %record.email))]
    pub async fn create(&self, record: NewUserRecord) -> Result<UserRecord, DirectoryError> {
        let id = UserRecordId::unique();
        let created = self.store.create(&id, record).await?;
        tracing::info!(record_id = %created.id, "user record created");
        Ok(created)
    }
}

/// Build the directory backend selected by configuration.
///
/// # Errors
///
/// Returns an error if the backend's client or connection pool cannot be built.
pub async fn connect(config: &AccountsConfig) -> Result<Arc<dyn DirectoryStore>, DirectoryError> {
    match config.directory_backend {
        DirectoryBackend::Appwrite => {
            let client = AppwriteClient::new(&config.appwrite)?;
            Ok(Arc::new(AppwriteDirectory::new(
                client,
                &config.appwrite.database_id,
                &config.appwrite.users_collection_id,
            )))
        }
        DirectoryBackend::Postgres => {
            let url = config.database_url.as_ref().ok_or_else(|| {
                DirectoryError::Misconfigured("ACCOUNTS_DATABASE_URL is not set".to_owned())
            })?;
            let pool = postgres::create_pool(url).await?;
            tracing::info!("Database pool created");
            Ok(Arc::new(PgDirectory::new(pool)))
        }
        DirectoryBackend::Memory => {
            tracing::warn!("using in-memory directory; records are lost on restart");
            Ok(Arc::new(InMemoryDirectory::new()))
        }
    }
}
