//! Application state shared across handlers.

use std::sync::Arc;

use thiserror::Error;

use stashbox_core::Avatar;

use crate::appwrite::AppwriteError;
use crate::config::AccountsConfig;
use crate::directory::{self, DirectoryError, DirectoryStore};
use crate::otp::{self, OtpIssuer};
use crate::services::ProvisioningService;

/// Error building application state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("directory: {0}")]
    Directory(#[from] DirectoryError),
    #[error("otp issuer: {0}")]
    Otp(#[from] AppwriteError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Built once at startup; handlers only read it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    directory: Arc<dyn DirectoryStore>,
    issuer: Arc<dyn OtpIssuer>,
    default_avatar: Avatar,
}

impl AppState {
    /// Create application state from already-built collaborators.
    #[must_use]
    pub fn new(
        directory: Arc<dyn DirectoryStore>,
        issuer: Arc<dyn OtpIssuer>,
        default_avatar: Avatar,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                directory,
                issuer,
                default_avatar,
            }),
        }
    }

    /// Build the configured directory backend and OTP issuer.
    ///
    /// # Errors
    ///
    /// Returns an error if a client or connection pool cannot be built.
    pub async fn from_config(config: &AccountsConfig) -> Result<Self, StateError> {
        let directory = directory::connect(config).await?;
        let issuer = otp::connect(&config.appwrite)?;
        Ok(Self::new(directory, issuer, config.default_avatar.clone()))
    }

    /// Get a reference to the directory store.
    #[must_use]
    pub fn directory(&self) -> &dyn DirectoryStore {
        self.inner.directory.as_ref()
    }

    /// Get a reference to the OTP issuer.
    #[must_use]
    pub fn issuer(&self) -> &dyn OtpIssuer {
        self.inner.issuer.as_ref()
    }

    /// Avatar given to newly created user records.
    #[must_use]
    pub fn default_avatar(&self) -> &Avatar {
        &self.inner.default_avatar
    }

    /// Provisioning service borrowing this state's collaborators.
    #[must_use]
    pub fn provisioning(&self) -> ProvisioningService<'_> {
        ProvisioningService::new(self.directory(), self.issuer(), self.default_avatar())
    }
}
