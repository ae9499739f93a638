//! Email OTP issuance.
//!
//! Issuing a token creates a fresh challenge for an email address and sends
//! the passcode by email. Verifying the passcode happens elsewhere; this
//! service only needs the `userId` the issuer links the challenge to.

pub mod appwrite;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use stashbox_core::{AccountId, Email};

use crate::appwrite::{AppwriteClient, AppwriteError};
use crate::config::AppwriteConfig;

pub use appwrite::AppwriteOtpIssuer;

/// Errors that can occur while issuing an OTP.
#[derive(Debug, Error)]
pub enum OtpError {
    /// The issuer is throttling requests for this email or client.
    #[error("OTP issuance rate limited")]
    RateLimited,

    /// The issuer refused the request (e.g. it does not accept the email).
    #[error("OTP request rejected: {0}")]
    Rejected(String),

    /// Transport or server failure.
    #[error("OTP transport error: {0}")]
    Transport(#[from] AppwriteError),
}

impl OtpError {
    /// Classify an Appwrite error by status.
    #[must_use]
    pub fn from_appwrite(err: AppwriteError) -> Self {
        match err {
            AppwriteError::Api { status: 429, .. } => Self::RateLimited,
            AppwriteError::Api {
                status: 400,
                message,
                ..
            } => Self::Rejected(message),
            other => Self::Transport(other),
        }
    }
}

/// A freshly issued email token.
///
/// The passcode itself is never part of this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailToken {
    /// The token's own ID.
    pub id: String,
    /// The user the challenge belongs to. May be empty if the issuer
    /// misbehaves; callers must check.
    pub user_id: String,
    /// When the passcode stops being accepted.
    pub expire: Option<DateTime<Utc>>,
}

/// Creates email OTP challenges.
#[async_trait]
pub trait OtpIssuer: Send + Sync {
    /// Create a challenge for `email`, requesting `user_id` as the owner,
    /// and send the passcode.
    ///
    /// If `email` already belongs to a user, the issuer returns that user's
    /// ID instead of `user_id`.
    async fn create_email_token(
        &self,
        user_id: &AccountId,
        email: &Email,
    ) -> Result<EmailToken, OtpError>;
}

/// Build the OTP issuer for the configured Appwrite project.
///
/// # Errors
///
/// Returns an error if the Appwrite client cannot be built.
pub fn connect(config: &AppwriteConfig) -> Result<Arc<dyn OtpIssuer>, AppwriteError> {
    let client = AppwriteClient::new(config)?;
    Ok(Arc::new(AppwriteOtpIssuer::new(client)))
}
