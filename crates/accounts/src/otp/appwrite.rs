//! Appwrite email-token issuer (`POST /account/tokens/email`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use stashbox_core::{AccountId, Email};

use super::{EmailToken, OtpError, OtpIssuer};
use crate::appwrite::AppwriteClient;

/// Issues email OTPs through Appwrite Accounts.
#[derive(Clone)]
pub struct AppwriteOtpIssuer {
    client: AppwriteClient,
}

impl AppwriteOtpIssuer {
    /// Create an issuer over `client`.
    #[must_use]
    pub const fn new(client: AppwriteClient) -> Self {
        Self { client }
    }
}

/// Token response. `secret` is never decoded.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenBody {
    #[serde(rename = "$id", default)]
    id: String,
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    expire: Option<DateTime<Utc>>,
}

#[async_trait]
impl OtpIssuer for AppwriteOtpIssuer {
    async fn create_email_token(
        &self,
        user_id: &AccountId,
        email: &Email,
    ) -> Result<EmailToken, OtpError> {
        let url = self
            .client
            .url("/account/tokens/email")
            .map_err(OtpError::Transport)?;
        let body = json!({
            "userId": user_id,
            "email": email,
        });

        let token: TokenBody = self
            .client
            .post(url, &body)
            .await
            .map_err(OtpError::from_appwrite)?;

        tracing::debug!(token_id = %token.id, user_id = %token.user_id, "email token created");

        Ok(EmailToken {
            id: token.id,
            user_id: token.user_id,
            expire: token.expire,
        })
    }
}
