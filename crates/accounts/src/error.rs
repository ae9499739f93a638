//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before the response is built; clients only ever see a
//! short JSON message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::otp::OtpError;
use crate::services::ProvisioningError;

/// Application-level error type for the accounts service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Provisioning failed.
    #[error("Provisioning error: {0}")]
    Provisioning(#[from] ProvisioningError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Provisioning(err) => match err {
                ProvisioningError::InvalidEmail(_)
                | ProvisioningError::InvalidFullName(_)
                | ProvisioningError::OtpIssuance(OtpError::Rejected(_)) => StatusCode::BAD_REQUEST,
                ProvisioningError::OtpIssuance(OtpError::RateLimited) => {
                    StatusCode::TOO_MANY_REQUESTS
                }
                ProvisioningError::OtpIssuance(OtpError::Transport(_))
                | ProvisioningError::MissingAccountId
                | ProvisioningError::Lookup(_)
                | ProvisioningError::RecordCreation(_) => StatusCode::BAD_GATEWAY,
            },
        }
    }

    /// Message safe to show to clients.
    fn public_message(&self) -> String {
        match self {
            Self::BadRequest(msg) => msg.clone(),
            Self::Provisioning(err) => match err {
                ProvisioningError::InvalidEmail(_) => "Invalid email address".to_string(),
                ProvisioningError::InvalidFullName(e) => format!("Invalid full name: {e}"),
                // Both OTP variants already display the generic message
                ProvisioningError::OtpIssuance(_) | ProvisioningError::MissingAccountId => {
                    err.to_string()
                }
                ProvisioningError::Lookup(_) => "User lookup failed".to_string(),
                ProvisioningError::RecordCreation(_) => "Failed to create user record".to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry; the failure itself was logged
        // where it happened
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::debug!(
                sentry_event_id = %event_id,
                status = %status,
                "Captured request error"
            );
        }

        let body = ErrorBody {
            error: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for a provisioning step.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of steps
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}
