//! Account provisioning API.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use stashbox_core::{Email, FullName};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::services::ProvisioningError;
use crate::state::AppState;

/// Request to create (or sign in to) an account.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub full_name: String,
    pub email: String,
}

/// Response carrying the ID to verify the OTP against.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountResponse {
    pub account_id: String,
}

/// Provision an account and email an OTP.
///
/// POST /api/accounts
///
/// The email is trimmed and lowercased before lookup.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a malformed body, otherwise the
/// provisioning error.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<Json<CreateAccountResponse>> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let email = Email::normalize(&req.email).map_err(ProvisioningError::from)?;
    let full_name = FullName::parse(&req.full_name).map_err(ProvisioningError::from)?;

    add_breadcrumb("accounts", "Account requested", &[("email_domain", email.domain())]);

    let provisioned = state.provisioning().provision(full_name, email).await?;

    Ok(Json(CreateAccountResponse {
        account_id: provisioned.account_id.into_inner(),
    }))
}
