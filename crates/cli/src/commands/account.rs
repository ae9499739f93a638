//! Account provisioning from the command line.
//!
//! # Usage
//!
//! ```bash
//! stashbox-cli account create -e ada@example.com -n "Ada Lovelace"
//! ```
//!
//! Uses the same configuration as the server (see `stashbox_accounts::config`),
//! including `DIRECTORY_BACKEND`. Prints the account ID on success.

use thiserror::Error;

use stashbox_accounts::config::{AccountsConfig, ConfigError};
use stashbox_accounts::services::{ProvisioningError, RecordOutcome};
use stashbox_accounts::state::{AppState, StateError};
use stashbox_core::{Email, FullName};

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Clients could not be built.
    #[error("Startup error: {0}")]
    State(#[from] StateError),

    /// Provisioning failed.
    #[error("{0}")]
    Provisioning(#[from] ProvisioningError),
}

/// Provision an account and send the OTP email.
///
/// The email is trimmed and lowercased first, as the HTTP API does.
///
/// # Returns
///
/// The account ID to verify the OTP against.
///
/// # Errors
///
/// Returns an error if configuration is invalid, input does not parse, or
/// provisioning fails.
pub async fn create(email: &str, full_name: &str) -> Result<String, AccountError> {
    let config = AccountsConfig::from_env()?;

    let email = Email::normalize(email).map_err(ProvisioningError::from)?;
    let full_name = FullName::parse(full_name).map_err(ProvisioningError::from)?;

    let state = AppState::from_config(&config).await?;
    let provisioned = state.provisioning().provision(full_name, email).await?;

    match &provisioned.record {
        RecordOutcome::Created(record) => {
            tracing::info!(record_id = %record.id, "Created user record");
        }
        RecordOutcome::Existing(record) => {
            tracing::info!(record_id = %record.id, "User record already existed");
        }
        RecordOutcome::CreatedConcurrently => {
            tracing::info!("User record was created by a concurrent request");
        }
    }

    Ok(provisioned.account_id.into_inner())
}
