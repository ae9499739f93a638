//! Account provisioning.
//!
//! One call looks up the email in the directory, issues an email OTP, and
//! creates a user record if none existed:
//!
//! ```text
//! START -> LOOKED_UP -> OTP_SENT -> RECORD_CREATED | RECORD_SKIPPED -> DONE
//! ```
//!
//! Any stage can fail, and nothing is retried. The OTP is issued before any
//! write, so a failed issuance never leaves a record behind. A failed
//! create after a successful issuance leaves an orphaned OTP; the caller
//! sees the error.

mod error;

pub use error::{ProvisioningError, ProvisioningStage};

use tracing::{Span, instrument};

use stashbox_core::{AccountId, Avatar, Email, FullName};

use crate::directory::{DirectoryError, DirectoryStore, UserDirectory};
use crate::models::{NewUserRecord, UserRecord};
use crate::otp::OtpIssuer;

/// What happened to the user record during provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// No record existed; this call created one.
    Created(UserRecord),
    /// A record already existed and was left untouched.
    Existing(UserRecord),
    /// No record existed at lookup, but a concurrent call created one first.
    CreatedConcurrently,
}

/// Result of a successful provisioning call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    /// The issuer's user ID for the OTP challenge.
    pub account_id: AccountId,
    /// What happened to the user record.
    pub record: RecordOutcome,
}

/// Account provisioning service.
pub struct ProvisioningService<'a> {
    directory: UserDirectory<'a>,
    issuer: &'a dyn OtpIssuer,
    default_avatar: &'a Avatar,
}

impl<'a> ProvisioningService<'a> {
    /// Create a new provisioning service.
    #[must_use]
    pub const fn new(
        store: &'a dyn DirectoryStore,
        issuer: &'a dyn OtpIssuer,
        default_avatar: &'a Avatar,
    ) -> Self {
        Self {
            directory: UserDirectory::new(store),
            issuer,
            default_avatar,
        }
    }

    /// Provision an account from raw input.
    ///
    /// The email is matched exactly as given; normalize it first if needed.
    ///
    /// # Errors
    ///
    /// Returns `ProvisioningError::InvalidFullName` or `InvalidEmail` before
    /// any remote call if the input does not parse, otherwise whatever
    /// [`Self::provision`] returns.
    pub async fn create_account(
        &self,
        full_name: &str,
        email: &str,
    ) -> Result<Provisioned, ProvisioningError> {
        let full_name = FullName::parse(full_name)?;
        let email = Email::parse(email)?;
        self.provision(full_name, email).await
    }

    /// Provision an account: look up, issue an OTP, create the record if new.
    ///
    /// # Errors
    ///
    /// Returns `ProvisioningError::Lookup` if the directory lookup fails.
    /// Returns `ProvisioningError::OtpIssuance` or `MissingAccountId` if no
    /// OTP could be sent. No record is created in either case.
    /// Returns `ProvisioningError::RecordCreation` if the record cannot be
    /// written after the OTP was sent.
    #[instrument(skip_all, fields(email = %email, stage = tracing::field::Empty))]
    pub async fn provision(
        &self,
        full_name: FullName,
        email: Email,
    ) -> Result<Provisioned, ProvisioningError> {
        enter(ProvisioningStage::Lookup);
        let existing = self.directory.find_by_email(&email).await.map_err(|e| {
            tracing::error!(error = %e, "user lookup failed");
            ProvisioningError::Lookup(e)
        })?;

        enter(ProvisioningStage::OtpIssuance);
        let token = self
            .issuer
            .create_email_token(&AccountId::unique(), &email)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "failed to send an OTP");
                ProvisioningError::OtpIssuance(e)
            })?;

        let account_id = AccountId::parse(&token.user_id).map_err(|e| {
            tracing::error!(
                error = %e,
                token_id = %token.id,
                "OTP issuer returned no usable user id"
            );
            ProvisioningError::MissingAccountId
        })?;

        let record = match existing {
            Some(record) => {
                tracing::info!(
                    record_id = %record.id,
                    account_id = %account_id,
                    "user record exists, OTP sent"
                );
                RecordOutcome::Existing(record)
            }
            None => {
                enter(ProvisioningStage::RecordCreation);
                self.create_record(full_name, email, &account_id).await?
            }
        };

        Ok(Provisioned { account_id, record })
    }

    async fn create_record(
        &self,
        full_name: FullName,
        email: Email,
        account_id: &AccountId,
    ) -> Result<RecordOutcome, ProvisioningError> {
        let new_record = NewUserRecord {
            full_name,
            email,
            avatar: self.default_avatar.clone(),
            account_id: account_id.clone(),
        };

        match self.directory.create(new_record).await {
            Ok(record) => {
                tracing::info!(
                    record_id = %record.id,
                    account_id = %account_id,
                    "user record created, OTP sent"
                );
                Ok(RecordOutcome::Created(record))
            }
            Err(DirectoryError::Conflict(reason)) => {
                tracing::warn!(
                    account_id = %account_id,
                    reason = %reason,
                    "user record created concurrently, skipping"
                );
                Ok(RecordOutcome::CreatedConcurrently)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    account_id = %account_id,
                    "failed to create user record after OTP was sent"
                );
                Err(ProvisioningError::RecordCreation(e))
            }
        }
    }
}

fn enter(stage: ProvisioningStage) {
    Span::current().record("stage", stage.as_str());
}
