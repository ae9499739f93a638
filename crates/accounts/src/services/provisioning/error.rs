//! Provisioning error types.

use std::fmt;

use thiserror::Error;

use stashbox_core::{EmailError, FullNameError};

use crate::directory::DirectoryError;
use crate::otp::OtpError;

/// Where in the provisioning sequence a call is, or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningStage {
    /// Parsing the caller's input.
    Input,
    /// Looking up an existing record by email.
    Lookup,
    /// Issuing the email OTP.
    OtpIssuance,
    /// Creating the user record.
    RecordCreation,
}

impl ProvisioningStage {
    /// Stable name used in logs and span fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Lookup => "lookup",
            Self::OtpIssuance => "otp_issuance",
            Self::RecordCreation => "record_creation",
        }
    }
}

impl fmt::Display for ProvisioningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while provisioning an account.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Invalid full name.
    #[error("invalid full name: {0}")]
    InvalidFullName(#[from] FullNameError),

    /// The directory lookup failed.
    #[error("user lookup failed: {0}")]
    Lookup(#[source] DirectoryError),

    /// The OTP issuer failed.
    #[error("failed to send an OTP")]
    OtpIssuance(#[source] OtpError),

    /// The OTP issuer answered without a usable user ID.
    #[error("failed to send an OTP")]
    MissingAccountId,

    /// Creating the user record failed. The OTP has already been sent.
    #[error("failed to create user record: {0}")]
    RecordCreation(#[source] DirectoryError),
}

impl ProvisioningError {
    /// The stage this error was raised in.
    #[must_use]
    pub const fn stage(&self) -> ProvisioningStage {
        match self {
            Self::InvalidEmail(_) | Self::InvalidFullName(_) => ProvisioningStage::Input,
            Self::Lookup(_) => ProvisioningStage::Lookup,
            Self::OtpIssuance(_) | Self::MissingAccountId => ProvisioningStage::OtpIssuance,
            Self::RecordCreation(_) => ProvisioningStage::RecordCreation,
        }
    }
}
