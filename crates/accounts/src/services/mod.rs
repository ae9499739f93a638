//! Business logic services.
//!
//! # Services
//!
//! - `provisioning` - Directory lookup, OTP issuance, and record creation

pub mod provisioning;

pub use provisioning::{
    Provisioned, ProvisioningError, ProvisioningService, ProvisioningStage, RecordOutcome,
};
