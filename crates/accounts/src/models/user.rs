//! User record domain types.

use chrono::{DateTime, Utc};

use stashbox_core::{AccountId, Avatar, Email, FullName, UserRecordId};

/// A directory entry for one user (domain type).
///
/// Created once on first provisioning and never modified by this service.
/// Apart from `email`, the natural key a lookup matched on, fields hold
/// whatever the store returned. Records written by other tools need not
/// satisfy the rules [`NewUserRecord`] enforces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Store-assigned record ID.
    pub id: String,
    /// User's full name as stored.
    pub full_name: String,
    /// User's email address, the natural key of the directory.
    pub email: Email,
    /// Avatar reference as stored (URL or data URI).
    pub avatar: String,
    /// Account ID returned by the OTP issuer when the record was created.
    ///
    /// `None` for records written by other tools that never went through
    /// provisioning.
    pub account_id: Option<String>,
    /// When the record was created, if the backend reports it.
    pub created_at: Option<DateTime<Utc>>,
}

/// Fields for a record that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserRecord {
    /// User's full name.
    pub full_name: FullName,
    /// User's email address.
    pub email: Email,
    /// Avatar reference.
    pub avatar: Avatar,
    /// Account ID of the OTP challenge issued alongside this record.
    pub account_id: AccountId,
}

impl NewUserRecord {
    /// Turn the new fields into a stored record under `id`.
    #[must_use]
    pub fn into_record(self, id: UserRecordId, created_at: Option<DateTime<Utc>>) -> UserRecord {
        UserRecord {
            id: id.into(),
            full_name: self.full_name.into_inner(),
            email: self.email,
            avatar: self.avatar.into_inner(),
            account_id: Some(self.account_id.into()),
            created_at,
        }
    }
}
