//! Newtype IDs for document-store identifiers.
//!
//! Directory records and auth accounts are both addressed by short opaque
//! strings. Use the `define_id!` macro to create type-safe wrappers so that a
//! record ID can never be passed where an account ID is expected.

use chrono::Utc;
use rand::Rng;

/// Maximum length of an identifier.
pub const MAX_ID_LENGTH: usize = 36;

/// Number of random hex digits appended to a generated identifier.
const UNIQUE_PADDING: usize = 7;

/// Errors that can occur when parsing an identifier.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input string is empty.
    #[error("id cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("id must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside `[A-Za-z0-9._-]`.
    #[error("id contains invalid character {0:?}")]
    InvalidCharacter(char),
    /// The input starts with `.`, `-` or `_`.
    #[error("id cannot start with a special character")]
    LeadingSpecialCharacter,
}

/// Check that `s` is a well-formed identifier.
///
/// # Errors
///
/// Returns the first rule the input breaks.
pub fn validate_id(s: &str) -> Result<(), IdError> {
    let first = s.chars().next().ok_or(IdError::Empty)?;

    if s.len() > MAX_ID_LENGTH {
        return Err(IdError::TooLong { max: MAX_ID_LENGTH });
    }

    if let Some(bad) = s
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
    {
        return Err(IdError::InvalidCharacter(bad));
    }

    if matches!(first, '.' | '-' | '_') {
        return Err(IdError::LeadingSpecialCharacter);
    }

    Ok(())
}

/// Generate a new unique identifier.
///
/// Layout: Unix seconds in hex, milliseconds as 5 hex digits, then 7 random
/// hex digits. IDs generated later sort after earlier ones (to the
/// millisecond), which keeps document listings roughly in creation order.
#[must_use]
pub fn unique_id() -> String {
    let now = Utc::now();
    let mut id = format!(
        "{:x}{:05x}",
        now.timestamp(),
        now.timestamp_subsec_millis()
    );

    let mut rng = rand::rng();
    for _ in 0..UNIQUE_PADDING {
        let nibble: u32 = rng.random_range(0..16);
        id.push(char::from_digit(nibble, 16).unwrap_or('0'));
    }

    id
}

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` as a plain string (validated on the way in)
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - `parse()`, `unique()`, `as_str()`, `into_inner()`
/// - `Display`, `FromStr`, `TryFrom<String>` and `From<$name> for String`
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use stashbox_core::define_id;
/// define_id!(SessionId);
/// define_id!(DeviceId);
///
/// let session = SessionId::unique();
/// let device = DeviceId::parse("laptop-1").unwrap();
///
/// // These are different types, so this won't compile:
/// // let _: SessionId = device;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse an ID, checking the identifier rules.
            ///
            /// # Errors
            ///
            /// Returns an error if the input is not a well-formed identifier.
            pub fn parse(s: &str) -> ::core::result::Result<Self, $crate::IdError> {
                $crate::types::id::validate_id(s)?;
                Ok(Self(s.to_owned()))
            }

            /// Generate a fresh, unique ID.
            #[must_use]
            pub fn unique() -> Self {
                Self($crate::types::id::unique_id())
            }

            /// Get the ID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl ::core::convert::TryFrom<String> for $name {
            type Error = $crate::IdError;

            fn try_from(s: String) -> ::core::result::Result<Self, Self::Error> {
                $crate::types::id::validate_id(&s)?;
                Ok(Self(s))
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let s = <String as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self::try_from(s)?)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <String as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

// Identifier of a directory entry (`UserRecord`).
define_id!(UserRecordId);
// Identifier handed out by the OTP issuer; the caller's opaque `accountId`.
define_id!(AccountId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_id_shape() {
        let id = unique_id();
        assert_eq!(id.len(), 20);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(validate_id(&id).is_ok());
    }

    #[test]
    fn test_unique_ids_differ() {
        let a = UserRecordId::unique();
        let b = UserRecordId::unique();
        assert_ne!(a, b);
    }

    #[test]
    fn test_validate_rules() {
        assert_eq!(validate_id(""), Err(IdError::Empty));
        assert_eq!(
            validate_id(&"a".repeat(37)),
            Err(IdError::TooLong { max: 36 })
        );
        assert_eq!(validate_id("abc def"), Err(IdError::InvalidCharacter(' ')));
        assert_eq!(validate_id("_abc"), Err(IdError::LeadingSpecialCharacter));
        assert!(validate_id("tok-123").is_ok());
        assert!(validate_id("a.b_c-d").is_ok());
    }

    #[test]
    fn test_parse_and_display() {
        let id = AccountId::parse("tok-123").unwrap();
        assert_eq!(id.to_string(), "tok-123");
        assert_eq!(String::from(id), "tok-123");
    }

    #[test]
    fn test_serde_validates() {
        let id: AccountId = serde_json::from_str("\"tok-123\"").unwrap();
        assert_eq!(id.as_str(), "tok-123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"tok-123\"");

        assert!(serde_json::from_str::<AccountId>("\"\"").is_err());
        assert!(serde_json::from_str::<UserRecordId>("\"-x\"").is_err());
    }
}
