//! Full name type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`FullName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FullNameError {
    /// The input is empty after trimming.
    #[error("full name cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("full name must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length in characters.
        max: usize,
    },
    /// The input contains control characters (newlines, tabs, NUL, ...).
    #[error("full name cannot contain control characters")]
    ControlCharacter,
}

/// A person's display name as supplied at sign-up.
///
/// Surrounding whitespace is trimmed. The name is stored as given otherwise;
/// no attempt is made to split it into given/family parts.
///
/// ```
/// use stashbox_core::FullName;
///
/// let name = FullName::parse("  Ada Lovelace ").unwrap();
/// assert_eq!(name.as_str(), "Ada Lovelace");
/// assert!(FullName::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct FullName(String);

impl FullName {
    /// Maximum length of a full name, in characters.
    pub const MAX_LENGTH: usize = 128;

    /// Parse a `FullName`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than
    /// [`FullName::MAX_LENGTH`] characters, or contains control characters.
    pub fn parse(s: &str) -> Result<Self, FullNameError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(FullNameError::Empty);
        }

        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(FullNameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if trimmed.chars().any(char::is_control) {
            return Err(FullNameError::ControlCharacter);
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `FullName` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for FullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FullName {
    type Error = FullNameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<FullName> for String {
    fn from(value: FullName) -> Self {
        value.0
    }
}

impl AsRef<str> for FullName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
