//! Avatar reference type and the built-in placeholder image.

use core::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// The placeholder avatar given to every newly provisioned user.
pub const DEFAULT_AVATAR_PNG: &[u8] = include_bytes!("../../assets/default-avatar.png");

/// Errors that can occur when parsing an [`Avatar`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AvatarError {
    /// The input string is empty.
    #[error("avatar cannot be empty")]
    Empty,
    /// The input is neither an http(s) URL nor an image data URI.
    #[error("avatar must be an http(s) URL or a data:image/ URI")]
    UnsupportedScheme,
}

/// A reference to a user's avatar image.
///
/// Either a remote `http(s)://` URL or an inline `data:image/...` URI.
/// The contents are never fetched or decoded here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Avatar(String);

impl Avatar {
    /// Parse an `Avatar` reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or uses an unsupported scheme.
    pub fn parse(s: &str) -> Result<Self, AvatarError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AvatarError::Empty);
        }

        let lower = s.to_ascii_lowercase();
        if lower.starts_with("https://")
            || lower.starts_with("http://")
            || lower.starts_with("data:image/")
        {
            Ok(Self(s.to_owned()))
        } else {
            Err(AvatarError::UnsupportedScheme)
        }
    }

    /// Build an inline data URI from raw PNG bytes.
    #[must_use]
    pub fn from_png(bytes: &[u8]) -> Self {
        Self(format!("data:image/png;base64,{}", STANDARD.encode(bytes)))
    }

    /// Returns the avatar reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Avatar` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Whether this avatar is an inline data URI.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.0.starts_with("data:")
    }
}

impl Default for Avatar {
    /// The built-in placeholder, [`DEFAULT_AVATAR_PNG`], as a data URI.
    fn default() -> Self {
        Self::from_png(DEFAULT_AVATAR_PNG)
    }
}

impl fmt::Display for Avatar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Inline avatars run to kilobytes; keep log lines readable.
        if self.is_inline() {
            f.write_str("<inline image>")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl TryFrom<String> for Avatar {
    type Error = AvatarError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Avatar> for String {
    fn from(value: Avatar) -> Self {
        value.0
    }
}

impl AsRef<str> for Avatar {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
