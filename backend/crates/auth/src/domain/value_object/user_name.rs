//! User Name Value Object
//!
//! The user name is the public handle used for login, display, and search.
//!
//! ## Invariants
//! - Length: 3 to 30 characters (after NFKC normalization and trim)
//! - ASCII letters, digits, and `_ . -` only
//! - Starts and ends with a letter, digit, or `_`
//! - No consecutive dots, no whitespace, at least one alphanumeric
//! - Not a reserved word
//!
//! Mixed-case input is accepted; the canonical (lowercase) form is what
//! uniqueness and lookups key on.

use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// Constants
// ============================================================================

/// Minimum length for user name (in characters)
pub const USER_NAME_MIN_LENGTH: usize = 3;

/// Maximum length for user name (in characters)
pub const USER_NAME_MAX_LENGTH: usize = 30;

/// Allowed special characters in user name
const ALLOWED_SPECIAL_CHARS: &[char] = &['_', '.', '-'];

/// Reserved words that cannot be used as user names
const RESERVED_WORDS: &[&str] = &[
    // System/Admin
    "admin",
    "administrator",
    "root",
    "system",
    "moderator",
    "staff",
    "support",
    "help",
    // API/Routing
    "api",
    "auth",
    "login",
    "logout",
    "register",
    "password",
    "reset",
    "verify",
    "subscribe",
    "courses",
    // Resources
    "user",
    "users",
    "account",
    "profile",
    "settings",
    "dashboard",
    // Common reserved
    "www",
    "mail",
    "test",
    "demo",
    "null",
    "undefined",
    "anonymous",
    "guest",
    "me",
    "self",
    "official",
    "bot",
];

// ============================================================================
// Error Types
// ============================================================================

/// Error returned when user name validation fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserNameError {
    /// User name is empty after normalization
    Empty,

    /// User name is too short
    TooShort { length: usize, min: usize },

    /// User name is too long
    TooLong { length: usize, max: usize },

    /// User name contains an invalid character
    InvalidCharacter { char: char, position: usize },

    /// User name starts with an invalid character
    InvalidStart { char: char },

    /// User name ends with an invalid character
    InvalidEnd { char: char },

    /// User name contains consecutive dots (..)
    ConsecutiveDots,

    /// User name contains no alphanumeric characters
    NoAlphanumeric,

    /// User name is a reserved word
    Reserved { word: String },
}

impl fmt::Display for UserNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "User name cannot be empty"),
            Self::TooShort { length, min } => {
                write!(f, "User name is too short ({length} chars, minimum {min})")
            }
            Self::TooLong { length, max } => {
                write!(f, "User name is too long ({length} chars, maximum {max})")
            }
            Self::InvalidCharacter { char, position } => {
                write!(
                    f,
                    "Invalid character '{char}' at position {position}. Only a-z, 0-9, _, ., - are allowed"
                )
            }
            Self::InvalidStart { char } => {
                write!(
                    f,
                    "User name cannot start with '{char}'. Must start with a-z, 0-9, or _"
                )
            }
            Self::InvalidEnd { char } => {
                write!(
                    f,
                    "User name cannot end with '{char}'. Must end with a-z, 0-9, or _"
                )
            }
            Self::ConsecutiveDots => {
                write!(f, "User name cannot contain consecutive dots (..)")
            }
            Self::NoAlphanumeric => {
                write!(f, "User name must contain at least one letter or digit")
            }
            Self::Reserved { word } => {
                write!(f, "'{word}' is a reserved user name")
            }
        }
    }
}

impl std::error::Error for UserNameError {}

// ============================================================================
// UserName Value Object
// ============================================================================

/// Validated, normalized user name
///
/// # Storage
/// - `original`: The user's input (trimmed, NFKC normalized, preserves case)
/// - `canonical`: Lowercase form for uniqueness checks and lookups
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName {
    /// Original user input (preserves case)
    original: String,
    /// Canonical form (lowercase) for uniqueness
    canonical: String,
}

impl UserName {
    /// Create a new UserName from raw input
    ///
    /// Applies normalization (NFKC, trim) and validates; preserves case in
    /// the original, stores lowercase in the canonical form.
    pub fn new(input: impl AsRef<str>) -> Result<Self, UserNameError> {
        let original: String = input.as_ref().nfkc().collect::<String>().trim().to_string();
        let canonical = original.to_lowercase();
        Self::validate(&canonical)?;
        Ok(Self {
            original,
            canonical,
        })
    }

    /// Get the original user name (preserves case)
    #[inline]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Get the canonical (normalized, lowercase) user name
    #[inline]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Alias for canonical()
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Create from database values (assumes already validated)
    pub fn from_db(original: &str) -> Self {
        Self {
            original: original.to_string(),
            canonical: original.to_lowercase(),
        }
    }

    /// Validate the canonical user name
    fn validate(canonical: &str) -> Result<(), UserNameError> {
        if canonical.is_empty() {
            return Err(UserNameError::Empty);
        }

        let length = canonical.chars().count();
        if length < USER_NAME_MIN_LENGTH {
            return Err(UserNameError::TooShort {
                length,
                min: USER_NAME_MIN_LENGTH,
            });
        }
        if length > USER_NAME_MAX_LENGTH {
            return Err(UserNameError::TooLong {
                length,
                max: USER_NAME_MAX_LENGTH,
            });
        }

        for (position, ch) in canonical.chars().enumerate() {
            let allowed = ch.is_ascii_lowercase()
                || ch.is_ascii_digit()
                || ALLOWED_SPECIAL_CHARS.contains(&ch);
            if !allowed {
                return Err(UserNameError::InvalidCharacter { char: ch, position });
            }
        }

        let first = canonical.chars().next().unwrap();
        if !(first.is_ascii_alphanumeric() || first == '_') {
            return Err(UserNameError::InvalidStart { char: first });
        }

        let last = canonical.chars().last().unwrap();
        if !(last.is_ascii_alphanumeric() || last == '_') {
            return Err(UserNameError::InvalidEnd { char: last });
        }

        if canonical.contains("..") {
            return Err(UserNameError::ConsecutiveDots);
        }

        if !canonical.chars().any(|c| c.is_ascii_alphanumeric()) {
            return Err(UserNameError::NoAlphanumeric);
        }

        if RESERVED_WORDS.contains(&canonical) {
            return Err(UserNameError::Reserved {
                word: canonical.to_string(),
            });
        }

        Ok(())
    }
}

impl fmt::Debug for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserName({})", self.original)
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

impl TryFrom<String> for UserName {
    type Error = UserNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserName> for String {
    fn from(value: UserName) -> Self {
        value.original
    }
}
