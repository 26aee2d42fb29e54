//! Contextual password rules
//!
//! Rejects new passwords that embed known-weak keywords or the account's own
//! identity. Applied at registration and password reset, before the platform
//! policy hashes anything. All comparisons are case-insensitive substring
//! checks on the raw input.

use crate::domain::value_object::email::Email;

/// Keywords that must not appear anywhere in a password
const WEAK_KEYWORDS: &[&str] = &["password", "secret", "qwerty"];

/// Why a password was rejected by the contextual rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordContextError {
    /// Contains a blocked keyword
    ContainsWeakKeyword(&'static str),
    /// Contains the account's username
    ContainsUserName,
    /// Contains the local part of the account's email
    ContainsEmailLocalPart,
}

impl std::fmt::Display for PasswordContextError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContainsWeakKeyword(word) => {
                write!(f, "password contains the weak keyword '{word}'")
            }
            Self::ContainsUserName => {
                write!(f, "password cannot contain your username")
            }
            Self::ContainsEmailLocalPart => {
                write!(f, "password cannot contain your email address")
            }
        }
    }
}

impl std::error::Error for PasswordContextError {}

/// Check a candidate password against the account's identity.
///
/// `user_name` is expected in canonical (lowercase) form; the candidate and
/// email local part are lowercased here.
pub fn check_password_context(
    candidate: &str,
    user_name: &str,
    email: &Email,
) -> Result<(), PasswordContextError> {
    let lowered = candidate.to_lowercase();

    for keyword in WEAK_KEYWORDS {
        if lowered.contains(keyword) {
            return Err(PasswordContextError::ContainsWeakKeyword(keyword));
        }
    }

    let user_name = user_name.to_lowercase();
    if !user_name.is_empty() && lowered.contains(&user_name) {
        return Err(PasswordContextError::ContainsUserName);
    }

    let local_part = email.local_part().to_lowercase();
    if !local_part.is_empty() && lowered.contains(&local_part) {
        return Err(PasswordContextError::ContainsEmailLocalPart);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(s: &str) -> Email {
        Email::new(s).unwrap()
    }

    #[test]
    fn test_weak_keywords_rejected() {
        let e = email("alice@example.com");
        assert!(matches!(
            check_password_context("myPassword42", "alice", &e),
            Err(PasswordContextError::ContainsWeakKeyword("password"))
        ));
        assert!(matches!(
            check_password_context("topSECRETvalue", "alice", &e),
            Err(PasswordContextError::ContainsWeakKeyword("secret"))
        ));
        assert!(matches!(
            check_password_context("xxQwErTyxx", "alice", &e),
            Err(PasswordContextError::ContainsWeakKeyword("qwerty"))
        ));
    }

    #[test]
    fn test_username_rejected_case_insensitive() {
        let e = email("alice@example.com");
        assert!(matches!(
            check_password_context("GreatALICE2024", "alice", &e),
            Err(PasswordContextError::ContainsUserName)
        ));
    }

    #[test]
    fn test_email_local_part_rejected() {
        let e = email("alice.w@example.com");
        assert!(matches!(
            check_password_context("xAlice.W!2024", "bob", &e),
            Err(PasswordContextError::ContainsEmailLocalPart)
        ));
    }

    #[test]
    fn test_unrelated_password_accepted() {
        let e = email("alice@example.com");
        assert!(check_password_context("Tr4il-Bl@zer-9", "alice", &e).is_ok());
    }
}
