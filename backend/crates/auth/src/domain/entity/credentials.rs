//! Credentials Entity
//!
//! Authentication credentials and the password-reset attempt/lockout state
//! machine. Separated from the User entity to isolate sensitive data.
//!
//! The state machine is deliberately pure: every transition takes an explicit
//! `now` and only mutates the entity. Persistence is a separate, explicit
//! repository call in the application layer, so the window/threshold logic is
//! unit-testable without a clock or a database.

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_object::{user_id::UserId, user_password::UserPassword};
use platform::crypto::{random_bytes, sha256, to_hex};

/// Outcome of a reset-attempt transition
///
/// `LockedNow` means the entity just transitioned into the locked state and
/// MUST be persisted even though the request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetAttemptOutcome {
    /// Attempt admitted and counted
    Allowed,
    /// A previously applied lock is still in force; entity unchanged
    AlreadyLocked,
    /// The threshold was hit on this call; lock applied, persist required
    LockedNow,
}

/// Credentials entity
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Reference to User
    pub user_id: UserId,
    /// Hashed password
    pub password_hash: UserPassword,
    /// Reset attempts within the current 24h window
    pub password_reset_attempts: u16,
    /// Time of the most recent reset attempt
    pub password_reset_last_attempt: Option<DateTime<Utc>>,
    /// Account locked until (set by the reset machine)
    pub locked_until: Option<DateTime<Utc>>,
    /// SHA-256 hex digest of the outstanding reset secret; never the secret
    pub password_reset_token: Option<String>,
    /// Expiry of the outstanding reset token
    pub password_reset_expires: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Credentials {
    /// Reset attempts allowed per window before lockout
    pub const MAX_RESET_ATTEMPTS: u16 = 3;
    /// Sliding attempt window in hours
    pub const ATTEMPT_WINDOW_HOURS: i64 = 24;
    /// Lockout duration in hours
    pub const LOCKOUT_HOURS: i64 = 24;
    /// Reset token lifetime in minutes
    pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;
    /// Random bytes in a reset secret (hex-encoded for delivery)
    pub const RESET_TOKEN_BYTES: usize = 32;

    /// Create new credentials
    pub fn new(user_id: UserId, password_hash: UserPassword) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            password_hash,
            password_reset_attempts: 0,
            password_reset_last_attempt: None,
            locked_until: None,
            password_reset_token: None,
            password_reset_expires: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the account is currently locked
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    /// Admit or refuse a password-reset attempt (the lockout state machine).
    ///
    /// Order matters and is intentional:
    /// 1. A standing lock wins; nothing else is evaluated or mutated.
    /// 2. Window reset happens BEFORE the threshold check, so the first
    ///    attempt after a window boundary always starts a fresh count and is
    ///    never itself blocked.
    /// 3. At the threshold, the lock is applied and the caller must persist.
    /// 4. Otherwise the attempt is counted.
    pub fn begin_reset_attempt(&mut self, now: DateTime<Utc>) -> ResetAttemptOutcome {
        if self.is_locked(now) {
            return ResetAttemptOutcome::AlreadyLocked;
        }

        // Step 1: sliding-window reset
        let window_start = now - Duration::hours(Self::ATTEMPT_WINDOW_HOURS);
        let window_expired = self
            .password_reset_last_attempt
            .is_none_or(|last| last < window_start);
        if window_expired {
            self.password_reset_attempts = 0;
            self.password_reset_last_attempt = Some(now);
            self.updated_at = now;
        }

        // Step 2: threshold check
        if self.password_reset_attempts >= Self::MAX_RESET_ATTEMPTS {
            self.locked_until = Some(now + Duration::hours(Self::LOCKOUT_HOURS));
            self.updated_at = now;
            return ResetAttemptOutcome::LockedNow;
        }

        self.password_reset_attempts += 1;
        self.password_reset_last_attempt = Some(now);
        self.updated_at = now;
        ResetAttemptOutcome::Allowed
    }

    /// Generate a reset secret, storing only its digest.
    ///
    /// Returns the plaintext secret for out-of-band delivery; the entity
    /// keeps `hex(sha256(secret))` and a 1 hour expiry.
    pub fn issue_reset_token(&mut self, now: DateTime<Utc>) -> String {
        let secret = to_hex(&random_bytes(Self::RESET_TOKEN_BYTES));
        self.password_reset_token = Some(Self::digest_token(&secret));
        self.password_reset_expires =
            Some(now + Duration::minutes(Self::RESET_TOKEN_TTL_MINUTES));
        self.updated_at = now;
        secret
    }

    /// Digest a presented reset secret for storage or lookup
    pub fn digest_token(secret: &str) -> String {
        to_hex(&sha256(secret.as_bytes()))
    }

    /// Complete a successful reset: new password, all reset state cleared.
    pub fn complete_reset(&mut self, new_password: UserPassword, now: DateTime<Utc>) {
        self.password_hash = new_password;
        self.password_reset_token = None;
        self.password_reset_expires = None;
        self.password_reset_attempts = 0;
        self.password_reset_last_attempt = None;
        self.locked_until = None;
        self.updated_at = now;
    }

    /// Clear the lock (a successful login demonstrates account control)
    pub fn clear_lock(&mut self, now: DateTime<Utc>) {
        if self.locked_until.is_some() {
            self.locked_until = None;
            self.updated_at = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_password::{RawPassword, UserPassword};

    fn credentials() -> Credentials {
        let raw = RawPassword::new("Initial#Pass9".to_string()).unwrap();
        let hash = UserPassword::from_raw(&raw, None).unwrap();
        Credentials::new(UserId::new(), hash)
    }

    #[test]
    fn test_three_attempts_then_lock() {
        let mut creds = credentials();
        let now = Utc::now();

        for i in 1..=3 {
            assert_eq!(
                creds.begin_reset_attempt(now),
                ResetAttemptOutcome::Allowed
            );
            assert_eq!(creds.password_reset_attempts, i);
            assert!(!creds.is_locked(now));
        }

        // Fourth attempt in the same window hits the threshold
        assert_eq!(
            creds.begin_reset_attempt(now),
            ResetAttemptOutcome::LockedNow
        );
        assert!(creds.is_locked(now));
        assert_eq!(
            creds.locked_until,
            Some(now + Duration::hours(Credentials::LOCKOUT_HOURS))
        );
    }

    #[test]
    fn test_locked_attempt_does_not_increment() {
        let mut creds = credentials();
        let now = Utc::now();

        for _ in 0..3 {
            creds.begin_reset_attempt(now);
        }
        creds.begin_reset_attempt(now); // applies the lock
        let attempts_when_locked = creds.password_reset_attempts;
        let locked_until = creds.locked_until;

        // While locked: refused, counter and deadline untouched
        assert_eq!(
            creds.begin_reset_attempt(now + Duration::hours(1)),
            ResetAttemptOutcome::AlreadyLocked
        );
        assert_eq!(creds.password_reset_attempts, attempts_when_locked);
        assert_eq!(creds.locked_until, locked_until);
    }

    #[test]
    fn test_window_reset_before_threshold_check() {
        let mut creds = credentials();
        let start = Utc::now();

        for _ in 0..3 {
            assert_eq!(
                creds.begin_reset_attempt(start),
                ResetAttemptOutcome::Allowed
            );
        }
        assert_eq!(creds.password_reset_attempts, 3);

        // 24h + 1s after the last attempt: the window reset runs first, so
        // this succeeds regardless of the prior count and becomes attempt #1.
        let later = start + Duration::hours(24) + Duration::seconds(1);
        assert_eq!(
            creds.begin_reset_attempt(later),
            ResetAttemptOutcome::Allowed
        );
        assert_eq!(creds.password_reset_attempts, 1);
        assert_eq!(creds.password_reset_last_attempt, Some(later));
        assert!(!creds.is_locked(later));
    }

    #[test]
    fn test_exactly_24h_is_not_a_new_window() {
        let mut creds = credentials();
        let start = Utc::now();

        for _ in 0..3 {
            creds.begin_reset_attempt(start);
        }

        // Exactly 24h later: last == now - 24h, which is NOT strictly before
        // the window start, so the old count still applies and the threshold
        // locks the account.
        let boundary = start + Duration::hours(24);
        assert_eq!(
            creds.begin_reset_attempt(boundary),
            ResetAttemptOutcome::LockedNow
        );
        assert!(creds.is_locked(boundary));
    }

    #[test]
    fn test_scenario_two_attempts_one_hour_ago() {
        let mut creds = credentials();
        let earlier = Utc::now() - Duration::hours(1);

        creds.begin_reset_attempt(earlier);
        creds.begin_reset_attempt(earlier);
        assert_eq!(creds.password_reset_attempts, 2);

        // One hour later, still inside the window: succeeds, becomes 3
        let now = earlier + Duration::hours(1);
        assert_eq!(creds.begin_reset_attempt(now), ResetAttemptOutcome::Allowed);
        assert_eq!(creds.password_reset_attempts, 3);
        assert!(!creds.is_locked(now));

        // Next call in the same window: locked for 24h from this moment
        let next = now + Duration::minutes(5);
        assert_eq!(
            creds.begin_reset_attempt(next),
            ResetAttemptOutcome::LockedNow
        );
        assert_eq!(
            creds.locked_until,
            Some(next + Duration::hours(Credentials::LOCKOUT_HOURS))
        );
    }

    #[test]
    fn test_issue_reset_token_stores_digest_only() {
        let mut creds = credentials();
        let now = Utc::now();

        let secret = creds.issue_reset_token(now);

        assert_eq!(secret.len(), Credentials::RESET_TOKEN_BYTES * 2); // hex
        let stored = creds.password_reset_token.as_deref().unwrap();
        assert_ne!(stored, secret);
        assert_eq!(stored, Credentials::digest_token(&secret));
        assert_eq!(
            creds.password_reset_expires,
            Some(now + Duration::minutes(Credentials::RESET_TOKEN_TTL_MINUTES))
        );
    }

    #[test]
    fn test_tokens_are_unique() {
        let mut creds = credentials();
        let now = Utc::now();
        let first = creds.issue_reset_token(now);
        let second = creds.issue_reset_token(now);
        assert_ne!(first, second);
    }

    #[test]
    fn test_complete_reset_clears_all_state() {
        let mut creds = credentials();
        let now = Utc::now();

        for _ in 0..4 {
            creds.begin_reset_attempt(now);
        }
        creds.issue_reset_token(now);

        let raw = RawPassword::new("Brand#New88pass".to_string()).unwrap();
        let new_hash = UserPassword::from_raw(&raw, None).unwrap();
        creds.complete_reset(new_hash, now);

        assert_eq!(creds.password_reset_attempts, 0);
        assert!(creds.password_reset_last_attempt.is_none());
        assert!(creds.password_reset_token.is_none());
        assert!(creds.password_reset_expires.is_none());
        assert!(!creds.is_locked(now));
        assert!(creds.password_hash.verify(&raw, None));
    }

    #[test]
    fn test_lock_expires_naturally() {
        let mut creds = credentials();
        let now = Utc::now();

        for _ in 0..4 {
            creds.begin_reset_attempt(now);
        }
        assert!(creds.is_locked(now));

        let after_lock = now + Duration::hours(Credentials::LOCKOUT_HOURS) + Duration::seconds(1);
        assert!(!creds.is_locked(after_lock));
        // And the next attempt is admitted as a fresh window
        assert_eq!(
            creds.begin_reset_attempt(after_lock),
            ResetAttemptOutcome::Allowed
        );
        assert_eq!(creds.password_reset_attempts, 1);
    }
}
