//! Auth Session Entity
//!
//! Represents an authenticated user session.
//! Stored in database with cookie-based token reference.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::value_object::{public_id::PublicId, user_id::UserId, user_role::UserRole};

/// Auth session entity
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Session ID (UUID v4)
    pub session_id: Uuid,
    /// Reference to User
    pub user_id: UserId,
    /// Public ID for API responses
    pub public_id: PublicId,
    /// User role at session creation
    pub user_role: UserRole,
    /// Session expiration (Unix timestamp ms)
    pub expires_at_ms: i64,
    /// Whether "Remember Me" was checked
    pub remember_me: bool,
    /// Client fingerprint hash (User-Agent based)
    pub client_fingerprint_hash: Vec<u8>,
    /// Client IP (optional, for logging)
    pub client_ip: Option<String>,
    /// User agent string (for session management display)
    pub user_agent: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last activity timestamp
    pub last_activity_at: DateTime<Utc>,
}

impl AuthSession {
    /// Create a new auth session
    ///
    /// TTL is provided by the application layer (config), not hard-coded here.
    pub fn new(
        user_id: UserId,
        public_id: PublicId,
        user_role: UserRole,
        remember_me: bool,
        fingerprint_hash: Vec<u8>,
        client_ip: Option<String>,
        user_agent: Option<String>,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            session_id: Uuid::new_v4(),
            user_id,
            public_id,
            user_role,
            expires_at_ms: (now + ttl).timestamp_millis(),
            remember_me,
            client_fingerprint_hash: fingerprint_hash,
            client_ip,
            user_agent,
            created_at: now,
            last_activity_at: now,
        }
    }

    /// Check if session has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires_at_ms
    }

    /// Update last activity timestamp
    pub fn touch(&mut self) {
        self.last_activity_at = Utc::now();
    }

    /// Extend session if "Remember Me" is enabled
    ///
    /// Only applies to remember_me sessions; extends to (now + ttl_long)
    /// when less than half of ttl_long remains.
    pub fn extend_if_needed(&mut self, ttl_long: Duration) {
        if !self.remember_me {
            return;
        }

        let now = Utc::now();
        if self.expires_at_ms < (now + (ttl_long / 2)).timestamp_millis() {
            self.expires_at_ms = (now + ttl_long).timestamp_millis();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(remember_me: bool, ttl: Duration) -> AuthSession {
        AuthSession::new(
            UserId::new(),
            PublicId::new(),
            UserRole::User,
            remember_me,
            vec![0u8; 32],
            None,
            Some("test-agent".to_string()),
            ttl,
        )
    }

    #[test]
    fn test_fresh_session_not_expired() {
        let s = session(false, Duration::hours(12));
        assert!(!s.is_expired());
    }

    #[test]
    fn test_expired_session() {
        let s = session(false, Duration::seconds(-1));
        assert!(s.is_expired());
    }

    #[test]
    fn test_extend_only_remember_me() {
        let ttl_long = Duration::days(30);

        let mut plain = session(false, Duration::hours(1));
        let before = plain.expires_at_ms;
        plain.extend_if_needed(ttl_long);
        assert_eq!(plain.expires_at_ms, before);

        let mut remembered = session(true, Duration::hours(1));
        remembered.extend_if_needed(ttl_long);
        assert!(remembered.expires_at_ms > (Utc::now() + Duration::days(29)).timestamp_millis());
    }
}
