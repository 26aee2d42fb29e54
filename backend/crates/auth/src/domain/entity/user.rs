//! User Entity
//!
//! Core user identity. Sensitive auth data (password hash, reset/lockout
//! state) lives in the Credentials entity.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{
    email::Email, public_id::PublicId, user_id::UserId, user_name::UserName, user_role::UserRole,
    user_status::UserStatus,
};

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    /// Internal UUID identifier
    pub user_id: UserId,
    /// Public-facing nanoid identifier (URL-safe)
    pub public_id: PublicId,
    /// User name (unique on canonical form, for login and display)
    pub user_name: UserName,
    /// Email address (unique, lowercased)
    pub email: Email,
    /// Role (User, Admin)
    pub user_role: UserRole,
    /// Status (Active, Deactivated)
    pub user_status: UserStatus,
    /// Last successful login time
    pub last_login_at: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user
    pub fn new(user_name: UserName, email: Email) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            public_id: PublicId::new(),
            user_name,
            email,
            user_role: UserRole::default(),
            user_status: UserStatus::default(),
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this account may sign in
    pub fn can_login(&self) -> bool {
        self.user_status.can_login()
    }

    /// Record successful login
    pub fn record_login(&mut self, now: DateTime<Utc>) {
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    /// Deactivate the account (terminal state, never deleted)
    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.user_status = UserStatus::Deactivated;
        self.updated_at = now;
    }
}
