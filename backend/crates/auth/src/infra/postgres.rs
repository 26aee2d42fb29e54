//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use nid::Nanoid;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use platform::rate_limit::{RateLimitConfig, RateLimitResult, RateLimitStore};

use crate::domain::entity::{auth_session::AuthSession, credentials::Credentials, user::User};
use crate::domain::repository::{AuthSessionRepository, CredentialsRepository, UserRepository};
use crate::domain::value_object::{
    email::Email, public_id::PublicId, user_id::UserId, user_name::UserName,
    user_password::UserPassword, user_role::UserRole, user_status::UserStatus,
};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Clean up expired sessions and stale rate-limit windows
    pub async fn cleanup_expired(&self) -> AuthResult<(u64, u64)> {
        let now_ms = Utc::now().timestamp_millis();

        let sessions = sqlx::query("DELETE FROM auth_sessions WHERE expires_at_ms < $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        // Windows older than a day can never satisfy another lookup
        let old_window_ms = now_ms - 24 * 3600 * 1000;
        let rate_limits = sqlx::query("DELETE FROM auth_rate_limits WHERE window_start_ms < $1")
            .bind(old_window_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(
            sessions_deleted = sessions,
            rate_limits_deleted = rate_limits,
            "Cleaned up expired auth data"
        );

        Ok((sessions, rate_limits))
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

const USER_COLUMNS: &str = r#"
    user_id,
    public_id,
    user_name,
    user_name_canonical,
    email,
    user_role,
    user_status,
    last_login_at,
    created_at,
    updated_at
"#;

impl UserRepository for PgAuthRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                public_id,
                user_name,
                user_name_canonical,
                email,
                user_role,
                user_status,
                last_login_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.public_id.as_str())
        .bind(user.user_name.original())
        .bind(user.user_name.canonical())
        .bind(user.email.as_str())
        .bind(user.user_role.id())
        .bind(user.user_status.id())
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_public_id(&self, public_id: &PublicId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE public_id = $1"
        ))
        .bind(public_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_user_name(&self, user_name: &UserName) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_name_canonical = $1"
        ))
        .bind(user_name.canonical())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE user_name_canonical = $1)",
        )
        .bind(user_name.canonical())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                user_name = $2,
                user_name_canonical = $3,
                email = $4,
                user_role = $5,
                user_status = $6,
                last_login_at = $7,
                updated_at = $8
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.user_name.original())
        .bind(user.user_name.canonical())
        .bind(user.email.as_str())
        .bind(user.user_role.id())
        .bind(user.user_status.id())
        .bind(user.last_login_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Credentials Repository Implementation
// ============================================================================

const CREDENTIALS_COLUMNS: &str = r#"
    user_id,
    password_hash,
    password_reset_attempts,
    password_reset_last_attempt,
    locked_until,
    password_reset_token,
    password_reset_expires,
    created_at,
    updated_at
"#;

impl CredentialsRepository for PgAuthRepository {
    async fn create(&self, credentials: &Credentials) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_credentials (
                user_id,
                password_hash,
                password_reset_attempts,
                password_reset_last_attempt,
                locked_until,
                password_reset_token,
                password_reset_expires,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(credentials.user_id.as_uuid())
        .bind(credentials.password_hash.as_phc_string())
        .bind(credentials.password_reset_attempts as i16)
        .bind(credentials.password_reset_last_attempt)
        .bind(credentials.locked_until)
        .bind(&credentials.password_reset_token)
        .bind(credentials.password_reset_expires)
        .bind(credentials.created_at)
        .bind(credentials.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<Credentials>> {
        let row = sqlx::query_as::<_, CredentialsRow>(&format!(
            "SELECT {CREDENTIALS_COLUMNS} FROM auth_credentials WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_credentials()).transpose()
    }

    async fn find_by_reset_digest(
        &self,
        digest: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Credentials>> {
        let row = sqlx::query_as::<_, CredentialsRow>(&format!(
            r#"
            SELECT {CREDENTIALS_COLUMNS} FROM auth_credentials
            WHERE password_reset_token = $1 AND password_reset_expires > $2
            "#
        ))
        .bind(digest)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_credentials()).transpose()
    }

    async fn update(&self, credentials: &Credentials) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE auth_credentials SET
                password_hash = $2,
                password_reset_attempts = $3,
                password_reset_last_attempt = $4,
                locked_until = $5,
                password_reset_token = $6,
                password_reset_expires = $7,
                updated_at = $8
            WHERE user_id = $1
            "#,
        )
        .bind(credentials.user_id.as_uuid())
        .bind(credentials.password_hash.as_phc_string())
        .bind(credentials.password_reset_attempts as i16)
        .bind(credentials.password_reset_last_attempt)
        .bind(credentials.locked_until)
        .bind(&credentials.password_reset_token)
        .bind(credentials.password_reset_expires)
        .bind(credentials.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Auth Session Repository Implementation
// ============================================================================

impl AuthSessionRepository for PgAuthRepository {
    async fn create(&self, session: &AuthSession) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_sessions (
                session_id,
                user_id,
                public_id,
                user_role,
                expires_at_ms,
                remember_me,
                client_fingerprint_hash,
                client_ip,
                user_agent,
                created_at,
                last_activity_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(session.session_id)
        .bind(session.user_id.as_uuid())
        .bind(session.public_id.as_str())
        .bind(session.user_role.id())
        .bind(session.expires_at_ms)
        .bind(session.remember_me)
        .bind(&session.client_fingerprint_hash)
        .bind(&session.client_ip)
        .bind(&session.user_agent)
        .bind(session.created_at)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(
        &self,
        session_id: Uuid,
        fingerprint_hash: &[u8],
    ) -> AuthResult<Option<AuthSession>> {
        let now_ms = Utc::now().timestamp_millis();

        let row = sqlx::query_as::<_, AuthSessionRow>(
            r#"
            SELECT
                session_id,
                user_id,
                public_id,
                user_role,
                expires_at_ms,
                remember_me,
                client_fingerprint_hash,
                client_ip,
                user_agent,
                created_at,
                last_activity_at
            FROM auth_sessions
            WHERE session_id = $1 AND expires_at_ms > $2
            "#,
        )
        .bind(session_id)
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => {
                if r.client_fingerprint_hash != fingerprint_hash {
                    tracing::warn!(
                        session_id = %session_id,
                        "Auth session fingerprint mismatch"
                    );
                    return Err(AuthError::SessionFingerprintMismatch);
                }
                Ok(Some(r.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn update(&self, session: &AuthSession) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE auth_sessions SET
                expires_at_ms = $2,
                last_activity_at = $3
            WHERE session_id = $1
            "#,
        )
        .bind(session.session_id)
        .bind(session.expires_at_ms)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, session_id: Uuid) -> AuthResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: &UserId, except: Option<Uuid>) -> AuthResult<u64> {
        let deleted = match except {
            Some(except_id) => {
                sqlx::query("DELETE FROM auth_sessions WHERE user_id = $1 AND session_id != $2")
                    .bind(user_id.as_uuid())
                    .bind(except_id)
                    .execute(&self.pool)
                    .await?
                    .rows_affected()
            }
            None => {
                sqlx::query("DELETE FROM auth_sessions WHERE user_id = $1")
                    .bind(user_id.as_uuid())
                    .execute(&self.pool)
                    .await?
                    .rows_affected()
            }
        };

        Ok(deleted)
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let now_ms = Utc::now().timestamp_millis();

        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE expires_at_ms < $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Rate Limit Store Implementation (fixed window, upsert increment)
// ============================================================================

impl RateLimitStore for PgAuthRepository {
    async fn check_and_increment(
        &self,
        key: &[u8],
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, Box<dyn std::error::Error + Send + Sync>> {
        let now_ms = Utc::now().timestamp_millis();
        let window_ms = config.window_ms();
        let window_start = now_ms - now_ms.rem_euclid(window_ms);

        let row: (i32,) = sqlx::query_as(
            r#"
            INSERT INTO auth_rate_limits (rate_key, window_start_ms, request_count)
            VALUES ($1, $2, 1)
            ON CONFLICT (rate_key, window_start_ms)
            DO UPDATE SET request_count = auth_rate_limits.request_count + 1
            RETURNING request_count
            "#,
        )
        .bind(key)
        .bind(window_start)
        .fetch_one(&self.pool)
        .await?;

        let count = row.0 as u32;
        let allowed = count <= config.max_requests;

        if !allowed {
            tracing::warn!(
                count = count,
                max = config.max_requests,
                "Rate limit exceeded"
            );
        }

        Ok(RateLimitResult {
            allowed,
            remaining: config.max_requests.saturating_sub(count),
            reset_at_ms: window_start + window_ms,
        })
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    public_id: String,
    user_name: String,
    #[allow(dead_code)]
    user_name_canonical: String,
    email: String,
    user_role: i16,
    user_status: i16,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let public_id = PublicId::from_nanoid(
            Nanoid::from_str(&self.public_id)
                .map_err(|e| AuthError::Internal(format!("Invalid public_id: {}", e)))?,
        );

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            public_id,
            user_name: UserName::from_db(&self.user_name),
            email: Email::from_db(self.email),
            user_role: UserRole::from_id(self.user_role),
            user_status: UserStatus::from_id(self.user_status).unwrap_or_default(),
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    user_id: Uuid,
    password_hash: String,
    password_reset_attempts: i16,
    password_reset_last_attempt: Option<DateTime<Utc>>,
    locked_until: Option<DateTime<Utc>>,
    password_reset_token: Option<String>,
    password_reset_expires: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CredentialsRow {
    fn into_credentials(self) -> AuthResult<Credentials> {
        let password_hash = UserPassword::from_phc_string(self.password_hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Credentials {
            user_id: UserId::from_uuid(self.user_id),
            password_hash,
            password_reset_attempts: self.password_reset_attempts.max(0) as u16,
            password_reset_last_attempt: self.password_reset_last_attempt,
            locked_until: self.locked_until,
            password_reset_token: self.password_reset_token,
            password_reset_expires: self.password_reset_expires,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AuthSessionRow {
    session_id: Uuid,
    user_id: Uuid,
    public_id: String,
    user_role: i16,
    expires_at_ms: i64,
    remember_me: bool,
    client_fingerprint_hash: Vec<u8>,
    client_ip: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl AuthSessionRow {
    fn into_session(self) -> AuthResult<AuthSession> {
        let public_id = PublicId::from_nanoid(
            Nanoid::from_str(&self.public_id)
                .map_err(|e| AuthError::Internal(format!("Invalid public_id: {}", e)))?,
        );

        Ok(AuthSession {
            session_id: self.session_id,
            user_id: UserId::from_uuid(self.user_id),
            public_id,
            user_role: UserRole::from_id(self.user_role),
            expires_at_ms: self.expires_at_ms,
            remember_me: self.remember_me,
            client_fingerprint_hash: self.client_fingerprint_hash,
            client_ip: self.client_ip,
            user_agent: self.user_agent,
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
        })
    }
}
