//! Sign In Use Case
//!
//! Authenticates a user and creates a session.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::application::session_token;
use crate::domain::entity::auth_session::AuthSession;
use crate::domain::repository::{AuthSessionRepository, CredentialsRepository, UserRepository};
use crate::domain::value_object::{
    email::Email, user_name::UserName, user_password::RawPassword,
};
use crate::error::{AuthError, AuthResult};

/// Re-export ClientFingerprint from platform
pub use platform::client::ClientFingerprint;

/// Sign in input
pub struct SignInInput {
    /// User name or email
    pub identifier: String,
    /// Password
    pub password: String,
    /// Remember me flag
    pub remember_me: bool,
}

/// Sign in output
pub struct SignInOutput {
    /// Session token for cookie
    pub session_token: String,
    /// Public ID
    pub public_id: String,
}

/// Sign in use case
pub struct SignInUseCase<U, C, S>
where
    U: UserRepository,
    C: CredentialsRepository,
    S: AuthSessionRepository,
{
    user_repo: Arc<U>,
    credentials_repo: Arc<C>,
    session_repo: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<U, C, S> SignInUseCase<U, C, S>
where
    U: UserRepository,
    C: CredentialsRepository,
    S: AuthSessionRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        credentials_repo: Arc<C>,
        session_repo: Arc<S>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            credentials_repo,
            session_repo,
            config,
        }
    }

    pub async fn execute(
        &self,
        input: SignInInput,
        fingerprint: ClientFingerprint,
    ) -> AuthResult<SignInOutput> {
        let now = Utc::now();

        // Find by email or user name; shape errors collapse into
        // InvalidCredentials so nothing is leaked.
        let user = if input.identifier.contains('@') {
            let email =
                Email::new(&input.identifier).map_err(|_| AuthError::InvalidCredentials)?;
            self.user_repo.find_by_email(&email).await?
        } else {
            let user_name =
                UserName::new(&input.identifier).map_err(|_| AuthError::InvalidCredentials)?;
            self.user_repo.find_by_user_name(&user_name).await?
        };

        let mut user = user.ok_or(AuthError::InvalidCredentials)?;

        // Verify password first; identifier and password failures must be
        // indistinguishable.
        let mut credentials = self
            .credentials_repo
            .find_by_user_id(&user.user_id)
            .await?
            .ok_or_else(|| AuthError::Internal("Credentials not found".to_string()))?;

        let raw_password =
            RawPassword::new(input.password).map_err(|_| AuthError::InvalidCredentials)?;

        if !credentials
            .password_hash
            .verify(&raw_password, self.config.pepper())
        {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.can_login() {
            return Err(AuthError::AccountDisabled);
        }

        // Reset-machine lock applies to sign in as well
        if credentials.is_locked(now) {
            return Err(AuthError::AccountLocked);
        }

        // A successful login clears any stale lock deadline
        if credentials.locked_until.is_some() {
            credentials.clear_lock(now);
            self.credentials_repo.update(&credentials).await?;
        }

        user.record_login(now);
        self.user_repo.update(&user).await?;

        // Create session
        let ttl = if input.remember_me {
            self.config.session_ttl_long
        } else {
            self.config.session_ttl_short
        };
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| AuthError::Internal(format!("Invalid session TTL: {e}")))?;

        let session = AuthSession::new(
            user.user_id,
            user.public_id,
            user.user_role,
            input.remember_me,
            fingerprint.hash_vec(),
            fingerprint.ip_string(),
            fingerprint.user_agent.clone(),
            ttl,
        );

        self.session_repo.create(&session).await?;

        let session_token = session_token::sign(session.session_id, &self.config.session_secret);

        tracing::info!(
            public_id = %user.public_id,
            session_id = %session.session_id,
            remember_me = input.remember_me,
            "User signed in"
        );

        Ok(SignInOutput {
            session_token,
            public_id: user.public_id.to_string(),
        })
    }
}
