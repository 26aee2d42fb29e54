//! Reset Password Use Case
//!
//! Consumes a reset token: digest lookup with expiry enforced by the store,
//! contextual strength checks against the account's identity, then a single
//! durable write that installs the new hash and clears all reset state.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::domain::entity::credentials::Credentials;
use crate::domain::password_context::check_password_context;
use crate::domain::repository::{CredentialsRepository, UserRepository};
use crate::domain::value_object::user_password::{RawPassword, UserPassword};
use crate::error::{AuthError, AuthResult};

/// Reset password use case
pub struct ResetPasswordUseCase<U, C>
where
    U: UserRepository,
    C: CredentialsRepository,
{
    user_repo: Arc<U>,
    credentials_repo: Arc<C>,
    config: Arc<AuthConfig>,
}

impl<U, C> ResetPasswordUseCase<U, C>
where
    U: UserRepository,
    C: CredentialsRepository,
{
    pub fn new(user_repo: Arc<U>, credentials_repo: Arc<C>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            credentials_repo,
            config,
        }
    }

    pub async fn execute(&self, token: &str, new_password: String) -> AuthResult<()> {
        let now = Utc::now();

        // The store matches digest AND expiry; an expired token with a
        // matching digest is indistinguishable from an unknown one.
        let digest = Credentials::digest_token(token);
        let mut credentials = self
            .credentials_repo
            .find_by_reset_digest(&digest, now)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        let user = self
            .user_repo
            .find_by_id(&credentials.user_id)
            .await?
            .ok_or_else(|| AuthError::Internal("User not found for credentials".to_string()))?;

        // Contextual rules first (weak keywords, username, email local part)
        check_password_context(&new_password, user.user_name.canonical(), &user.email)
            .map_err(|e| AuthError::WeakPassword(e.to_string()))?;

        // Platform policy + hashing
        let raw_password = RawPassword::new(new_password)
            .map_err(|e| AuthError::PasswordValidation(e.to_string()))?;
        let password_hash = UserPassword::from_raw(&raw_password, self.config.pepper())
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        credentials.complete_reset(password_hash, now);
        self.credentials_repo.update(&credentials).await?;

        tracing::info!(
            public_id = %user.public_id,
            "Password reset completed"
        );

        Ok(())
    }
}
