//! Forgot Password Use Case
//!
//! Runs the reset-attempt lockout machine, issues a one-time reset token,
//! and delivers the reset link out-of-band.
//!
//! The handler responds with the same success shape whether or not the
//! identifier matched an account; only lockout/throttle failures surface.
//! Every state transition is persisted before the notifier runs, so a
//! delivery failure can never corrupt reset state.

use std::sync::Arc;

use chrono::Utc;

use platform::mailer::Mailer;

use crate::application::config::AuthConfig;
use crate::domain::entity::credentials::ResetAttemptOutcome;
use crate::domain::repository::{CredentialsRepository, UserRepository};
use crate::domain::value_object::{email::Email, user_name::UserName};
use crate::error::{AuthError, AuthResult};

/// Forgot password use case
pub struct ForgotPasswordUseCase<U, C, M>
where
    U: UserRepository,
    C: CredentialsRepository,
    M: Mailer,
{
    user_repo: Arc<U>,
    credentials_repo: Arc<C>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<U, C, M> ForgotPasswordUseCase<U, C, M>
where
    U: UserRepository,
    C: CredentialsRepository,
    M: Mailer,
{
    pub fn new(
        user_repo: Arc<U>,
        credentials_repo: Arc<C>,
        mailer: Arc<M>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            credentials_repo,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, identifier: &str) -> AuthResult<()> {
        let now = Utc::now();

        // Look up by email or user name; unknown identifiers are a silent
        // success so account existence is never revealed.
        let user = if identifier.contains('@') {
            match Email::new(identifier) {
                Ok(email) => self.user_repo.find_by_email(&email).await?,
                Err(_) => None,
            }
        } else {
            match UserName::new(identifier) {
                Ok(user_name) => self.user_repo.find_by_user_name(&user_name).await?,
                Err(_) => None,
            }
        };

        let Some(user) = user else {
            tracing::debug!("Forgot-password request for unknown identifier");
            return Ok(());
        };

        let mut credentials = self
            .credentials_repo
            .find_by_user_id(&user.user_id)
            .await?
            .ok_or_else(|| AuthError::Internal("Credentials not found".to_string()))?;

        // Lockout state machine; a fresh lock must be durable before we fail.
        match credentials.begin_reset_attempt(now) {
            ResetAttemptOutcome::AlreadyLocked => {
                return Err(AuthError::AccountLocked);
            }
            ResetAttemptOutcome::LockedNow => {
                self.credentials_repo.update(&credentials).await?;
                return Err(AuthError::TooManyResetAttempts);
            }
            ResetAttemptOutcome::Allowed => {}
        }

        // Issue the token and persist BEFORE attempting delivery.
        let secret = credentials.issue_reset_token(now);
        self.credentials_repo.update(&credentials).await?;

        tracing::info!(
            public_id = %user.public_id,
            attempts = credentials.password_reset_attempts,
            "Password reset token issued"
        );

        // Fire-and-forget delivery; the token is already durable.
        let reset_link = self.config.reset_link(&secret);
        let body = format!(
            "Hello {},\n\n\
             A password reset was requested for your account. Use the link\n\
             below within one hour to choose a new password:\n\n\
             {}\n\n\
             If you did not request this, you can ignore this email.",
            user.user_name, reset_link
        );

        if let Err(e) = self
            .mailer
            .send(user.email.as_str(), "Reset your password", &body)
            .await
        {
            tracing::warn!(error = %e, "Failed to deliver reset email");
        }

        Ok(())
    }
}
