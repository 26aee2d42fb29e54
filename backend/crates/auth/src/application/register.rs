//! Register Use Case
//!
//! Creates a new user account with credentials.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::entity::{credentials::Credentials, user::User};
use crate::domain::password_context::check_password_context;
use crate::domain::repository::{CredentialsRepository, UserRepository};
use crate::domain::value_object::{
    email::Email,
    user_name::UserName,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Register input
pub struct RegisterInput {
    pub user_name: String,
    pub email: String,
    pub password: String,
}

/// Register output
pub struct RegisterOutput {
    pub public_id: String,
}

/// Register use case
pub struct RegisterUseCase<U, C>
where
    U: UserRepository,
    C: CredentialsRepository,
{
    user_repo: Arc<U>,
    credentials_repo: Arc<C>,
    config: Arc<AuthConfig>,
}

impl<U, C> RegisterUseCase<U, C>
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

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<RegisterOutput> {
        // Validate identity fields
        let user_name = UserName::new(&input.user_name)
            .map_err(|e| AuthError::InvalidInput(e.to_string()))?;

        let email =
            Email::new(&input.email).map_err(|e| AuthError::InvalidInput(e.message().to_string()))?;

        // Contextual strength rules before the platform policy
        check_password_context(&input.password, user_name.canonical(), &email)
            .map_err(|e| AuthError::WeakPassword(e.to_string()))?;

        // Platform policy + hashing
        let raw_password = RawPassword::new(input.password)
            .map_err(|e| AuthError::PasswordValidation(e.to_string()))?;

        // Breach check is best-effort: a positive hit rejects, an API failure
        // only logs.
        if self.config.check_password_breach {
            match raw_password.is_compromised().await {
                Ok(true) => {
                    return Err(AuthError::WeakPassword(
                        "password appears in a known data breach".to_string(),
                    ));
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Password breach check unavailable");
                }
            }
        }

        // Uniqueness checks
        if self.user_repo.exists_by_user_name(&user_name).await? {
            return Err(AuthError::UserNameTaken);
        }
        if self.user_repo.exists_by_email(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = UserPassword::from_raw(&raw_password, self.config.pepper())
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        // Create user + credentials
        let user = User::new(user_name, email);
        let credentials = Credentials::new(user.user_id, password_hash);

        self.user_repo.create(&user).await?;
        self.credentials_repo.create(&credentials).await?;

        tracing::info!(
            public_id = %user.public_id,
            user_name = %user.user_name,
            "User registered"
        );

        Ok(RegisterOutput {
            public_id: user.public_id.to_string(),
        })
    }
}
