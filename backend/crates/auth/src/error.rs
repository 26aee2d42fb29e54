//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// User name already exists
    #[error("User name already exists")]
    UserNameTaken,

    /// Email already registered
    #[error("Email already registered")]
    EmailTaken,

    /// Invalid credentials (wrong identifier or password)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Account is locked by the password-reset lockout machine
    #[error("Account is temporarily locked. Please try again later.")]
    AccountLocked,

    /// Too many password reset attempts; lock was just applied
    #[error("Too many password reset attempts. Account locked for 24 hours.")]
    TooManyResetAttempts,

    /// Reset token unknown or past its expiry
    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    /// New password failed the contextual strength rules
    #[error("Password is too weak: {0}")]
    WeakPassword(String),

    /// Account is deactivated
    #[error("Account is deactivated")]
    AccountDisabled,

    /// Session not found or expired
    #[error("Session not found or expired")]
    SessionInvalid,

    /// Session fingerprint mismatch
    #[error("Session fingerprint mismatch")]
    SessionFingerprintMismatch,

    /// Too many requests from this client
    #[error("Too many requests. Please slow down.")]
    RateLimited,

    /// Missing required header
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    /// Invalid input field (username/email shape)
    #[error("{0}")]
    InvalidInput(String),

    /// Password validation error (platform policy)
    #[error("Password validation failed: {0}")]
    PasswordValidation(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::UserNameTaken | AuthError::EmailTaken => StatusCode::CONFLICT,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::AccountLocked | AuthError::TooManyResetAttempts => StatusCode::LOCKED,
            AuthError::InvalidResetToken | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
            AuthError::AccountDisabled => StatusCode::FORBIDDEN,
            AuthError::SessionInvalid | AuthError::SessionFingerprintMismatch => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AuthError::MissingHeader(_)
            | AuthError::InvalidInput(_)
            | AuthError::PasswordValidation(_) => StatusCode::BAD_REQUEST,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::UserNameTaken | AuthError::EmailTaken => ErrorKind::Conflict,
            AuthError::InvalidCredentials
            | AuthError::SessionInvalid
            | AuthError::SessionFingerprintMismatch => ErrorKind::Unauthorized,
            AuthError::AccountLocked | AuthError::TooManyResetAttempts => ErrorKind::Locked,
            AuthError::InvalidResetToken | AuthError::WeakPassword(_) => ErrorKind::BadRequest,
            AuthError::AccountDisabled => ErrorKind::Forbidden,
            AuthError::RateLimited => ErrorKind::TooManyRequests,
            AuthError::MissingHeader(_)
            | AuthError::InvalidInput(_)
            | AuthError::PasswordValidation(_) => ErrorKind::BadRequest,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::AccountLocked => {
                tracing::warn!("Attempt on locked account");
            }
            AuthError::TooManyResetAttempts => {
                tracing::warn!("Reset attempt limit reached, account locked");
            }
            AuthError::SessionFingerprintMismatch => {
                tracing::warn!("Session fingerprint mismatch detected");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<platform::client::FingerprintError> for AuthError {
    fn from(err: platform::client::FingerprintError) -> Self {
        match err {
            platform::client::FingerprintError::MissingHeader(header) => {
                AuthError::MissingHeader(header)
            }
        }
    }
}
