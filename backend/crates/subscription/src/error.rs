//! Subscription Error Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Subscription-specific result type alias
pub type SubscriptionResult<T> = Result<T, SubscriptionError>;

/// Subscription-specific error variants
#[derive(Debug, Error)]
pub enum SubscriptionError {
    /// User already holds an active subscription
    #[error("User already has an active subscription")]
    AlreadySubscribed,

    /// No active subscription to operate on
    #[error("No active subscription found")]
    NoActiveSubscription,

    /// No subscription row at all
    #[error("No subscription found")]
    NotFound,

    /// Unknown plan identifier
    #[error("Unknown subscription plan: {0}")]
    InvalidPlan(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SubscriptionError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            SubscriptionError::AlreadySubscribed => StatusCode::CONFLICT,
            SubscriptionError::NoActiveSubscription | SubscriptionError::NotFound => {
                StatusCode::NOT_FOUND
            }
            SubscriptionError::InvalidPlan(_) => StatusCode::BAD_REQUEST,
            SubscriptionError::Database(_) | SubscriptionError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SubscriptionError::AlreadySubscribed => ErrorKind::Conflict,
            SubscriptionError::NoActiveSubscription | SubscriptionError::NotFound => {
                ErrorKind::NotFound
            }
            SubscriptionError::InvalidPlan(_) => ErrorKind::BadRequest,
            SubscriptionError::Database(_) | SubscriptionError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    fn log(&self) {
        match self {
            SubscriptionError::Database(e) => {
                tracing::error!(error = %e, "Subscription database error");
            }
            SubscriptionError::Internal(msg) => {
                tracing::error!(message = %msg, "Subscription internal error");
            }
            _ => {
                tracing::debug!(error = %self, "Subscription error");
            }
        }
    }
}

impl IntoResponse for SubscriptionError {
    fn into_response(self) -> Response {
        self.log();
        AppError::new(self.kind(), self.to_string()).into_response()
    }
}
