//! Course Error Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Course-specific result type alias
pub type CourseResult<T> = Result<T, CourseError>;

/// Course-specific error variants
#[derive(Debug, Error)]
pub enum CourseError {
    /// Course missing or inactive
    #[error("Course not found")]
    CourseNotFound,

    /// Progress requested before the course was started
    #[error("Course not started")]
    CourseNotStarted,

    /// Subscription gate refused access
    #[error("Subscription required to access courses")]
    SubscriptionRequired,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CourseError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            CourseError::CourseNotFound => StatusCode::NOT_FOUND,
            CourseError::CourseNotStarted => StatusCode::BAD_REQUEST,
            CourseError::SubscriptionRequired => StatusCode::FORBIDDEN,
            CourseError::Database(_) | CourseError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            CourseError::CourseNotFound => ErrorKind::NotFound,
            CourseError::CourseNotStarted => ErrorKind::BadRequest,
            CourseError::SubscriptionRequired => ErrorKind::Forbidden,
            CourseError::Database(_) | CourseError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    fn log(&self) {
        match self {
            CourseError::Database(e) => {
                tracing::error!(error = %e, "Course database error");
            }
            CourseError::Internal(msg) => {
                tracing::error!(message = %msg, "Course internal error");
            }
            CourseError::SubscriptionRequired => {
                tracing::debug!("Course access without active subscription");
            }
            _ => {
                tracing::debug!(error = %self, "Course error");
            }
        }
    }
}

impl IntoResponse for CourseError {
    fn into_response(self) -> Response {
        self.log();
        AppError::new(self.kind(), self.to_string()).into_response()
    }
}

/// Gate failures are infrastructure errors from this domain's perspective
impl From<subscription::SubscriptionError> for CourseError {
    fn from(err: subscription::SubscriptionError) -> Self {
        CourseError::Internal(format!("Subscription gate failed: {err}"))
    }
}
