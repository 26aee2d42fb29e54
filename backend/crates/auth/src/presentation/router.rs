//! Auth Router

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use platform::mailer::Mailer;

use crate::application::config::AuthConfig;
use crate::presentation::handlers::{self, AuthAppState, AuthRepo};

/// Create the Auth router for any repository/mailer implementation
pub fn auth_router<R, M>(repo: R, mailer: M, config: AuthConfig) -> Router
where
    R: AuthRepo,
    M: Mailer + Send + Sync + 'static + Clone,
{
    let state = AuthAppState {
        repo: Arc::new(repo),
        mailer: Arc::new(mailer),
        config: Arc::new(config),
    };

    Router::new()
        .route("/register", post(handlers::register::<R, M>))
        .route("/login", post(handlers::login::<R, M>))
        .route("/logout", post(handlers::logout::<R, M>))
        .route("/forgot-password", post(handlers::forgot_password::<R, M>))
        .route("/reset-password", post(handlers::reset_password::<R, M>))
        .route("/status", get(handlers::session_status::<R, M>))
        .with_state(state)
}
