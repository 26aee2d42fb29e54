//! Subscription Router

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use platform::mailer::Mailer;

use crate::domain::repository::SubscriptionRepository;
use crate::presentation::handlers::{self, SubscriptionAppState};

/// Create the Subscription router for any repository/mailer implementation.
///
/// The composition root must layer the auth middleware on top; every route
/// expects an authenticated [`kernel::principal::Principal`] in extensions.
pub fn subscription_router<R, M>(repo: R, mailer: M) -> Router
where
    R: SubscriptionRepository + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static + Clone,
{
    let state = SubscriptionAppState {
        repo: Arc::new(repo),
        mailer: Arc::new(mailer),
    };

    Router::new()
        .route("/subscribe", post(handlers::subscribe::<R, M>))
        .route("/cancel", post(handlers::cancel::<R, M>))
        .route("/status", get(handlers::status::<R, M>))
        .with_state(state)
}
