//! Courses Routers
//!
//! Two routers: the public catalog (list, detail) and the authenticated
//! progress surface. The composition root layers the auth middleware on the
//! protected router and merges both under /api/courses.

use axum::{
    Router,
    routing::{get, post, put},
};

use subscription::SubscriptionGate;

use crate::presentation::handlers::{self, CourseAppState, CourseRepo};

/// Public catalog routes
pub fn courses_public_router<R, G>(state: CourseAppState<R, G>) -> Router
where
    R: CourseRepo,
    G: SubscriptionGate + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(handlers::list_courses::<R, G>))
        .route("/{course_id}", get(handlers::get_course::<R, G>))
        .with_state(state)
}

/// Authenticated progress routes; expects the auth middleware on top
pub fn courses_protected_router<R, G>(state: CourseAppState<R, G>) -> Router
where
    R: CourseRepo,
    G: SubscriptionGate + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/mine", get(handlers::user_courses::<R, G>))
        .route("/{course_id}/start", post(handlers::start_course::<R, G>))
        .route(
            "/{course_id}/progress",
            put(handlers::update_progress::<R, G>).get(handlers::get_progress::<R, G>),
        )
        .route("/{course_id}/retake", post(handlers::retake_course::<R, G>))
        .with_state(state)
}
