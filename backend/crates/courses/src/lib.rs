//! Courses Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits
//! - `application/` - Use cases
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers
//!
//! ## Accrual Model
//! - Progress is tracked per (user, course); completed module/challenge ids
//!   are sets, so repeating work never double-awards
//! - Challenge rewards accrue to BOTH the progress record and the learner's
//!   lifetime totals; the two accumulators are written in one transaction
//! - Reaching exactly 100% completes the course once, bumps the lifetime
//!   completion count, and recomputes the rank
//! - Retake zeroes the progress record; lifetime totals are never rolled back
//! - Starting a course requires an active subscription
//!   ([`subscription::SubscriptionGate`])

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use error::{CourseError, CourseResult};
pub use infra::postgres::PgCourseRepository;
pub use presentation::router::{courses_protected_router, courses_public_router};

pub mod models {
    pub use crate::domain::entities::*;
    pub use crate::domain::value_objects::*;
    pub use crate::presentation::dto::*;
}

pub mod store {
    pub use crate::infra::postgres::PgCourseRepository as CourseStore;
}

pub mod router {
    pub use crate::presentation::router::*;
}
