//! Subscription Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities and repository traits
//! - `application/` - Use cases
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers
//!
//! Billing windows only: Monthly buys 30 days, Yearly buys 450 days
//! (12 months plus a 3 month bonus). One subscription row per user; the
//! [`domain::repository::SubscriptionGate`] trait is the access check the
//! courses domain consults before progress can start.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use domain::repository::SubscriptionGate;
pub use error::{SubscriptionError, SubscriptionResult};
pub use infra::postgres::PgSubscriptionRepository;
pub use presentation::router::subscription_router;

pub mod models {
    pub use crate::domain::entities::*;
    pub use crate::presentation::dto::*;
}

pub mod store {
    pub use crate::infra::postgres::PgSubscriptionRepository as SubscriptionStore;
}

pub mod router {
    pub use crate::presentation::router::*;
}
