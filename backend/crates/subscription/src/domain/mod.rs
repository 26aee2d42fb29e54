//! Domain Layer

pub mod entities;
pub mod repository;

// Re-exports
pub use entities::{Plan, Subscription, SubscriptionStatus};
pub use repository::{SubscriptionGate, SubscriptionRepository};
