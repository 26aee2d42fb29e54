//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::Subscription;
use crate::error::SubscriptionResult;

/// Subscription repository trait
#[trait_variant::make(SubscriptionRepository: Send)]
pub trait LocalSubscriptionRepository {
    /// Create a new subscription
    async fn create(&self, subscription: &Subscription) -> SubscriptionResult<()>;

    /// Find the user's subscription row (one per user), if any
    async fn find_by_user(&self, user_id: Uuid) -> SubscriptionResult<Option<Subscription>>;

    /// Update a subscription
    async fn update(&self, subscription: &Subscription) -> SubscriptionResult<()>;

    /// Flip Active rows whose end date has passed to Expired.
    /// Returns the number of rows changed. Run as startup maintenance.
    async fn expire_overdue(&self, now: DateTime<Utc>) -> SubscriptionResult<u64>;

    /// Email address of the subscribing user (for cancellation notices)
    async fn email_of(&self, user_id: Uuid) -> SubscriptionResult<Option<String>>;
}

/// Boolean access check consulted before course progress can start.
///
/// Kept as its own narrow trait so the courses domain depends on exactly
/// this capability and nothing else from the billing side.
#[trait_variant::make(SubscriptionGate: Send)]
pub trait LocalSubscriptionGate {
    /// True iff the user holds an Active subscription whose window covers now
    async fn has_access(&self, user_id: Uuid) -> SubscriptionResult<bool>;
}
