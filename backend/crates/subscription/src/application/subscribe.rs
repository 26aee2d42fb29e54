//! Subscribe Use Case
//!
//! Opens a billing window for a user. One subscription row per user: a
//! lapsed row is replaced in place, an active one is a conflict.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::entities::{Plan, Subscription};
use crate::domain::repository::SubscriptionRepository;
use crate::error::{SubscriptionError, SubscriptionResult};

/// Subscribe use case
pub struct SubscribeUseCase<R>
where
    R: SubscriptionRepository,
{
    repo: Arc<R>,
}

impl<R> SubscribeUseCase<R>
where
    R: SubscriptionRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user_id: Uuid, plan: Plan) -> SubscriptionResult<Subscription> {
        let now = Utc::now();

        let existing = self.repo.find_by_user(user_id).await?;

        if let Some(existing) = &existing {
            if existing.grants_access(now) {
                return Err(SubscriptionError::AlreadySubscribed);
            }
        }

        let subscription = Subscription::new(user_id, plan, now);

        match existing {
            // Reuse the row: the unique constraint on user_id holds
            Some(old) => {
                let mut replacement = subscription.clone();
                replacement.subscription_id = old.subscription_id;
                replacement.created_at = old.created_at;
                self.repo.update(&replacement).await?;

                tracing::info!(
                    user_id = %user_id,
                    plan = plan.code(),
                    "Subscription renewed"
                );
                Ok(replacement)
            }
            None => {
                self.repo.create(&subscription).await?;

                tracing::info!(
                    user_id = %user_id,
                    plan = plan.code(),
                    "Subscription created"
                );
                Ok(subscription)
            }
        }
    }
}
