//! Subscription Status Use Case

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::entities::Subscription;
use crate::domain::repository::SubscriptionRepository;
use crate::error::{SubscriptionError, SubscriptionResult};

/// Subscription status use case
pub struct SubscriptionStatusUseCase<R>
where
    R: SubscriptionRepository,
{
    repo: Arc<R>,
}

impl<R> SubscriptionStatusUseCase<R>
where
    R: SubscriptionRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user_id: Uuid) -> SubscriptionResult<Subscription> {
        self.repo
            .find_by_user(user_id)
            .await?
            .ok_or(SubscriptionError::NotFound)
    }
}
