//! Cancel Subscription Use Case

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use platform::mailer::Mailer;

use crate::domain::repository::SubscriptionRepository;
use crate::error::{SubscriptionError, SubscriptionResult};

/// Cancel subscription use case
pub struct CancelSubscriptionUseCase<R, M>
where
    R: SubscriptionRepository,
    M: Mailer,
{
    repo: Arc<R>,
    mailer: Arc<M>,
}

impl<R, M> CancelSubscriptionUseCase<R, M>
where
    R: SubscriptionRepository,
    M: Mailer,
{
    pub fn new(repo: Arc<R>, mailer: Arc<M>) -> Self {
        Self { repo, mailer }
    }

    pub async fn execute(&self, user_id: Uuid, reason: Option<String>) -> SubscriptionResult<()> {
        let now = Utc::now();

        let mut subscription = self
            .repo
            .find_by_user(user_id)
            .await?
            .filter(|s| s.grants_access(now))
            .ok_or(SubscriptionError::NoActiveSubscription)?;

        subscription.cancel(reason, now);
        self.repo.update(&subscription).await?;

        tracing::info!(user_id = %user_id, "Subscription cancelled");

        // Courtesy notice; state is already durable
        if let Some(email) = self.repo.email_of(user_id).await? {
            let body = "Your subscription has been cancelled. Access to courses ends \
                        immediately. We would love to have you back any time."
                .to_string();
            if let Err(e) = self
                .mailer
                .send(&email, "Subscription cancelled", &body)
                .await
            {
                tracing::warn!(error = %e, "Failed to deliver cancellation email");
            }
        }

        Ok(())
    }
}
