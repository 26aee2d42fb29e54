//! PostgreSQL Repository Implementation

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use kernel::id::SubscriptionId;

use crate::domain::entities::{Plan, Subscription, SubscriptionStatus};
use crate::domain::repository::{SubscriptionGate, SubscriptionRepository};
use crate::error::{SubscriptionError, SubscriptionResult};

/// PostgreSQL-backed subscription repository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Startup maintenance: expire overrun windows
    pub async fn process_expired(&self) -> SubscriptionResult<u64> {
        let changed = SubscriptionRepository::expire_overdue(self, Utc::now()).await?;
        if changed > 0 {
            tracing::info!(expired = changed, "Expired overrun subscriptions");
        }
        Ok(changed)
    }
}

const SUBSCRIPTION_COLUMNS: &str = r#"
    subscription_id,
    user_id,
    plan,
    status,
    start_date,
    end_date,
    cancelled_at,
    cancellation_reason,
    created_at,
    updated_at
"#;

impl SubscriptionRepository for PgSubscriptionRepository {
    async fn create(&self, subscription: &Subscription) -> SubscriptionResult<()> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                subscription_id,
                user_id,
                plan,
                status,
                start_date,
                end_date,
                cancelled_at,
                cancellation_reason,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(subscription.subscription_id.as_uuid())
        .bind(subscription.user_id)
        .bind(subscription.plan.id())
        .bind(subscription.status.id())
        .bind(subscription.start_date)
        .bind(subscription.end_date)
        .bind(subscription.cancelled_at)
        .bind(&subscription.cancellation_reason)
        .bind(subscription.created_at)
        .bind(subscription.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_user(&self, user_id: Uuid) -> SubscriptionResult<Option<Subscription>> {
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_subscription()).transpose()
    }

    async fn update(&self, subscription: &Subscription) -> SubscriptionResult<()> {
        sqlx::query(
            r#"
            UPDATE subscriptions SET
                plan = $2,
                status = $3,
                start_date = $4,
                end_date = $5,
                cancelled_at = $6,
                cancellation_reason = $7,
                updated_at = $8
            WHERE subscription_id = $1
            "#,
        )
        .bind(subscription.subscription_id.as_uuid())
        .bind(subscription.plan.id())
        .bind(subscription.status.id())
        .bind(subscription.start_date)
        .bind(subscription.end_date)
        .bind(subscription.cancelled_at)
        .bind(&subscription.cancellation_reason)
        .bind(subscription.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> SubscriptionResult<u64> {
        let changed = sqlx::query(
            r#"
            UPDATE subscriptions SET
                status = $1,
                updated_at = $2
            WHERE status = $3 AND end_date < $2
            "#,
        )
        .bind(SubscriptionStatus::Expired.id())
        .bind(now)
        .bind(SubscriptionStatus::Active.id())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(changed)
    }

    async fn email_of(&self, user_id: Uuid) -> SubscriptionResult<Option<String>> {
        let email =
            sqlx::query_scalar::<_, String>("SELECT email FROM users WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(email)
    }
}

impl SubscriptionGate for PgSubscriptionRepository {
    async fn has_access(&self, user_id: Uuid) -> SubscriptionResult<bool> {
        let has_access = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM subscriptions
                WHERE user_id = $1 AND status = $2 AND end_date > $3
            )
            "#,
        )
        .bind(user_id)
        .bind(SubscriptionStatus::Active.id())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(has_access)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct SubscriptionRow {
    subscription_id: Uuid,
    user_id: Uuid,
    plan: i16,
    status: i16,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
    cancellation_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SubscriptionRow {
    fn into_subscription(self) -> SubscriptionResult<Subscription> {
        let plan = Plan::from_id(self.plan)
            .ok_or_else(|| SubscriptionError::Internal(format!("Invalid plan id: {}", self.plan)))?;
        let status = SubscriptionStatus::from_id(self.status).ok_or_else(|| {
            SubscriptionError::Internal(format!("Invalid status id: {}", self.status))
        })?;

        Ok(Subscription {
            subscription_id: SubscriptionId::from_uuid(self.subscription_id),
            user_id: self.user_id,
            plan,
            status,
            start_date: self.start_date,
            end_date: self.end_date,
            cancelled_at: self.cancelled_at,
            cancellation_reason: self.cancellation_reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
