//! Unit tests for the subscription crate
//!
//! Use-case tests run against an in-memory repository; entity tests live in
//! the entities module.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use platform::mailer::{Mailer, MailerError};

use crate::application::{CancelSubscriptionUseCase, SubscribeUseCase, SubscriptionStatusUseCase};
use crate::domain::entities::{Plan, Subscription, SubscriptionStatus};
use crate::domain::repository::{SubscriptionGate, SubscriptionRepository};
use crate::error::{SubscriptionError, SubscriptionResult};

#[derive(Default)]
struct MemSubscriptionStore {
    rows: Mutex<Vec<Subscription>>,
    emails: Mutex<HashMap<Uuid, String>>,
}

impl SubscriptionRepository for MemSubscriptionStore {
    async fn create(&self, subscription: &Subscription) -> SubscriptionResult<()> {
        self.rows.lock().unwrap().push(subscription.clone());
        Ok(())
    }

    async fn find_by_user(&self, user_id: Uuid) -> SubscriptionResult<Option<Subscription>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    async fn update(&self, subscription: &Subscription) -> SubscriptionResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows
            .iter_mut()
            .find(|s| s.subscription_id == subscription.subscription_id)
        {
            *existing = subscription.clone();
        }
        Ok(())
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> SubscriptionResult<u64> {
        let mut rows = self.rows.lock().unwrap();
        let mut changed = 0;
        for row in rows.iter_mut() {
            if row.status == SubscriptionStatus::Active && row.end_date < now {
                row.expire(now);
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn email_of(&self, user_id: Uuid) -> SubscriptionResult<Option<String>> {
        Ok(self.emails.lock().unwrap().get(&user_id).cloned())
    }
}

impl SubscriptionGate for MemSubscriptionStore {
    async fn has_access(&self, user_id: Uuid) -> SubscriptionResult<bool> {
        let now = Utc::now();
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .any(|s| s.user_id == user_id && s.grants_access(now)))
    }
}

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<String>>,
}

impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, _subject: &str, _body: &str) -> Result<(), MailerError> {
        self.sent.lock().unwrap().push(to.to_string());
        Ok(())
    }
}

mod subscribe_tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribe_grants_access() {
        let store = Arc::new(MemSubscriptionStore::default());
        let user_id = Uuid::new_v4();

        let use_case = SubscribeUseCase::new(store.clone());
        let subscription = use_case.execute(user_id, Plan::Monthly).await.unwrap();

        assert_eq!(subscription.status, SubscriptionStatus::Active);
        assert!(store.has_access(user_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_double_subscribe_conflicts() {
        let store = Arc::new(MemSubscriptionStore::default());
        let user_id = Uuid::new_v4();

        let use_case = SubscribeUseCase::new(store.clone());
        use_case.execute(user_id, Plan::Monthly).await.unwrap();

        let result = use_case.execute(user_id, Plan::Yearly).await;
        assert!(matches!(result, Err(SubscriptionError::AlreadySubscribed)));
    }

    #[tokio::test]
    async fn test_resubscribe_after_lapse_reuses_row() {
        let store = Arc::new(MemSubscriptionStore::default());
        let user_id = Uuid::new_v4();

        let use_case = SubscribeUseCase::new(store.clone());
        use_case.execute(user_id, Plan::Monthly).await.unwrap();

        // Simulate the window running out
        {
            let mut rows = store.rows.lock().unwrap();
            rows[0].end_date = Utc::now() - Duration::days(1);
        }
        assert!(!store.has_access(user_id).await.unwrap());

        let renewed = use_case.execute(user_id, Plan::Yearly).await.unwrap();
        assert_eq!(renewed.plan, Plan::Yearly);
        assert_eq!(store.rows.lock().unwrap().len(), 1); // one row per user
        assert!(store.has_access(user_id).await.unwrap());
    }
}

mod cancel_tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_active_subscription() {
        let store = Arc::new(MemSubscriptionStore::default());
        let mailer = Arc::new(RecordingMailer::default());
        let user_id = Uuid::new_v4();
        store
            .emails
            .lock()
            .unwrap()
            .insert(user_id, "user@example.com".to_string());

        SubscribeUseCase::new(store.clone())
            .execute(user_id, Plan::Monthly)
            .await
            .unwrap();

        let use_case = CancelSubscriptionUseCase::new(store.clone(), mailer.clone());
        use_case
            .execute(user_id, Some("moving on".to_string()))
            .await
            .unwrap();

        let row = store.rows.lock().unwrap()[0].clone();
        assert_eq!(row.status, SubscriptionStatus::Cancelled);
        assert_eq!(row.cancellation_reason.as_deref(), Some("moving on"));
        assert!(!store.has_access(user_id).await.unwrap());
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_without_active_subscription() {
        let store = Arc::new(MemSubscriptionStore::default());
        let mailer = Arc::new(RecordingMailer::default());

        let use_case = CancelSubscriptionUseCase::new(store.clone(), mailer.clone());
        let result = use_case.execute(Uuid::new_v4(), None).await;

        assert!(matches!(
            result,
            Err(SubscriptionError::NoActiveSubscription)
        ));
    }
}

mod maintenance_tests {
    use super::*;

    #[tokio::test]
    async fn test_expire_overdue_only_touches_overrun_actives() {
        let store = Arc::new(MemSubscriptionStore::default());
        let now = Utc::now();

        let overdue_user = Uuid::new_v4();
        let current_user = Uuid::new_v4();

        let mut overdue = Subscription::new(overdue_user, Plan::Monthly, now - Duration::days(31));
        overdue.end_date = now - Duration::days(1);
        store.create(&overdue).await.unwrap();

        let current = Subscription::new(current_user, Plan::Monthly, now);
        store.create(&current).await.unwrap();

        let changed = store.expire_overdue(now).await.unwrap();
        assert_eq!(changed, 1);

        assert!(!store.has_access(overdue_user).await.unwrap());
        assert!(store.has_access(current_user).await.unwrap());
    }

    #[tokio::test]
    async fn test_status_reports_latest_row() {
        let store = Arc::new(MemSubscriptionStore::default());
        let user_id = Uuid::new_v4();

        let status = SubscriptionStatusUseCase::new(store.clone());
        assert!(matches!(
            status.execute(user_id).await,
            Err(SubscriptionError::NotFound)
        ));

        SubscribeUseCase::new(store.clone())
            .execute(user_id, Plan::Yearly)
            .await
            .unwrap();

        let subscription = status.execute(user_id).await.unwrap();
        assert_eq!(subscription.plan, Plan::Yearly);
    }
}
