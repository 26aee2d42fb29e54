//! Domain Entities
//!
//! Core business entities for the subscription domain.

use chrono::{DateTime, Duration, Utc};
use kernel::id::SubscriptionId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum Plan {
    Monthly = 0,
    Yearly = 1,
}

impl Plan {
    /// Paid-for window length. Yearly includes a 3 month bonus
    /// (15 x 30 days in total).
    pub const fn duration_days(&self) -> i64 {
        match self {
            Plan::Monthly => 30,
            Plan::Yearly => 15 * 30,
        }
    }

    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Plan::Monthly => "monthly",
            Plan::Yearly => "yearly",
        }
    }

    #[inline]
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(Plan::Monthly),
            1 => Some(Plan::Yearly),
            _ => None,
        }
    }
}

/// Subscription lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum SubscriptionStatus {
    Active = 0,
    Cancelled = 1,
    Expired = 2,
}

impl SubscriptionStatus {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }

    #[inline]
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(SubscriptionStatus::Active),
            1 => Some(SubscriptionStatus::Cancelled),
            2 => Some(SubscriptionStatus::Expired),
            _ => None,
        }
    }
}

/// Subscription entity - one row per user
#[derive(Debug, Clone)]
pub struct Subscription {
    pub subscription_id: SubscriptionId,
    pub user_id: Uuid,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Start a new subscription window at `now`
    pub fn new(user_id: Uuid, plan: Plan, now: DateTime<Utc>) -> Self {
        Self {
            subscription_id: SubscriptionId::new(),
            user_id,
            plan,
            status: SubscriptionStatus::Active,
            start_date: now,
            end_date: now + Duration::days(plan.duration_days()),
            cancelled_at: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this subscription currently grants access
    pub fn grants_access(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && self.end_date > now
    }

    /// Cancel the subscription
    pub fn cancel(&mut self, reason: Option<String>, now: DateTime<Utc>) {
        self.status = SubscriptionStatus::Cancelled;
        self.cancelled_at = Some(now);
        self.cancellation_reason = reason;
        self.updated_at = now;
    }

    /// Flip an overrun Active subscription to Expired
    pub fn expire(&mut self, now: DateTime<Utc>) {
        self.status = SubscriptionStatus::Expired;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_windows() {
        assert_eq!(Plan::Monthly.duration_days(), 30);
        assert_eq!(Plan::Yearly.duration_days(), 450);
    }

    #[test]
    fn test_new_subscription_window() {
        let now = Utc::now();
        let sub = Subscription::new(Uuid::new_v4(), Plan::Monthly, now);

        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.start_date, now);
        assert_eq!(sub.end_date, now + Duration::days(30));
        assert!(sub.grants_access(now));
        assert!(sub.grants_access(now + Duration::days(29)));
        assert!(!sub.grants_access(now + Duration::days(30)));
    }

    #[test]
    fn test_yearly_window() {
        let now = Utc::now();
        let sub = Subscription::new(Uuid::new_v4(), Plan::Yearly, now);
        assert!(sub.grants_access(now + Duration::days(449)));
        assert!(!sub.grants_access(now + Duration::days(450)));
    }

    #[test]
    fn test_cancel_revokes_access() {
        let now = Utc::now();
        let mut sub = Subscription::new(Uuid::new_v4(), Plan::Monthly, now);

        sub.cancel(Some("too expensive".to_string()), now);
        assert_eq!(sub.status, SubscriptionStatus::Cancelled);
        assert_eq!(sub.cancelled_at, Some(now));
        assert!(!sub.grants_access(now));
    }

    #[test]
    fn test_expire() {
        let now = Utc::now();
        let mut sub = Subscription::new(Uuid::new_v4(), Plan::Monthly, now);
        let later = now + Duration::days(31);

        sub.expire(later);
        assert_eq!(sub.status, SubscriptionStatus::Expired);
        assert!(!sub.grants_access(later));
    }

    #[test]
    fn test_plan_roundtrip() {
        assert_eq!(Plan::from_id(0), Some(Plan::Monthly));
        assert_eq!(Plan::from_id(1), Some(Plan::Yearly));
        assert_eq!(Plan::from_id(9), None);
        assert_eq!(SubscriptionStatus::from_id(2), Some(SubscriptionStatus::Expired));
    }
}
