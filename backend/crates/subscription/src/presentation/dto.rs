//! API DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::Subscription;

/// Subscribe request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    /// "monthly" or "yearly"
    pub plan: String,
}

/// Cancel request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub reason: Option<String>,
}

/// Subscription representation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub plan: String,
    pub status: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<&Subscription> for SubscriptionResponse {
    fn from(s: &Subscription) -> Self {
        Self {
            plan: s.plan.code().to_string(),
            status: s.status.code().to_string(),
            start_date: s.start_date,
            end_date: s.end_date,
            cancelled_at: s.cancelled_at,
        }
    }
}
