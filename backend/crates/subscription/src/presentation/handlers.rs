//! HTTP Handlers
//!
//! All routes here sit behind the auth middleware; the authenticated
//! [`Principal`] arrives via request extensions.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, response::IntoResponse};
use std::sync::Arc;

use kernel::principal::Principal;
use platform::mailer::Mailer;

use crate::application::{
    CancelSubscriptionUseCase, SubscribeUseCase, SubscriptionStatusUseCase,
};
use crate::domain::entities::Plan;
use crate::domain::repository::SubscriptionRepository;
use crate::error::{SubscriptionError, SubscriptionResult};
use crate::presentation::dto::{CancelRequest, SubscribeRequest, SubscriptionResponse};

/// Shared state for subscription handlers
#[derive(Clone)]
pub struct SubscriptionAppState<R, M>
where
    R: SubscriptionRepository + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static + Clone,
{
    pub repo: Arc<R>,
    pub mailer: Arc<M>,
}

/// POST /api/subscription/subscribe
pub async fn subscribe<R, M>(
    State(state): State<SubscriptionAppState<R, M>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<SubscribeRequest>,
) -> SubscriptionResult<impl IntoResponse>
where
    R: SubscriptionRepository + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static + Clone,
{
    let plan = match req.plan.as_str() {
        "monthly" => Plan::Monthly,
        "yearly" => Plan::Yearly,
        other => return Err(SubscriptionError::InvalidPlan(other.to_string())),
    };

    let use_case = SubscribeUseCase::new(state.repo.clone());
    let subscription = use_case.execute(principal.user_id, plan).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubscriptionResponse::from(&subscription)),
    ))
}

/// POST /api/subscription/cancel
pub async fn cancel<R, M>(
    State(state): State<SubscriptionAppState<R, M>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CancelRequest>,
) -> SubscriptionResult<StatusCode>
where
    R: SubscriptionRepository + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static + Clone,
{
    let use_case = CancelSubscriptionUseCase::new(state.repo.clone(), state.mailer.clone());
    use_case.execute(principal.user_id, req.reason).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/subscription/status
pub async fn status<R, M>(
    State(state): State<SubscriptionAppState<R, M>>,
    Extension(principal): Extension<Principal>,
) -> SubscriptionResult<Json<SubscriptionResponse>>
where
    R: SubscriptionRepository + Clone + Send + Sync + 'static,
    M: Mailer + Send + Sync + 'static + Clone,
{
    let use_case = SubscriptionStatusUseCase::new(state.repo.clone());
    let subscription = use_case.execute(principal.user_id).await?;

    Ok(Json(SubscriptionResponse::from(&subscription)))
}
