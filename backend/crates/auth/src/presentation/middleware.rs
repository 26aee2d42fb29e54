//! Auth Middleware
//!
//! Middleware for requiring authentication on protected routes. On success
//! the resolved [`Principal`] is inserted into request extensions for
//! downstream handlers (courses, subscription).

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use kernel::principal::Principal;
use platform::client::{extract_client_ip, extract_fingerprint};
use std::sync::Arc;

use crate::application::CheckSessionUseCase;
use crate::application::config::AuthConfig;
use crate::domain::repository::AuthSessionRepository;
use crate::error::AuthError;

/// Middleware state
#[derive(Clone)]
pub struct AuthMiddlewareState<R>
where
    R: AuthSessionRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
}

/// Middleware that requires a valid auth session
///
/// Rejects with 401 when the session is missing/invalid; otherwise injects
/// the authenticated [`Principal`] into request extensions.
pub async fn require_auth_session<R>(
    state: AuthMiddlewareState<R>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: AuthSessionRepository + Clone + Send + Sync + 'static,
{
    let headers = req.headers();

    let client_ip = req
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|info| info.0.ip());

    let client_ip = extract_client_ip(headers, client_ip);

    let fingerprint = match extract_fingerprint(headers, client_ip) {
        Ok(fp) => fp,
        Err(e) => return Err(AuthError::from(e).into_response()),
    };

    let token = platform::cookie::extract_cookie(headers, &state.config.session_cookie_name);

    let use_case = CheckSessionUseCase::new(state.repo.clone(), state.config.clone());

    let session = if let Some(token) = token {
        use_case.get_session(&token, &fingerprint.hash).await.ok()
    } else {
        None
    };

    let Some(session) = session else {
        return Err((StatusCode::UNAUTHORIZED, [("X-Auth-Required", "true")]).into_response());
    };

    req.extensions_mut().insert(Principal::new(
        session.user_id.into_uuid(),
        session.public_id.to_string(),
    ));

    Ok(next.run(req).await)
}
