//! HTTP Handlers

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use std::sync::Arc;

use platform::client::{extract_client_ip, extract_fingerprint};
use platform::mailer::Mailer;
use platform::rate_limit::RateLimitStore;

use crate::application::config::{AuthConfig, SameSite};
use crate::application::{
    CheckSessionUseCase, ForgotPasswordUseCase, RegisterInput, RegisterUseCase,
    ResetPasswordUseCase, SignInInput, SignInUseCase, SignOutUseCase,
};
use crate::domain::repository::{AuthSessionRepository, CredentialsRepository, UserRepository};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest, LoginResponse, RegisterRequest,
    RegisterResponse, ResetPasswordRequest, SessionStatusResponse,
};

/// Bound shared by every auth handler's repository
pub trait AuthRepo:
    UserRepository
    + CredentialsRepository
    + AuthSessionRepository
    + RateLimitStore
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> AuthRepo for T where
    T: UserRepository
        + CredentialsRepository
        + AuthSessionRepository
        + RateLimitStore
        + Clone
        + Send
        + Sync
        + 'static
{
}

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R, M>
where
    R: AuthRepo,
    M: Mailer + Send + Sync + 'static + Clone,
{
    pub repo: Arc<R>,
    pub mailer: Arc<M>,
    pub config: Arc<AuthConfig>,
}

// ============================================================================
// Register
// ============================================================================

/// POST /api/auth/register
pub async fn register<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthRepo,
    M: Mailer + Send + Sync + 'static + Clone,
{
    if !req.agree_to_terms {
        return Err(AuthError::InvalidInput(
            "You must agree to the Terms and Conditions".to_string(),
        ));
    }

    let use_case = RegisterUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(RegisterInput {
            user_name: req.user_name,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            public_id: output.public_id,
        }),
    ))
}

// ============================================================================
// Login
// ============================================================================

/// POST /api/auth/login
pub async fn login<R, M>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthRepo,
    M: Mailer + Send + Sync + 'static + Clone,
{
    let client_ip = extract_client_ip(&headers, Some(addr.ip()));
    let fingerprint = extract_fingerprint(&headers, client_ip)?;

    let use_case = SignInUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    );

    let remember_me = req.remember_me;

    let output = use_case
        .execute(
            SignInInput {
                identifier: req.identifier,
                password: req.password,
                remember_me,
            },
            fingerprint,
        )
        .await?;

    // Success - set session cookie (Max-Age must match remember_me)
    let cookie = build_session_cookie(&state.config, &output.session_token, remember_me);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            public_id: output.public_id,
        }),
    ))
}

// ============================================================================
// Logout
// ============================================================================

/// POST /api/auth/logout
pub async fn logout<R, M>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    R: AuthRepo,
    M: Mailer + Send + Sync + 'static + Clone,
{
    let token = extract_session_cookie(&headers, &state.config.session_cookie_name);

    if let Some(token) = token {
        let use_case = SignOutUseCase::new(state.repo.clone(), state.config.clone());
        // Ignore errors - just clear the cookie
        let _ = use_case.execute(&token).await;
    }

    let cookie = build_clear_cookie(&state.config);

    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]))
}

// ============================================================================
// Forgot / Reset Password
// ============================================================================

/// POST /api/auth/forgot-password
pub async fn forgot_password<R, M>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<ForgotPasswordRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthRepo,
    M: Mailer + Send + Sync + 'static + Clone,
{
    let client_ip = extract_client_ip(&headers, Some(addr.ip()));
    let fingerprint = extract_fingerprint(&headers, client_ip)?;

    // Per-client fixed window on top of the per-account lockout machine
    let limit = state
        .repo
        .check_and_increment(&fingerprint.hash, &state.config.reset_rate_limit)
        .await
        .map_err(|e| AuthError::Internal(format!("Rate limit check failed: {e}")))?;
    if !limit.allowed {
        return Err(AuthError::RateLimited);
    }

    let use_case = ForgotPasswordUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    use_case.execute(&req.identifier).await?;

    // Success shape is identical whether or not the account exists
    Ok((
        StatusCode::ACCEPTED,
        Json(ForgotPasswordResponse {
            message: "If the account exists, a reset email has been sent".to_string(),
        }),
    ))
}

/// POST /api/auth/reset-password
pub async fn reset_password<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<ResetPasswordRequest>,
) -> AuthResult<StatusCode>
where
    R: AuthRepo,
    M: Mailer + Send + Sync + 'static + Clone,
{
    if req.new_password != req.confirm_password {
        return Err(AuthError::InvalidInput(
            "Passwords do not match".to_string(),
        ));
    }

    let use_case =
        ResetPasswordUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    use_case.execute(&req.token, req.new_password).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Session Status
// ============================================================================

/// GET /api/auth/status
pub async fn session_status<R, M>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
) -> AuthResult<Json<SessionStatusResponse>>
where
    R: AuthRepo,
    M: Mailer + Send + Sync + 'static + Clone,
{
    let client_ip = extract_client_ip(&headers, Some(addr.ip()));
    let fingerprint = extract_fingerprint(&headers, client_ip)?;

    let token = extract_session_cookie(&headers, &state.config.session_cookie_name);

    let use_case = CheckSessionUseCase::new(state.repo.clone(), state.config.clone());

    let session_info = if let Some(token) = token {
        use_case.execute(&token, &fingerprint.hash).await.ok()
    } else {
        None
    };

    match session_info {
        Some(info) => Ok(Json(SessionStatusResponse {
            authenticated: true,
            public_id: Some(info.public_id),
            user_role: Some(info.user_role),
            expires_at_ms: Some(info.expires_at_ms),
        })),
        None => Ok(Json(SessionStatusResponse {
            authenticated: false,
            public_id: None,
            user_role: None,
            expires_at_ms: None,
        })),
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn extract_session_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    platform::cookie::extract_cookie(headers, name)
}

fn build_session_cookie(config: &AuthConfig, token: &str, remember_me: bool) -> String {
    let max_age = if remember_me {
        config.session_ttl_long.as_secs()
    } else {
        config.session_ttl_short.as_secs()
    };

    let mut parts = vec![
        format!("{}={}", config.session_cookie_name, token),
        "HttpOnly".to_string(),
        "Path=/".to_string(),
        format!("Max-Age={}", max_age),
    ];

    if config.cookie_secure {
        parts.push("Secure".to_string());
    }

    match config.cookie_same_site {
        SameSite::Strict => parts.push("SameSite=Strict".to_string()),
        SameSite::Lax => parts.push("SameSite=Lax".to_string()),
        SameSite::None => parts.push("SameSite=None".to_string()),
    }

    parts.join("; ")
}

fn build_clear_cookie(config: &AuthConfig) -> String {
    let mut parts = vec![
        format!("{}=", config.session_cookie_name),
        "HttpOnly".to_string(),
        "Path=/".to_string(),
        "Max-Age=0".to_string(),
        "Expires=Thu, 01 Jan 1970 00:00:00 GMT".to_string(),
    ];

    if config.cookie_secure {
        parts.push("Secure".to_string());
    }

    match config.cookie_same_site {
        SameSite::Strict => parts.push("SameSite=Strict".to_string()),
        SameSite::Lax => parts.push("SameSite=Lax".to_string()),
        SameSite::None => parts.push("SameSite=None".to_string()),
    }

    parts.join("; ")
}
