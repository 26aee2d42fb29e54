//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; application-level errors use
//! `kernel::error::AppError` via the per-domain error types.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use auth::middleware::{AuthMiddlewareState, require_auth_session};
use auth::{AuthConfig, PgAuthRepository};
use axum::{
    Router, http,
    http::{Method, header},
};
use base64::Engine;
use base64::engine::general_purpose;
use courses::presentation::handlers::CourseAppState;
use courses::{PgCourseRepository, courses_protected_router, courses_public_router};
use platform::mailer::{Mailer, MailerError, NoopMailer, SmtpConfig, SmtpMailer};
use sqlx::postgres::PgPoolOptions;
use subscription::{PgSubscriptionRepository, subscription_router};
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

/// Mailer selected at startup: real SMTP when configured, logging noop
/// otherwise (development, tests).
#[derive(Clone)]
enum AppMailer {
    Smtp(SmtpMailer),
    Noop(NoopMailer),
}

impl Mailer for AppMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError> {
        match self {
            AppMailer::Smtp(mailer) => mailer.send(to, subject, body).await,
            AppMailer::Noop(mailer) => mailer.send(to, subject, body).await,
        }
    }
}

fn build_mailer() -> anyhow::Result<AppMailer> {
    let Ok(host) = env::var("SMTP_HOST") else {
        tracing::warn!("SMTP_HOST not set, outbound email disabled");
        return Ok(AppMailer::Noop(NoopMailer));
    };

    let config = SmtpConfig {
        host,
        port: env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse()?,
        username: env::var("SMTP_USER").unwrap_or_default(),
        password: env::var("SMTP_PASS").unwrap_or_default(),
        from_address: env::var("SMTP_FROM").unwrap_or_else(|_| "no-reply@localhost".to_string()),
        from_name: env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "Learning Platform".to_string()),
    };

    Ok(AppMailer::Smtp(SmtpMailer::new(&config)?))
}

fn build_auth_config() -> anyhow::Result<AuthConfig> {
    let mut config = if cfg!(debug_assertions) {
        AuthConfig::development()
    } else {
        // In production, the session secret comes from the environment
        let secret_b64 =
            env::var("SESSION_SECRET").expect("SESSION_SECRET must be set in production");
        let secret_bytes = Engine::decode(&general_purpose::STANDARD, &secret_b64)?;
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&secret_bytes);
        AuthConfig {
            session_secret: secret,
            check_password_breach: true,
            ..Default::default()
        }
    };

    if let Ok(frontend_url) = env::var("FRONTEND_URL") {
        config.frontend_url = frontend_url;
    }

    if let Ok(pepper_b64) = env::var("PASSWORD_PEPPER") {
        config.password_pepper = Some(Engine::decode(&general_purpose::STANDARD, &pepper_b64)?);
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,auth=info,courses=info,subscription=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let auth_repo = PgAuthRepository::new(pool.clone());
    let course_repo = PgCourseRepository::new(pool.clone());
    let subscription_repo = PgSubscriptionRepository::new(pool.clone());

    // Startup maintenance; failures here should not prevent server startup
    match auth_repo.cleanup_expired().await {
        Ok((sessions, rate_limits)) => {
            tracing::info!(
                sessions_deleted = sessions,
                rate_limits_deleted = rate_limits,
                "Auth cleanup completed"
            );
        }
        Err(e) => {
            tracing::warn!(error = %e, "Auth cleanup failed, continuing anyway");
        }
    }

    match subscription_repo.process_expired().await {
        Ok(expired) => {
            tracing::info!(expired = expired, "Subscription expiry sweep completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Subscription expiry sweep failed, continuing anyway");
        }
    }

    let auth_config = build_auth_config()?;
    let mailer = build_mailer()?;

    // Auth middleware guarding the progress and billing surfaces
    let auth_mw_state = AuthMiddlewareState {
        repo: Arc::new(auth_repo.clone()),
        config: Arc::new(auth_config.clone()),
    };
    let require_auth = axum::middleware::from_fn(move |req, next| {
        let state = auth_mw_state.clone();
        async move { require_auth_session(state, req, next).await }
    });

    let course_state = CourseAppState::new(course_repo, subscription_repo.clone());

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest(
            "/api/auth",
            auth::auth_router(auth_repo, mailer.clone(), auth_config),
        )
        .nest(
            "/api/courses",
            courses_public_router(course_state.clone()).merge(
                courses_protected_router(course_state).layer(require_auth.clone()),
            ),
        )
        .nest(
            "/api/subscription",
            subscription_router(subscription_repo, mailer).layer(require_auth),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()?;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
