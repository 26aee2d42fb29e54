//! Outbound Email Delivery
//!
//! SMTP mailer behind a [`Mailer`] trait so domain crates can send
//! notifications without knowing the transport. Delivery is best-effort from
//! the caller's perspective: callers persist their state first and treat a
//! send failure as a logged warning, never as a state rollback.

use lettre::message::Mailbox;
use lettre::transport::smtp::PoolConfig;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

/// Mailer errors
#[derive(Debug, Error)]
pub enum MailerError {
    /// Address or message construction failed
    #[error("Invalid email message: {0}")]
    InvalidMessage(String),

    /// SMTP transport failure
    #[error("Email delivery failed: {0}")]
    DeliveryFailed(String),
}

/// Trait for outbound email delivery
#[trait_variant::make(Mailer: Send)]
pub trait LocalMailer {
    /// Send a plain-text email
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError>;
}

/// SMTP transport configuration
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// From address, e.g. "no-reply@example.com"
    pub from_address: String,
    /// Display name for the From header
    pub from_name: String,
}

/// SMTP-backed mailer (STARTTLS relay with connection pooling)
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build a pooled SMTP transport from config
    pub fn new(config: &SmtpConfig) -> Result<Self, MailerError> {
        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_address)
            .parse()
            .map_err(|e| MailerError::InvalidMessage(format!("Invalid from address: {}", e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| MailerError::DeliveryFailed(format!("SMTP transport setup: {}", e)))?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .port(config.port)
            .pool_config(PoolConfig::new().max_size(4))
            .timeout(Some(std::time::Duration::from_secs(10)))
            .build();

        Ok(Self { transport, from })
    }
}

impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to
                .parse()
                .map_err(|e| MailerError::InvalidMessage(format!("Invalid to address: {}", e)))?)
            .subject(subject)
            .header(lettre::message::header::ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| MailerError::InvalidMessage(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailerError::DeliveryFailed(e.to_string()))?;

        tracing::debug!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}

/// Mailer that only logs; used in development and tests
#[derive(Debug, Clone, Default)]
pub struct NoopMailer;

impl Mailer for NoopMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), MailerError> {
        tracing::info!(to = %to, subject = %subject, "Email suppressed (noop mailer)");
        Ok(())
    }
}
