//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, HMAC, Base64, hex)
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)
//! - Cookie management
//! - Client identification (fingerprint, IP extraction)
//! - Rate limiting infrastructure
//! - Outbound email delivery (SMTP)

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod mailer;
pub mod password;
pub mod rate_limit;
