//! Unit tests for the auth crate
//!
//! Use-case tests run against in-memory repository implementations; no
//! database or network is required. Entity-level state machine tests live
//! next to the entities.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use platform::mailer::{Mailer, MailerError};

use crate::application::config::AuthConfig;
use crate::application::{
    ForgotPasswordUseCase, RegisterInput, RegisterUseCase, ResetPasswordUseCase, SignInInput,
    SignInUseCase,
};
use crate::domain::entity::{auth_session::AuthSession, credentials::Credentials, user::User};
use crate::domain::repository::{AuthSessionRepository, CredentialsRepository, UserRepository};
use crate::domain::value_object::{
    email::Email, public_id::PublicId, user_id::UserId, user_name::UserName,
};
use crate::error::{AuthError, AuthResult};
use platform::client::ClientFingerprint;

// ============================================================================
// In-memory repositories
// ============================================================================

#[derive(Default)]
struct MemAuthStore {
    users: Mutex<Vec<User>>,
    credentials: Mutex<Vec<Credentials>>,
    sessions: Mutex<Vec<AuthSession>>,
}

impl UserRepository for MemAuthStore {
    async fn create(&self, user: &User) -> AuthResult<()> {
        self.users.lock().unwrap().push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.user_id == *user_id)
            .cloned())
    }

    async fn find_by_public_id(&self, public_id: &PublicId) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.public_id == *public_id)
            .cloned())
    }

    async fn find_by_user_name(&self, user_name: &UserName) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.user_name.canonical() == user_name.canonical())
            .cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == *email)
            .cloned())
    }

    async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.user_name.canonical() == user_name.canonical()))
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.users.lock().unwrap().iter().any(|u| u.email == *email))
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(existing) = users.iter_mut().find(|u| u.user_id == user.user_id) {
            *existing = user.clone();
        }
        Ok(())
    }
}

impl CredentialsRepository for MemAuthStore {
    async fn create(&self, credentials: &Credentials) -> AuthResult<()> {
        self.credentials.lock().unwrap().push(credentials.clone());
        Ok(())
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<Credentials>> {
        Ok(self
            .credentials
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.user_id == *user_id)
            .cloned())
    }

    async fn find_by_reset_digest(
        &self,
        digest: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Credentials>> {
        Ok(self
            .credentials
            .lock()
            .unwrap()
            .iter()
            .find(|c| {
                c.password_reset_token.as_deref() == Some(digest)
                    && c.password_reset_expires.is_some_and(|exp| exp > now)
            })
            .cloned())
    }

    async fn update(&self, credentials: &Credentials) -> AuthResult<()> {
        let mut all = self.credentials.lock().unwrap();
        if let Some(existing) = all.iter_mut().find(|c| c.user_id == credentials.user_id) {
            *existing = credentials.clone();
        }
        Ok(())
    }
}

impl AuthSessionRepository for MemAuthStore {
    async fn create(&self, session: &AuthSession) -> AuthResult<()> {
        self.sessions.lock().unwrap().push(session.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        session_id: Uuid,
        fingerprint_hash: &[u8],
    ) -> AuthResult<Option<AuthSession>> {
        let sessions = self.sessions.lock().unwrap();
        match sessions.iter().find(|s| s.session_id == session_id) {
            Some(s) if s.client_fingerprint_hash != fingerprint_hash => {
                Err(AuthError::SessionFingerprintMismatch)
            }
            Some(s) => Ok(Some(s.clone())),
            None => Ok(None),
        }
    }

    async fn update(&self, session: &AuthSession) -> AuthResult<()> {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(existing) = sessions.iter_mut().find(|s| s.session_id == session.session_id) {
            *existing = session.clone();
        }
        Ok(())
    }

    async fn delete(&self, session_id: Uuid) -> AuthResult<()> {
        self.sessions
            .lock()
            .unwrap()
            .retain(|s| s.session_id != session_id);
        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: &UserId, except: Option<Uuid>) -> AuthResult<u64> {
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|s| s.user_id != *user_id || Some(s.session_id) == except);
        Ok((before - sessions.len()) as u64)
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let now_ms = Utc::now().timestamp_millis();
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|s| s.expires_at_ms >= now_ms);
        Ok((before - sessions.len()) as u64)
    }
}

// ============================================================================
// Test mailers
// ============================================================================

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

impl RecordingMailer {
    fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Pull the reset secret out of the last delivered reset link
    fn last_token(&self) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let (_, _, body) = sent.last()?;
        let idx = body.find("token=")?;
        let token: String = body[idx + "token=".len()..]
            .chars()
            .take_while(|c| c.is_ascii_hexdigit())
            .collect();
        Some(token)
    }
}

struct FailingMailer;

impl Mailer for FailingMailer {
    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), MailerError> {
        Err(MailerError::DeliveryFailed("SMTP down".to_string()))
    }
}

// ============================================================================
// Helpers
// ============================================================================

const STRONG_PASSWORD: &str = "Gl4cier!Morning-42";

fn config() -> Arc<AuthConfig> {
    Arc::new(AuthConfig::development())
}

fn fingerprint() -> ClientFingerprint {
    ClientFingerprint::new([7u8; 32], None, Some("test-agent".to_string()))
}

async fn register_user(store: &Arc<MemAuthStore>, config: &Arc<AuthConfig>) -> String {
    let use_case = RegisterUseCase::new(store.clone(), store.clone(), config.clone());
    let output = use_case
        .execute(RegisterInput {
            user_name: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: STRONG_PASSWORD.to_string(),
        })
        .await
        .expect("registration should succeed");
    output.public_id
}

// ============================================================================
// Registration
// ============================================================================

mod register_tests {
    use super::*;

    #[tokio::test]
    async fn test_register_creates_user_and_credentials() {
        let store = Arc::new(MemAuthStore::default());
        let config = config();

        let public_id = register_user(&store, &config).await;
        assert_eq!(public_id.len(), 21);

        assert_eq!(store.users.lock().unwrap().len(), 1);
        assert_eq!(store.credentials.lock().unwrap().len(), 1);

        let creds = &store.credentials.lock().unwrap()[0];
        assert_eq!(creds.password_reset_attempts, 0);
        assert!(creds.password_reset_token.is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_user_name() {
        let store = Arc::new(MemAuthStore::default());
        let config = config();
        register_user(&store, &config).await;

        let use_case = RegisterUseCase::new(store.clone(), store.clone(), config.clone());
        let result = use_case
            .execute(RegisterInput {
                user_name: "Alice".to_string(), // same canonical form
                email: "other@example.com".to_string(),
                password: STRONG_PASSWORD.to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::UserNameTaken)));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let store = Arc::new(MemAuthStore::default());
        let config = config();
        register_user(&store, &config).await;

        let use_case = RegisterUseCase::new(store.clone(), store.clone(), config.clone());
        let result = use_case
            .execute(RegisterInput {
                user_name: "bob".to_string(),
                email: "Alice@Example.com".to_string(), // lowercased on parse
                password: STRONG_PASSWORD.to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_register_rejects_password_containing_user_name() {
        let store = Arc::new(MemAuthStore::default());
        let config = config();

        let use_case = RegisterUseCase::new(store.clone(), store.clone(), config.clone());
        let result = use_case
            .execute(RegisterInput {
                user_name: "carol".to_string(),
                email: "carol@example.com".to_string(),
                password: "MightyCarol#2024".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::WeakPassword(_))));
        assert!(store.users.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_rejects_weak_keyword() {
        let store = Arc::new(MemAuthStore::default());
        let config = config();

        let use_case = RegisterUseCase::new(store.clone(), store.clone(), config.clone());
        let result = use_case
            .execute(RegisterInput {
                user_name: "carol".to_string(),
                email: "carol@example.com".to_string(),
                password: "mySecretValue#9".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::WeakPassword(_))));
    }
}

// ============================================================================
// Sign in
// ============================================================================

mod sign_in_tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_in_with_user_name_and_email() {
        let store = Arc::new(MemAuthStore::default());
        let config = config();
        register_user(&store, &config).await;

        let use_case =
            SignInUseCase::new(store.clone(), store.clone(), store.clone(), config.clone());

        let output = use_case
            .execute(
                SignInInput {
                    identifier: "alice".to_string(),
                    password: STRONG_PASSWORD.to_string(),
                    remember_me: false,
                },
                fingerprint(),
            )
            .await
            .unwrap();
        assert!(output.session_token.contains('.'));

        let output = use_case
            .execute(
                SignInInput {
                    identifier: "alice@example.com".to_string(),
                    password: STRONG_PASSWORD.to_string(),
                    remember_me: true,
                },
                fingerprint(),
            )
            .await
            .unwrap();
        assert!(!output.public_id.is_empty());

        assert_eq!(store.sessions.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_sign_in_wrong_password() {
        let store = Arc::new(MemAuthStore::default());
        let config = config();
        register_user(&store, &config).await;

        let use_case =
            SignInUseCase::new(store.clone(), store.clone(), store.clone(), config.clone());

        let result = use_case
            .execute(
                SignInInput {
                    identifier: "alice".to_string(),
                    password: "Wrong#Pass-111".to_string(),
                    remember_me: false,
                },
                fingerprint(),
            )
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_sign_in_unknown_user_matches_wrong_password() {
        let store = Arc::new(MemAuthStore::default());
        let config = config();

        let use_case =
            SignInUseCase::new(store.clone(), store.clone(), store.clone(), config.clone());

        let result = use_case
            .execute(
                SignInInput {
                    identifier: "nobody".to_string(),
                    password: STRONG_PASSWORD.to_string(),
                    remember_me: false,
                },
                fingerprint(),
            )
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_sign_in_locked_account() {
        let store = Arc::new(MemAuthStore::default());
        let config = config();
        register_user(&store, &config).await;

        {
            let mut creds = store.credentials.lock().unwrap();
            creds[0].locked_until = Some(Utc::now() + Duration::hours(1));
        }

        let use_case =
            SignInUseCase::new(store.clone(), store.clone(), store.clone(), config.clone());

        let result = use_case
            .execute(
                SignInInput {
                    identifier: "alice".to_string(),
                    password: STRONG_PASSWORD.to_string(),
                    remember_me: false,
                },
                fingerprint(),
            )
            .await;

        assert!(matches!(result, Err(AuthError::AccountLocked)));
    }

    #[tokio::test]
    async fn test_sign_in_clears_expired_lock() {
        let store = Arc::new(MemAuthStore::default());
        let config = config();
        register_user(&store, &config).await;

        {
            let mut creds = store.credentials.lock().unwrap();
            creds[0].locked_until = Some(Utc::now() - Duration::hours(1));
        }

        let use_case =
            SignInUseCase::new(store.clone(), store.clone(), store.clone(), config.clone());

        use_case
            .execute(
                SignInInput {
                    identifier: "alice".to_string(),
                    password: STRONG_PASSWORD.to_string(),
                    remember_me: false,
                },
                fingerprint(),
            )
            .await
            .unwrap();

        assert!(store.credentials.lock().unwrap()[0].locked_until.is_none());
    }

    #[tokio::test]
    async fn test_sign_in_deactivated_account() {
        let store = Arc::new(MemAuthStore::default());
        let config = config();
        register_user(&store, &config).await;

        {
            let mut users = store.users.lock().unwrap();
            users[0].deactivate(Utc::now());
        }

        let use_case =
            SignInUseCase::new(store.clone(), store.clone(), store.clone(), config.clone());

        let result = use_case
            .execute(
                SignInInput {
                    identifier: "alice".to_string(),
                    password: STRONG_PASSWORD.to_string(),
                    remember_me: false,
                },
                fingerprint(),
            )
            .await;

        assert!(matches!(result, Err(AuthError::AccountDisabled)));
    }
}

// ============================================================================
// Forgot password (lockout machine + token issuance)
// ============================================================================

mod forgot_password_tests {
    use super::*;

    #[tokio::test]
    async fn test_issues_token_and_sends_email() {
        let store = Arc::new(MemAuthStore::default());
        let config = config();
        let mailer = Arc::new(RecordingMailer::default());
        register_user(&store, &config).await;

        let use_case = ForgotPasswordUseCase::new(
            store.clone(),
            store.clone(),
            mailer.clone(),
            config.clone(),
        );

        use_case.execute("alice").await.unwrap();

        assert_eq!(mailer.sent_count(), 1);
        let secret = mailer.last_token().unwrap();
        assert_eq!(secret.len(), 64);

        let creds = store.credentials.lock().unwrap()[0].clone();
        assert_eq!(creds.password_reset_attempts, 1);
        // Only the digest is stored, never the secret
        assert_eq!(
            creds.password_reset_token.as_deref(),
            Some(Credentials::digest_token(&secret).as_str())
        );
        assert!(creds.password_reset_expires.is_some());
    }

    #[tokio::test]
    async fn test_unknown_identifier_is_silent_success() {
        let store = Arc::new(MemAuthStore::default());
        let config = config();
        let mailer = Arc::new(RecordingMailer::default());

        let use_case = ForgotPasswordUseCase::new(
            store.clone(),
            store.clone(),
            mailer.clone(),
            config.clone(),
        );

        assert!(use_case.execute("ghost").await.is_ok());
        assert!(use_case.execute("ghost@example.com").await.is_ok());
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_lockout_after_three_attempts() {
        let store = Arc::new(MemAuthStore::default());
        let config = config();
        let mailer = Arc::new(RecordingMailer::default());
        register_user(&store, &config).await;

        let use_case = ForgotPasswordUseCase::new(
            store.clone(),
            store.clone(),
            mailer.clone(),
            config.clone(),
        );

        for _ in 0..3 {
            use_case.execute("alice").await.unwrap();
        }
        assert_eq!(mailer.sent_count(), 3);

        // Fourth attempt hits the threshold: lock applied and persisted
        let result = use_case.execute("alice").await;
        assert!(matches!(result, Err(AuthError::TooManyResetAttempts)));
        assert!(
            store.credentials.lock().unwrap()[0]
                .locked_until
                .is_some()
        );

        // Fifth attempt: the standing lock answers, no counter movement
        let result = use_case.execute("alice").await;
        assert!(matches!(result, Err(AuthError::AccountLocked)));
        assert_eq!(
            store.credentials.lock().unwrap()[0].password_reset_attempts,
            3
        );
        assert_eq!(mailer.sent_count(), 3);
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_token_durable() {
        let store = Arc::new(MemAuthStore::default());
        let config = config();
        register_user(&store, &config).await;

        let use_case = ForgotPasswordUseCase::new(
            store.clone(),
            store.clone(),
            Arc::new(FailingMailer),
            config.clone(),
        );

        // Delivery fails but the operation succeeds and the token persists
        use_case.execute("alice").await.unwrap();

        let creds = store.credentials.lock().unwrap()[0].clone();
        assert!(creds.password_reset_token.is_some());
        assert_eq!(creds.password_reset_attempts, 1);
    }
}

// ============================================================================
// Reset password (token consumption)
// ============================================================================

mod reset_password_tests {
    use super::*;

    async fn issue_reset(
        store: &Arc<MemAuthStore>,
        config: &Arc<AuthConfig>,
        mailer: &Arc<RecordingMailer>,
    ) -> String {
        let use_case = ForgotPasswordUseCase::new(
            store.clone(),
            store.clone(),
            mailer.clone(),
            config.clone(),
        );
        use_case.execute("alice").await.unwrap();
        mailer.last_token().unwrap()
    }

    #[tokio::test]
    async fn test_reset_happy_path_clears_state() {
        let store = Arc::new(MemAuthStore::default());
        let config = config();
        let mailer = Arc::new(RecordingMailer::default());
        register_user(&store, &config).await;
        let secret = issue_reset(&store, &config, &mailer).await;

        let use_case =
            ResetPasswordUseCase::new(store.clone(), store.clone(), config.clone());
        use_case
            .execute(&secret, "Fresh!Meadow-77".to_string())
            .await
            .unwrap();

        let creds = store.credentials.lock().unwrap()[0].clone();
        assert!(creds.password_reset_token.is_none());
        assert!(creds.password_reset_expires.is_none());
        assert_eq!(creds.password_reset_attempts, 0);
        assert!(creds.locked_until.is_none());

        // The new password signs in
        let sign_in =
            SignInUseCase::new(store.clone(), store.clone(), store.clone(), config.clone());
        sign_in
            .execute(
                SignInInput {
                    identifier: "alice".to_string(),
                    password: "Fresh!Meadow-77".to_string(),
                    remember_me: false,
                },
                fingerprint(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reset_token_single_use() {
        let store = Arc::new(MemAuthStore::default());
        let config = config();
        let mailer = Arc::new(RecordingMailer::default());
        register_user(&store, &config).await;
        let secret = issue_reset(&store, &config, &mailer).await;

        let use_case =
            ResetPasswordUseCase::new(store.clone(), store.clone(), config.clone());
        use_case
            .execute(&secret, "Fresh!Meadow-77".to_string())
            .await
            .unwrap();

        let result = use_case
            .execute(&secret, "Another#Value-88".to_string())
            .await;
        assert!(matches!(result, Err(AuthError::InvalidResetToken)));
    }

    #[tokio::test]
    async fn test_reset_expired_token_rejected_despite_matching_digest() {
        let store = Arc::new(MemAuthStore::default());
        let config = config();
        let mailer = Arc::new(RecordingMailer::default());
        register_user(&store, &config).await;
        let secret = issue_reset(&store, &config, &mailer).await;

        // Force the token past its expiry; the digest still matches
        {
            let mut creds = store.credentials.lock().unwrap();
            creds[0].password_reset_expires = Some(Utc::now() - Duration::seconds(1));
        }

        let use_case =
            ResetPasswordUseCase::new(store.clone(), store.clone(), config.clone());
        let result = use_case
            .execute(&secret, "Fresh!Meadow-77".to_string())
            .await;

        assert!(matches!(result, Err(AuthError::InvalidResetToken)));
    }

    #[tokio::test]
    async fn test_reset_unknown_token_rejected() {
        let store = Arc::new(MemAuthStore::default());
        let config = config();
        register_user(&store, &config).await;

        let use_case =
            ResetPasswordUseCase::new(store.clone(), store.clone(), config.clone());
        let result = use_case
            .execute("deadbeef".repeat(8).as_str(), "Fresh!Meadow-77".to_string())
            .await;

        assert!(matches!(result, Err(AuthError::InvalidResetToken)));
    }

    #[tokio::test]
    async fn test_reset_rejects_contextual_weak_passwords() {
        let store = Arc::new(MemAuthStore::default());
        let config = config();
        let mailer = Arc::new(RecordingMailer::default());
        register_user(&store, &config).await;
        let secret = issue_reset(&store, &config, &mailer).await;

        let use_case =
            ResetPasswordUseCase::new(store.clone(), store.clone(), config.clone());

        for candidate in [
            "xxPassWordxx9",   // weak keyword
            "ssh-Secret-99",   // weak keyword
            "meetAlice#2024",  // username
            "qWeRtY-7654321",  // weak keyword
        ] {
            let result = use_case.execute(&secret, candidate.to_string()).await;
            assert!(
                matches!(result, Err(AuthError::WeakPassword(_))),
                "expected WeakPassword for {candidate}"
            );
        }

        // The token survives failed strength checks and still works
        use_case
            .execute(&secret, "Fresh!Meadow-77".to_string())
            .await
            .unwrap();
    }
}
