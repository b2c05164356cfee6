//! Registration, login, and bearer-token identity resolution.
//!
//! The gateway is the single entry point the HTTP handlers use for auth. It
//! admits requests through the rate limiter, hashes and verifies passwords on
//! the blocking pool, issues tokens, and resolves the acting user.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::credentials::PasswordHasher;
use crate::domain::{DuplicateEmail, MetricsPtr, NewUser, RateLimitStorePtr, RepositoryPtr, User};
use crate::error::AppError;
use crate::token::TokenService;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Rate-limit actions; each forms the `"<action>:<client>"` key prefix.
pub mod action {
    pub const REGISTER: &str = "register";
    pub const LOGIN: &str = "login";
    pub const ME: &str = "me";
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of `POST /auth/register`.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    // ---
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "fullName")]
    pub full_name: Option<String>,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    // ---
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Returned after a successful registration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
}

/// Returned after a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Public view of the current user.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            is_active: user.is_active,
        }
    }
}

/// Per-window allowances for throttled actions.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionLimits {
    pub auth_per_window: u32,
    pub api_per_window: u32,
    pub window: Duration,
}

// ============================================================================
// Gateway
// ============================================================================

pub struct AuthGateway {
    // ---
    repository: RepositoryPtr,
    limiter: RateLimitStorePtr,
    tokens: TokenService,
    passwords: PasswordHasher,
    limits: AdmissionLimits,
    metrics: MetricsPtr,

    /// Verified against when the email is unknown, so both failure paths
    /// cost one bcrypt verify.
    dummy_hash: String,
}

impl AuthGateway {
    // ---
    pub fn new(
        repository: RepositoryPtr,
        limiter: RateLimitStorePtr,
        tokens: TokenService,
        passwords: PasswordHasher,
        limits: AdmissionLimits,
        metrics: MetricsPtr,
    ) -> anyhow::Result<Self> {
        // ---
        let dummy_hash = passwords.hash("dummy-password-for-timing")?;

        Ok(Self {
            repository,
            limiter,
            tokens,
            passwords,
            limits,
            metrics,
            dummy_hash,
        })
    }

    pub fn repository(&self) -> &RepositoryPtr {
        &self.repository
    }

    pub fn limiter(&self) -> &RateLimitStorePtr {
        &self.limiter
    }

    /// Count one request for `action` from `client` and reject it if over `limit`.
    pub async fn admit(&self, action: &str, client: &str, limit: u32) -> Result<(), AppError> {
        // ---
        let key = format!("{action}:{client}");

        self.limiter
            .check_and_increment(&key, limit, self.limits.window)
            .await
            .map_err(|err| {
                if matches!(err, crate::domain::RateLimitError::Exceeded { .. }) {
                    tracing::warn!(%client, action, "Rate limit exceeded");
                    self.metrics.record_rate_limited(action);
                }
                AppError::from(err)
            })
    }

    /// Create an account. The email must not be registered yet.
    pub async fn register(
        &self,
        client: &str,
        req: RegisterRequest,
    ) -> Result<UserSummary, AppError> {
        // ---
        self.admit_auth(action::REGISTER, client).await?;

        let (email, password) = required_credentials(req.email, req.password)?;

        if self.repository.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let hashed_password = self.hash_password(password).await?;
        let full_name = req.full_name.filter(|n| !n.trim().is_empty());

        let user = self
            .repository
            .insert_user(NewUser::new(email, hashed_password, full_name))
            .await
            .map_err(|err| match err.downcast_ref::<DuplicateEmail>() {
                Some(_) => AppError::Conflict("Email already registered".to_string()),
                None => AppError::Internal(err),
            })?;

        tracing::info!(user_id = user.id, "Registered new user");
        self.metrics.record_user_registered();

        Ok(UserSummary {
            id: user.id,
            email: user.email,
        })
    }

    /// Exchange email and password for a bearer token.
    pub async fn login(&self, client: &str, req: LoginRequest) -> Result<AccessToken, AppError> {
        // ---
        self.admit_auth(action::LOGIN, client).await?;

        let (email, password) = required_credentials(req.email, req.password)?;

        let user = self.repository.find_user_by_email(&email).await?;

        let hash = match &user {
            Some(u) => u.hashed_password.clone(),
            None => self.dummy_hash.clone(),
        };
        let verified = self.verify_password(password, hash).await?;

        let user = match user {
            Some(user) if verified => user,
            _ => {
                tracing::info!(%client, "Login rejected");
                self.metrics.record_login(false);
                return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
        };

        let issued = self.tokens.issue(&user.id.to_string())?;
        self.metrics.record_login(true);
        tracing::info!(user_id = user.id, "Login succeeded");

        Ok(AccessToken {
            access_token: issued.token,
            token_type: "bearer".to_string(),
            expires_in: issued.expires_in,
        })
    }

    /// Validate a bearer token and load the user it names.
    pub async fn resolve_current_user(&self, token: &str) -> Result<User, AppError> {
        // ---
        let subject = self.tokens.validate(token).map_err(|reason| {
            tracing::debug!(%reason, "Rejected bearer token");
            AppError::Unauthorized("Invalid token".to_string())
        })?;

        let user_id: i64 = subject.parse().map_err(|_| {
            tracing::debug!("Bearer token subject is not a user id");
            AppError::Unauthorized("Invalid token".to_string())
        })?;

        self.repository
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))
    }

    /// Admission check against the register/login allowance.
    pub async fn admit_auth(&self, action: &str, client: &str) -> Result<(), AppError> {
        // ---
        self.admit(action, client, self.limits.auth_per_window)
            .await
    }

    /// Admission check for `/me`-style API calls.
    pub async fn admit_api(&self, client: &str) -> Result<(), AppError> {
        // ---
        self.admit(action::ME, client, self.limits.api_per_window)
            .await
    }

    async fn hash_password(&self, password: String) -> anyhow::Result<String> {
        // ---
        let passwords = self.passwords;
        tokio::task::spawn_blocking(move || passwords.hash(&password))
            .await
            .context("Password hashing task failed")?
    }

    async fn verify_password(&self, password: String, hash: String) -> anyhow::Result<bool> {
        // ---
        let passwords = self.passwords;
        tokio::task::spawn_blocking(move || passwords.verify(&password, &hash))
            .await
            .context("Password verification task failed")
    }
}

/// Both fields must be present and non-blank.
fn required_credentials(
    email: Option<String>,
    password: Option<String>,
) -> Result<(String, String), AppError> {
    // ---
    match (email, password) {
        (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
            Ok((email, password))
        }
        _ => Err(AppError::BadRequest(
            "Email and password required".to_string(),
        )),
    }
}

/// Shared handle used by [`crate::app_state::AppState`].
pub type AuthGatewayPtr = Arc<AuthGateway>;

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::infrastructure::database::MemoryRepository;
    use crate::infrastructure::metrics::create_noop_metrics;
    use crate::infrastructure::rate_limit::MemoryRateLimitStore;

    const CLIENT: &str = "127.0.0.1";

    fn gateway_with(auth_limit: u32) -> AuthGateway {
        // ---
        AuthGateway::new(
            Arc::new(MemoryRepository::new()),
            Arc::new(MemoryRateLimitStore::new()),
            TokenService::new("test-secret", Duration::from_secs(3600)).unwrap(),
            PasswordHasher::new(4),
            AdmissionLimits {
                auth_per_window: auth_limit,
                api_per_window: 60,
                window: Duration::from_secs(60),
            },
            create_noop_metrics().unwrap(),
        )
        .unwrap()
    }

    fn gateway() -> AuthGateway {
        gateway_with(100)
    }

    fn register_req(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            full_name: Some("Alice".to_string()),
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn register_returns_summary() {
        // ---
        let gw = gateway();
        let summary = gw
            .register(CLIENT, register_req("alice@example.com", "pw123"))
            .await
            .unwrap();

        assert_eq!(
            summary,
            UserSummary {
                id: 1,
                email: "alice@example.com".to_string()
            }
        );

        let stored = gw
            .repository()
            .find_user_by_id(1)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(stored.hashed_password, "pw123");
        assert!(stored.is_active);
        assert_eq!(stored.full_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn register_duplicate_email_conflicts() {
        // ---
        let gw = gateway();
        gw.register(CLIENT, register_req("alice@example.com", "pw123"))
            .await
            .unwrap();

        let err = gw
            .register(CLIENT, register_req("alice@example.com", "other"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn register_requires_email_and_password() {
        // ---
        let gw = gateway();

        let missing_password = RegisterRequest {
            email: Some("bob@example.com".to_string()),
            ..Default::default()
        };
        let blank_email = register_req("   ", "pw");

        for req in [missing_password, blank_email, RegisterRequest::default()] {
            let err = gw.register(CLIENT, req).await.unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");
        }
    }

    #[tokio::test]
    async fn login_wrong_password_and_unknown_email_look_the_same() {
        // ---
        let gw = gateway();
        gw.register(CLIENT, register_req("alice@example.com", "pw123"))
            .await
            .unwrap();

        let wrong = gw
            .login(CLIENT, login_req("alice@example.com", "nope"))
            .await
            .unwrap_err();
        let unknown = gw
            .login(CLIENT, login_req("mallory@example.com", "pw123"))
            .await
            .unwrap_err();

        assert_eq!(wrong.to_string(), "Invalid credentials");
        assert_eq!(unknown.to_string(), "Invalid credentials");
        assert!(matches!(wrong, AppError::Unauthorized(_)));
        assert!(matches!(unknown, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn login_then_resolve_current_user() {
        // ---
        let gw = gateway();
        gw.register(CLIENT, register_req("alice@example.com", "pw123"))
            .await
            .unwrap();

        let token = gw
            .login(CLIENT, login_req("alice@example.com", "pw123"))
            .await
            .unwrap();
        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.expires_in, 3600);

        let user = gw.resolve_current_user(&token.access_token).await.unwrap();
        assert_eq!(user.email, "alice@example.com");
    }

    #[tokio::test]
    async fn resolve_rejects_tampered_token() {
        // ---
        let gw = gateway();
        gw.register(CLIENT, register_req("alice@example.com", "pw123"))
            .await
            .unwrap();
        let token = gw
            .login(CLIENT, login_req("alice@example.com", "pw123"))
            .await
            .unwrap();

        // Swap one character in the middle of the signature
        let mut chars: Vec<char> = token.access_token.chars().collect();
        let i = chars.len() - 10;
        chars[i] = if chars[i] == 'x' { 'y' } else { 'x' };
        let tampered: String = chars.into_iter().collect();

        let err = gw.resolve_current_user(&tampered).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert_eq!(err.to_string(), "Invalid token");
    }

    #[tokio::test]
    async fn resolve_reports_vanished_user() {
        // ---
        let gw = gateway();
        let token = TokenService::new("test-secret", Duration::from_secs(3600))
            .unwrap()
            .issue("999")
            .unwrap();

        let err = gw.resolve_current_user(&token.token).await.unwrap_err();
        assert_eq!(err.to_string(), "User not found");
    }

    #[tokio::test]
    async fn resolve_rejects_non_numeric_subject() {
        // ---
        let gw = gateway();
        let token = TokenService::new("test-secret", Duration::from_secs(3600))
            .unwrap()
            .issue("alice")
            .unwrap();

        let err = gw.resolve_current_user(&token.token).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid token");
    }

    #[tokio::test]
    async fn login_is_rate_limited_per_client() {
        // ---
        let gw = gateway_with(2);

        for _ in 0..2 {
            let err = gw
                .login(CLIENT, login_req("x@example.com", "pw"))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Unauthorized(_)));
        }

        let err = gw
            .login(CLIENT, login_req("x@example.com", "pw"))
            .await
            .unwrap_err();
        match err {
            AppError::RateLimited { retry_after_secs } => assert!(retry_after_secs <= 60),
            other => panic!("expected RateLimited, got {other:?}"),
        }

        // Another client and another action are unaffected.
        let err = gw
            .login("10.9.9.9", login_req("x@example.com", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        gw.register(CLIENT, register_req("x@example.com", "pw"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rate_limit_precedes_validation() {
        // ---
        let gw = gateway_with(0);

        let err = gw
            .register(CLIENT, RegisterRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RateLimited { .. }), "got {err:?}");
    }
}
