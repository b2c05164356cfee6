use super::user::{NewUser, User};
use anyhow::Result;
use std::sync::Arc;

/// Returned (wrapped in `anyhow::Error`) by [`Repository::insert_user`] when the
/// email is already taken.
#[derive(Debug, thiserror::Error)]
#[error("email already registered: {0}")]
pub struct DuplicateEmail(pub String);

/// Abstraction over user persistence.
///
/// The auth core only reads users and inserts them once at registration;
/// everything else about the entity belongs to the storage layer.
#[async_trait::async_trait]
pub trait Repository: Send + Sync {
    // ---
    /// Get user by email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Get user by ID.
    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>>;

    /// Insert a new user and return it with its assigned id.
    ///
    /// Fails with [`DuplicateEmail`] if the email is already present.
    async fn insert_user(&self, user: NewUser) -> Result<User>;

    /// Cheap connectivity check used by `/health?mode=full`.
    async fn ping(&self) -> Result<()>;
}

/// Type alias for any backend that implements Repository.
pub type RepositoryPtr = Arc<dyn Repository>;
