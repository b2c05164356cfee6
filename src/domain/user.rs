use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    // ---
    pub id: i64,
    pub email: String,

    /// bcrypt hash, never serialized
    #[serde(skip_serializing)]
    pub hashed_password: String,

    pub full_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A user that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    // ---
    pub email: String,
    pub hashed_password: String,
    pub full_name: Option<String>,
}

impl NewUser {
    // ---
    pub fn new(email: String, hashed_password: String, full_name: Option<String>) -> Self {
        // ---
        Self {
            email,
            hashed_password,
            full_name,
        }
    }

    /// Materialize into an active [`User`] with the id assigned by the store.
    pub fn into_user(self, id: i64) -> User {
        // ---
        User {
            id,
            email: self.email,
            hashed_password: self.hashed_password,
            full_name: self.full_name,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
