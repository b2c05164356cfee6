use anyhow::Result;
use parking_lot::Mutex;

use crate::domain::{DuplicateEmail, NewUser, Repository, User};

/// In-memory user store with sequential ids starting at 1.
#[derive(Default)]
pub struct MemoryRepository {
    // ---
    users: Mutex<Vec<User>>,
}

impl MemoryRepository {
    // ---
    pub fn new() -> Self {
        // ---
        Self::default()
    }
}

#[async_trait::async_trait]
impl Repository for MemoryRepository {
    // ---
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        // ---
        Ok(self.users.lock().iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>> {
        // ---
        Ok(self.users.lock().iter().find(|u| u.id == user_id).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        // ---
        let mut users = self.users.lock();

        if users.iter().any(|u| u.email == user.email) {
            return Err(DuplicateEmail(user.email).into());
        }

        let id = users.last().map_or(1, |u| u.id + 1);
        let user = user.into_user(id);
        users.push(user.clone());

        Ok(user)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
