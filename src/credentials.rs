//! Password hashing and verification.
//!
//! Hashes are bcrypt strings (`$2b$<cost>$<salt><digest>`) with a fresh random
//! salt per call. Both operations are deliberately slow; async callers should
//! run them on the blocking pool.

use anyhow::{Context, Result};

/// Salted, adaptive password hasher backed by bcrypt.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    // ---
    cost: u32,
}

impl PasswordHasher {
    // ---
    pub fn new(cost: u32) -> Self {
        // ---
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        // ---
        self.cost
    }

    /// Hash `plaintext` with a new random salt.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        // ---
        bcrypt::hash(plaintext, self.cost).context("Failed to hash password")
    }

    /// Check `plaintext` against a stored hash.
    ///
    /// Returns `false` on mismatch and on a malformed hash; never errors.
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        // ---
        match bcrypt::verify(plaintext, hash) {
            Ok(matches) => matches,
            Err(err) => {
                tracing::warn!("Stored password hash could not be parsed: {}", err);
                false
            }
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}
