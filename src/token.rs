//! Bearer token issuance and validation.
//!
//! Tokens are HS256 JWTs carrying the user id as `sub` and an absolute `exp`.
//! There is no revocation; expiry is the only end of life.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT claims payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<i64>,
    exp: i64,
}

/// A freshly signed token and the seconds it has left to live.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    // ---
    pub token: String,
    pub expires_in: i64,
}

/// Why a presented token was refused.
///
/// Only for server-side logging; callers must answer with a generic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidToken {
    // ---
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not verify")]
    BadSignature,
    #[error("token has expired")]
    Expired,
    #[error("token carries no subject")]
    MissingSubject,
}

/// Signs and verifies access tokens with a process-wide secret.
pub struct TokenService {
    // ---
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
}

impl TokenService {
    // ---
    pub fn new(secret: &str, default_ttl: std::time::Duration) -> Result<Self> {
        // ---
        let default_ttl =
            Duration::from_std(default_ttl).context("Access token TTL out of range")?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            default_ttl,
        })
    }

    /// TTL applied by [`TokenService::issue`].
    pub fn default_ttl(&self) -> Duration {
        // ---
        self.default_ttl
    }

    /// Issue a token for `subject` using the configured TTL.
    pub fn issue(&self, subject: &str) -> Result<IssuedToken> {
        // ---
        self.issue_with_ttl(subject, self.default_ttl)
    }

    /// Issue a token for `subject` expiring `ttl` from now.
    pub fn issue_with_ttl(&self, subject: &str, ttl: Duration) -> Result<IssuedToken> {
        // ---
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .context("Token expiry overflows")?;

        let claims = Claims {
            sub: Some(subject.to_string()),
            iat: Some(now.timestamp()),
            exp: expires_at.timestamp(),
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .context("Failed to sign access token")?;

        tracing::debug!("Issued access token for subject {}", subject);

        Ok(IssuedToken {
            token,
            expires_in: (expires_at - now).num_seconds().max(0),
        })
    }

    /// Verify signature and expiry, and return the subject.
    pub fn validate(&self, token: &str) -> Result<String, InvalidToken> {
        // ---
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|err| match err.kind() {
                ErrorKind::InvalidSignature => InvalidToken::BadSignature,
                ErrorKind::ExpiredSignature => InvalidToken::Expired,
                ErrorKind::MissingRequiredClaim(claim) if claim == "sub" => {
                    InvalidToken::MissingSubject
                }
                _ => InvalidToken::Malformed,
            })?;

        // Valid only while now < exp; the library accepts exp == now.
        if data.claims.exp <= Utc::now().timestamp() {
            return Err(InvalidToken::Expired);
        }

        match data.claims.sub {
            Some(sub) if !sub.trim().is_empty() => Ok(sub),
            _ => Err(InvalidToken::MissingSubject),
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use std::time::Duration as StdDuration;

    fn service(secret: &str) -> TokenService {
        TokenService::new(secret, StdDuration::from_secs(60 * 60)).unwrap()
    }

    #[test]
    fn issue_then_validate_returns_subject() {
        // ---
        let tokens = service("test-secret-key-12345");
        let issued = tokens.issue("42").unwrap();

        assert!(!issued.token.is_empty());
        assert_eq!(tokens.validate(&issued.token), Ok("42".to_string()));
    }

    #[test]
    fn expires_in_matches_ttl() {
        // ---
        let tokens = service("test-secret-key-12345");
        let issued = tokens.issue("1").unwrap();
        assert_eq!(issued.expires_in, 3600);

        let short = tokens.issue_with_ttl("1", Duration::seconds(90)).unwrap();
        assert_eq!(short.expires_in, 90);
    }

    #[test]
    fn expired_token_is_rejected() {
        // ---
        let tokens = service("test-secret-key-12345");
        let issued = tokens.issue_with_ttl("7", Duration::seconds(-5)).unwrap();

        assert_eq!(issued.expires_in, 0);
        assert_eq!(tokens.validate(&issued.token), Err(InvalidToken::Expired));
    }

    #[test]
    fn token_is_dead_in_its_expiry_second() {
        // ---
        let tokens = service("test-secret-key-12345");
        let issued = tokens.issue_with_ttl("7", Duration::zero()).unwrap();

        assert_eq!(issued.expires_in, 0);
        assert_eq!(tokens.validate(&issued.token), Err(InvalidToken::Expired));
    }

    #[test]
    fn different_secret_is_rejected() {
        // ---
        let signer = service("secret1");
        let verifier = service("secret2");
        let issued = signer.issue("7").unwrap();

        assert_eq!(
            verifier.validate(&issued.token),
            Err(InvalidToken::BadSignature)
        );
    }

    #[test]
    fn tampered_token_is_rejected() {
        // ---
        let tokens = service("test-secret-key-12345");
        let issued = tokens.issue("7").unwrap();

        // Swap the payload for one claiming a different subject.
        let parts: Vec<&str> = issued.token.split('.').collect();
        let forged = tokens.issue("8").unwrap();
        let forged_payload = forged.token.split('.').nth(1).unwrap();
        let tampered = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(tokens.validate(&tampered), Err(InvalidToken::BadSignature));
    }

    #[test]
    fn garbage_is_malformed() {
        // ---
        let tokens = service("test-secret-key-12345");

        assert_eq!(tokens.validate("invalid.token.here"), Err(InvalidToken::Malformed));
        assert_eq!(tokens.validate(""), Err(InvalidToken::Malformed));
    }

    #[test]
    fn missing_subject_is_rejected() {
        // ---
        #[derive(Serialize)]
        struct NoSubject {
            exp: i64,
        }

        let secret = "test-secret-key-12345";
        let tokens = service(secret);
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &NoSubject {
                exp: Utc::now().timestamp() + 600,
            },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        assert_eq!(tokens.validate(&token), Err(InvalidToken::MissingSubject));
    }

    #[test]
    fn blank_subject_is_rejected() {
        // ---
        let tokens = service("test-secret-key-12345");
        let issued = tokens.issue("  ").unwrap();

        assert_eq!(tokens.validate(&issued.token), Err(InvalidToken::MissingSubject));
    }

    #[test]
    fn other_algorithm_is_rejected() {
        // ---
        let secret = "test-secret-key-12345";
        let tokens = service(secret);
        let claims = Claims {
            sub: Some("7".to_string()),
            iat: Some(Utc::now().timestamp()),
            exp: Utc::now().timestamp() + 600,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        assert!(tokens.validate(&token).is_err());
    }
}
