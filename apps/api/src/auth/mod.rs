//! Auth — JWT bearer tokens and password hashing.
//!
//! Tokens are HS256 with `sub` = user id; lifetime comes from config.
//! Passwords are Argon2id with a per-hash random salt.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod extract;
pub mod handlers;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Issues and verifies access tokens. Constructed once at startup and
/// carried in `AppState`.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_minutes: i64,
}

impl TokenIssuer {
    pub fn new(secret: &str, expiry_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_minutes,
        }
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + Duration::minutes(self.expiry_minutes)).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| anyhow!("Failed to encode access token: {e}"))
    }

    /// Validates the token signature and expiry and returns the user id.
    pub fn verify(&self, token: &str) -> Result<Uuid> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| anyhow!("Token validation failed: {e}"))?;
        Uuid::parse_str(&data.claims.sub).map_err(|e| anyhow!("Invalid user ID in claims: {e}"))
    }
}

pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| anyhow!("Failed to hash password: {e}"))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| anyhow!("Invalid password hash: {e}"))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow!("Password verification failed: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("this-is-a-very-long-secret-key-for-testing-purposes", 30)
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let tokens = issuer();
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id).expect("issue failed");
        let verified = tokens.verify(&token).expect("verify failed");
        assert_eq!(verified, user_id);
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let tokens = issuer();
        assert!(tokens.verify("not.a.token").is_err());
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let token = issuer().issue(Uuid::new_v4()).expect("issue failed");
        let other = TokenIssuer::new("a-completely-different-secret-of-decent-length", 30);
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Basic abc123"), None);
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("correct horse battery staple").expect("hash failed");
        assert!(verify_password("correct horse battery staple", &hash).expect("verify failed"));
        assert!(!verify_password("wrong password", &hash).expect("verify failed"));
    }

    #[test]
    fn test_password_hashes_are_salted() {
        let a = hash_password("same password").expect("hash failed");
        let b = hash_password("same password").expect("hash failed");
        assert_ne!(a, b);
    }
}
