//! Authentication primitives and request extractors
//!
//! Token issuance/verification is a boundary concern: handlers only ever see
//! `CurrentUser` / `MaybeUser`, fed by the API middleware that resolves
//! the `Authorization: Token <key>` header against stored sha256 hashes.

use crate::db::models::User;
use crate::errors::{AppError, Result};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};
use axum::{extract::FromRequestParts, http::request::Parts};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Authentication context resolved by the middleware for every request
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    /// The authenticated user, if the request carried a valid token
    pub user: Option<User>,

    /// Hash of the presented token, kept so logout can delete exactly it
    pub token_hash: Option<String>,
}

impl AuthContext {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Extractor rejecting anonymous callers with 401
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let ctx = parts.extensions.get::<AuthContext>().cloned().unwrap_or_default();
        match ctx.user {
            Some(user) => Ok(CurrentUser(user)),
            None => Err(AppError::Unauthorized {
                message: "authentication credentials were not provided".to_string(),
            }),
        }
    }
}

/// Extractor tolerating anonymous callers
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let ctx = parts.extensions.get::<AuthContext>().cloned().unwrap_or_default();
        Ok(MaybeUser(ctx.user))
    }
}

/// Generate a fresh opaque token (64 hex chars)
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hash a token for storage and lookup
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash a password with argon2
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal {
            message: format!("Failed to hash password: {}", e),
        })
}

/// Verify a password against a stored argon2 hash
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(password_hash).map_err(|e| AppError::Internal {
        message: format!("Stored password hash is malformed: {}", e),
    })?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_hash_token_deterministic() {
        let a = hash_token("secret");
        let b = hash_token("secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, hash_token("other"));
    }

    #[test]
    fn test_password_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
    }
}
