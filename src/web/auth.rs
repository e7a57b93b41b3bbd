//! Customer sessions and staff access.
//!
//! Customers log in with email and password and get an opaque bearer token.
//! Staff present the shared staff or admin secret in `x-staff-key`.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::{async_trait, extract::FromRequestParts, http::{header, request::Parts}};
use tracing::warn;
use uuid::Uuid;

use super::error::ApiError;
use super::repository::{self, Session};
use super::AppState;
use crate::domain::access::{AccessError, Role};
use crate::domain::aggregates::Customer;

pub const STAFF_KEY_HEADER: &str = "x-staff-key";

/// Argon2id with a fresh random salt, as a PHC string (`$argon2id$v=19$...`).
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

/// Checks a password against a stored PHC string; the digests are compared in constant time.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(hash) => Argon2::default().verify_password(password.as_bytes(), &hash).is_ok(),
        Err(e) => {
            warn!(error = %e, "stored password hash is unreadable");
            false
        }
    }
}

pub fn new_token() -> String { format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()) }

fn bearer(parts: &Parts) -> Option<&str> {
    parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
}

/// The logged-in customer and the session the request came with.
pub struct CurrentCustomer {
    pub customer: Customer,
    pub session: Session,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentCustomer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer(parts).ok_or(ApiError::Unauthorized)?;
        let mut conn = state.db.acquire().await?;
        let session = repository::find_session(&mut conn, token).await?.ok_or(ApiError::Unauthorized)?;
        let customer = repository::find_customer(&mut conn, &session.customer_id).await?
            .filter(Customer::is_active)
            .ok_or(ApiError::Unauthorized)?;
        Ok(Self { customer, session })
    }
}

/// A caller holding the staff or admin secret.
pub struct StaffAccess { pub role: Role }

impl StaffAccess {
    pub fn ensure_catalog_manager(&self) -> Result<(), ApiError> {
        if self.role.can_manage_catalog() { Ok(()) } else { Err(AccessError::Forbidden(self.role).into()) }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for StaffAccess {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let key = parts.headers.get(STAFF_KEY_HEADER).and_then(|v| v.to_str().ok()).ok_or(ApiError::Unauthorized)?;
        let role = state.gate.require_order_handler(key)?;
        Ok(Self { role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_is_salted() {
        let a = hash_password("secret-pass").unwrap();
        assert!(a.starts_with("$argon2id$"), "{a}");
        assert!(!a.contains("secret-pass"));
        let b = hash_password("secret-pass").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("secret-pass", &a));
        assert!(verify_password("secret-pass", &b));
        assert!(!verify_password("Secret-pass", &a));
    }

    #[test]
    fn test_unreadable_hash_never_verifies() {
        assert!(!verify_password("secret-pass", ""));
        assert!(!verify_password("secret-pass", "5e884898da28047151d0e56f8dc62927"));
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(new_token(), new_token());
        assert_eq!(new_token().len(), 64);
    }
}
