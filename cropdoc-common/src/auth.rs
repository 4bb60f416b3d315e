//! Credential hashing and session token helpers
//!
//! Pure functions only; no HTTP framework dependencies. The bearer-token
//! middleware lives in the service crate.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{Error, Result};

/// Session lifetime: 7 days from issue
pub const SESSION_TTL_DAYS: i64 = 7;

/// Hash a plaintext password for storage
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a plaintext password against a stored hash
///
/// A malformed stored hash counts as a failed verification rather than an
/// error, so login never leaks whether a hash exists.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    bcrypt::verify(password, stored_hash).unwrap_or(false)
}

/// Generate an opaque session token
pub fn generate_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Expiry timestamp for a session issued at `issued_at`
pub fn session_expiry(issued_at: DateTime<Utc>) -> DateTime<Utc> {
    issued_at + Duration::days(SESSION_TTL_DAYS)
}
