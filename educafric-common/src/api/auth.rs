//! Credential primitives: password hashing and session tokens
//!
//! # Passwords
//!
//! Argon2id with a random salt, stored as a PHC string.
//!
//! # Session tokens
//!
//! - 32 random bytes, hex encoded, handed to the client in a cookie
//! - Only the SHA-256 of the token is stored, so a leaked `sessions`
//!   table cannot be replayed
//!
//! # Pure Functions
//!
//! No HTTP framework dependencies; the cookie handling lives in the services.

use crate::Result;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Name of the session cookie
pub const SESSION_COOKIE_NAME: &str = "educafric_session";

/// Session token length in bytes (before hex encoding)
const SESSION_TOKEN_BYTES: usize = 32;

// ========================================
// Passwords
// ========================================

/// Hash a plaintext password
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against a stored hash
///
/// A malformed stored hash is an error; a wrong password is `Ok(false)`.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)?;
    let argon2 = Argon2::default();

    Ok(argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

// ========================================
// Session Tokens
// ========================================

/// Generate a new random session token (64 hex chars)
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    to_hex(&bytes)
}

/// Digest of a session token as stored in the database
pub fn hash_session_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Extract the session token from a `Cookie` header value
///
/// # Examples
///
/// ```
/// use educafric_common::api::auth::session_token_from_cookie_header;
///
/// let header = "theme=dark; educafric_session=abc123; lang=fr";
/// assert_eq!(session_token_from_cookie_header(header), Some("abc123"));
/// assert_eq!(session_token_from_cookie_header("theme=dark"), None);
/// ```
pub fn session_token_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

// ========================================
// Tests
// ========================================
