// Salted, one-way password hashing on top of argon2. Digests are PHC
// strings; the per-user salt is generated here and returned to the caller
// for storage alongside the digest.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use once_cell::sync::Lazy;

use crate::error::{AppError, AppResult};

/// Digest used to equalize the authenticate path when no user matches the
/// email, so an unknown email costs the same as a wrong password.
static DUMMY_DIGEST: Lazy<String> = Lazy::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"placeholder-credential", &salt)
        .map(|hash| hash.to_string())
        .unwrap_or_default()
});

/// Hash a plaintext password under a freshly generated salt.
/// Returns `(salt, digest)`; the plaintext is not retained.
pub fn hash(password: &str) -> AppResult<(String, String)> {
    let salt = SaltString::generate(&mut OsRng);
    let digest = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

    Ok((salt.to_string(), digest.to_string()))
}

/// Recompute and compare. The comparison inside `verify_password` is
/// constant-time, so the digest never leaks through timing.
pub fn verify(candidate: &str, digest: &str) -> bool {
    match PasswordHash::new(digest) {
        Ok(parsed) => Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn dummy_digest() -> &'static str {
    &DUMMY_DIGEST
}
