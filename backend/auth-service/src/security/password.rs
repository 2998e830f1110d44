/// Password hashing and verification using Argon2id
use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use crate::error::{AuthError, AuthResult};
use crate::validators::validate_password;
use once_cell::sync::Lazy;

// Verified against when the account does not exist, so unknown and known
// phone numbers cost the same Argon2 work
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| {
    let salt = SaltString::generate(rand::thread_rng());
    Argon2::default()
        .hash_password(b"dummy-password-never-matches", &salt)
        .ok()
        .map(|hash| hash.to_string())
});

/// Hash a password using Argon2id
/// Returns the PHC string suitable for storage
pub fn hash_password(password: &str) -> AuthResult<String> {
    // Validate password strength first
    if !validate_password(password) {
        return Err(AuthError::Validation(
            "password must be at least 8 characters with upper, lower and digit".to_string(),
        ));
    }

    let salt = SaltString::generate(rand::thread_rng());
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AuthError::Internal("Failed to hash password".to_string()))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against a stored hash
pub fn verify_password(password: &str, hash: &str) -> AuthResult<()> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AuthError::Internal("Invalid password hash format".to_string()))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Compute the dummy hash up front instead of on the first unknown login
pub fn init_dummy_hash() {
    Lazy::force(&DUMMY_HASH);
}

/// Run a full verification that always fails
pub fn verify_dummy_password(password: &str) -> AuthResult<()> {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    Err(AuthError::InvalidCredentials)
}
