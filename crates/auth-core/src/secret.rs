//! Credential generation, hashing, and comparison

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use rand::rngs::OsRng;
use rand::{Rng, RngCore, distributions::Alphanumeric};

use crate::error::{AuthError, Result};

/// Length of generated API client ids.
pub const CLIENT_ID_LEN: usize = 16;

/// Length of generated API client secrets.
pub const CLIENT_SECRET_LEN: usize = 32;

/// Maximum stored length of an API client name.
pub const CLIENT_NAME_MAX_LEN: usize = 32;

/// Length of generated refresh tokens.
pub const REFRESH_TOKEN_LEN: usize = 32;

/// Length of a generated bearer-token signing secret.
pub const SIGNING_SECRET_LEN: usize = 64;

/// Generate a random alphanumeric string from the OS entropy source.
pub fn random_alphanumeric(len: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Hash a password into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut salt_bytes);
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::Internal(e.to_string()))?;

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Internal(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a candidate password against a stored PHC string.
///
/// Argon2 verification is constant-time in the password; an unparseable
/// stored hash simply fails the check.
pub fn verify_password(stored_hash: &str, candidate: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Constant-time equality for short opaque secrets.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    ring::constant_time::verify_slices_are_equal(a.as_bytes(), b.as_bytes()).is_ok()
}

/// Canonical form of a security answer: punctuation and spaces stripped,
/// lowercased. Applied before hashing and before verification.
pub fn normalize_security_answer(answer: &str) -> String {
    const STRIP: &str = " !@#$%^&*()-_=+'\",.<>?";
    answer
        .chars()
        .filter(|c| !STRIP.contains(*c))
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_password() {
        let hash = hash_password("pw123").unwrap();
        assert!(verify_password(&hash, "pw123"));
        assert!(!verify_password(&hash, "pw124"));
        assert!(!verify_password("not-a-phc-string", "pw123"));
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("same-password").unwrap();
        let second = hash_password("same-password").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn random_strings_have_requested_shape() {
        let token = random_alphanumeric(REFRESH_TOKEN_LEN);
        assert_eq!(token.len(), REFRESH_TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, random_alphanumeric(REFRESH_TOKEN_LEN));
    }

    #[test]
    fn constant_time_eq_matches_exactly() {
        assert!(constant_time_eq("secret", "secret"));
        assert!(!constant_time_eq("secret", "secreT"));
        assert!(!constant_time_eq("secret", "secret-longer"));
    }

    #[test]
    fn security_answers_are_normalized() {
        assert_eq!(normalize_security_answer("My Dog, Rex!"), "mydogrex");
        assert_eq!(normalize_security_answer("12345"), "12345");
    }
}
