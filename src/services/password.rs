//! Password hashing
//!
//! Argon2id with the crate's default parameters and a fresh random salt per
//! hash. Hashes are stored in PHC string format, so the parameters travel
//! with the hash.

use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Well-formed hash no password matches, with the default cost parameters.
/// Verifying against it when no account exists costs as much as a wrong
/// password does.
pub const UNMATCHABLE_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$Y29uZHVpdC1ub21hdGNoIQ$DVn32UWMAkJl+Nd55ex2k6Z6noIWGMY39BCnAZme8Xw";

/// Hash a password using Argon2id.
///
/// ```ignore
/// use conduit::services::password::hash_password;
///
/// let hash = hash_password("jakejake")?;
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
        .context("Password hashing failed")?;

    Ok(password_hash.to_string())
}

/// Verify a password against a stored PHC hash.
///
/// A mismatch is `Ok(false)`; only a malformed stored hash is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Password verification failed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_produces_argon2id_hash() {
        let hash = hash_password("jakejake").expect("Failed to hash password");
        assert!(hash.starts_with("$argon2id$"));
        assert_ne!(hash, "jakejake");
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let first = hash_password("jakejake").unwrap();
        let second = hash_password("jakejake").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("jakejake", &first).unwrap());
        assert!(verify_password("jakejake", &second).unwrap());
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(!verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn test_unmatchable_hash_shares_default_parameters() {
        let fresh = hash_password("jakejake").unwrap();
        let params = |hash: &str| hash.split('$').take(4).collect::<Vec<_>>().join("$");

        assert_eq!(params(UNMATCHABLE_HASH), params(&fresh));
        assert!(!verify_password("jakejake", UNMATCHABLE_HASH).unwrap());
        assert!(!verify_password("", UNMATCHABLE_HASH).unwrap());
    }

    #[test]
    fn test_verify_malformed_hash_is_error() {
        assert!(verify_password("whatever", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_unicode_password() {
        let hash = hash_password("пароль-密码-🔐").unwrap();
        assert!(verify_password("пароль-密码-🔐", &hash).unwrap());
        assert!(!verify_password("пароль-密码", &hash).unwrap());
    }
}
