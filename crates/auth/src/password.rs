//! Password hashing with Argon2id.
//!
//! Hashes are PHC strings carrying their own salt and parameters, so only the
//! string needs storing.

use argon2::{
    Argon2,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password does not match")]
    Mismatch,
    #[error("password hash: {0}")]
    Hash(String),
}

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| PasswordError::Hash(err.to_string()))
}

/// Check `password` against a hash produced by [`hash_password`].
pub fn check_password(password: &str, hashed_password: &str) -> Result<(), PasswordError> {
    let parsed =
        PasswordHash::new(hashed_password).map_err(|err| PasswordError::Hash(err.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|err| match err {
            password_hash::Error::Password => PasswordError::Mismatch,
            other => PasswordError::Hash(other.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_check() {
        let hashed = hash_password("secret").unwrap();

        assert!(hashed.starts_with("$argon2id$"));
        assert_ne!(hashed, "secret");
        assert_eq!(check_password("secret", &hashed), Ok(()));
        assert_eq!(
            check_password("wrong", &hashed),
            Err(PasswordError::Mismatch)
        );
    }

    #[test]
    fn same_password_gets_a_new_salt() {
        let first = hash_password("secret").unwrap();
        let second = hash_password("secret").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_hash_is_not_a_mismatch() {
        assert!(matches!(
            check_password("secret", "not-a-phc-string"),
            Err(PasswordError::Hash(_))
        ));
    }
}
