//! Argon2id password hashing for stored credentials.

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{SaltString, rand_core::OsRng},
};

use crate::error::{ServiceError, ServiceResult};

fn hasher() -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default())
}

/// ## Summary
/// Hashes a password with a fresh random salt, producing a PHC string
/// suitable for the `password_hash` field of a seeded user.
///
/// ## Errors
/// Returns `InvalidConfiguration` if hashing fails.
pub fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    hasher()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::InvalidConfiguration(format!("Failed to hash password: {e}")))
}

/// ## Summary
/// Checks a login password against a stored PHC hash. The parameters encoded
/// in the hash take precedence over the defaults used for new hashes.
///
/// ## Errors
/// - `NotAuthenticated` if the password does not match.
/// - `InvalidConfiguration` if the stored hash cannot be parsed.
pub fn verify_password(password: &str, password_hash: &str) -> ServiceResult<()> {
    let stored = PasswordHash::new(password_hash)
        .map_err(|e| ServiceError::InvalidConfiguration(format!("Invalid password hash: {e}")))?;

    hasher()
        .verify_password(password.as_bytes(), &stored)
        .map_err(|err| {
            tracing::trace!(error = %err, "Password verification failed");
            ServiceError::NotAuthenticated
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_salted_argon2id_phc_strings() {
        let first = hash_password("pa55word").unwrap();
        let second = hash_password("pa55word").unwrap();

        assert!(first.starts_with("$argon2id$v=19$"));
        assert_ne!(first, second);
        assert!(verify_password("pa55word", &first).is_ok());
        assert!(verify_password("pa55word", &second).is_ok());
    }

    #[test]
    fn mismatch_is_not_authenticated() {
        let hash = hash_password("pa55word").unwrap();

        for attempt in ["pa55worD", "", "pa55word "] {
            assert!(matches!(
                verify_password(attempt, &hash),
                Err(ServiceError::NotAuthenticated)
            ));
        }
    }

    #[test]
    fn unparseable_hash_is_a_configuration_error() {
        for stored in ["", "plaintext"] {
            assert!(matches!(
                verify_password("pa55word", stored),
                Err(ServiceError::InvalidConfiguration(_))
            ));
        }
    }
}
