use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::{Payload, TokenError, TokenMaker, TokenResult};
use scoreit_core::{config::TokenConfig, constants::SYMMETRIC_KEY_SIZE};
use scoreit_db::model::role::Role;

/// HS256 token maker keyed by a single symmetric key.
pub struct JwtMaker {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
}

impl JwtMaker {
    /// ## Summary
    /// Creates a maker for the given key, issuer and audience.
    ///
    /// ## Errors
    /// Returns `InvalidKeySize` if the key is not exactly `SYMMETRIC_KEY_SIZE` bytes.
    pub fn new(symmetric_key: &[u8], issuer: &str, audience: &str) -> TokenResult<Self> {
        if symmetric_key.len() != SYMMETRIC_KEY_SIZE {
            return Err(TokenError::InvalidKeySize {
                expected: SYMMETRIC_KEY_SIZE,
                actual: symmetric_key.len(),
            });
        }

        // Expiry is decided by `Payload::valid` without leeway.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.set_required_spec_claims(&["exp", "nbf", "aud", "iss", "sub"]);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(symmetric_key),
            decoding_key: DecodingKey::from_secret(symmetric_key),
            validation,
            issuer: issuer.to_string(),
            audience: audience.to_string(),
        })
    }

    /// ## Summary
    /// Creates a maker from the token section of the settings.
    ///
    /// ## Errors
    /// Returns `InvalidKeySize` if the configured key has the wrong length.
    pub fn from_config(config: &TokenConfig) -> TokenResult<Self> {
        Self::new(
            config.symmetric_key.as_bytes(),
            &config.issuer,
            &config.audience,
        )
    }
}

impl TokenMaker for JwtMaker {
    fn create_token(
        &self,
        user_id: uuid::Uuid,
        roles: &[Role],
        duration: Duration,
    ) -> TokenResult<(String, Payload)> {
        let payload = Payload::new(user_id, roles, duration, &self.issuer, &self.audience)?;

        let token = encode(&Header::new(Algorithm::HS256), &payload, &self.encoding_key)
            .map_err(TokenError::Encoding)?;

        Ok((token, payload))
    }

    fn verify_token(&self, token: &str) -> TokenResult<Payload> {
        let payload = decode::<Payload>(token, &self.decoding_key, &self.validation)
            .map_err(|err| {
                tracing::trace!(error = %err, "Token failed to decode");
                TokenError::InvalidToken
            })?
            .claims;

        payload.valid()?;

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn random_key() -> String {
        // 32 hex characters
        uuid::Uuid::new_v4().simple().to_string()
    }

    fn maker() -> JwtMaker {
        JwtMaker::new(random_key().as_bytes(), "scoreit-api", "scoreit-app").unwrap()
    }

    #[test]
    fn create_and_verify_token() {
        let maker = maker();
        let user_id = uuid::Uuid::new_v4();
        let duration = Duration::minutes(1);
        let issued_at = chrono::Utc::now();
        let expired_at = issued_at + duration;

        let (token, created) = maker
            .create_token(user_id, &[Role::user()], duration)
            .unwrap();
        assert!(!token.is_empty());

        let payload = maker.verify_token(&token).unwrap();
        assert_eq!(payload, created);
        assert_eq!(payload.user_id, user_id);
        assert_eq!(payload.roles, vec![Role::user()]);
        assert!((payload.issued_at - issued_at).num_seconds().abs() <= 1);
        assert!((payload.expire_at - expired_at).num_seconds().abs() <= 1);
        assert_eq!(payload.issuer, "scoreit-api");
        assert_eq!(payload.audience, "scoreit-app");
    }

    #[test]
    fn role_set_survives_in_any_order() {
        let maker = maker();
        let roles = vec![Role::admin(), Role::new("scorekeeper"), Role::user()];

        let (token, _) = maker
            .create_token(uuid::Uuid::new_v4(), &roles, Duration::minutes(5))
            .unwrap();
        let mut verified = maker.verify_token(&token).unwrap().roles;

        let mut expected = roles;
        verified.sort();
        expected.sort();
        assert_eq!(verified, expected);
    }

    #[test]
    fn expired_token() {
        let maker = maker();
        for duration in [Duration::minutes(-1), Duration::zero()] {
            let (token, payload) = maker
                .create_token(uuid::Uuid::new_v4(), &[Role::user()], duration)
                .unwrap();
            assert!(!token.is_empty());
            assert!(payload.expire_at <= chrono::Utc::now());

            assert!(matches!(
                maker.verify_token(&token),
                Err(TokenError::ExpiredToken)
            ));
        }
    }

    #[test]
    fn oversized_duration_is_an_error() {
        let maker = maker();
        for duration in [
            Duration::seconds(9_000_000_000_000),
            Duration::MAX,
            Duration::MIN,
        ] {
            assert!(matches!(
                maker.create_token(uuid::Uuid::new_v4(), &[], duration),
                Err(TokenError::InvalidDuration)
            ));
        }
    }

    #[test]
    fn invalid_key_size() {
        for len in [0, 16, 31, 33, 64] {
            let key = vec![b'k'; len];
            let result = JwtMaker::new(&key, "scoreit-api", "scoreit-app");
            assert!(matches!(
                result,
                Err(TokenError::InvalidKeySize {
                    expected: SYMMETRIC_KEY_SIZE,
                    actual
                }) if actual == len
            ));
        }
    }

    #[test]
    fn token_from_other_key_is_invalid() {
        let (token, _) = maker()
            .create_token(uuid::Uuid::new_v4(), &[Role::user()], Duration::minutes(1))
            .unwrap();

        assert!(matches!(
            maker().verify_token(&token),
            Err(TokenError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_from_other_key_is_invalid_not_expired() {
        let (token, _) = maker()
            .create_token(uuid::Uuid::new_v4(), &[], Duration::minutes(-1))
            .unwrap();

        assert!(matches!(
            maker().verify_token(&token),
            Err(TokenError::InvalidToken)
        ));
    }

    #[test]
    fn tampered_and_malformed_tokens_are_invalid() {
        let maker = maker();
        let (token, _) = maker
            .create_token(uuid::Uuid::new_v4(), &[Role::user()], Duration::minutes(1))
            .unwrap();

        // Claims of another token, signature of this one.
        let (other, _) = maker
            .create_token(uuid::Uuid::new_v4(), &[Role::admin()], Duration::minutes(1))
            .unwrap();
        let other_claims = other.split('.').nth(1).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = other_claims;
        let spliced = parts.join(".");

        for bad in [spliced.as_str(), "", "not-a-token", "a.b.c"] {
            assert!(
                matches!(maker.verify_token(bad), Err(TokenError::InvalidToken)),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn issuer_or_audience_mismatch_is_invalid() {
        let key = random_key();
        let issuing = JwtMaker::new(key.as_bytes(), "someone-else", "scoreit-app").unwrap();
        let verifying = JwtMaker::new(key.as_bytes(), "scoreit-api", "scoreit-app").unwrap();
        let (token, _) = issuing
            .create_token(uuid::Uuid::new_v4(), &[], Duration::minutes(1))
            .unwrap();
        assert!(matches!(
            verifying.verify_token(&token),
            Err(TokenError::InvalidToken)
        ));

        let issuing = JwtMaker::new(key.as_bytes(), "scoreit-api", "other-app").unwrap();
        let (token, _) = issuing
            .create_token(uuid::Uuid::new_v4(), &[], Duration::minutes(1))
            .unwrap();
        assert!(matches!(
            verifying.verify_token(&token),
            Err(TokenError::InvalidToken)
        ));
    }
}
