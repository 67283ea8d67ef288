use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::{TokenError, TokenResult};
use scoreit_db::model::role::Role;

/// Label stored in the `sub` claim of every token issued by this service.
pub const TOKEN_SUBJECT: &str = "user-token";

/// Claims embedded in a token.
///
/// Timestamps are kept at second precision so a payload survives the
/// JWT round trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(rename = "jti")]
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expire_at: DateTime<Utc>,
    #[serde(rename = "nbf", with = "chrono::serde::ts_seconds")]
    pub not_before: DateTime<Utc>,
    #[serde(rename = "aud")]
    pub audience: String,
    #[serde(rename = "iss")]
    pub issuer: String,
    #[serde(rename = "sub")]
    pub subject: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl Payload {
    /// ## Summary
    /// Builds a payload with a fresh random id, issued now and expiring after `duration`.
    ///
    /// Not-before equals issued-at.
    ///
    /// ## Errors
    /// Returns `InvalidDuration` if the expiry does not fit in a timestamp.
    pub fn new(
        user_id: uuid::Uuid,
        roles: &[Role],
        duration: Duration,
        issuer: &str,
        audience: &str,
    ) -> TokenResult<Self> {
        let issued_at = Utc::now().trunc_subsecs(0);
        let expire_at = issued_at
            .checked_add_signed(duration)
            .ok_or(TokenError::InvalidDuration)?;

        Ok(Self {
            id: uuid::Uuid::new_v4(),
            user_id,
            issued_at,
            expire_at,
            not_before: issued_at,
            audience: audience.to_string(),
            issuer: issuer.to_string(),
            subject: TOKEN_SUBJECT.to_string(),
            roles: roles.to_vec(),
        })
    }

    /// ## Summary
    /// Checks the validity window against the current time.
    ///
    /// ## Errors
    /// Returns `ExpiredToken` once now has reached expire-at, `InvalidToken`
    /// if now is before not-before.
    pub fn valid(&self) -> TokenResult<()> {
        self.valid_at(Utc::now())
    }

    /// ## Errors
    /// See [`Payload::valid`].
    pub fn valid_at(&self, now: DateTime<Utc>) -> TokenResult<()> {
        if now >= self.expire_at {
            return Err(TokenError::ExpiredToken);
        }
        if now < self.not_before {
            return Err(TokenError::InvalidToken);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_payload_sets_window() {
        let user_id = uuid::Uuid::new_v4();
        let before = Utc::now();
        let payload = Payload::new(
            user_id,
            &[Role::user()],
            Duration::minutes(1),
            "scoreit-api",
            "scoreit-app",
        )
        .unwrap();

        assert_eq!(payload.user_id, user_id);
        assert_eq!(payload.not_before, payload.issued_at);
        assert_eq!(payload.expire_at - payload.issued_at, Duration::minutes(1));
        assert!((before - payload.issued_at) < Duration::seconds(1));
        assert_eq!(payload.subject, TOKEN_SUBJECT);
        assert!(payload.valid().is_ok());
    }

    #[test]
    fn payload_ids_are_unique() {
        let user_id = uuid::Uuid::new_v4();
        let a = Payload::new(user_id, &[], Duration::minutes(1), "i", "a").unwrap();
        let b = Payload::new(user_id, &[], Duration::minutes(1), "i", "a").unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn expired_and_not_yet_valid_windows() {
        let payload = Payload::new(
            uuid::Uuid::new_v4(),
            &[],
            Duration::minutes(1),
            "i",
            "a",
        )
        .unwrap();

        assert!(matches!(
            payload.valid_at(payload.expire_at),
            Err(TokenError::ExpiredToken)
        ));
        assert!(matches!(
            payload.valid_at(payload.not_before - Duration::seconds(1)),
            Err(TokenError::InvalidToken)
        ));
        assert!(payload.valid_at(payload.not_before).is_ok());
    }

    #[test]
    fn non_positive_duration_is_expired() {
        for duration in [Duration::zero(), Duration::minutes(-1)] {
            let payload = Payload::new(uuid::Uuid::new_v4(), &[], duration, "i", "a").unwrap();
            assert!(matches!(payload.valid(), Err(TokenError::ExpiredToken)));
        }
    }

    #[test]
    fn serde_round_trip_is_lossless() {
        let payload = Payload::new(
            uuid::Uuid::new_v4(),
            &[Role::user(), Role::admin()],
            Duration::hours(2),
            "scoreit-api",
            "scoreit-app",
        )
        .unwrap();

        let json = serde_json::to_string(&payload).unwrap();
        let decoded: Payload = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, payload);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["exp"], payload.expire_at.timestamp());
        assert_eq!(value["roles"], serde_json::json!(["user", "admin"]));
    }

    #[test]
    fn expiry_past_the_timestamp_range_is_rejected() {
        for duration in [Duration::MAX, Duration::MIN, Duration::days(365 * 300_000)] {
            assert!(matches!(
                Payload::new(uuid::Uuid::new_v4(), &[], duration, "i", "a"),
                Err(TokenError::InvalidDuration)
            ));
        }
    }
}
