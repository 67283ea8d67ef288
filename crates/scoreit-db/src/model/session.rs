use chrono::{DateTime, Utc};
use serde::Serialize;

/// Server-side record of a refresh token.
///
/// `id` is always the refresh token's payload id. The only mutation after
/// creation is `is_blocked` going from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub refresh_token: String,
    pub user_agent: String,
    pub client_ip: String,
    pub is_blocked: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Returns `true` once `now` has reached the stored expiry.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub refresh_token: String,
    pub user_agent: String,
    pub client_ip: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateSession {
    pub id: uuid::Uuid,
    pub is_blocked: bool,
}
