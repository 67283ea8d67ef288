use chrono::{DateTime, Utc};
use serde::Serialize;

/// A login credential as seen by the auth core. Read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserCredential {
    pub id: uuid::Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserCredential {
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub email: String,
}
