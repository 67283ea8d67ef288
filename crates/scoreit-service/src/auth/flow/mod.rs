//! Login, refresh and logout on top of the token maker and the stores.
//!
//! Access tokens are stateless. A refresh token is only honoured while its
//! session row is present, unblocked, owned by the same user, holds the exact
//! token string and has not expired.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::password::verify_password;
use super::token::{Payload, TokenMaker};
use crate::error::{ServiceError, ServiceResult};
use scoreit_core::config::TokenConfig;
use scoreit_db::{
    error::DbError,
    model::{
        session::{NewSession, UpdateSession},
        user::UserCredential,
    },
    store::{CredentialStore, SessionStore},
};

#[derive(Debug, Clone)]
pub struct LoginParams {
    pub username: String,
    pub password: String,
    pub user_agent: String,
    pub client_ip: String,
}

/// Public view of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: uuid::Uuid,
    pub username: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserCredential> for UserSummary {
    fn from(user: UserCredential) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub session_id: uuid::Uuid,
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub user: UserSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshOutcome {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
}

/// Orchestrates the session lifecycle.
pub struct AuthFlow {
    token_maker: Arc<dyn TokenMaker>,
    sessions: Arc<dyn SessionStore>,
    credentials: Arc<dyn CredentialStore>,
    access_token_duration: Duration,
    refresh_token_duration: Duration,
}

impl AuthFlow {
    #[must_use]
    pub fn new(
        token_maker: Arc<dyn TokenMaker>,
        sessions: Arc<dyn SessionStore>,
        credentials: Arc<dyn CredentialStore>,
        access_token_duration: Duration,
        refresh_token_duration: Duration,
    ) -> Self {
        Self {
            token_maker,
            sessions,
            credentials,
            access_token_duration,
            refresh_token_duration,
        }
    }

    /// ## Summary
    /// Builds a flow using the token durations from settings.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` if a duration cannot be represented.
    pub fn from_config(
        config: &TokenConfig,
        token_maker: Arc<dyn TokenMaker>,
        sessions: Arc<dyn SessionStore>,
        credentials: Arc<dyn CredentialStore>,
    ) -> ServiceResult<Self> {
        let duration = |name: &str, secs: i64| {
            Duration::try_seconds(secs).ok_or_else(|| {
                ServiceError::InvalidConfiguration(format!("{name} is out of range: {secs}"))
            })
        };

        Ok(Self::new(
            token_maker,
            sessions,
            credentials,
            duration("access_token_duration_secs", config.access_token_duration_secs)?,
            duration(
                "refresh_token_duration_secs",
                config.refresh_token_duration_secs,
            )?,
        ))
    }

    /// ## Summary
    /// Checks the credentials, then issues an access token carrying the user's
    /// roles and a refresh token backed by a new session.
    ///
    /// ## Errors
    /// - `NotFound` if the username is unknown.
    /// - `NotAuthenticated` if the password does not match.
    /// - `DatabaseError` or `TokenError` if a store or the token maker fails.
    #[tracing::instrument(skip(self, params), fields(username = %params.username, client_ip = %params.client_ip))]
    pub async fn login(&self, params: LoginParams) -> ServiceResult<LoginOutcome> {
        let user = self
            .credentials
            .get_user_by_username(&params.username)
            .await
            .map_err(store_error)?;

        verify_password(&params.password, &user.password_hash).inspect_err(|_| {
            tracing::debug!(user_id = %user.id, "Password does not match");
        })?;

        let roles = self
            .credentials
            .roles_for_user(user.id)
            .await
            .map_err(store_error)?;

        let (access_token, access_payload) =
            self.token_maker
                .create_token(user.id, &roles, self.access_token_duration)?;
        let (refresh_token, refresh_payload) =
            self.token_maker
                .create_token(user.id, &[], self.refresh_token_duration)?;

        let session = self
            .sessions
            .create_session(NewSession {
                id: refresh_payload.id,
                user_id: user.id,
                refresh_token: refresh_token.clone(),
                user_agent: params.user_agent,
                client_ip: params.client_ip,
                expires_at: refresh_payload.expire_at,
            })
            .await
            .map_err(store_error)?;

        tracing::info!(user_id = %user.id, session_id = %session.id, role_count = roles.len(), "User logged in");

        Ok(LoginOutcome {
            session_id: session.id,
            access_token,
            access_token_expires_at: access_payload.expire_at,
            refresh_token,
            refresh_token_expires_at: refresh_payload.expire_at,
            user: user.into(),
        })
    }

    /// ## Summary
    /// Issues a new access token for the owner of a live session. Roles are
    /// read again from the credential store.
    ///
    /// ## Errors
    /// - `NotAuthenticated` if the token fails verification or the session is
    ///   blocked, owned by another user, holds another token, or has expired.
    /// - `NotFound` if no session exists for the token.
    /// - `DatabaseError` or `TokenError` if a store or the token maker fails.
    #[tracing::instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> ServiceResult<RefreshOutcome> {
        let payload = self.verify(refresh_token)?;

        let session = self
            .sessions
            .get_session(payload.id)
            .await
            .map_err(store_error)?;

        if session.is_blocked {
            tracing::debug!(session_id = %session.id, "Session is blocked");
            return Err(ServiceError::NotAuthenticated);
        }
        if session.user_id != payload.user_id {
            tracing::debug!(session_id = %session.id, "Session belongs to another user");
            return Err(ServiceError::NotAuthenticated);
        }
        if session.refresh_token != refresh_token {
            tracing::debug!(session_id = %session.id, "Refresh token does not match session");
            return Err(ServiceError::NotAuthenticated);
        }
        if session.is_expired_at(Utc::now()) {
            tracing::debug!(session_id = %session.id, "Session has expired");
            return Err(ServiceError::NotAuthenticated);
        }

        let roles = self
            .credentials
            .roles_for_user(payload.user_id)
            .await
            .map_err(store_error)?;

        let (access_token, access_payload) =
            self.token_maker
                .create_token(payload.user_id, &roles, self.access_token_duration)?;

        tracing::debug!(user_id = %payload.user_id, session_id = %session.id, "Access token renewed");

        Ok(RefreshOutcome {
            access_token,
            access_token_expires_at: access_payload.expire_at,
        })
    }

    /// ## Summary
    /// Blocks the session of a refresh token. Blocking an already blocked
    /// session succeeds.
    ///
    /// ## Errors
    /// - `NotAuthenticated` if the token fails verification.
    /// - `NotFound` if no session exists for the token.
    /// - `DatabaseError` if the session store fails.
    #[tracing::instrument(skip_all)]
    pub async fn logout(&self, refresh_token: &str) -> ServiceResult<()> {
        let payload = self.verify(refresh_token)?;

        self.sessions
            .update_session(UpdateSession {
                id: payload.id,
                is_blocked: true,
            })
            .await
            .map_err(store_error)?;

        tracing::info!(user_id = %payload.user_id, session_id = %payload.id, "User logged out");
        Ok(())
    }

    fn verify(&self, token: &str) -> ServiceResult<Payload> {
        self.token_maker.verify_token(token).map_err(|err| {
            tracing::debug!(reason = %err, "Refresh token rejected");
            ServiceError::NotAuthenticated
        })
    }
}

fn store_error(err: DbError) -> ServiceError {
    match err {
        DbError::NotFound(what) => ServiceError::NotFound(what),
        other => {
            tracing::error!(error = %other, "Store operation failed");
            ServiceError::DatabaseError(other)
        }
    }
}
