//! In-process implementations of the storage contracts.

use std::collections::HashMap;

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use tokio::sync::RwLock;

use super::{CredentialStore, SessionStore};
use crate::error::{DbError, DbResult};
use crate::model::{
    role::Role,
    session::{NewSession, Session, UpdateSession},
    user::{NewUserCredential, UserCredential},
};
use scoreit_core::config::SeedUserConfig;

/// Session table held in memory.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<uuid::Uuid, Session>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored refresh token of a session.
    ///
    /// ## Errors
    /// Returns `NotFound` if no session has this id.
    pub async fn replace_refresh_token(
        &self,
        id: uuid::Uuid,
        refresh_token: String,
    ) -> DbResult<Session> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| DbError::NotFound(format!("session {id}")))?;
        session.refresh_token = refresh_token;
        Ok(session.clone())
    }
}

impl SessionStore for MemorySessionStore {
    fn create_session(&self, params: NewSession) -> BoxFuture<'_, DbResult<Session>> {
        async move {
            let mut sessions = self.sessions.write().await;
            if sessions.contains_key(&params.id) {
                return Err(DbError::Conflict(format!("session {}", params.id)));
            }

            let session = Session {
                id: params.id,
                user_id: params.user_id,
                refresh_token: params.refresh_token,
                user_agent: params.user_agent,
                client_ip: params.client_ip,
                is_blocked: false,
                expires_at: params.expires_at,
                created_at: Utc::now(),
            };
            sessions.insert(session.id, session.clone());

            tracing::trace!(session_id = %session.id, user_id = %session.user_id, "Session created");
            Ok(session)
        }
        .boxed()
    }

    fn get_session(&self, id: uuid::Uuid) -> BoxFuture<'_, DbResult<Session>> {
        async move {
            self.sessions
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| DbError::NotFound(format!("session {id}")))
        }
        .boxed()
    }

    fn update_session(&self, params: UpdateSession) -> BoxFuture<'_, DbResult<Session>> {
        async move {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get_mut(&params.id)
                .ok_or_else(|| DbError::NotFound(format!("session {}", params.id)))?;
            session.is_blocked = params.is_blocked;

            tracing::trace!(session_id = %params.id, is_blocked = params.is_blocked, "Session updated");
            Ok(session.clone())
        }
        .boxed()
    }
}

#[derive(Debug, Default)]
struct CredentialTables {
    users: HashMap<String, UserCredential>,
    roles: HashMap<uuid::Uuid, Vec<Role>>,
}

/// Credential and role tables held in memory.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    tables: RwLock<CredentialTables>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ## Summary
    /// Builds a store holding the users configured in settings.
    ///
    /// ## Errors
    /// Returns `Conflict` if two seed users share a username.
    pub async fn from_seed(users: &[SeedUserConfig]) -> DbResult<Self> {
        let store = Self::new();
        for user in users {
            let roles = user.roles.iter().map(|role| Role::new(role.as_str())).collect();
            store
                .insert_user(
                    NewUserCredential {
                        username: user.username.clone(),
                        password_hash: user.password_hash.clone(),
                        name: user.name.clone(),
                        email: user.email.clone(),
                    },
                    roles,
                )
                .await?;
        }
        tracing::info!(user_count = users.len(), "Credential store seeded");
        Ok(store)
    }

    /// ## Summary
    /// Adds a user with the given roles.
    ///
    /// ## Errors
    /// Returns `Conflict` if the username is taken.
    pub async fn insert_user(
        &self,
        new_user: NewUserCredential,
        roles: Vec<Role>,
    ) -> DbResult<UserCredential> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&new_user.username) {
            return Err(DbError::Conflict(format!(
                "username {}",
                new_user.username
            )));
        }

        let user = UserCredential {
            id: uuid::Uuid::now_v7(),
            username: new_user.username,
            password_hash: new_user.password_hash,
            name: new_user.name,
            email: new_user.email,
            created_at: Utc::now(),
        };
        tables.roles.insert(user.id, roles);
        tables.users.insert(user.username.clone(), user.clone());

        tracing::debug!(user_id = %user.id, username = %user.username, "User inserted");
        Ok(user)
    }

    /// Replaces the role set of a user.
    pub async fn set_roles(&self, user_id: uuid::Uuid, roles: Vec<Role>) {
        self.tables.write().await.roles.insert(user_id, roles);
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get_user_by_username<'a>(
        &'a self,
        username: &'a str,
    ) -> BoxFuture<'a, DbResult<UserCredential>> {
        async move {
            self.tables
                .read()
                .await
                .users
                .get(username)
                .cloned()
                .ok_or_else(|| DbError::NotFound(format!("user {username}")))
        }
        .boxed()
    }

    fn roles_for_user(&self, user_id: uuid::Uuid) -> BoxFuture<'_, DbResult<Vec<Role>>> {
        async move {
            Ok(self
                .tables
                .read()
                .await
                .roles
                .get(&user_id)
                .cloned()
                .unwrap_or_default())
        }
        .boxed()
    }
}
