//! Storage contracts consumed by the authentication flow.
//!
//! Both traits return boxed futures so they can be used as trait objects and
//! swapped for test doubles.

use futures::future::BoxFuture;

use crate::error::DbResult;
use crate::model::{
    role::Role,
    session::{NewSession, Session, UpdateSession},
    user::UserCredential,
};

pub mod memory;

pub use memory::{MemoryCredentialStore, MemorySessionStore};

/// Durable storage for login sessions.
pub trait SessionStore: Send + Sync {
    /// Persists a new, unblocked session.
    ///
    /// ## Errors
    /// `Conflict` if a session with the same id exists, `Internal` on storage failure.
    fn create_session(&self, params: NewSession) -> BoxFuture<'_, DbResult<Session>>;

    /// ## Errors
    /// `NotFound` if no session has this id, `Internal` on storage failure.
    fn get_session(&self, id: uuid::Uuid) -> BoxFuture<'_, DbResult<Session>>;

    /// Sets the `is_blocked` flag and returns the updated row.
    ///
    /// ## Errors
    /// `NotFound` if no session has this id, `Internal` on storage failure.
    fn update_session(&self, params: UpdateSession) -> BoxFuture<'_, DbResult<Session>>;
}

/// Lookup of login credentials and the roles attached to a user.
pub trait CredentialStore: Send + Sync {
    /// ## Errors
    /// `NotFound` if no user has this username, `Internal` on storage failure.
    fn get_user_by_username<'a>(
        &'a self,
        username: &'a str,
    ) -> BoxFuture<'a, DbResult<UserCredential>>;

    /// Returns the roles of a user; an unknown user has no roles.
    ///
    /// ## Errors
    /// `Internal` on storage failure.
    fn roles_for_user(&self, user_id: uuid::Uuid) -> BoxFuture<'_, DbResult<Vec<Role>>>;
}
