use salvo::Router;

use crate::middleware::auth::AuthMiddleware;
use scoreit_core::constants::API_VERSION_COMPONENT;

mod auth;
mod whoami;

/// ## Summary
/// Versioned API: the public auth endpoints plus the routes guarded by `AuthMiddleware`.
#[must_use]
pub fn routes() -> Router {
    Router::with_path(API_VERSION_COMPONENT)
        .push(auth::routes())
        .push(Router::new().hoop(AuthMiddleware).push(whoami::routes()))
}
