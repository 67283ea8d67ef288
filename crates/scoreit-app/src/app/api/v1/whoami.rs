use chrono::{DateTime, Utc};
use salvo::prelude::Json;
use salvo::{Depot, Router, handler};
use serde::Serialize;

use crate::error::AppResult;
use scoreit_db::model::role::Role;
use scoreit_service::auth::depot::get_payload_from_depot;

/// Identity carried by the verified access token.
#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub user_id: uuid::Uuid,
    pub roles: Vec<Role>,
    pub expires_at: DateTime<Utc>,
}

/// ## Summary
/// Returns the caller's identity as JSON.
/// The payload is retrieved from the depot set by the `AuthMiddleware`.
#[handler]
async fn whoami(depot: &Depot) -> AppResult<Json<WhoAmIResponse>> {
    let payload = get_payload_from_depot(depot)?;

    Ok(Json(WhoAmIResponse {
        user_id: payload.user_id,
        roles: payload.roles.clone(),
        expires_at: payload.expire_at,
    }))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path("whoami").get(whoami)
}
