mod app_specific;
mod v1;

use salvo::Router;

use scoreit_core::constants::API_ROUTE_COMPONENT;

/// ## Summary
/// Constructs the main router: `/app` operational endpoints and the `/api` tree.
#[must_use]
pub fn routes() -> Router {
    Router::new()
        .push(app_specific::routes())
        .push(Router::with_path(API_ROUTE_COMPONENT).push(v1::routes()))
}
