use salvo::Depot;

use crate::error::AppError;
use scoreit_core::constants::AUTHORIZATION_HEADER_KEY;
use scoreit_service::auth::{
    depot::{depot_keys, get_policy_engine_from_depot, get_token_maker_from_depot},
    header::bearer_token,
};
use scoreit_service::error::{ServiceError, ServiceResult};

/// ## Summary
/// Authorization middleware that verifies the bearer token, registers the
/// token's roles with the policy engine and enforces the policy for the
/// request path and method.
///
/// ## Side Effects
/// Inserts the verified token payload into the depot under
/// `depot_keys::AUTHORIZATION_PAYLOAD` for downstream handlers.
///
/// ## Errors
/// - HTTP 401 if the header is missing or malformed, the scheme is not bearer,
///   or the token fails verification.
/// - HTTP 403 if the policy denies the request.
/// - HTTP 500 if a component is missing from the depot or the policy engine fails.
#[salvo::async_trait]
impl salvo::Handler for AuthMiddleware {
    #[tracing::instrument(skip(self, req, depot, res, ctrl), fields(
        method = %req.method(),
        path = %req.uri().path()
    ))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        res: &mut salvo::Response,
        ctrl: &mut salvo::FlowCtrl,
    ) {
        tracing::trace!("Authorizing request");

        if let Err(err) = authorize(req, depot).await {
            AppError::from(err).render(res);
            ctrl.skip_rest();
        }
    }
}

async fn authorize(req: &salvo::Request, depot: &mut Depot) -> ServiceResult<()> {
    let header = req
        .headers()
        .get(AUTHORIZATION_HEADER_KEY)
        .map(|value| value.to_str().map_err(|_err| ServiceError::NotAuthenticated))
        .transpose()?;
    let token = bearer_token(header)?;

    let token_maker = get_token_maker_from_depot(depot)?;
    let payload = token_maker.verify_token(token).map_err(|err| {
        tracing::debug!(reason = %err, "Access token rejected");
        ServiceError::NotAuthenticated
    })?;

    let subject = payload.user_id.to_string();
    let roles = payload.roles.clone();
    depot.insert(depot_keys::AUTHORIZATION_PAYLOAD, payload);

    let engine = get_policy_engine_from_depot(depot)?;
    engine.ensure_roles(&subject, &roles).await?;

    let resource = req.uri().path();
    let action = req.method().as_str();
    if !engine.enforce(&subject, resource, action).await? {
        tracing::debug!(user_id = %subject, "Policy denied request");
        return Err(ServiceError::AuthorizationError(format!(
            "{action} {resource} is not permitted"
        )));
    }

    tracing::debug!(user_id = %subject, "Request authorized");
    Ok(())
}

/// ## Summary
/// Middleware handler for authorization.
/// Hoop it on routers whose routes require an authenticated, permitted caller.
pub struct AuthMiddleware;
