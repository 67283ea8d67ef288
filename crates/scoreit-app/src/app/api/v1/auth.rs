use salvo::http::StatusCode;
use salvo::{Depot, Request, Router, handler, writing::Json};
use serde::{Deserialize, de::DeserializeOwned};

use crate::error::{AppError, AppResult};
use scoreit_service::auth::{
    depot::get_auth_flow_from_depot,
    flow::{LoginOutcome, LoginParams, RefreshOutcome},
};
use scoreit_service::error::ServiceError;

/// ## Summary
/// Login request payload
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    /// ## Errors
    /// Returns `ValidationError` unless the username is 3 to 40 alphanumeric
    /// characters and the password is 6 to 40 characters.
    fn validate(&self) -> AppResult<()> {
        let username_len = self.username.chars().count();
        if !(3..=40).contains(&username_len)
            || !self.username.chars().all(char::is_alphanumeric)
        {
            return Err(ServiceError::ValidationError(
                "username must be 3 to 40 alphanumeric characters".to_string(),
            )
            .into());
        }
        if !(6..=40).contains(&self.password.chars().count()) {
            return Err(ServiceError::ValidationError(
                "password must be 6 to 40 characters".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

// Manual impl so the password is never logged.
impl std::fmt::Display for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LoginRequest {{ username: {} }}", self.username)
    }
}

/// ## Summary
/// Renew and logout request payload
#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

impl RefreshTokenRequest {
    fn validate(&self) -> AppResult<()> {
        if self.refresh_token.trim().is_empty() {
            return Err(
                ServiceError::ValidationError("refresh_token is required".to_string()).into(),
            );
        }
        Ok(())
    }
}

async fn parse_body<T: DeserializeOwned>(req: &mut Request) -> AppResult<T> {
    req.parse_json::<T>().await.map_err(|err| {
        tracing::debug!(error = %err, "Failed to parse request body");
        AppError::BadRequest(err.to_string())
    })
}

/// ## Summary
/// POST /api/v1/auth/login - Exchange a username and password for an access
/// token, a refresh token and a new session.
///
/// ## Errors
/// Returns HTTP 400 for an invalid body, 404 for an unknown user, 401 for a
/// wrong password and 500 if a store fails.
#[handler]
async fn login(req: &mut Request, depot: &mut Depot) -> AppResult<Json<LoginOutcome>> {
    let body: LoginRequest = parse_body(req).await?;
    body.validate()?;

    tracing::debug!(request = %body, "Processing login request");

    let user_agent = req
        .headers()
        .get(salvo::http::header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let client_ip = req
        .remote_addr()
        .as_ipv4()
        .map(|addr| addr.ip().to_string())
        .or_else(|| req.remote_addr().as_ipv6().map(|addr| addr.ip().to_string()))
        .unwrap_or_default();

    let flow = get_auth_flow_from_depot(depot)?;
    let outcome = flow
        .login(LoginParams {
            username: body.username,
            password: body.password,
            user_agent,
            client_ip,
        })
        .await?;

    Ok(Json(outcome))
}

/// ## Summary
/// POST /api/v1/auth/renew - Issue a new access token for a live session.
///
/// ## Errors
/// Returns HTTP 400 for an invalid body, 401 for a rejected refresh token or
/// session, 404 if the session does not exist and 500 if a store fails.
#[handler]
async fn renew(req: &mut Request, depot: &mut Depot) -> AppResult<Json<RefreshOutcome>> {
    let body: RefreshTokenRequest = parse_body(req).await?;
    body.validate()?;

    let flow = get_auth_flow_from_depot(depot)?;
    Ok(Json(flow.refresh(&body.refresh_token).await?))
}

/// ## Summary
/// POST /api/v1/auth/logout - Block the session behind a refresh token.
///
/// ## Errors
/// Returns HTTP 400 for an invalid body, 401 for a rejected refresh token,
/// 404 if the session does not exist and 500 if a store fails.
#[handler]
async fn logout(req: &mut Request, depot: &mut Depot) -> AppResult<StatusCode> {
    let body: RefreshTokenRequest = parse_body(req).await?;
    body.validate()?;

    let flow = get_auth_flow_from_depot(depot)?;
    flow.logout(&body.refresh_token).await?;

    Ok(StatusCode::OK)
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(scoreit_core::constants::AUTH_ROUTE_COMPONENT)
        .push(Router::with_path("login").post(login))
        .push(Router::with_path("renew").post(renew))
        .push(Router::with_path("logout").post(logout))
}
