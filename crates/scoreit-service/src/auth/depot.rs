//! Depot integration for the auth components.
//!
//! The composition root hoops the handlers below so every request sees the
//! shared token maker, policy engine and flow; the authorization middleware
//! stores the verified payload under [`depot_keys::AUTHORIZATION_PAYLOAD`].

use std::sync::Arc;

use salvo::async_trait;

use super::flow::AuthFlow;
use super::policy::PolicyEngine;
use super::token::{Payload, TokenMaker};
use crate::error::{ServiceError, ServiceResult};

pub mod depot_keys {
    pub const AUTHORIZATION_PAYLOAD: &str = "__authorization_payload";
}

/// Get the verified token payload from the depot.
///
/// ## Errors
///
/// Returns `NotAuthenticated` if the request did not pass the authorization middleware.
pub fn get_payload_from_depot(depot: &salvo::Depot) -> ServiceResult<&Payload> {
    depot
        .get::<Payload>(depot_keys::AUTHORIZATION_PAYLOAD)
        .map_err(|_missing| ServiceError::NotAuthenticated)
}

pub struct TokenMakerHandler {
    pub token_maker: Arc<dyn TokenMaker>,
}

#[async_trait]
impl salvo::Handler for TokenMakerHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(self.token_maker.clone());
    }
}

/// ## Summary
/// Retrieves the token maker from the depot.
///
/// ## Errors
/// Returns an error if the token maker is not found in the depot.
pub fn get_token_maker_from_depot(depot: &salvo::Depot) -> ServiceResult<Arc<dyn TokenMaker>> {
    depot
        .obtain::<Arc<dyn TokenMaker>>()
        .cloned()
        .map_err(|_err| ServiceError::InvariantViolation("Token maker not found in depot"))
}

pub struct PolicyEngineHandler {
    pub engine: Arc<dyn PolicyEngine>,
}

#[async_trait]
impl salvo::Handler for PolicyEngineHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(self.engine.clone());
    }
}

/// ## Summary
/// Retrieves the policy engine from the depot.
///
/// ## Errors
/// Returns an error if the policy engine is not found in the depot.
pub fn get_policy_engine_from_depot(depot: &salvo::Depot) -> ServiceResult<Arc<dyn PolicyEngine>> {
    depot
        .obtain::<Arc<dyn PolicyEngine>>()
        .cloned()
        .map_err(|_err| ServiceError::InvariantViolation("Policy engine not found in depot"))
}

pub struct AuthFlowHandler {
    pub flow: Arc<AuthFlow>,
}

#[async_trait]
impl salvo::Handler for AuthFlowHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(self.flow.clone());
    }
}

/// ## Summary
/// Retrieves the authentication flow from the depot.
///
/// ## Errors
/// Returns an error if the flow is not found in the depot.
pub fn get_auth_flow_from_depot(depot: &salvo::Depot) -> ServiceResult<Arc<AuthFlow>> {
    depot
        .obtain::<Arc<AuthFlow>>()
        .cloned()
        .map_err(|_err| ServiceError::InvariantViolation("Auth flow not found in depot"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_payload_is_not_authenticated() {
        let depot = salvo::Depot::new();
        assert!(matches!(
            get_payload_from_depot(&depot),
            Err(ServiceError::NotAuthenticated)
        ));
    }

    #[test]
    fn missing_components_are_invariant_violations() {
        let depot = salvo::Depot::new();
        assert!(matches!(
            get_token_maker_from_depot(&depot),
            Err(ServiceError::InvariantViolation(_))
        ));
        assert!(matches!(
            get_policy_engine_from_depot(&depot),
            Err(ServiceError::InvariantViolation(_))
        ));
        assert!(matches!(
            get_auth_flow_from_depot(&depot),
            Err(ServiceError::InvariantViolation(_))
        ));
    }

    #[test]
    fn payload_round_trips_through_depot() {
        let payload = Payload::new(
            uuid::Uuid::new_v4(),
            &[],
            chrono::Duration::minutes(1),
            "scoreit-api",
            "scoreit-app",
        )
        .unwrap();
        let mut depot = salvo::Depot::new();
        depot.insert(depot_keys::AUTHORIZATION_PAYLOAD, payload.clone());

        assert_eq!(get_payload_from_depot(&depot).unwrap(), &payload);
    }
}
