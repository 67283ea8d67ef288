//! Token issuance, session lifecycle and policy enforcement for scoreit.

pub mod auth;
pub mod error;
