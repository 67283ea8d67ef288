//! Authentication and authorization core.
//!
//! ## Module Organization
//!
//! - `depot`: Salvo depot injection of the auth components and the verified payload
//! - `flow`: Login, refresh and logout (`AuthFlow`)
//! - `header`: `Authorization` header parsing
//! - `password`: Password hashing and verification with Argon2
//! - `policy`: Rule loading and Casbin-backed enforcement
//! - `token`: Signed token creation and verification

pub mod depot;
pub mod flow;
pub mod header;
pub mod password;
pub mod policy;
pub mod token;
