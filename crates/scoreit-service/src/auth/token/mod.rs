//! Self-contained signed tokens carrying identity and role claims.
//!
//! Verification never consults a store: a token is valid when its signature
//! checks out under the process key and its payload has not expired.

use chrono::Duration;
use thiserror::Error;

use scoreit_db::model::role::Role;

pub mod jwt;
pub mod payload;

pub use jwt::JwtMaker;
pub use payload::Payload;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("invalid key size: must be exactly {expected} bytes, got {actual}")]
    InvalidKeySize { expected: usize, actual: usize },

    #[error("token is invalid")]
    InvalidToken,

    #[error("token has expired")]
    ExpiredToken,

    #[error("token duration is out of range")]
    InvalidDuration,

    #[error("failed to encode token: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
}

pub type TokenResult<T> = std::result::Result<T, TokenError>;

/// Creates and verifies tokens.
pub trait TokenMaker: Send + Sync {
    /// ## Summary
    /// Issues a token for `user_id` carrying `roles`, valid for `duration`.
    ///
    /// ## Errors
    /// - `InvalidDuration` if the expiry cannot be represented.
    /// - `Encoding` if the token cannot be serialized or signed.
    fn create_token(
        &self,
        user_id: uuid::Uuid,
        roles: &[Role],
        duration: Duration,
    ) -> TokenResult<(String, Payload)>;

    /// ## Summary
    /// Authenticates and decodes `token`, then checks its validity window.
    ///
    /// ## Errors
    /// - `InvalidToken` on any tamper, format, key, issuer or audience mismatch.
    /// - `ExpiredToken` if the signature is valid but the token has expired.
    fn verify_token(&self, token: &str) -> TokenResult<Payload>;
}
