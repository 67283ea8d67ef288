/// Route component constants shared across crates
pub const API_ROUTE_COMPONENT: &str = "api";
pub const API_ROUTE_PREFIX: &str = const_str::concat!("/", API_ROUTE_COMPONENT);

pub const API_VERSION_COMPONENT: &str = "v1";
pub const API_V1_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", API_VERSION_COMPONENT);

pub const AUTH_ROUTE_COMPONENT: &str = "auth";
pub const AUTH_ROUTE_PREFIX: &str =
    const_str::concat!(API_V1_ROUTE_PREFIX, "/", AUTH_ROUTE_COMPONENT);

/// Request header carrying the bearer token.
pub const AUTHORIZATION_HEADER_KEY: &str = "authorization";
/// Scheme keyword expected in the authorization header, compared case-insensitively.
pub const AUTHORIZATION_TYPE_BEARER: &str = "bearer";

/// Required length in bytes of the token symmetric key.
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// Longest accepted token lifetime in seconds (one year).
pub const MAX_TOKEN_DURATION_SECS: i64 = 366 * 24 * 60 * 60;
