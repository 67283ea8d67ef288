use crate::error::{ServiceError, ServiceResult};
use scoreit_core::constants::AUTHORIZATION_TYPE_BEARER;

/// ## Summary
/// Extracts the credential from an `Authorization` header value of the form
/// `Bearer <token>`. The scheme is matched case-insensitively and the second
/// whitespace-separated field is the token; any further fields are ignored.
///
/// ## Errors
/// Returns `NotAuthenticated` if the header is missing, has fewer than two
/// fields, or uses a scheme other than bearer.
pub fn bearer_token(header: Option<&str>) -> ServiceResult<&str> {
    let Some(header) = header else {
        tracing::debug!("Authorization header is not provided");
        return Err(ServiceError::NotAuthenticated);
    };

    let mut fields = header.split_whitespace();
    let (Some(scheme), Some(token)) = (fields.next(), fields.next()) else {
        tracing::debug!("Invalid authorization header format");
        return Err(ServiceError::NotAuthenticated);
    };

    if !scheme.eq_ignore_ascii_case(AUTHORIZATION_TYPE_BEARER) {
        tracing::debug!(scheme, "Unsupported authorization type");
        return Err(ServiceError::NotAuthenticated);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bearer_in_any_case() {
        for header in ["Bearer abc.def.ghi", "bearer abc.def.ghi", "BEARER   abc.def.ghi"] {
            assert_eq!(bearer_token(Some(header)).unwrap(), "abc.def.ghi");
        }
    }

    #[test]
    fn trailing_fields_are_ignored() {
        for header in ["Bearer abc.def.ghi extra", "bearer\tabc.def.ghi  x y"] {
            assert_eq!(bearer_token(Some(header)).unwrap(), "abc.def.ghi");
        }
    }

    #[test]
    fn rejects_malformed_headers() {
        for header in [
            None,
            Some(""),
            Some("Bearer"),
            Some("abc.def.ghi"),
            Some("Basic dXNlcjpwYXNz"),
            Some("Token abc.def.ghi"),
        ] {
            assert!(
                matches!(bearer_token(header), Err(ServiceError::NotAuthenticated)),
                "expected {header:?} to be rejected"
            );
        }
    }
}
