use salvo::http::StatusCode;
use salvo::writing::Json;
use serde::Serialize;
use thiserror::Error;

use scoreit_core::error::CoreError;
use scoreit_db::error::DbError;
use scoreit_service::error::ServiceError;

/// Application-level errors (HTTP layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] ServiceError),

    #[error(transparent)]
    DatabaseError(#[from] DbError),

    #[error(transparent)]
    CoreError(#[from] CoreError),

    #[error("Invalid request body: {0}")]
    BadRequest(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

/// ## Summary
/// Error response payload
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl AppError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_)
            | Self::ServiceError(ServiceError::ValidationError(_))
            | Self::CoreError(CoreError::ValidationError(_)) => StatusCode::BAD_REQUEST,
            Self::ServiceError(ServiceError::NotAuthenticated | ServiceError::TokenError(_)) => {
                StatusCode::UNAUTHORIZED
            }
            Self::ServiceError(ServiceError::AuthorizationError(_)) => StatusCode::FORBIDDEN,
            Self::ServiceError(ServiceError::NotFound(_))
            | Self::DatabaseError(DbError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message exposed to the client. Server-side failures carry no detail.
    fn public_message(&self) -> String {
        match self.status_code().as_u16() {
            400 => self.to_string(),
            401 => "Unauthorized".to_string(),
            403 => "Forbidden".to_string(),
            404 => "Not found".to_string(),
            _ => "Internal server error".to_string(),
        }
    }

    /// ## Summary
    /// Writes the status code and a JSON error body to `res`.
    pub fn render(&self, res: &mut salvo::Response) {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = ?self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        res.status_code(status);
        res.render(Json(ErrorResponse {
            error: self.public_message(),
        }));
    }
}

#[salvo::async_trait]
impl salvo::Writer for AppError {
    async fn write(
        self,
        _req: &mut salvo::Request,
        _depot: &mut salvo::Depot,
        res: &mut salvo::Response,
    ) {
        self.render(res);
    }
}
