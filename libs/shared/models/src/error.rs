use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-wide error taxonomy. Every rejected action states why:
/// the response body carries a machine-readable `error` kind plus a
/// human-readable `message`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Role mismatch: {0}")]
    RoleMismatch(String),

    #[error("Not owner: {0}")]
    NotOwner(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("External service error: {0}")]
    ExternalService(String),
}

impl AppError {
    /// Stable kind string clients can branch on.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "auth_error",
            AppError::RoleMismatch(_) => "role_mismatch",
            AppError::NotOwner(_) => "not_owner",
            AppError::NotFound(_) => "not_found",
            AppError::AlreadyExists(_) => "already_exists",
            AppError::InvalidTransition(_) => "invalid_transition",
            AppError::ValidationError(_) => "validation_error",
            AppError::BadRequest(_) => "bad_request",
            AppError::Database(_) => "database_error",
            AppError::Internal(_) => "internal_error",
            AppError::ExternalService(_) => "external_service_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::RoleMismatch(_) | AppError::NotOwner(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) | AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn message(&self) -> &str {
        match self {
            AppError::Auth(msg)
            | AppError::RoleMismatch(msg)
            | AppError::NotOwner(msg)
            | AppError::NotFound(msg)
            | AppError::AlreadyExists(msg)
            | AppError::InvalidTransition(msg)
            | AppError::ValidationError(msg)
            | AppError::BadRequest(msg)
            | AppError::Database(msg)
            | AppError::Internal(msg)
            | AppError::ExternalService(msg) => msg,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        tracing::error!("Error: {}: {}", status, self.message());

        let body = Json(json!({
            "error": self.kind(),
            "message": self.message(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(
            AppError::RoleMismatch("only patients can book".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotOwner("not your blog".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::AlreadyExists("profile exists".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InvalidTransition("completed is terminal".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::ValidationError("email must contain '@'".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn kinds_are_stable() {
        assert_eq!(AppError::RoleMismatch(String::new()).kind(), "role_mismatch");
        assert_eq!(AppError::NotOwner(String::new()).kind(), "not_owner");
        assert_eq!(AppError::AlreadyExists(String::new()).kind(), "already_exists");
        assert_eq!(
            AppError::InvalidTransition(String::new()).kind(),
            "invalid_transition"
        );
        assert_eq!(AppError::NotFound(String::new()).kind(), "not_found");
    }
}
