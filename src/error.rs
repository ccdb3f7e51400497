// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::api::ApiResponse;
use crate::flags::FlagError;
use crate::middleware::AuthError;
use crate::store::StoreError;
use crate::users::UserError;
use crate::validation::ValidationError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field: Option<String>,
    },
    InvalidJson(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 413 Payload Too Large
    PayloadTooLarge(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::InternalServerError(_) => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::PayloadTooLarge(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "error": self.message(),
            "code": self.error_code(),
        });
        if let ApiError::ValidationError { field: Some(field), .. } = self {
            body["field"] = json!(field);
        }
        body
    }

    pub fn into_api_response(self) -> ApiResponse {
        ApiResponse::json(self.status_code(), &self.to_json())
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, field: Option<String>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field,
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        ApiError::PayloadTooLarge(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

// Convert domain error types to ApiError
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidJson(msg) => {
                ApiError::invalid_json(format!("Invalid JSON in request body: {}", msg))
            }
            ValidationError::Field { field, message } => ApiError::validation_error(message, Some(field)),
            ValidationError::Body(message) => ApiError::validation_error(message, None),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(name) => ApiError::not_found(format!("Parameter {} not found", name)),
            StoreError::AlreadyExists(name) => {
                ApiError::conflict(format!("Parameter {} already exists", name))
            }
            other => {
                // Log the real error but return generic message
                tracing::error!("Parameter store error: {}", other);
                ApiError::internal_server_error("Internal server error")
            }
        }
    }
}

impl From<FlagError> for ApiError {
    fn from(err: FlagError) -> Self {
        match err {
            FlagError::NotFound(_) => ApiError::not_found(err.to_string()),
            FlagError::AlreadyExists(_) => ApiError::conflict(err.to_string()),
            FlagError::InvalidReference(_) => ApiError::validation_error(err.to_string(), Some("arn".to_string())),
            FlagError::Reserved(_) => ApiError::validation_error(err.to_string(), Some("id".to_string())),
            FlagError::Encode(e) => {
                tracing::error!("Flag encoding error: {}", e);
                ApiError::internal_server_error("Internal server error")
            }
            FlagError::Store(e) => e.into(),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => ApiError::not_found(err.to_string()),
            UserError::AlreadyExists(_) => ApiError::conflict(err.to_string()),
            UserError::Corrupt(msg) => {
                tracing::error!("User collection unreadable: {}", msg);
                ApiError::internal_server_error("Internal server error")
            }
            UserError::Encode(e) => {
                tracing::error!("User encoding error: {}", e);
                ApiError::internal_server_error("Internal server error")
            }
            UserError::Store(e) => e.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Forbidden(msg) => ApiError::forbidden(msg),
            AuthError::Lookup(e) => e.into(),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl From<ApiError> for ApiResponse {
    fn from(err: ApiError) -> Self {
        err.into_api_response()
    }
}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_status_codes() {
        let cases: Vec<(ApiError, u16, &str)> = vec![
            (ValidationError::InvalidJson("eof".into()).into(), 400, "INVALID_JSON"),
            (ValidationError::field("id", "Field 'id' is required").into(), 400, "VALIDATION_ERROR"),
            (AuthError::Forbidden("no".into()).into(), 403, "FORBIDDEN"),
            (FlagError::NotFound("/feature-flags/X".into()).into(), 404, "NOT_FOUND"),
            (UserError::AlreadyExists("a@x.com".into()).into(), 409, "CONFLICT"),
            (FlagError::InvalidReference("arn:x".into()).into(), 400, "VALIDATION_ERROR"),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_code(), status);
            assert_eq!(err.error_code(), code);
        }
    }

    #[test]
    fn store_failures_do_not_leak_details() {
        let err: ApiError = FlagError::Store(StoreError::Request("connection refused to 10.0.0.1".into())).into();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.to_json(), json!({"error": "Internal server error", "code": "INTERNAL_SERVER_ERROR"}));
    }

    #[test]
    fn validation_body_names_the_field() {
        let response = ApiResponse::from(ApiError::from(ValidationError::field("type", "bad type")));
        assert_eq!(response.status_code, 400);
        assert_eq!(
            response.body_json(),
            json!({"error": "bad type", "code": "VALIDATION_ERROR", "field": "type"})
        );
    }
}
