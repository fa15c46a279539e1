use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error body returned by every failing HTTP endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Field that failed validation, when the failure is a form violation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

/// The first rule a submitted form broke.
///
/// Validation stops at the first violation in field-declaration order, so a
/// form never carries more than one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub rule: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(
        field: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            rule: rule.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    /// Any failure reported by the table backend: transport, permission,
    /// constraint violation or an undecodable row.
    #[error("Remote error: {message}")]
    RemoteError { message: String },

    #[error("Validation error: {0}")]
    ValidationError(FieldViolation),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::remote(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerializationError(err.to_string())
    }
}

impl From<FieldViolation> for ServiceError {
    fn from(violation: FieldViolation) -> Self {
        ServiceError::ValidationError(violation)
    }
}

/// A form body that could not be read at all is reported like any other
/// form violation.
impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::ValidationError(FieldViolation::new(
            "body",
            "malformed",
            rejection.body_text(),
        ))
    }
}

impl ServiceError {
    pub fn remote(message: impl Into<String>) -> Self {
        ServiceError::RemoteError {
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RemoteError { .. } => StatusCode::BAD_GATEWAY,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Backend failures collapse into one generic notification.
    pub fn response_message(&self) -> String {
        match self {
            Self::RemoteError { .. } => "Failed to load data".to_string(),
            Self::SerializationError(_) => "Internal server error".to_string(),
            Self::ValidationError(violation) => violation.message.clone(),
            _ => self.to_string(),
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            Self::ValidationError(violation) => Some(violation.field.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: self.details(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn service_error_status_code_mapping() {
        assert_eq!(
            ServiceError::remote("boom").status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ServiceError::ValidationError(FieldViolation::new("quantity", "positive", "x"))
                .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::SerializationError("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn remote_errors_surface_as_one_generic_message() {
        assert_eq!(
            ServiceError::remote("permission denied for table profiles").response_message(),
            "Failed to load data"
        );
        assert_eq!(
            ServiceError::NotFound("No batch found".into()).response_message(),
            "Not found: No batch found"
        );
    }

    #[tokio::test]
    async fn validation_error_response_names_the_field() {
        let violation =
            FieldViolation::new("batch_number", "length", "Batch number is required");
        let response = ServiceError::ValidationError(violation).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.message, "Batch number is required");
        assert_eq!(payload.details.as_deref(), Some("batch_number"));
        assert_eq!(payload.error, "Bad Request");
    }
}
