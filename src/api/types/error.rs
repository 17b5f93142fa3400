//! JSON error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Error classes reported in the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    InvalidRequestError,
    PermissionError,
    NotFoundError,
    ExpiredError,
    ServerError,
    ServiceUnavailableError,
}

impl std::fmt::Display for ApiErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequestError => write!(f, "invalid_request_error"),
            Self::PermissionError => write!(f, "permission_error"),
            Self::NotFoundError => write!(f, "not_found_error"),
            Self::ExpiredError => write!(f, "expired_error"),
            Self::ServerError => write!(f, "server_error"),
            Self::ServiceUnavailableError => write!(f, "service_unavailable_error"),
        }
    }
}

/// Error body: `{"error": {"message", "type", "param", "code"}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: ApiErrorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error_type: ApiErrorType, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ApiErrorDetail {
                    message: message.into(),
                    error_type,
                    param: None,
                    code: None,
                },
            },
        }
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.response.error.param = Some(param.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.response.error.code = Some(code.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiErrorType::InvalidRequestError, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, ApiErrorType::PermissionError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiErrorType::NotFoundError, message)
    }

    /// A signed link past its expiry
    pub fn gone(message: impl Into<String>) -> Self {
        Self::new(StatusCode::GONE, ApiErrorType::ExpiredError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ApiErrorType::ServerError, message)
    }

    /// Generation failed and the domain has no safe fallback
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorType::ServiceUnavailableError,
            message,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let code = err.code();

        let api_err = match err {
            DomainError::Validation { field, message } => {
                let api_err = Self::bad_request(message);
                match field {
                    Some(field) => api_err.with_param(field),
                    None => api_err,
                }
            }
            DomainError::NotFound { message } => Self::not_found(message),
            DomainError::Provider { provider, message } => {
                Self::unavailable(format!("{}: {}", provider, message))
            }
            DomainError::Configuration { message }
            | DomainError::Cache { message }
            | DomainError::Storage { message }
            | DomainError::Internal { message } => Self::internal(message),
        };

        api_err.with_code(code)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.response.error.error_type, self.response.error.message
        )
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_creation() {
        let err = ApiError::bad_request("text is required");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.response.error.error_type, ApiErrorType::InvalidRequestError);
        assert_eq!(err.response.error.message, "text is required");
    }

    #[test]
    fn test_api_error_with_param() {
        let err = ApiError::bad_request("rate out of range")
            .with_param("rate")
            .with_code("invalid_value");

        assert_eq!(err.response.error.param, Some("rate".to_string()));
        assert_eq!(err.response.error.code, Some("invalid_value".to_string()));
    }

    #[test]
    fn test_domain_error_mapping() {
        let cases = [
            (DomainError::validation("x"), StatusCode::BAD_REQUEST),
            (DomainError::not_found("x"), StatusCode::NOT_FOUND),
            (DomainError::configuration("x"), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::provider("openai", "x"), StatusCode::SERVICE_UNAVAILABLE),
            (DomainError::storage("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (domain_err, status) in cases {
            let api_err: ApiError = domain_err.into();
            assert_eq!(api_err.status, status);
        }
    }

    #[test]
    fn test_field_becomes_param() {
        let api_err: ApiError = DomainError::invalid_field("phrase", "phrase must not be empty").into();

        assert_eq!(api_err.response.error.param.as_deref(), Some("phrase"));
        assert_eq!(api_err.response.error.code.as_deref(), Some("invalid_request"));
    }

    #[test]
    fn test_link_errors_render_status() {
        let response = ApiError::forbidden("Invalid signature").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = ApiError::gone("Signed URL has expired").into_response();
        assert_eq!(response.status(), StatusCode::GONE);
    }

    #[test]
    fn test_provider_failure_maps_to_unavailable() {
        let api_err: ApiError = DomainError::provider("openai", "HTTP 500").into();

        assert_eq!(api_err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(api_err.response.error.error_type, ApiErrorType::ServiceUnavailableError);
        assert_eq!(api_err.response.error.message, "openai: HTTP 500");
        assert_eq!(api_err.response.error.code.as_deref(), Some("generation_failed"));
        assert_eq!(api_err.to_string(), "service_unavailable_error: openai: HTTP 500");
    }

    #[test]
    fn test_error_serialization() {
        let err = ApiError::gone("Link expired");
        let json = serde_json::to_value(&err.response).unwrap();

        assert_eq!(json["error"]["type"], "expired_error");
        assert_eq!(json["error"]["message"], "Link expired");
        assert!(json["error"].get("param").is_none());
    }
}
