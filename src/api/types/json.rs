//! Extractors that report rejections in the API error format

use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json as AxumJson,
};
use serde::de::DeserializeOwned;

use super::error::{ApiErrorDetail, ApiErrorResponse, ApiErrorType};

/// `axum::Json` whose rejections are JSON error bodies
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// `axum::extract::Query` whose rejections are JSON error bodies
#[derive(Debug, Clone, Copy, Default)]
pub struct Query<T>(pub T);

/// Malformed body or query string
#[derive(Debug)]
pub struct InputRejection {
    status: StatusCode,
    message: String,
    code: &'static str,
}

impl IntoResponse for InputRejection {
    fn into_response(self) -> Response {
        let response = ApiErrorResponse {
            error: ApiErrorDetail {
                message: self.message,
                error_type: ApiErrorType::InvalidRequestError,
                param: None,
                code: Some(self.code.to_string()),
            },
        };

        (self.status, AxumJson(response)).into_response()
    }
}

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = InputRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match AxumJson::<T>::from_request(req, state).await {
            Ok(AxumJson(value)) => Ok(Json(value)),
            Err(rejection) => Err(InputRejection {
                status: rejection.status(),
                message: json_rejection_message(&rejection),
                code: "json_parse_error",
            }),
        }
    }
}

impl<S, T> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = InputRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(Query(value)),
            Err(rejection) => Err(InputRejection {
                status: StatusCode::BAD_REQUEST,
                message: format!("Invalid query string: {}", rejection.body_text()),
                code: "query_parse_error",
            }),
        }
    }
}

fn json_rejection_message(rejection: &axum::extract::rejection::JsonRejection) -> String {
    use axum::extract::rejection::JsonRejection::*;

    match rejection {
        JsonDataError(err) => format!("Invalid JSON data: {}", err.body_text()),
        JsonSyntaxError(err) => format!("Invalid JSON syntax: {}", err.body_text()),
        MissingJsonContentType(_) => {
            "Missing Content-Type header. Expected 'application/json'.".to_string()
        }
        BytesRejection(err) => format!("Failed to read request body: {}", err.body_text()),
        _ => "Invalid JSON request".to_string(),
    }
}

impl<T> IntoResponse for Json<T>
where
    T: serde::Serialize,
{
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}
