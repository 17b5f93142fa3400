//! Request and response types for the HTTP API

pub mod content;
pub mod error;
pub mod json;

pub use content::{BatchItem, BatchResponse, ContentResponse, RefreshParams, Refreshable};
pub use error::{ApiError, ApiErrorDetail, ApiErrorResponse, ApiErrorType};
pub use json::{Json, Query};
