//! Error handling for the Estimo API
//!
//! Structured error types converted to HTTP responses with a status code and
//! a machine-readable error code.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use estimo_core::CatalogError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Validation errors (400 Bad Request)
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// Resource not found (404 Not Found)
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// Catalog backend errors (503 Service Unavailable)
    #[error("Storage error: {message}")]
    StorageError { message: String },

    /// Internal server errors (500 Internal Server Error)
    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::StorageError { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::StorageError { .. } => "STORAGE_ERROR",
            ApiError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn to_response(&self) -> ApiErrorResponse {
        let details = match self {
            ApiError::Validation { field: Some(field), .. } => {
                Some(serde_json::json!({ "field": field }))
            }
            _ => None,
        };

        ApiErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details,
            timestamp: Utc::now(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    pub fn validation_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }
}

/// JSON error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_response())).into_response()
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound { target_id } => ApiError::not_found(target_id),
            CatalogError::Storage { message } => ApiError::StorageError { message },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::internal(format!("pipeline task failed: {err}"))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
