//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::store::StoreError;

/// A single rejected input field.
///
/// `path` names the offending field the way the client sent it
/// (e.g. `amount`, `members.1.userId`, `from`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error code.
///
/// # Error Categories
///
/// - **Validation Errors**: malformed input, rejected before any business logic runs
/// - **Resource Errors**: update/delete/get of an identifier that does not exist
/// - **Storage Errors**: the database is unreachable or a query failed
/// - **Aggregation Errors**: storage failures while computing a summary
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Request body, path, or query parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request with one entry per rejected field.
    #[error("Request validation failed")]
    Validation(Vec<FieldError>),

    /// The referenced record does not exist.
    ///
    /// The string names the resource kind, e.g. "Expense".
    /// Returns HTTP 404 Not Found.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The expense store failed.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// The expense store failed while computing a summary.
    ///
    /// No partial summary is ever returned.
    #[error("Aggregation failed: {0}")]
    Aggregation(#[source] StoreError),
}

impl AppError {
    /// Shorthand for a validation error on a single field.
    pub fn invalid_field(path: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError::new(path, message)])
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "validation_failed",
///     "message": "Request validation failed",
///     "details": [{ "path": "amount", "message": "Must be a non-negative number" }]
///   }
/// }
/// ```
///
/// `details` is only present for validation errors.
///
/// # Status Code Mapping
///
/// - `Validation` → 400 Bad Request
/// - `NotFound` → 404 Not Found
/// - `Database` / `Store` → 500 Internal Server Error (hides details from client)
/// - `Aggregation` → 500 Internal Server Error
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": {
                        "code": "validation_failed",
                        "message": self.to_string(),
                        "details": details,
                    }
                }),
            ),
            AppError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": {
                        "code": "not_found",
                        "message": self.to_string(),
                    }
                }),
            ),
            AppError::Database(_) | AppError::Store(_) => {
                tracing::error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": {
                            "code": "internal_error",
                            "message": "An internal error occurred",
                        }
                    }),
                )
            }
            AppError::Aggregation(_) => {
                tracing::error!(error = %self, "summary computation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": {
                            "code": "aggregation_failed",
                            "message": "Failed to generate summary",
                        }
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
