//! Health check endpoint for service monitoring.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{error::AppError, services::expense_service::ExpenseService};

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service status
    pub status: String,

    /// Which expense store is serving requests
    pub store: String,

    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
}

/// Health check handler.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "status": "healthy",
///   "store": "postgres",
///   "timestamp": "2025-12-21T19:00:00Z"
/// }
/// ```
///
/// If the store is unreachable, returns the standard 500 error response.
pub async fn health_check(
    State(expenses): State<ExpenseService>,
) -> Result<Json<HealthResponse>, AppError> {
    let store = expenses.store();
    store.ping().await?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        store: store.backend_tag().to_string(),
        timestamp: Utc::now(),
    }))
}
