//! Expense HTTP handlers.
//!
//! - GET /api/expenses - List matching expenses
//! - GET /api/expenses/summary - Aggregated summary of matching expenses
//! - GET /api/expenses/{id} - Get one expense
//! - POST /api/expenses - Create an expense
//! - PUT /api/expenses/{id} - Update some fields of an expense
//! - DELETE /api/expenses/{id} - Delete an expense

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};

use crate::{
    error::AppError,
    models::{
        CreateExpenseRequest, Expense, ExpenseQueryParams, ExpenseSummary, UpdateExpenseRequest,
    },
    services::expense_service::ExpenseService,
    validation::path_id,
};

/// List expenses.
///
/// # Endpoint
///
/// `GET /api/expenses?walletId=&userId=&categories=Food,Transport&tags=&search=&from=&to=&limit=&sort=`
///
/// All parameters are optional. `categories` and `tags` are comma-separated;
/// `sort` is `asc` or `desc` by date (default `desc`).
pub async fn list_expenses(
    State(expenses): State<ExpenseService>,
    query: Result<Query<ExpenseQueryParams>, QueryRejection>,
) -> Result<Json<Vec<Expense>>, AppError> {
    let Query(params) = query?;
    let (criteria, options) = params.listing()?;

    Ok(Json(expenses.list(&criteria, options).await?))
}

/// Summarize expenses.
///
/// # Endpoint
///
/// `GET /api/expenses/summary` with the same filters as the listing.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "totalAmount": 350,
///   "totalCount": 3,
///   "averagePerDay": 175,
///   "distinctCategories": 2,
///   "categoryBreakdown": [
///     { "category": "Transport", "total": 200, "count": 1, "average": 200, "percentage": 57.14 }
///   ],
///   "trend": [{ "date": "2024-03-01", "total": 300 }],
///   "topCategory": { "category": "Transport", "total": 200 },
///   "topExpense": { "name": "Flight", "amount": 200, "category": "Transport", "date": "2024-03-01T00:00:00Z" },
///   "anomalies": []
/// }
/// ```
pub async fn expense_summary(
    State(expenses): State<ExpenseService>,
    query: Result<Query<ExpenseQueryParams>, QueryRejection>,
) -> Result<Json<ExpenseSummary>, AppError> {
    let Query(params) = query?;
    let criteria = params.criteria()?;

    Ok(Json(expenses.summary(&criteria).await?))
}

pub async fn get_expense(
    State(expenses): State<ExpenseService>,
    Path(id): Path<String>,
) -> Result<Json<Expense>, AppError> {
    let id = path_id(&id)?;
    Ok(Json(expenses.get(&id).await?))
}

/// Create an expense.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Lunch",
///   "amount": 12.5,
///   "category": "Food",
///   "date": "2024-03-01",   // optional, defaults to now
///   "tags": ["work"]        // optional
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: the stored expense
/// - **Error (400)**: one `details` entry per rejected field
pub async fn create_expense(
    State(expenses): State<ExpenseService>,
    body: Result<Json<CreateExpenseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    let Json(request) = body?;
    let expense = expenses.create(request).await?;

    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn update_expense(
    State(expenses): State<ExpenseService>,
    Path(id): Path<String>,
    body: Result<Json<UpdateExpenseRequest>, JsonRejection>,
) -> Result<Json<Expense>, AppError> {
    let id = path_id(&id)?;
    let Json(request) = body?;
    let patch = request.validate()?;

    Ok(Json(expenses.update(&id, patch).await?))
}

pub async fn delete_expense(
    State(expenses): State<ExpenseService>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = path_id(&id)?;
    expenses.delete(&id).await?;

    Ok(StatusCode::NO_CONTENT)
}
