//! Budget HTTP handlers.
//!
//! - GET /api/budgets - List budgets, optionally with spending
//! - POST /api/budgets - Create a budget
//! - GET /api/budgets/{id} - Get one budget
//! - PUT /api/budgets/{id} - Update some fields of a budget
//! - DELETE /api/budgets/{id} - Delete a budget

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};

use crate::{
    db::DbPool,
    error::AppError,
    models::{Budget, BudgetListing, BudgetQueryParams, CreateBudgetRequest, UpdateBudgetRequest},
    services::{budget_service, expense_service::ExpenseService},
    validation::path_id,
};

/// List budgets.
///
/// # Endpoint
///
/// `GET /api/budgets?walletId=&userId=&categories=&activeOn=&includeUsage=true`
///
/// With `includeUsage=true` every entry becomes
/// `{"budget": {...}, "spent": 120, "remaining": 280, "utilization": 30}`.
pub async fn list_budgets(
    State(pool): State<DbPool>,
    State(expenses): State<ExpenseService>,
    query: Result<Query<BudgetQueryParams>, QueryRejection>,
) -> Result<Json<BudgetListing>, AppError> {
    let Query(params) = query?;
    let (filter, include_usage) = params.validate()?;

    let budgets = budget_service::list_budgets(&pool, &filter).await?;
    if !include_usage {
        return Ok(Json(BudgetListing::Plain(budgets)));
    }

    let usage = budget_service::with_usage(expenses.store().as_ref(), budgets).await?;
    Ok(Json(BudgetListing::WithUsage(usage)))
}

pub async fn get_budget(
    State(pool): State<DbPool>,
    Path(id): Path<String>,
) -> Result<Json<Budget>, AppError> {
    let id = path_id(&id)?;
    Ok(Json(budget_service::get_budget(&pool, &id).await?))
}

pub async fn create_budget(
    State(pool): State<DbPool>,
    body: Result<Json<CreateBudgetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Budget>), AppError> {
    let Json(request) = body?;
    let budget = budget_service::create_budget(&pool, request.validate()?).await?;

    Ok((StatusCode::CREATED, Json(budget)))
}

pub async fn update_budget(
    State(pool): State<DbPool>,
    Path(id): Path<String>,
    body: Result<Json<UpdateBudgetRequest>, JsonRejection>,
) -> Result<Json<Budget>, AppError> {
    let id = path_id(&id)?;
    let Json(request) = body?;
    let patch = request.validate()?;

    Ok(Json(budget_service::update_budget(&pool, &id, patch).await?))
}

pub async fn delete_budget(
    State(pool): State<DbPool>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = path_id(&id)?;
    budget_service::delete_budget(&pool, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}
