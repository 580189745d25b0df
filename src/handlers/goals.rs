//! Savings goal HTTP handlers.

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
    models::{
        AdjustProgressRequest, CreateGoalRequest, Goal, GoalQueryParams, UpdateGoalRequest,
    },
    services::goal_service,
    validation::path_id,
};

/// `GET /api/goals?walletId=&userId=&activeOnly=true`
pub async fn list_goals(
    State(pool): State<DbPool>,
    query: Result<Query<GoalQueryParams>, QueryRejection>,
) -> Result<Json<Vec<Goal>>, AppError> {
    let Query(params) = query?;
    let filter = params.validate()?;

    Ok(Json(goal_service::list_goals(&pool, &filter).await?))
}

pub async fn get_goal(
    State(pool): State<DbPool>,
    Path(id): Path<String>,
) -> Result<Json<Goal>, AppError> {
    let id = path_id(&id)?;
    Ok(Json(goal_service::get_goal(&pool, &id).await?))
}

pub async fn create_goal(
    State(pool): State<DbPool>,
    body: Result<Json<CreateGoalRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Goal>), AppError> {
    let Json(request) = body?;
    let goal = goal_service::create_goal(&pool, request.validate()?).await?;

    Ok((StatusCode::CREATED, Json(goal)))
}

pub async fn update_goal(
    State(pool): State<DbPool>,
    Path(id): Path<String>,
    body: Result<Json<UpdateGoalRequest>, JsonRejection>,
) -> Result<Json<Goal>, AppError> {
    let id = path_id(&id)?;
    let Json(request) = body?;
    let patch = request.validate()?;

    Ok(Json(goal_service::update_goal(&pool, &id, patch).await?))
}

/// `PATCH /api/goals/{id}/progress` with `{"amountDelta": 50}`.
pub async fn adjust_progress(
    State(pool): State<DbPool>,
    Path(id): Path<String>,
    body: Result<Json<AdjustProgressRequest>, JsonRejection>,
) -> Result<Json<Goal>, AppError> {
    let id = path_id(&id)?;
    let Json(request) = body?;
    let delta = request.validate()?;

    Ok(Json(goal_service::adjust_progress(&pool, &id, delta).await?))
}

pub async fn delete_goal(
    State(pool): State<DbPool>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = path_id(&id)?;
    goal_service::delete_goal(&pool, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}
