//! Wallet HTTP handlers.
//!
//! - GET /api/wallets - List wallets, optionally by owner
//! - POST /api/wallets - Create a wallet
//! - GET /api/wallets/{id} - Get one wallet
//! - PUT /api/wallets/{id} - Update some fields of a wallet
//! - DELETE /api/wallets/{id} - Delete a wallet
//! - POST /api/wallets/{id}/members - Add a member
//! - DELETE /api/wallets/{id}/members/{userId} - Remove a member

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
        CreateWalletRequest, InvalidObjectId, MemberRequest, UpdateWalletRequest, Wallet,
        WalletQueryParams,
    },
    services::wallet_service,
    validation::path_id,
};

pub async fn list_wallets(
    State(pool): State<DbPool>,
    query: Result<Query<WalletQueryParams>, QueryRejection>,
) -> Result<Json<Vec<Wallet>>, AppError> {
    let Query(params) = query?;
    let owner_id = params.validate()?;

    Ok(Json(
        wallet_service::list_wallets(&pool, owner_id.as_ref()).await?,
    ))
}

pub async fn get_wallet(
    State(pool): State<DbPool>,
    Path(id): Path<String>,
) -> Result<Json<Wallet>, AppError> {
    let id = path_id(&id)?;
    Ok(Json(wallet_service::get_wallet(&pool, &id).await?))
}

/// Create a wallet.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Household",
///   "ownerId": "65f1a2b3c4d5e6f708192a3b",
///   "members": [{ "userId": "65f1a2b3c4d5e6f708192a3c", "role": "editor" }],
///   "currency": "EUR"
/// }
/// ```
pub async fn create_wallet(
    State(pool): State<DbPool>,
    body: Result<Json<CreateWalletRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Wallet>), AppError> {
    let Json(request) = body?;
    let wallet = wallet_service::create_wallet(&pool, request.validate()?).await?;

    Ok((StatusCode::CREATED, Json(wallet)))
}

pub async fn update_wallet(
    State(pool): State<DbPool>,
    Path(id): Path<String>,
    body: Result<Json<UpdateWalletRequest>, JsonRejection>,
) -> Result<Json<Wallet>, AppError> {
    let id = path_id(&id)?;
    let Json(request) = body?;
    let patch = request.validate()?;

    Ok(Json(wallet_service::update_wallet(&pool, &id, patch).await?))
}

pub async fn delete_wallet(
    State(pool): State<DbPool>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = path_id(&id)?;
    wallet_service::delete_wallet(&pool, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_member(
    State(pool): State<DbPool>,
    Path(id): Path<String>,
    body: Result<Json<MemberRequest>, JsonRejection>,
) -> Result<Json<Wallet>, AppError> {
    let id = path_id(&id)?;
    let Json(request) = body?;
    let member = request.validate()?;

    Ok(Json(wallet_service::add_member(&pool, &id, member).await?))
}

pub async fn remove_member(
    State(pool): State<DbPool>,
    Path((id, user_id)): Path<(String, String)>,
) -> Result<Json<Wallet>, AppError> {
    let id = path_id(&id)?;
    let user_id = user_id
        .parse()
        .map_err(|e: InvalidObjectId| AppError::invalid_field("userId", e.to_string()))?;

    Ok(Json(
        wallet_service::remove_member(&pool, &id, &user_id).await?,
    ))
}
