//! Wallet service - shared wallets and their member lists.
//!
//! Members are stored as a JSONB array on the wallet row. Adding and removing
//! members rewrites that array inside a single `UPDATE`, so concurrent
//! membership changes do not overwrite each other.

use sqlx::types::Json;

use crate::{
    db::DbPool,
    error::AppError,
    models::{NewWallet, ObjectId, Wallet, WalletMember, WalletPatch},
};

const WALLET_COLUMNS: &str = "id, name, owner_id, members, currency, created_at, updated_at";

/// Wallets, newest first, optionally restricted to one owner.
pub async fn list_wallets(
    pool: &DbPool,
    owner_id: Option<&ObjectId>,
) -> Result<Vec<Wallet>, AppError> {
    let wallets = sqlx::query_as::<_, Wallet>(&format!(
        r#"
        SELECT {WALLET_COLUMNS} FROM wallets
        WHERE ($1::text IS NULL OR owner_id = $1)
        ORDER BY created_at DESC
        "#
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    Ok(wallets)
}

pub async fn get_wallet(pool: &DbPool, id: &ObjectId) -> Result<Wallet, AppError> {
    sqlx::query_as::<_, Wallet>(&format!("SELECT {WALLET_COLUMNS} FROM wallets WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Wallet"))
}

pub async fn create_wallet(pool: &DbPool, wallet: NewWallet) -> Result<Wallet, AppError> {
    let wallet = sqlx::query_as::<_, Wallet>(&format!(
        r#"
        INSERT INTO wallets (id, name, owner_id, members, currency)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {WALLET_COLUMNS}
        "#
    ))
    .bind(ObjectId::generate())
    .bind(wallet.name)
    .bind(wallet.owner_id)
    .bind(Json(wallet.members))
    .bind(wallet.currency)
    .fetch_one(pool)
    .await?;

    tracing::info!(id = %wallet.id, owner = %wallet.owner_id, "wallet created");
    Ok(wallet)
}

pub async fn update_wallet(
    pool: &DbPool,
    id: &ObjectId,
    patch: WalletPatch,
) -> Result<Wallet, AppError> {
    let wallet = sqlx::query_as::<_, Wallet>(&format!(
        r#"
        UPDATE wallets
        SET name = COALESCE($2, name),
            owner_id = COALESCE($3, owner_id),
            members = COALESCE($4, members),
            currency = COALESCE($5, currency),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {WALLET_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(patch.name)
    .bind(patch.owner_id)
    .bind(patch.members.map(Json))
    .bind(patch.currency)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Wallet"))?;

    tracing::info!(id = %wallet.id, "wallet updated");
    Ok(wallet)
}

/// Add `member` unless the identical `{userId, role}` entry is already present.
pub async fn add_member(
    pool: &DbPool,
    id: &ObjectId,
    member: WalletMember,
) -> Result<Wallet, AppError> {
    let entry = Json(vec![member]);
    let wallet = sqlx::query_as::<_, Wallet>(&format!(
        r#"
        UPDATE wallets
        SET members = CASE
                WHEN members @> $2 THEN members
                ELSE members || $2
            END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {WALLET_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(entry)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Wallet"))?;

    tracing::info!(id = %wallet.id, members = wallet.members.len(), "wallet member added");
    Ok(wallet)
}

/// Remove every entry for `user_id`, whatever its role.
pub async fn remove_member(
    pool: &DbPool,
    id: &ObjectId,
    user_id: &ObjectId,
) -> Result<Wallet, AppError> {
    let wallet = sqlx::query_as::<_, Wallet>(&format!(
        r#"
        UPDATE wallets
        SET members = COALESCE(
                (SELECT jsonb_agg(m) FROM jsonb_array_elements(members) AS m
                 WHERE m->>'userId' <> $2),
                '[]'::jsonb
            ),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {WALLET_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Wallet"))?;

    tracing::info!(id = %wallet.id, user = %user_id, "wallet member removed");
    Ok(wallet)
}

pub async fn delete_wallet(pool: &DbPool, id: &ObjectId) -> Result<(), AppError> {
    let deleted = sqlx::query("DELETE FROM wallets WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound("Wallet"));
    }
    tracing::info!(%id, "wallet deleted");
    Ok(())
}
