//! Savings goal service.

use sqlx::{Postgres, QueryBuilder};

use crate::{
    db::DbPool,
    error::AppError,
    models::{Goal, GoalFilter, GoalPatch, NewGoal, ObjectId},
};

const GOAL_COLUMNS: &str = "id, name, description, target_amount, current_amount, wallet_id, \
     user_id, deadline, created_at, updated_at";

fn push_goal_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &GoalFilter) {
    let mut separator = " WHERE ";
    let mut next = |query: &mut QueryBuilder<'_, Postgres>| {
        query.push(separator);
        separator = " AND ";
    };

    if let Some(wallet_id) = &filter.wallet_id {
        next(query);
        query.push("wallet_id = ").push_bind(wallet_id.clone());
    }
    if let Some(user_id) = &filter.user_id {
        next(query);
        query.push("user_id = ").push_bind(user_id.clone());
    }
    if filter.active_only {
        next(query);
        query.push("target_amount > 0 AND current_amount < target_amount");
    }
}

/// Goals matching `filter`, nearest deadline first. Open-ended goals come last.
pub async fn list_goals(pool: &DbPool, filter: &GoalFilter) -> Result<Vec<Goal>, AppError> {
    let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {GOAL_COLUMNS} FROM goals"));
    push_goal_filter(&mut query, filter);
    query.push(" ORDER BY deadline ASC NULLS LAST, created_at ASC");

    let goals = query.build_query_as::<Goal>().fetch_all(pool).await?;
    Ok(goals)
}

pub async fn get_goal(pool: &DbPool, id: &ObjectId) -> Result<Goal, AppError> {
    sqlx::query_as::<_, Goal>(&format!("SELECT {GOAL_COLUMNS} FROM goals WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Goal"))
}

pub async fn create_goal(pool: &DbPool, goal: NewGoal) -> Result<Goal, AppError> {
    let goal = sqlx::query_as::<_, Goal>(&format!(
        r#"
        INSERT INTO goals (
            id, name, description, target_amount, current_amount,
            wallet_id, user_id, deadline
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {GOAL_COLUMNS}
        "#
    ))
    .bind(ObjectId::generate())
    .bind(goal.name)
    .bind(goal.description)
    .bind(goal.target_amount)
    .bind(goal.current_amount)
    .bind(goal.wallet_id)
    .bind(goal.user_id)
    .bind(goal.deadline)
    .fetch_one(pool)
    .await?;

    tracing::info!(id = %goal.id, "goal created");
    Ok(goal)
}

pub async fn update_goal(pool: &DbPool, id: &ObjectId, patch: GoalPatch) -> Result<Goal, AppError> {
    let goal = sqlx::query_as::<_, Goal>(&format!(
        r#"
        UPDATE goals
        SET name = COALESCE($2, name),
            description = COALESCE($3, description),
            target_amount = COALESCE($4, target_amount),
            current_amount = COALESCE($5, current_amount),
            wallet_id = COALESCE($6, wallet_id),
            user_id = COALESCE($7, user_id),
            deadline = COALESCE($8, deadline),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {GOAL_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(patch.name)
    .bind(patch.description)
    .bind(patch.target_amount)
    .bind(patch.current_amount)
    .bind(patch.wallet_id)
    .bind(patch.user_id)
    .bind(patch.deadline)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Goal"))?;

    tracing::info!(id = %goal.id, "goal updated");
    Ok(goal)
}

/// Add `delta` to the goal's current amount.
///
/// The increment happens in a single `UPDATE`, so concurrent adjustments
/// never lose each other. The guard in the `WHERE` clause refuses any
/// adjustment that would leave the amount negative.
pub async fn adjust_progress(pool: &DbPool, id: &ObjectId, delta: f64) -> Result<Goal, AppError> {
    let updated = sqlx::query_as::<_, Goal>(&format!(
        r#"
        UPDATE goals
        SET current_amount = current_amount + $2,
            updated_at = NOW()
        WHERE id = $1 AND current_amount + $2 >= 0
        RETURNING {GOAL_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(delta)
    .fetch_optional(pool)
    .await?;

    if let Some(goal) = updated {
        tracing::info!(id = %goal.id, delta, current = goal.current_amount, "goal progress adjusted");
        return Ok(goal);
    }

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM goals WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    if exists {
        Err(AppError::invalid_field(
            "amountDelta",
            "Would make currentAmount negative",
        ))
    } else {
        Err(AppError::NotFound("Goal"))
    }
}

pub async fn delete_goal(pool: &DbPool, id: &ObjectId) -> Result<(), AppError> {
    let deleted = sqlx::query("DELETE FROM goals WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound("Goal"));
    }
    tracing::info!(%id, "goal deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_only_compares_progress_to_target() {
        let filter = GoalFilter {
            wallet_id: Some(ObjectId::generate()),
            active_only: true,
            ..Default::default()
        };
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM goals");

        push_goal_filter(&mut query, &filter);

        assert_eq!(
            query.sql(),
            "SELECT * FROM goals WHERE wallet_id = $1 \
             AND target_amount > 0 AND current_amount < target_amount"
        );
    }

    #[test]
    fn no_filters_no_where_clause() {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM goals");

        push_goal_filter(&mut query, &GoalFilter::default());

        assert_eq!(query.sql(), "SELECT * FROM goals");
    }
}
