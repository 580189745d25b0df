//! Budget service - CRUD and spending against limits.
//!
//! Budgets live in PostgreSQL. Spending is not stored on the budget; it is
//! summed from the expense store on request, using the same predicate the
//! expense listing and summaries use.

use sqlx::{Postgres, QueryBuilder};

use crate::{
    db::DbPool,
    error::AppError,
    models::{Budget, BudgetFilter, BudgetPatch, BudgetUsage, NewBudget, ObjectId},
    services::filter::{ExpensePredicate, FilterCriteria},
    store::ExpenseStore,
};

const BUDGET_COLUMNS: &str = "id, name, category, spending_limit, wallet_id, user_id, \
     period_start, period_end, notes, created_at, updated_at";

/// Append ` WHERE ...` for the supplied filters.
fn push_budget_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &BudgetFilter) {
    let mut separated = " WHERE ";
    let mut next = |query: &mut QueryBuilder<'_, Postgres>| {
        query.push(separated);
        separated = " AND ";
    };

    if let Some(wallet_id) = &filter.wallet_id {
        next(query);
        query.push("wallet_id = ").push_bind(wallet_id.clone());
    }
    if let Some(user_id) = &filter.user_id {
        next(query);
        query.push("user_id = ").push_bind(user_id.clone());
    }
    if !filter.categories.is_empty() {
        next(query);
        query
            .push("category = ANY(")
            .push_bind(filter.categories.clone())
            .push(")");
    }
    if let Some(day) = filter.active_on {
        next(query);
        query
            .push("period_start <= ")
            .push_bind(day)
            .push(" AND period_end >= ")
            .push_bind(day);
    }
}

/// The expenses that count against `budget`: same wallet and owner when set,
/// same category, dated within the period (inclusive).
pub fn spending_criteria(budget: &Budget) -> FilterCriteria {
    FilterCriteria {
        wallet_id: budget.wallet_id.clone(),
        user_id: budget.user_id.clone(),
        categories: vec![budget.category.clone()],
        from: Some(budget.period_start),
        to: Some(budget.period_end),
        ..Default::default()
    }
    .normalized()
}

/// Budgets matching `filter`, most recent period first.
pub async fn list_budgets(pool: &DbPool, filter: &BudgetFilter) -> Result<Vec<Budget>, AppError> {
    let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {BUDGET_COLUMNS} FROM budgets"));
    push_budget_filter(&mut query, filter);
    query.push(" ORDER BY period_start DESC, created_at DESC");

    let budgets = query.build_query_as::<Budget>().fetch_all(pool).await?;
    Ok(budgets)
}

/// Attach spending to each budget.
pub async fn with_usage(
    store: &dyn ExpenseStore,
    budgets: Vec<Budget>,
) -> Result<Vec<BudgetUsage>, AppError> {
    let mut usage = Vec::with_capacity(budgets.len());
    for budget in budgets {
        let predicate = ExpensePredicate::build(&spending_criteria(&budget));
        let totals = store.totals(&predicate).await?;
        usage.push(BudgetUsage::new(budget, totals.total_amount));
    }
    Ok(usage)
}

pub async fn get_budget(pool: &DbPool, id: &ObjectId) -> Result<Budget, AppError> {
    sqlx::query_as::<_, Budget>(&format!(
        "SELECT {BUDGET_COLUMNS} FROM budgets WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Budget"))
}

pub async fn create_budget(pool: &DbPool, budget: NewBudget) -> Result<Budget, AppError> {
    let budget = sqlx::query_as::<_, Budget>(&format!(
        r#"
        INSERT INTO budgets (
            id, name, category, spending_limit, wallet_id, user_id,
            period_start, period_end, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {BUDGET_COLUMNS}
        "#
    ))
    .bind(ObjectId::generate())
    .bind(budget.name)
    .bind(budget.category)
    .bind(budget.limit)
    .bind(budget.wallet_id)
    .bind(budget.user_id)
    .bind(budget.period_start)
    .bind(budget.period_end)
    .bind(budget.notes)
    .fetch_one(pool)
    .await?;

    tracing::info!(id = %budget.id, category = %budget.category, "budget created");
    Ok(budget)
}

/// Apply `patch` in one statement.
///
/// The period check runs against the merged row, so a patch that moves only
/// one end of the period cannot invert it.
pub async fn update_budget(
    pool: &DbPool,
    id: &ObjectId,
    patch: BudgetPatch,
) -> Result<Budget, AppError> {
    let updated = sqlx::query_as::<_, Budget>(&format!(
        r#"
        UPDATE budgets
        SET name = COALESCE($2, name),
            category = COALESCE($3, category),
            spending_limit = COALESCE($4, spending_limit),
            wallet_id = COALESCE($5, wallet_id),
            user_id = COALESCE($6, user_id),
            period_start = COALESCE($7, period_start),
            period_end = COALESCE($8, period_end),
            notes = COALESCE($9, notes),
            updated_at = NOW()
        WHERE id = $1
          AND COALESCE($8, period_end) >= COALESCE($7, period_start)
        RETURNING {BUDGET_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(patch.name)
    .bind(patch.category)
    .bind(patch.limit)
    .bind(patch.wallet_id)
    .bind(patch.user_id)
    .bind(patch.period_start)
    .bind(patch.period_end)
    .bind(patch.notes)
    .fetch_optional(pool)
    .await?;

    if let Some(budget) = updated {
        tracing::info!(id = %budget.id, "budget updated");
        return Ok(budget);
    }

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM budgets WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    if exists {
        Err(AppError::invalid_field(
            "periodEnd",
            "Must not precede periodStart",
        ))
    } else {
        Err(AppError::NotFound("Budget"))
    }
}

pub async fn delete_budget(pool: &DbPool, id: &ObjectId) -> Result<(), AppError> {
    let deleted = sqlx::query("DELETE FROM budgets WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound("Budget"));
    }
    tracing::info!(%id, "budget deleted");
    Ok(())
}
