//! PostgreSQL expense store.
//!
//! Predicates are rendered into `WHERE` clauses with [`QueryBuilder`] so every
//! value travels as a bind parameter. The aggregation primitives run as
//! `GROUP BY` queries inside the database.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Postgres, QueryBuilder};

use super::{CategoryTotal, DailyTotal, ExpenseStore, StoreError, Totals};
use crate::{
    db::DbPool,
    models::{Expense, ExpensePatch, ListOptions, NewExpense, ObjectId, SortDirection},
    services::filter::{Condition, ExpensePredicate},
};

const EXPENSE_COLUMNS: &str = "id, name, amount, category, date, currency, note, tags, wallet_id, \
     user_id, is_recurring, receipt_url, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgExpenseStore {
    pool: DbPool,
}

impl PgExpenseStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Append ` WHERE ...` for `predicate`. Nothing is appended for the empty predicate.
fn push_predicate(query: &mut QueryBuilder<'_, Postgres>, predicate: &ExpensePredicate) {
    for (index, condition) in predicate.conditions().iter().enumerate() {
        query.push(if index == 0 { " WHERE " } else { " AND " });
        match condition {
            Condition::WalletIs(id) => {
                query.push("wallet_id = ").push_bind(id.clone());
            }
            Condition::OwnerIs(id) => {
                query.push("user_id = ").push_bind(id.clone());
            }
            Condition::CategoryIn(categories) => {
                query
                    .push("category = ANY(")
                    .push_bind(categories.clone())
                    .push(")");
            }
            Condition::AnyTagIn(tags) => {
                query.push("tags && ").push_bind(tags.clone()).push("::text[]");
            }
            Condition::TextContains(needle) => {
                let pattern = format!("%{}%", escape_like(needle));
                query
                    .push("(name ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR note ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
            Condition::DateOnOrAfter(from) => {
                query.push("date >= ").push_bind(*from);
            }
            Condition::DateOnOrBefore(to) => {
                query.push("date <= ").push_bind(*to);
            }
        }
    }
}

/// Escape `LIKE` wildcards so the search text matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl ExpenseStore for PgExpenseStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert(&self, expense: NewExpense) -> Result<Expense, StoreError> {
        let expense = sqlx::query_as::<_, Expense>(&format!(
            r#"
            INSERT INTO expenses (
                id, name, amount, category, date, currency, note, tags,
                wallet_id, user_id, is_recurring, receipt_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {EXPENSE_COLUMNS}
            "#
        ))
        .bind(ObjectId::generate())
        .bind(expense.name)
        .bind(expense.amount)
        .bind(expense.category)
        .bind(expense.date)
        .bind(expense.currency)
        .bind(expense.note)
        .bind(expense.tags)
        .bind(expense.wallet_id)
        .bind(expense.user_id)
        .bind(expense.is_recurring)
        .bind(expense.receipt_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(expense)
    }

    async fn get(&self, id: &ObjectId) -> Result<Option<Expense>, StoreError> {
        let expense = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expense)
    }

    async fn update(
        &self,
        id: &ObjectId,
        patch: ExpensePatch,
    ) -> Result<Option<Expense>, StoreError> {
        // A single UPDATE keeps the replacement atomic at the row level.
        let expense = sqlx::query_as::<_, Expense>(&format!(
            r#"
            UPDATE expenses
            SET name = COALESCE($2, name),
                amount = COALESCE($3, amount),
                category = COALESCE($4, category),
                date = COALESCE($5, date),
                currency = COALESCE($6, currency),
                note = COALESCE($7, note),
                tags = COALESCE($8, tags),
                wallet_id = COALESCE($9, wallet_id),
                user_id = COALESCE($10, user_id),
                is_recurring = COALESCE($11, is_recurring),
                receipt_url = COALESCE($12, receipt_url),
                updated_at = $13
            WHERE id = $1
            RETURNING {EXPENSE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.name)
        .bind(patch.amount)
        .bind(patch.category)
        .bind(patch.date)
        .bind(patch.currency)
        .bind(patch.note)
        .bind(patch.tags)
        .bind(patch.wallet_id)
        .bind(patch.user_id)
        .bind(patch.is_recurring)
        .bind(patch.receipt_url)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(expense)
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find(
        &self,
        predicate: &ExpensePredicate,
        options: ListOptions,
    ) -> Result<Vec<Expense>, StoreError> {
        let mut query = QueryBuilder::new(format!("SELECT {EXPENSE_COLUMNS} FROM expenses"));
        push_predicate(&mut query, predicate);
        query.push(match options.sort {
            SortDirection::Ascending => " ORDER BY date ASC, created_at ASC, id ASC",
            SortDirection::Descending => " ORDER BY date DESC, created_at DESC, id DESC",
        });
        if let Some(limit) = options.limit {
            query.push(" LIMIT ").push_bind(limit as i64);
        }

        let expenses = query
            .build_query_as::<Expense>()
            .fetch_all(&self.pool)
            .await?;

        Ok(expenses)
    }

    async fn totals(&self, predicate: &ExpensePredicate) -> Result<Totals, StoreError> {
        let mut query = QueryBuilder::new(
            r#"
            SELECT COALESCE(SUM(amount), 0)::float8 AS total_amount,
                   COUNT(*) AS total_count,
                   MIN(date) AS min_date,
                   MAX(date) AS max_date
            FROM expenses
            "#,
        );
        push_predicate(&mut query, predicate);

        let totals = query
            .build_query_as::<Totals>()
            .fetch_one(&self.pool)
            .await?;

        Ok(totals)
    }

    async fn category_totals(
        &self,
        predicate: &ExpensePredicate,
    ) -> Result<Vec<CategoryTotal>, StoreError> {
        let mut query = QueryBuilder::new(
            r#"
            SELECT category,
                   SUM(amount)::float8 AS total,
                   COUNT(*) AS count,
                   AVG(amount)::float8 AS average
            FROM expenses
            "#,
        );
        push_predicate(&mut query, predicate);
        query.push(" GROUP BY category ORDER BY total DESC, category ASC");

        let categories = query
            .build_query_as::<CategoryTotal>()
            .fetch_all(&self.pool)
            .await?;

        Ok(categories)
    }

    async fn daily_totals(
        &self,
        predicate: &ExpensePredicate,
    ) -> Result<Vec<DailyTotal>, StoreError> {
        let mut query = QueryBuilder::new(
            r#"
            SELECT (date AT TIME ZONE 'UTC')::date AS day,
                   SUM(amount)::float8 AS total
            FROM expenses
            "#,
        );
        push_predicate(&mut query, predicate);
        query.push(" GROUP BY day ORDER BY day ASC");

        let days = query
            .build_query_as::<DailyTotal>()
            .fetch_all(&self.pool)
            .await?;

        Ok(days)
    }

    async fn largest(
        &self,
        predicate: &ExpensePredicate,
        limit: usize,
    ) -> Result<Vec<Expense>, StoreError> {
        let mut query = QueryBuilder::new(format!("SELECT {EXPENSE_COLUMNS} FROM expenses"));
        push_predicate(&mut query, predicate);
        query
            .push(" ORDER BY amount DESC, created_at ASC, id ASC LIMIT ")
            .push_bind(limit as i64);

        let expenses = query
            .build_query_as::<Expense>()
            .fetch_all(&self.pool)
            .await?;

        Ok(expenses)
    }
}
