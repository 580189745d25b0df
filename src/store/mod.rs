//! Expense persistence.
//!
//! The expense service talks to storage only through [`ExpenseStore`], so the
//! backend is chosen when the service is constructed:
//! - [`PgExpenseStore`]: PostgreSQL, used by the server
//! - [`MemoryExpenseStore`]: process-local, used by tests and embedders
//!
//! Besides CRUD the trait exposes the four aggregation primitives the summary
//! is built from. Each is a single read against the store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    models::{Expense, ExpensePatch, ListOptions, NewExpense, ObjectId},
    services::filter::ExpensePredicate,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryExpenseStore;
pub use postgres::PgExpenseStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Sum, count and date bounds over every matching expense.
#[derive(Debug, Clone, Copy, Default, PartialEq, sqlx::FromRow)]
pub struct Totals {
    pub total_amount: f64,
    pub total_count: i64,
    pub min_date: Option<DateTime<Utc>>,
    pub max_date: Option<DateTime<Utc>>,
}

/// Amount statistics for one category.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    pub count: i64,
    pub average: f64,
}

/// Sum of amounts on one UTC calendar day.
#[derive(Debug, Clone, Copy, PartialEq, sqlx::FromRow)]
pub struct DailyTotal {
    pub day: NaiveDate,
    pub total: f64,
}

#[async_trait]
pub trait ExpenseStore: Send + Sync + 'static {
    /// Short name of the backend, reported by the health check.
    fn backend_tag(&self) -> &'static str;

    /// Check the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn insert(&self, expense: NewExpense) -> Result<Expense, StoreError>;

    async fn get(&self, id: &ObjectId) -> Result<Option<Expense>, StoreError>;

    /// Apply `patch` in one operation. `None` if no expense has this id.
    async fn update(&self, id: &ObjectId, patch: ExpensePatch)
    -> Result<Option<Expense>, StoreError>;

    /// Permanently remove an expense. `false` if no expense has this id.
    async fn delete(&self, id: &ObjectId) -> Result<bool, StoreError>;

    /// Matching expenses ordered by date, then creation time, both in the
    /// requested direction.
    async fn find(
        &self,
        predicate: &ExpensePredicate,
        options: ListOptions,
    ) -> Result<Vec<Expense>, StoreError>;

    /// Zero totals and no dates when nothing matches.
    async fn totals(&self, predicate: &ExpensePredicate) -> Result<Totals, StoreError>;

    /// Per-category statistics, highest total first; equal totals by category name.
    async fn category_totals(
        &self,
        predicate: &ExpensePredicate,
    ) -> Result<Vec<CategoryTotal>, StoreError>;

    /// Per-day sums in ascending day order. Days without expenses are absent.
    async fn daily_totals(&self, predicate: &ExpensePredicate)
    -> Result<Vec<DailyTotal>, StoreError>;

    /// Up to `limit` matching expenses by amount, largest first. Equal amounts
    /// keep creation order (earliest first), then identifier order.
    async fn largest(
        &self,
        predicate: &ExpensePredicate,
        limit: usize,
    ) -> Result<Vec<Expense>, StoreError>;
}
