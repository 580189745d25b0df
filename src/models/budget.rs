//! Budget data models and API request types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::ObjectId,
    validation::{Violations, parse_flag, split_list},
};

/// A spending limit for one category over a period.
///
/// # Database Table
///
/// Maps to the `budgets` table. `limit` is stored as `spending_limit`
/// because `LIMIT` is reserved in SQL.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub category: String,
    #[sqlx(rename = "spending_limit")]
    pub limit: f64,
    pub wallet_id: Option<ObjectId>,
    pub user_id: Option<ObjectId>,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A budget together with how much of it has been spent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetUsage {
    pub budget: Budget,
    pub spent: f64,
    /// Never negative, even when overspent.
    pub remaining: f64,
    /// `spent` as a percentage of the limit; 0 for a zero limit.
    pub utilization: f64,
}

impl BudgetUsage {
    pub fn new(budget: Budget, spent: f64) -> Self {
        let remaining = (budget.limit - spent).max(0.0);
        let utilization = if budget.limit > 0.0 {
            spent / budget.limit * 100.0
        } else {
            0.0
        };
        Self {
            budget,
            spent,
            remaining,
            utilization,
        }
    }
}

/// Response of `GET /api/budgets`, shaped by `includeUsage`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BudgetListing {
    Plain(Vec<Budget>),
    WithUsage(Vec<BudgetUsage>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    pub name: String,
    pub category: String,
    pub limit: f64,
    pub wallet_id: Option<ObjectId>,
    pub user_id: Option<ObjectId>,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub limit: Option<f64>,
    pub wallet_id: Option<ObjectId>,
    pub user_id: Option<ObjectId>,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Request body for creating a budget.
///
/// # JSON Example
///
/// ```json
/// {
///   "name": "Groceries",
///   "category": "Food",
///   "limit": 400,
///   "periodStart": "2024-03-01",
///   "periodEnd": "2024-03-31"
/// }
/// ```
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBudgetRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub limit: Option<f64>,
    pub wallet_id: Option<String>,
    pub user_id: Option<String>,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub notes: Option<String>,
}

impl CreateBudgetRequest {
    pub fn validate(self) -> Result<NewBudget, AppError> {
        let mut v = Violations::new();

        let name = v.required_text("name", self.name);
        let category = v.required_text("category", self.category);
        let limit = match self.limit {
            None => {
                v.push("limit", "Required");
                None
            }
            limit => v.non_negative("limit", limit),
        };
        let wallet_id = v.object_id("walletId", self.wallet_id.as_deref());
        let user_id = v.object_id("userId", self.user_id.as_deref());
        let period_start = match self.period_start {
            None => {
                v.push("periodStart", "Required");
                None
            }
            Some(raw) => v.date("periodStart", Some(&raw)),
        };
        let period_end = match self.period_end {
            None => {
                v.push("periodEnd", "Required");
                None
            }
            Some(raw) => v.date("periodEnd", Some(&raw)),
        };
        let notes = v.note("notes", self.notes);

        if let (Some(start), Some(end)) = (period_start, period_end) {
            if end < start {
                v.push("periodEnd", "Must not precede periodStart");
            }
        }

        let (Some(name), Some(category), Some(limit), Some(period_start), Some(period_end)) =
            (name, category, limit, period_start, period_end)
        else {
            return Err(v.into_error());
        };

        v.finish(NewBudget {
            name,
            category,
            limit,
            wallet_id,
            user_id,
            period_start,
            period_end,
            notes,
        })
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBudgetRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub limit: Option<f64>,
    pub wallet_id: Option<String>,
    pub user_id: Option<String>,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub notes: Option<String>,
}

impl UpdateBudgetRequest {
    pub fn validate(self) -> Result<BudgetPatch, AppError> {
        let mut v = Violations::new();

        let patch = BudgetPatch {
            name: self.name.and_then(|name| v.non_empty_text("name", name)),
            category: self
                .category
                .and_then(|category| v.non_empty_text("category", category)),
            limit: v.non_negative("limit", self.limit),
            wallet_id: v.object_id("walletId", self.wallet_id.as_deref()),
            user_id: v.object_id("userId", self.user_id.as_deref()),
            period_start: v.date("periodStart", self.period_start.as_deref()),
            period_end: v.date("periodEnd", self.period_end.as_deref()),
            notes: v.note("notes", self.notes),
        };

        if let (Some(start), Some(end)) = (patch.period_start, patch.period_end) {
            if end < start {
                v.push("periodEnd", "Must not precede periodStart");
            }
        }
        if v.is_empty() && patch == BudgetPatch::default() {
            v.push("body", "Request body cannot be empty");
        }

        v.finish(patch)
    }
}

/// Validated filters for listing budgets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetFilter {
    pub wallet_id: Option<ObjectId>,
    pub user_id: Option<ObjectId>,
    pub categories: Vec<String>,
    /// Only budgets whose period contains this instant.
    pub active_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetQueryParams {
    pub wallet_id: Option<String>,
    pub user_id: Option<String>,
    pub categories: Option<String>,
    pub active_on: Option<String>,
    pub include_usage: Option<String>,
}

impl BudgetQueryParams {
    /// Returns the filter and whether usage was requested.
    pub fn validate(&self) -> Result<(BudgetFilter, bool), AppError> {
        let mut v = Violations::new();

        let filter = BudgetFilter {
            wallet_id: v.object_id("walletId", self.wallet_id.as_deref()),
            user_id: v.object_id("userId", self.user_id.as_deref()),
            categories: split_list(self.categories.as_deref()),
            active_on: v.date("activeOn", self.active_on.as_deref()),
        };
        let include_usage =
            parse_flag(&mut v, "includeUsage", self.include_usage.as_deref()).unwrap_or(false);

        v.finish((filter, include_usage))
    }
}
