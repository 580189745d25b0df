//! Expense data models and API request types.
//!
//! This module defines:
//! - `Expense`: a stored expense record
//! - `NewExpense` / `ExpensePatch`: validated input for create and update
//! - `CreateExpenseRequest` / `UpdateExpenseRequest`: raw request bodies
//! - `ExpenseQueryParams`: raw list/summary query string

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::ObjectId,
    services::filter::FilterCriteria,
    validation::{Violations, split_list},
};

/// Currency assigned when the client does not send one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Upper bound on the number of expenses a single list request returns.
pub const MAX_LIST_LIMIT: usize = 500;

/// Represents an expense record.
///
/// # Database Table
///
/// Maps to the `expenses` table. Amounts are plain non-negative numbers in the
/// expense's own currency; no conversion happens anywhere in the service.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub name: String,

    pub amount: f64,

    pub category: String,

    /// When the expense happened (defaults to creation time)
    pub date: DateTime<Utc>,

    /// ISO 4217 code, always uppercase
    pub currency: String,

    pub note: Option<String>,

    /// Order preserved as entered, duplicates allowed
    pub tags: Vec<String>,

    pub wallet_id: Option<ObjectId>,

    /// Owner of the expense
    pub user_id: Option<ObjectId>,

    pub is_recurring: bool,

    pub receipt_url: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// A validated expense ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub name: String,
    pub amount: f64,
    pub category: String,
    pub date: DateTime<Utc>,
    pub currency: String,
    pub note: Option<String>,
    pub tags: Vec<String>,
    pub wallet_id: Option<ObjectId>,
    pub user_id: Option<ObjectId>,
    pub is_recurring: bool,
    pub receipt_url: Option<String>,
}

impl NewExpense {
    /// A minimal expense dated `date`, mostly useful for seeding stores.
    pub fn new(
        name: impl Into<String>,
        amount: f64,
        category: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            amount,
            category: category.into(),
            date,
            currency: DEFAULT_CURRENCY.to_string(),
            note: None,
            tags: Vec::new(),
            wallet_id: None,
            user_id: None,
            is_recurring: false,
            receipt_url: None,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_wallet(mut self, wallet_id: ObjectId) -> Self {
        self.wallet_id = Some(wallet_id);
        self
    }

    pub fn with_user(mut self, user_id: ObjectId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Build the stored record.
    pub fn into_expense(self, id: ObjectId, now: DateTime<Utc>) -> Expense {
        Expense {
            id,
            name: self.name,
            amount: self.amount,
            category: self.category,
            date: self.date,
            currency: self.currency,
            note: self.note,
            tags: self.tags,
            wallet_id: self.wallet_id,
            user_id: self.user_id,
            is_recurring: self.is_recurring,
            receipt_url: self.receipt_url,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A validated set of field replacements.
///
/// `None` leaves the stored value untouched. At least one field is set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpensePatch {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub currency: Option<String>,
    pub note: Option<String>,
    pub tags: Option<Vec<String>>,
    pub wallet_id: Option<ObjectId>,
    pub user_id: Option<ObjectId>,
    pub is_recurring: Option<bool>,
    pub receipt_url: Option<String>,
}

impl ExpensePatch {
    /// Apply the patch to a stored record in place.
    pub fn apply(self, expense: &mut Expense, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            expense.name = name;
        }
        if let Some(amount) = self.amount {
            expense.amount = amount;
        }
        if let Some(category) = self.category {
            expense.category = category;
        }
        if let Some(date) = self.date {
            expense.date = date;
        }
        if let Some(currency) = self.currency {
            expense.currency = currency;
        }
        if let Some(note) = self.note {
            expense.note = Some(note);
        }
        if let Some(tags) = self.tags {
            expense.tags = tags;
        }
        if let Some(wallet_id) = self.wallet_id {
            expense.wallet_id = Some(wallet_id);
        }
        if let Some(user_id) = self.user_id {
            expense.user_id = Some(user_id);
        }
        if let Some(is_recurring) = self.is_recurring {
            expense.is_recurring = is_recurring;
        }
        if let Some(receipt_url) = self.receipt_url {
            expense.receipt_url = Some(receipt_url);
        }
        expense.updated_at = now;
    }
}

/// Request body for creating an expense.
///
/// # JSON Example
///
/// ```json
/// {
///   "name": "Groceries",
///   "amount": 42.5,
///   "category": "Food",
///   "date": "2024-03-01",
///   "currency": "nzd",
///   "tags": ["weekly"],
///   "walletId": "65a1b2c3d4e5f60718293a4b"
/// }
/// ```
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub currency: Option<String>,
    pub note: Option<String>,
    pub tags: Option<Vec<String>>,
    pub wallet_id: Option<String>,
    pub user_id: Option<String>,
    pub is_recurring: Option<bool>,
    pub receipt_url: Option<String>,
}

impl CreateExpenseRequest {
    /// Validate the body, filling in defaults for date, currency and tags.
    pub fn validate(self, now: DateTime<Utc>) -> Result<NewExpense, AppError> {
        let mut v = Violations::new();

        let name = v.required_text("name", self.name);
        let amount = match self.amount {
            None => {
                v.push("amount", "Required");
                None
            }
            amount => v.non_negative("amount", amount),
        };
        let category = v.required_text("category", self.category);
        let date = v.date("date", self.date.as_deref());
        let currency = v.currency("currency", self.currency);
        let note = v.note("note", self.note);
        let tags = v.tags("tags", self.tags);
        let wallet_id = v.object_id("walletId", self.wallet_id.as_deref());
        let user_id = v.object_id("userId", self.user_id.as_deref());
        let receipt_url = v.url("receiptUrl", self.receipt_url);

        let (Some(name), Some(amount), Some(category)) = (name, amount, category) else {
            return Err(v.into_error());
        };

        v.finish(NewExpense {
            name,
            amount,
            category,
            date: date.unwrap_or(now),
            currency: currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            note,
            tags: tags.unwrap_or_default(),
            wallet_id,
            user_id,
            is_recurring: self.is_recurring.unwrap_or(false),
            receipt_url,
        })
    }
}

/// Request body for updating an expense. Every field is optional but at
/// least one must be present.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseRequest {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub currency: Option<String>,
    pub note: Option<String>,
    pub tags: Option<Vec<String>>,
    pub wallet_id: Option<String>,
    pub user_id: Option<String>,
    pub is_recurring: Option<bool>,
    pub receipt_url: Option<String>,
}

impl UpdateExpenseRequest {
    pub fn validate(self) -> Result<ExpensePatch, AppError> {
        let mut v = Violations::new();

        let patch = ExpensePatch {
            name: self.name.and_then(|name| v.non_empty_text("name", name)),
            amount: v.non_negative("amount", self.amount),
            category: self
                .category
                .and_then(|category| v.non_empty_text("category", category)),
            date: v.date("date", self.date.as_deref()),
            currency: v.currency("currency", self.currency),
            note: v.note("note", self.note),
            tags: v.tags("tags", self.tags),
            wallet_id: v.object_id("walletId", self.wallet_id.as_deref()),
            user_id: v.object_id("userId", self.user_id.as_deref()),
            is_recurring: self.is_recurring,
            receipt_url: v.url("receiptUrl", self.receipt_url),
        };

        if v.is_empty() && patch == ExpensePatch::default() {
            v.push("body", "Request body cannot be empty");
        }

        v.finish(patch)
    }
}

/// Sort direction for expense listings, applied to `date` and then `createdAt`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Listing options beyond the filter predicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub limit: Option<usize>,
    pub sort: SortDirection,
}

/// Raw query string accepted by `GET /api/expenses` and `GET /api/expenses/summary`.
///
/// List-valued parameters are comma separated: `categories=Food,Transport`.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseQueryParams {
    pub wallet_id: Option<String>,
    pub user_id: Option<String>,
    pub categories: Option<String>,
    pub tags: Option<String>,
    pub search: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
}

impl ExpenseQueryParams {
    /// Validate the filter criteria part of the query.
    pub fn criteria(&self) -> Result<FilterCriteria, AppError> {
        let mut v = Violations::new();
        let criteria = self.collect_criteria(&mut v);
        v.finish(criteria)
    }

    /// Validate the full listing query: criteria, limit and sort.
    pub fn listing(&self) -> Result<(FilterCriteria, ListOptions), AppError> {
        let mut v = Violations::new();
        let criteria = self.collect_criteria(&mut v);

        let limit = self.limit.as_deref().and_then(|raw| {
            match raw.trim().parse::<usize>() {
                Ok(limit) if (1..=MAX_LIST_LIMIT).contains(&limit) => Some(limit),
                _ => {
                    v.push("limit", format!("Must be an integer between 1 and {MAX_LIST_LIMIT}"));
                    None
                }
            }
        });
        let sort = match self.sort.as_deref().map(str::trim) {
            None | Some("desc") => SortDirection::Descending,
            Some("asc") => SortDirection::Ascending,
            Some(_) => {
                v.push("sort", "Must be 'asc' or 'desc'");
                SortDirection::Descending
            }
        };

        v.finish((criteria, ListOptions { limit, sort }))
    }

    fn collect_criteria(&self, v: &mut Violations) -> FilterCriteria {
        FilterCriteria {
            wallet_id: v.object_id("walletId", self.wallet_id.as_deref()),
            user_id: v.object_id("userId", self.user_id.as_deref()),
            categories: split_list(self.categories.as_deref()),
            tags: split_list(self.tags.as_deref()),
            search: self.search.clone(),
            from: v.date("from", self.from.as_deref()),
            to: v.date("to", self.to.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn create_fills_defaults() {
        let request = CreateExpenseRequest {
            name: Some("  Coffee ".to_string()),
            amount: Some(4.5),
            category: Some("Food".to_string()),
            currency: Some("nzd".to_string()),
            ..Default::default()
        };

        let expense = request.validate(now()).unwrap();

        assert_eq!(expense.name, "Coffee");
        assert_eq!(expense.date, now());
        assert_eq!(expense.currency, "NZD");
        assert!(expense.tags.is_empty());
        assert!(!expense.is_recurring);
    }

    #[test]
    fn create_defaults_currency_to_usd() {
        let request = CreateExpenseRequest {
            name: Some("Bus".to_string()),
            amount: Some(2.0),
            category: Some("Transport".to_string()),
            ..Default::default()
        };

        assert_eq!(request.validate(now()).unwrap().currency, "USD");
    }

    #[test]
    fn create_reports_every_invalid_field() {
        let request = CreateExpenseRequest {
            name: Some("".to_string()),
            amount: Some(-3.0),
            category: None,
            date: Some("not a date".to_string()),
            receipt_url: Some("receipt.png".to_string()),
            ..Default::default()
        };

        let Err(AppError::Validation(details)) = request.validate(now()) else {
            panic!("expected a validation error");
        };
        let paths: Vec<&str> = details.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["name", "amount", "category", "date", "receiptUrl"]);
    }

    #[test]
    fn update_rejects_empty_body() {
        let Err(AppError::Validation(details)) = UpdateExpenseRequest::default().validate() else {
            panic!("expected a validation error");
        };

        assert_eq!(details[0].path, "body");
    }

    #[test]
    fn patch_replaces_only_supplied_fields() {
        let mut expense = NewExpense::new("Lunch", 12.0, "Food", now())
            .with_tags(["work"])
            .into_expense(ObjectId::generate(), now());
        let later = now() + chrono::Duration::hours(1);

        let patch = UpdateExpenseRequest {
            amount: Some(15.0),
            currency: Some("eur".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        patch.apply(&mut expense, later);

        assert_eq!(expense.amount, 15.0);
        assert_eq!(expense.currency, "EUR");
        assert_eq!(expense.name, "Lunch");
        assert_eq!(expense.tags, vec!["work".to_string()]);
        assert_eq!(expense.updated_at, later);
        assert_eq!(expense.created_at, now());
    }

    #[test]
    fn listing_validates_limit_and_sort() {
        let params = ExpenseQueryParams {
            limit: Some("501".to_string()),
            sort: Some("sideways".to_string()),
            ..Default::default()
        };

        let Err(AppError::Validation(details)) = params.listing() else {
            panic!("expected a validation error");
        };
        let paths: Vec<&str> = details.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["limit", "sort"]);
    }

    #[test]
    fn listing_parses_lists_and_dates() {
        let params = ExpenseQueryParams {
            categories: Some("Transport,Food".to_string()),
            from: Some("2024-01-01".to_string()),
            limit: Some("10".to_string()),
            sort: Some("asc".to_string()),
            ..Default::default()
        };

        let (criteria, options) = params.listing().unwrap();

        assert_eq!(criteria.categories, vec!["Transport", "Food"]);
        assert_eq!(
            criteria.from,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(options.limit, Some(10));
        assert_eq!(options.sort, SortDirection::Ascending);
    }

    #[test]
    fn serializes_with_document_field_names() {
        let expense = NewExpense::new("Lunch", 12.0, "Food", now())
            .into_expense("65a1b2c3d4e5f60718293a4b".parse().unwrap(), now());

        let json = serde_json::to_value(&expense).unwrap();

        assert_eq!(json["_id"], "65a1b2c3d4e5f60718293a4b");
        assert_eq!(json["isRecurring"], false);
        assert!(json.get("createdAt").is_some());
    }
}
