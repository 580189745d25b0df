//! Expense summary response types.
//!
//! A summary is derived on demand and never persisted. It is cached as JSON,
//! which is why these types deserialize as well as serialize.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ObjectId;

/// Aggregate statistics over the expenses matching a filter.
///
/// # JSON Example
///
/// ```json
/// {
///   "totalAmount": 350.0,
///   "totalCount": 3,
///   "averagePerDay": 175.0,
///   "distinctCategories": 2,
///   "categoryBreakdown": [
///     { "category": "Transport", "total": 200.0, "count": 1, "average": 200.0, "percentage": 57.14 }
///   ],
///   "trend": [{ "date": "2024-03-01", "total": 300.0 }],
///   "topCategory": { "category": "Transport", "total": 200.0, "percentage": 57.14 },
///   "topExpense": { "name": "Train", "amount": 200.0, "category": "Transport", "date": "2024-03-01T12:00:00Z" },
///   "anomalies": []
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummary {
    pub total_amount: f64,
    pub total_count: i64,
    pub average_per_day: f64,
    pub distinct_categories: usize,
    pub category_breakdown: Vec<CategoryBreakdown>,
    pub trend: Vec<TrendPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_category: Option<TopCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_expense: Option<TopExpense>,
    pub anomalies: Vec<Anomaly>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub category: String,
    pub total: f64,
    pub count: i64,
    pub average: f64,
    /// Share of the summary's total amount, 0 to 100.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// UTC calendar day, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCategory {
    pub category: String,
    pub total: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopExpense {
    pub name: String,
    pub amount: f64,
    pub category: String,
    pub date: DateTime<Utc>,
}

/// An expense whose amount is well above its category's average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub id: ObjectId,
    pub name: String,
    pub amount: f64,
    pub category: String,
    pub date: DateTime<Utc>,
}
