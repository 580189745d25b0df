//! Expense summary computation.
//!
//! The summary is assembled from the store's four aggregation primitives
//! (totals, per-category totals, per-day totals and the largest records),
//! which are independent reads and run concurrently. Everything after that is
//! arithmetic over their results.

use chrono::{DateTime, Utc};

use crate::{
    models::{
        Anomaly, CategoryBreakdown, Expense, ExpenseSummary, TopCategory, TopExpense, TrendPoint,
    },
    services::filter::{ExpensePredicate, FilterCriteria},
    store::{CategoryTotal, ExpenseStore, StoreError},
};

/// How many of the largest expenses are considered for anomaly detection.
pub const ANOMALY_CANDIDATES: usize = 25;

/// Maximum number of anomalies reported.
pub const MAX_ANOMALIES: usize = 5;

/// An expense is anomalous at or above this multiple of its category average.
pub const ANOMALY_FACTOR: f64 = 1.5;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Compute the summary of every expense matching `criteria`.
///
/// Read-only. Any store failure aborts the whole computation; no partial
/// summary is returned.
pub async fn summarize(
    store: &dyn ExpenseStore,
    criteria: &FilterCriteria,
) -> Result<ExpenseSummary, StoreError> {
    let predicate = ExpensePredicate::build(criteria);

    let (totals, categories, daily, largest) = tokio::try_join!(
        store.totals(&predicate),
        store.category_totals(&predicate),
        store.daily_totals(&predicate),
        store.largest(&predicate, ANOMALY_CANDIDATES),
    )?;

    let category_breakdown = breakdown(categories, totals.total_amount);
    let span = day_span(
        criteria.from.zip(criteria.to),
        totals.min_date.zip(totals.max_date),
    );
    let average_per_day = if span > 0 {
        totals.total_amount / span as f64
    } else {
        0.0
    };

    let top_category = category_breakdown.first().map(|top| TopCategory {
        category: top.category.clone(),
        total: top.total,
        percentage: top.percentage,
    });
    let top_expense = largest.first().map(|expense| TopExpense {
        name: expense.name.clone(),
        amount: expense.amount,
        category: expense.category.clone(),
        date: expense.date,
    });
    let anomalies = find_anomalies(&largest, &category_breakdown);

    Ok(ExpenseSummary {
        total_amount: totals.total_amount,
        total_count: totals.total_count,
        average_per_day,
        distinct_categories: category_breakdown.len(),
        category_breakdown,
        trend: daily
            .into_iter()
            .map(|day| TrendPoint {
                date: day.day,
                total: day.total,
            })
            .collect(),
        top_category,
        top_expense,
        anomalies,
    })
}

/// Attach each category's share of `total_amount`. All shares are 0 when the
/// total is 0.
pub fn breakdown(categories: Vec<CategoryTotal>, total_amount: f64) -> Vec<CategoryBreakdown> {
    categories
        .into_iter()
        .map(|category| CategoryBreakdown {
            percentage: if total_amount > 0.0 {
                category.total / total_amount * 100.0
            } else {
                0.0
            },
            category: category.category,
            total: category.total,
            count: category.count,
            average: category.average,
        })
        .collect()
}

/// Number of days an average per day is spread over.
///
/// Uses the requested range when both ends were given, otherwise the observed
/// range of matching dates. The span is the distance in days rounded up, plus
/// one, and never less than one. Without any range it is 0.
pub fn day_span(
    requested: Option<(DateTime<Utc>, DateTime<Utc>)>,
    observed: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> i64 {
    let Some((from, to)) = requested.or(observed) else {
        return 0;
    };
    let millis = (to - from).num_milliseconds().abs();
    let days = millis / MILLIS_PER_DAY + i64::from(millis % MILLIS_PER_DAY != 0);
    (days + 1).max(1)
}

/// Pick anomalies from `candidates`, which arrive largest first.
///
/// A candidate is anomalous when its category average is non-zero and its
/// amount is at least [`ANOMALY_FACTOR`] times that average. Candidate order
/// is kept and at most [`MAX_ANOMALIES`] are returned.
pub fn find_anomalies(candidates: &[Expense], breakdown: &[CategoryBreakdown]) -> Vec<Anomaly> {
    candidates
        .iter()
        .filter(|expense| {
            breakdown
                .iter()
                .find(|entry| entry.category == expense.category)
                .is_some_and(|entry| {
                    entry.average != 0.0 && expense.amount >= entry.average * ANOMALY_FACTOR
                })
        })
        .take(MAX_ANOMALIES)
        .map(|expense| Anomaly {
            id: expense.id.clone(),
            name: expense.name.clone(),
            amount: expense.amount,
            category: expense.category.clone(),
            date: expense.date,
        })
        .collect()
}
