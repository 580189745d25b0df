//! Process-local expense store.
//!
//! Records live in a vector in insertion order, which is also creation order,
//! so every ordering tie-break falls out of stable sorts.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;

use super::{CategoryTotal, DailyTotal, ExpenseStore, StoreError, Totals};
use crate::{
    models::{Expense, ExpensePatch, ListOptions, NewExpense, ObjectId, SortDirection},
    services::filter::ExpensePredicate,
};

#[derive(Debug, Default)]
pub struct MemoryExpenseStore {
    records: RwLock<Vec<Expense>>,
}

impl MemoryExpenseStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn matching(&self, predicate: &ExpensePredicate) -> Vec<Expense> {
        self.records
            .read()
            .await
            .iter()
            .filter(|expense| predicate.matches(expense))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ExpenseStore for MemoryExpenseStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert(&self, expense: NewExpense) -> Result<Expense, StoreError> {
        let expense = expense.into_expense(ObjectId::generate(), Utc::now());
        self.records.write().await.push(expense.clone());
        Ok(expense)
    }

    async fn get(&self, id: &ObjectId) -> Result<Option<Expense>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|expense| &expense.id == id)
            .cloned())
    }

    async fn update(
        &self,
        id: &ObjectId,
        patch: ExpensePatch,
    ) -> Result<Option<Expense>, StoreError> {
        let mut records = self.records.write().await;
        let Some(expense) = records.iter_mut().find(|expense| &expense.id == id) else {
            return Ok(None);
        };
        patch.apply(expense, Utc::now());
        Ok(Some(expense.clone()))
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|expense| &expense.id != id);
        Ok(records.len() != before)
    }

    async fn find(
        &self,
        predicate: &ExpensePredicate,
        options: ListOptions,
    ) -> Result<Vec<Expense>, StoreError> {
        // Insertion position settles records created within the same instant.
        let mut expenses: Vec<(usize, Expense)> =
            self.matching(predicate).await.into_iter().enumerate().collect();
        expenses.sort_by(|(a_pos, a), (b_pos, b)| {
            let ordering = a
                .date
                .cmp(&b.date)
                .then(a.created_at.cmp(&b.created_at))
                .then(a_pos.cmp(b_pos));
            match options.sort {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
        if let Some(limit) = options.limit {
            expenses.truncate(limit);
        }
        Ok(expenses.into_iter().map(|(_, expense)| expense).collect())
    }

    async fn totals(&self, predicate: &ExpensePredicate) -> Result<Totals, StoreError> {
        let records = self.records.read().await;
        let mut totals = Totals::default();
        for expense in records.iter().filter(|expense| predicate.matches(expense)) {
            totals.total_amount += expense.amount;
            totals.total_count += 1;
            totals.min_date = Some(totals.min_date.map_or(expense.date, |d| d.min(expense.date)));
            totals.max_date = Some(totals.max_date.map_or(expense.date, |d| d.max(expense.date)));
        }
        Ok(totals)
    }

    async fn category_totals(
        &self,
        predicate: &ExpensePredicate,
    ) -> Result<Vec<CategoryTotal>, StoreError> {
        let records = self.records.read().await;
        let mut by_category: BTreeMap<&str, (f64, i64)> = BTreeMap::new();
        for expense in records.iter().filter(|expense| predicate.matches(expense)) {
            let entry = by_category.entry(expense.category.as_str()).or_default();
            entry.0 += expense.amount;
            entry.1 += 1;
        }

        // BTreeMap iteration is by name, so the stable sort leaves equal totals name-ordered.
        let mut categories: Vec<CategoryTotal> = by_category
            .into_iter()
            .map(|(category, (total, count))| CategoryTotal {
                category: category.to_string(),
                total,
                count,
                average: total / count as f64,
            })
            .collect();
        categories.sort_by(|a, b| b.total.total_cmp(&a.total));
        Ok(categories)
    }

    async fn daily_totals(
        &self,
        predicate: &ExpensePredicate,
    ) -> Result<Vec<DailyTotal>, StoreError> {
        let records = self.records.read().await;
        let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for expense in records.iter().filter(|expense| predicate.matches(expense)) {
            *by_day.entry(expense.date.date_naive()).or_insert(0.0) += expense.amount;
        }
        Ok(by_day
            .into_iter()
            .map(|(day, total)| DailyTotal { day, total })
            .collect())
    }

    async fn largest(
        &self,
        predicate: &ExpensePredicate,
        limit: usize,
    ) -> Result<Vec<Expense>, StoreError> {
        let mut expenses = self.matching(predicate).await;
        expenses.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        expenses.truncate(limit);
        Ok(expenses)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone};

    use super::*;
    use crate::services::filter::FilterCriteria;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()
    }

    fn everything() -> ExpensePredicate {
        ExpensePredicate::build(&FilterCriteria::default())
    }

    async fn seeded() -> MemoryExpenseStore {
        let store = MemoryExpenseStore::new();
        store.insert(NewExpense::new("Lunch", 100.0, "Food", day(1))).await.unwrap();
        store.insert(NewExpense::new("Dinner", 50.0, "Food", day(2))).await.unwrap();
        store.insert(NewExpense::new("Train", 200.0, "Transport", day(1))).await.unwrap();
        store
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let store = MemoryExpenseStore::new();

        let created = store
            .insert(NewExpense::new("Lunch", 12.5, "Food", day(1)))
            .await
            .unwrap();

        assert_eq!(store.get(&created.id).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn insert_assigns_a_fresh_identifier() {
        let store = MemoryExpenseStore::new();
        let new = NewExpense::new("Lunch", 12.5, "Food", day(1));

        let first = store.insert(new.clone()).await.unwrap();
        let second = store.insert(new).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.id.as_str().len(), 24);
        assert!(store.get(&second.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_ids() {
        let store = seeded().await;
        let missing = ObjectId::generate();

        let patch = ExpensePatch {
            amount: Some(1.0),
            ..Default::default()
        };
        assert_eq!(store.update(&missing, patch).await.unwrap(), None);
        assert!(!store.delete(&missing).await.unwrap());
    }

    #[tokio::test]
    async fn delete_is_permanent() {
        let store = seeded().await;
        let first = store.find(&everything(), ListOptions::default()).await.unwrap()[0].clone();

        assert!(store.delete(&first.id).await.unwrap());
        assert_eq!(store.get(&first.id).await.unwrap(), None);
        assert_eq!(store.totals(&everything()).await.unwrap().total_count, 2);
    }

    #[tokio::test]
    async fn find_sorts_by_date_then_creation_and_limits() {
        let store = seeded().await;

        let ascending = store
            .find(
                &everything(),
                ListOptions {
                    limit: None,
                    sort: SortDirection::Ascending,
                },
            )
            .await
            .unwrap();
        let names: Vec<&str> = ascending.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Lunch", "Train", "Dinner"]);

        let newest = store
            .find(
                &everything(),
                ListOptions {
                    limit: Some(2),
                    sort: SortDirection::Descending,
                },
            )
            .await
            .unwrap();
        let names: Vec<&str> = newest.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Dinner", "Train"]);
    }

    #[tokio::test]
    async fn aggregates_match_hand_computed_values() {
        let store = seeded().await;
        let predicate = everything();

        let totals = store.totals(&predicate).await.unwrap();
        assert_eq!(totals.total_amount, 350.0);
        assert_eq!(totals.total_count, 3);
        assert_eq!(totals.min_date, Some(day(1)));
        assert_eq!(totals.max_date, Some(day(2)));

        let categories = store.category_totals(&predicate).await.unwrap();
        assert_eq!(categories[0].category, "Transport");
        assert_eq!(categories[1].category, "Food");
        assert_eq!(categories[1].average, 75.0);

        let daily = store.daily_totals(&predicate).await.unwrap();
        assert_eq!(
            daily,
            vec![
                DailyTotal {
                    day: day(1).date_naive(),
                    total: 300.0
                },
                DailyTotal {
                    day: day(2).date_naive(),
                    total: 50.0
                },
            ]
        );
    }

    #[tokio::test]
    async fn largest_breaks_ties_by_creation_order() {
        let store = MemoryExpenseStore::new();
        store.insert(NewExpense::new("First", 80.0, "A", day(3))).await.unwrap();
        store.insert(NewExpense::new("Second", 80.0, "B", day(1))).await.unwrap();
        store.insert(NewExpense::new("Small", 5.0, "A", day(2))).await.unwrap();

        let largest = store.largest(&everything(), 2).await.unwrap();

        let names: Vec<&str> = largest.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn totals_are_zero_when_nothing_matches() {
        let store = seeded().await;
        let predicate = ExpensePredicate::build(&FilterCriteria {
            from: Some(day(1) + Duration::days(30)),
            ..Default::default()
        });

        assert_eq!(store.totals(&predicate).await.unwrap(), Totals::default());
        assert!(store.category_totals(&predicate).await.unwrap().is_empty());
        assert!(store.daily_totals(&predicate).await.unwrap().is_empty());
    }
}
