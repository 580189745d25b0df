//! Filter builder for expense queries.
//!
//! Turns user-supplied [`FilterCriteria`] into an [`ExpensePredicate`]: the
//! conjunction of only the constraints that were actually supplied. Both
//! expense stores evaluate the same predicate, the in-memory store through
//! [`ExpensePredicate::matches`] and the PostgreSQL store by translating each
//! [`Condition`] into a SQL clause.
//!
//! Within a list-valued dimension (categories, tags) values are OR-matched;
//! across dimensions everything is AND-ed.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Expense, ObjectId};

/// Criteria a client can filter expenses by. Every field is optional; an
/// absent field imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub wallet_id: Option<ObjectId>,
    pub user_id: Option<ObjectId>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub search: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl FilterCriteria {
    /// Canonical form: list values sorted and deduplicated, blank search dropped.
    ///
    /// Criteria that differ only in list order normalize to the same value,
    /// which is what makes them share a cache entry.
    pub fn normalized(mut self) -> Self {
        self.categories.sort();
        self.categories.dedup();
        self.tags.sort();
        self.tags.dedup();
        self.search = self
            .search
            .map(|search| search.trim().to_string())
            .filter(|search| !search.is_empty());
        self
    }

    /// Stable cache key for these criteria under `namespace`.
    pub fn cache_key(&self, namespace: &str) -> Result<String, serde_json::Error> {
        let body = serde_json::to_string(&self.clone().normalized())?;
        Ok(format!("{namespace}:{body}"))
    }
}

/// One constraint on an expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    WalletIs(ObjectId),
    OwnerIs(ObjectId),
    CategoryIn(Vec<String>),
    /// Matches when any of the record's tags is in the list.
    AnyTagIn(Vec<String>),
    /// Case-insensitive substring of name or note. Stored lowercased.
    TextContains(String),
    DateOnOrAfter(DateTime<Utc>),
    DateOnOrBefore(DateTime<Utc>),
}

impl Condition {
    pub fn matches(&self, expense: &Expense) -> bool {
        match self {
            Condition::WalletIs(id) => expense.wallet_id.as_ref() == Some(id),
            Condition::OwnerIs(id) => expense.user_id.as_ref() == Some(id),
            Condition::CategoryIn(categories) => categories.contains(&expense.category),
            Condition::AnyTagIn(tags) => expense.tags.iter().any(|tag| tags.contains(tag)),
            Condition::TextContains(needle) => {
                expense.name.to_lowercase().contains(needle)
                    || expense
                        .note
                        .as_deref()
                        .is_some_and(|note| note.to_lowercase().contains(needle))
            }
            Condition::DateOnOrAfter(from) => expense.date >= *from,
            Condition::DateOnOrBefore(to) => expense.date <= *to,
        }
    }
}

/// Conjunction of [`Condition`]s. The empty predicate matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpensePredicate {
    conditions: Vec<Condition>,
}

impl ExpensePredicate {
    /// Build the predicate for `criteria`. Pure and deterministic: identical
    /// criteria always produce identical predicates.
    pub fn build(criteria: &FilterCriteria) -> Self {
        let criteria = criteria.clone().normalized();
        let mut conditions = Vec::new();

        if let Some(wallet_id) = criteria.wallet_id {
            conditions.push(Condition::WalletIs(wallet_id));
        }
        if let Some(user_id) = criteria.user_id {
            conditions.push(Condition::OwnerIs(user_id));
        }
        if !criteria.categories.is_empty() {
            conditions.push(Condition::CategoryIn(criteria.categories));
        }
        if !criteria.tags.is_empty() {
            conditions.push(Condition::AnyTagIn(criteria.tags));
        }
        if let Some(search) = criteria.search {
            conditions.push(Condition::TextContains(search.to_lowercase()));
        }
        if let Some(from) = criteria.from {
            conditions.push(Condition::DateOnOrAfter(from));
        }
        if let Some(to) = criteria.to {
            conditions.push(Condition::DateOnOrBefore(to));
        }

        Self { conditions }
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        self.conditions.iter().all(|condition| condition.matches(expense))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::NewExpense;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()
    }

    fn expense(new: NewExpense) -> Expense {
        new.into_expense(ObjectId::generate(), day(1))
    }

    #[test]
    fn empty_criteria_match_everything() {
        let predicate = ExpensePredicate::build(&FilterCriteria::default());

        assert!(predicate.conditions().is_empty());
        assert!(predicate.matches(&expense(NewExpense::new("Rent", 900.0, "Housing", day(1)))));
    }

    #[test]
    fn only_supplied_criteria_become_conditions() {
        let wallet: ObjectId = "65a1b2c3d4e5f60718293a4b".parse().unwrap();
        let criteria = FilterCriteria {
            wallet_id: Some(wallet.clone()),
            categories: vec!["Food".to_string()],
            to: Some(day(10)),
            ..Default::default()
        };

        let predicate = ExpensePredicate::build(&criteria);

        assert_eq!(
            predicate.conditions(),
            &[
                Condition::WalletIs(wallet),
                Condition::CategoryIn(vec!["Food".to_string()]),
                Condition::DateOnOrBefore(day(10)),
            ]
        );
    }

    #[test]
    fn user_filter_matches_only_that_users_expenses() {
        let alice: ObjectId = "65a1b2c3d4e5f60718293a4b".parse().unwrap();
        let bob: ObjectId = "65a1b2c3d4e5f60718293a4c".parse().unwrap();
        let criteria = FilterCriteria {
            user_id: Some(alice.clone()),
            ..Default::default()
        };
        let predicate = ExpensePredicate::build(&criteria);

        assert_eq!(predicate.conditions(), &[Condition::OwnerIs(alice.clone())]);
        assert!(predicate.matches(&expense(
            NewExpense::new("Coffee", 4.0, "Food", day(2)).with_user(alice)
        )));
        assert!(!predicate.matches(&expense(
            NewExpense::new("Coffee", 4.0, "Food", day(2)).with_user(bob)
        )));
        assert!(!predicate.matches(&expense(NewExpense::new("Coffee", 4.0, "Food", day(2)))));
    }

    #[test]
    fn and_across_dimensions_or_within_lists() {
        let criteria = FilterCriteria {
            categories: vec!["Food".to_string()],
            tags: vec!["urgent".to_string(), "work".to_string()],
            ..Default::default()
        };
        let predicate = ExpensePredicate::build(&criteria);

        let food_urgent =
            expense(NewExpense::new("Pizza", 20.0, "Food", day(2)).with_tags(["late", "urgent"]));
        let food_plain = expense(NewExpense::new("Bread", 3.0, "Food", day(2)));
        let transport_urgent =
            expense(NewExpense::new("Taxi", 30.0, "Transport", day(2)).with_tags(["urgent"]));

        assert!(predicate.matches(&food_urgent));
        assert!(!predicate.matches(&food_plain));
        assert!(!predicate.matches(&transport_urgent));
    }

    #[test]
    fn search_is_case_insensitive_over_name_and_note() {
        let predicate = ExpensePredicate::build(&FilterCriteria {
            search: Some("  CoFFee ".to_string()),
            ..Default::default()
        });

        let by_name = expense(NewExpense::new("Morning coffee", 4.0, "Food", day(3)));
        let by_note =
            expense(NewExpense::new("Cafe", 4.0, "Food", day(3)).with_note("Flat white COFFEE"));
        let neither = expense(NewExpense::new("Tea", 3.0, "Food", day(3)));

        assert!(predicate.matches(&by_name));
        assert!(predicate.matches(&by_note));
        assert!(!predicate.matches(&neither));
    }

    #[test]
    fn date_range_is_inclusive_on_both_ends() {
        let predicate = ExpensePredicate::build(&FilterCriteria {
            from: Some(day(5)),
            to: Some(day(7)),
            ..Default::default()
        });

        for (d, expected) in [(4, false), (5, true), (6, true), (7, true), (8, false)] {
            let e = expense(NewExpense::new("Item", 1.0, "Misc", day(d)));
            assert_eq!(predicate.matches(&e), expected, "day {d}");
        }
    }

    #[test]
    fn cache_key_ignores_list_order() {
        let a = FilterCriteria {
            categories: vec!["Transport".to_string(), "Food".to_string()],
            tags: vec!["b".to_string(), "a".to_string()],
            ..Default::default()
        };
        let b = FilterCriteria {
            categories: vec!["Food".to_string(), "Transport".to_string()],
            tags: vec!["a".to_string(), "b".to_string()],
            ..Default::default()
        };

        let key = a.cache_key("summary").unwrap();
        assert_eq!(key, b.cache_key("summary").unwrap());
        assert!(key.starts_with("summary:"));
    }

    #[test]
    fn cache_key_distinguishes_different_criteria() {
        let food = FilterCriteria {
            categories: vec!["Food".to_string()],
            ..Default::default()
        };

        assert_ne!(
            food.cache_key("summary").unwrap(),
            FilterCriteria::default().cache_key("summary").unwrap()
        );
    }
}
