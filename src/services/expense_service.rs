//! Expense service - CRUD, listing and cached summaries.
//!
//! The service owns no global state. The store and the cache are handed in at
//! construction, so the server wires PostgreSQL and tests wire the in-memory
//! store.
//!
//! # Cache policy
//!
//! - Summaries are cached for the configured TTL, keyed by normalized criteria.
//! - Every successful create, update or delete drops all cached summaries
//!   before the write is reported back.
//! - Cache failures are logged and otherwise ignored; the store stays the
//!   source of truth.

use std::{sync::Arc, time::Duration};

use chrono::Utc;

use crate::{
    error::AppError,
    models::{
        CreateExpenseRequest, Expense, ExpensePatch, ExpenseSummary, ListOptions, MAX_LIST_LIMIT,
        ObjectId,
    },
    services::{
        aggregator,
        cache::{SUMMARY_NAMESPACE, SummaryCache},
        filter::{ExpensePredicate, FilterCriteria},
    },
    store::ExpenseStore,
};

/// Default lifetime of a cached summary.
pub const DEFAULT_SUMMARY_TTL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct ExpenseService {
    store: Arc<dyn ExpenseStore>,
    cache: Arc<dyn SummaryCache>,
    summary_ttl: Duration,
}

impl ExpenseService {
    pub fn new(
        store: Arc<dyn ExpenseStore>,
        cache: Arc<dyn SummaryCache>,
        summary_ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            summary_ttl,
        }
    }

    pub fn store(&self) -> &Arc<dyn ExpenseStore> {
        &self.store
    }

    /// Matching expenses, at most [`MAX_LIST_LIMIT`].
    pub async fn list(
        &self,
        criteria: &FilterCriteria,
        options: ListOptions,
    ) -> Result<Vec<Expense>, AppError> {
        let options = ListOptions {
            limit: options.limit.map(|limit| limit.min(MAX_LIST_LIMIT)),
            ..options
        };
        let expenses = self
            .store
            .find(&ExpensePredicate::build(criteria), options)
            .await?;
        Ok(expenses)
    }

    pub async fn get(&self, id: &ObjectId) -> Result<Expense, AppError> {
        self.store
            .get(id)
            .await?
            .ok_or(AppError::NotFound("Expense"))
    }

    pub async fn create(&self, request: CreateExpenseRequest) -> Result<Expense, AppError> {
        let expense = request.validate(Utc::now())?;
        let expense = self.store.insert(expense).await?;
        tracing::info!(id = %expense.id, category = %expense.category, "expense created");

        self.invalidate_summaries().await;
        Ok(expense)
    }

    pub async fn update(&self, id: &ObjectId, patch: ExpensePatch) -> Result<Expense, AppError> {
        let expense = self
            .store
            .update(id, patch)
            .await?
            .ok_or(AppError::NotFound("Expense"))?;
        tracing::info!(id = %expense.id, "expense updated");

        self.invalidate_summaries().await;
        Ok(expense)
    }

    pub async fn delete(&self, id: &ObjectId) -> Result<(), AppError> {
        if !self.store.delete(id).await? {
            return Err(AppError::NotFound("Expense"));
        }
        tracing::info!(%id, "expense deleted");

        self.invalidate_summaries().await;
        Ok(())
    }

    /// Summary for `criteria`, served from the cache when a fresh entry exists.
    ///
    /// Concurrent misses for the same criteria each recompute; the last writer
    /// wins the cache slot.
    pub async fn summary(&self, criteria: &FilterCriteria) -> Result<ExpenseSummary, AppError> {
        let key = match criteria.cache_key(SUMMARY_NAMESPACE) {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!(error = %e, "no cache key for criteria, bypassing cache");
                None
            }
        };

        if let Some(key) = &key {
            if let Some(summary) = self.cached_summary(key).await {
                return Ok(summary);
            }
        }

        let summary = aggregator::summarize(self.store.as_ref(), criteria)
            .await
            .map_err(AppError::Aggregation)?;

        if let Some(key) = &key {
            self.cache_summary(key, &summary).await;
        }
        Ok(summary)
    }

    async fn cached_summary(&self, key: &str) -> Option<ExpenseSummary> {
        match self.cache.get(key).await {
            Ok(Some(cached)) => match serde_json::from_str(&cached) {
                Ok(summary) => {
                    tracing::debug!(%key, "summary cache hit");
                    return Some(summary);
                }
                Err(e) => tracing::warn!(%key, error = %e, "discarding unreadable cached summary"),
            },
            Ok(None) => tracing::debug!(%key, "summary cache miss"),
            Err(e) => tracing::warn!(%key, error = %e, "summary cache unavailable"),
        }
        None
    }

    async fn cache_summary(&self, key: &str, summary: &ExpenseSummary) {
        match serde_json::to_string(summary) {
            Ok(json) => {
                if let Err(e) = self.cache.set(key, json, self.summary_ttl).await {
                    tracing::warn!(%key, error = %e, "failed to cache summary");
                }
            }
            Err(e) => tracing::warn!(%key, error = %e, "failed to serialize summary"),
        }
    }

    async fn invalidate_summaries(&self) {
        match self.cache.invalidate_namespace(SUMMARY_NAMESPACE).await {
            Ok(removed) => tracing::debug!(removed, "summary cache invalidated"),
            // Stale entries still expire with their TTL.
            Err(e) => tracing::warn!(error = %e, "summary cache invalidation failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        models::{NewExpense, UpdateExpenseRequest},
        services::cache::{CacheError, MemorySummaryCache},
        store::{CategoryTotal, DailyTotal, MemoryExpenseStore, StoreError, Totals},
    };

    fn service() -> (ExpenseService, Arc<MemorySummaryCache>) {
        let cache = Arc::new(MemorySummaryCache::new());
        let service = ExpenseService::new(
            Arc::new(MemoryExpenseStore::new()),
            cache.clone(),
            DEFAULT_SUMMARY_TTL,
        );
        (service, cache)
    }

    fn request(name: &str, amount: f64, category: &str) -> CreateExpenseRequest {
        CreateExpenseRequest {
            name: Some(name.to_string()),
            amount: Some(amount),
            category: Some(category.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn summary_is_cached_until_a_write() {
        let (service, cache) = service();
        service.create(request("Lunch", 10.0, "Food")).await.unwrap();
        let criteria = FilterCriteria::default();

        let first = service.summary(&criteria).await.unwrap();
        assert_eq!(cache.len().await, 1);

        // A write that bypasses the service leaves the cached summary in place.
        service
            .store()
            .insert(NewExpense::new("Sneaky", 99.0, "Food", Utc::now()))
            .await
            .unwrap();
        assert_eq!(service.summary(&criteria).await.unwrap(), first);

        let created = service.create(request("Dinner", 20.0, "Food")).await.unwrap();
        assert!(cache.is_empty().await);
        assert_eq!(service.summary(&criteria).await.unwrap().total_amount, 129.0);

        let patch = UpdateExpenseRequest {
            amount: Some(30.0),
            ..Default::default()
        }
        .validate()
        .unwrap();
        service.update(&created.id, patch).await.unwrap();
        assert_eq!(service.summary(&criteria).await.unwrap().total_amount, 139.0);

        service.delete(&created.id).await.unwrap();
        assert_eq!(service.summary(&criteria).await.unwrap().total_amount, 109.0);
    }

    #[tokio::test]
    async fn cached_summary_is_identical_to_computed_one() {
        let (service, cache) = service();
        for n in 1..=7u32 {
            let amount = f64::from(n * 104_729 % 1_000_000) / 7.0 + f64::from(n % 97) / 3.0;
            let category = ["Food", "Transport", "Fun"][(n % 3) as usize];
            service
                .create(request(&format!("Item {n}"), amount, category))
                .await
                .unwrap();
        }
        let criteria = FilterCriteria::default();

        let computed = service.summary(&criteria).await.unwrap();
        assert_eq!(cache.len().await, 1);
        let cached = service.summary(&criteria).await.unwrap();

        assert_eq!(cached, computed);
        for (a, b) in cached
            .category_breakdown
            .iter()
            .zip(&computed.category_breakdown)
        {
            assert_eq!(a.percentage.to_bits(), b.percentage.to_bits());
            assert_eq!(a.average.to_bits(), b.average.to_bits());
        }
        assert_eq!(
            cached.average_per_day.to_bits(),
            computed.average_per_day.to_bits()
        );
    }

    #[tokio::test]
    async fn list_order_does_not_split_cache_entries() {
        let (service, cache) = service();
        service.create(request("Lunch", 10.0, "Food")).await.unwrap();

        let a = FilterCriteria {
            categories: vec!["Food".to_string(), "Transport".to_string()],
            ..Default::default()
        };
        let b = FilterCriteria {
            categories: vec!["Transport".to_string(), "Food".to_string()],
            ..Default::default()
        };
        service.summary(&a).await.unwrap();
        service.summary(&b).await.unwrap();

        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let (service, _) = service();
        let id = ObjectId::generate();

        assert!(matches!(service.get(&id).await, Err(AppError::NotFound("Expense"))));
        assert!(matches!(service.delete(&id).await, Err(AppError::NotFound("Expense"))));
        let patch = ExpensePatch {
            name: Some("x".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.update(&id, patch).await,
            Err(AppError::NotFound("Expense"))
        ));
    }

    #[tokio::test]
    async fn invalid_create_never_reaches_the_store() {
        let (service, _) = service();

        let result = service.create(request("", -1.0, "Food")).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        let all = service
            .list(&FilterCriteria::default(), ListOptions::default())
            .await
            .unwrap();
        assert!(all.is_empty());
    }

    /// A store whose reads always fail.
    struct BrokenStore;

    #[async_trait]
    impl ExpenseStore for BrokenStore {
        fn backend_tag(&self) -> &'static str {
            "broken"
        }
        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn insert(&self, _: NewExpense) -> Result<Expense, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn get(&self, _: &ObjectId) -> Result<Option<Expense>, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn update(
            &self,
            _: &ObjectId,
            _: ExpensePatch,
        ) -> Result<Option<Expense>, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn delete(&self, _: &ObjectId) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn find(
            &self,
            _: &ExpensePredicate,
            _: ListOptions,
        ) -> Result<Vec<Expense>, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn totals(&self, _: &ExpensePredicate) -> Result<Totals, StoreError> {
            Ok(Totals::default())
        }
        async fn category_totals(
            &self,
            _: &ExpensePredicate,
        ) -> Result<Vec<CategoryTotal>, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }
        async fn daily_totals(&self, _: &ExpensePredicate) -> Result<Vec<DailyTotal>, StoreError> {
            Ok(Vec::new())
        }
        async fn largest(&self, _: &ExpensePredicate, _: usize) -> Result<Vec<Expense>, StoreError> {
            Ok(Vec::new())
        }
    }

    /// A cache that is never reachable.
    struct UnreachableCache;

    #[async_trait]
    impl SummaryCache for UnreachableCache {
        async fn get(&self, _: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError("connection refused".to_string()))
        }
        async fn set(&self, _: &str, _: String, _: Duration) -> Result<(), CacheError> {
            Err(CacheError("connection refused".to_string()))
        }
        async fn invalidate_namespace(&self, _: &str) -> Result<usize, CacheError> {
            Err(CacheError("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn store_failure_is_an_aggregation_error_and_nothing_is_cached() {
        let cache = Arc::new(MemorySummaryCache::new());
        let service = ExpenseService::new(Arc::new(BrokenStore), cache.clone(), DEFAULT_SUMMARY_TTL);

        let result = service.summary(&FilterCriteria::default()).await;

        assert!(matches!(result, Err(AppError::Aggregation(_))));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn unreachable_cache_falls_through_to_the_store() {
        let service = ExpenseService::new(
            Arc::new(MemoryExpenseStore::new()),
            Arc::new(UnreachableCache),
            DEFAULT_SUMMARY_TTL,
        );

        service.create(request("Lunch", 10.0, "Food")).await.unwrap();
        let summary = service.summary(&FilterCriteria::default()).await.unwrap();

        assert_eq!(summary.total_amount, 10.0);
    }
}
