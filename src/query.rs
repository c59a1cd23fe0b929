use std::future::Future;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::{
    cache::{QueryCache, QueryOptions, QueryOutput, QueryResult, UPDATES_CAPACITY},
    cache_keys::{self, QueryKey, DASHBOARD, TRANSACTIONS},
    error::Error,
    model::{DashboardSummary, Transaction, TransactionFilters, TransactionPatch},
    provider::Api,
    types::HealthStatus,
};

/// Application-root query client: owns the data-access layer and one
/// cache per query family.
#[derive(Debug, Clone)]
pub struct QueryClient {
    api: Api,
    dashboard: QueryCache<DashboardSummary>,
    transactions: QueryCache<Vec<Transaction>>,
    health: QueryCache<HealthStatus>,
    updates: broadcast::Sender<QueryKey>,
}

impl QueryClient {
    pub fn new(api: Api, options: QueryOptions) -> Self {
        let (updates, _) = broadcast::channel(UPDATES_CAPACITY);

        QueryClient {
            api,
            dashboard: QueryCache::with_updates(options, updates.clone()),
            transactions: QueryCache::with_updates(options, updates.clone()),
            health: QueryCache::with_updates(
                options.without_retry(),
                updates.clone(),
            ),
            updates,
        }
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    pub fn dashboard(&self, month: &str) -> QueryResult<DashboardSummary> {
        let key = cache_keys::dashboard(month);
        self.dashboard.query(&key, self.dashboard_fetcher(month))
    }

    pub async fn fetch_dashboard(
        &self,
        month: &str,
    ) -> QueryOutput<DashboardSummary> {
        let key = cache_keys::dashboard(month);
        self.dashboard.fetch(&key, self.dashboard_fetcher(month)).await
    }

    pub fn transactions(
        &self,
        filters: &TransactionFilters,
    ) -> QueryResult<Vec<Transaction>> {
        let key = cache_keys::transactions(filters);
        self.transactions
            .query(&key, self.transactions_fetcher(filters))
    }

    pub async fn fetch_transactions(
        &self,
        filters: &TransactionFilters,
    ) -> QueryOutput<Vec<Transaction>> {
        let key = cache_keys::transactions(filters);
        self.transactions
            .fetch(&key, self.transactions_fetcher(filters))
            .await
    }

    pub fn health(&self) -> QueryResult<HealthStatus> {
        self.health
            .query(&cache_keys::health_check(), self.health_fetcher())
    }

    pub async fn fetch_health(&self) -> QueryOutput<HealthStatus> {
        self.health
            .fetch(&cache_keys::health_check(), self.health_fetcher())
            .await
    }

    /// Runs `mutation` once. On success the transaction and dashboard
    /// families are invalidated; a failure leaves every cache untouched.
    pub async fn mutate<R, Fut>(&self, name: &str, mutation: Fut) -> Result<R, Error>
    where
        Fut: Future<Output = Result<R, Error>>,
    {
        match mutation.await {
            Ok(value) => {
                let transactions = self.invalidate(&QueryKey::new(TRANSACTIONS));
                let dashboard = self.invalidate(&QueryKey::new(DASHBOARD));
                info!(
                    "Mutation {} done, invalidated {} queries",
                    name,
                    transactions + dashboard
                );
                Ok(value)
            },
            Err(e) => {
                warn!("Mutation {} failed: {}", name, e);
                Err(e)
            },
        }
    }

    pub async fn update_transaction(
        &self,
        id: &str,
        patch: &TransactionPatch,
    ) -> Result<Transaction, Error> {
        self.mutate("updateTransaction", self.api.update_transaction(id, patch))
            .await
    }

    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        self.dashboard.invalidate(prefix)
            + self.transactions.invalidate(prefix)
            + self.health.invalidate(prefix)
    }

    /// Keys of entries that settled, across every family.
    pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
        self.updates.subscribe()
    }

    fn dashboard_fetcher(
        &self,
        month: &str,
    ) -> impl Fn() -> BoxedFetch<DashboardSummary> + Send + Sync + 'static {
        let api = self.api.clone();
        let month = month.to_owned();
        move || {
            let api = api.clone();
            let month = month.clone();
            async move { api.fetch_dashboard_summary(&month).await }.boxed()
        }
    }

    fn transactions_fetcher(
        &self,
        filters: &TransactionFilters,
    ) -> impl Fn() -> BoxedFetch<Vec<Transaction>> + Send + Sync + 'static {
        let api = self.api.clone();
        let filters = filters.clone();
        move || {
            let api = api.clone();
            let filters = filters.clone();
            async move { api.fetch_transactions(&filters).await }.boxed()
        }
    }

    fn health_fetcher(
        &self,
    ) -> impl Fn() -> BoxedFetch<HealthStatus> + Send + Sync + 'static {
        let api = self.api.clone();
        move || {
            let api = api.clone();
            async move { api.fetch_health().await }.boxed()
        }
    }
}

type BoxedFetch<T> = BoxFuture<'static, Result<T, Error>>;
