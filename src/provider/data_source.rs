use std::{fmt, sync::Arc};

use async_trait::async_trait;
use tracing::info;

use crate::{
    configuration::Config,
    error::Error,
    model::{DashboardSummary, Transaction, TransactionFilters, TransactionPatch},
    provider::{Mock, HTTP},
    types::HealthStatus,
};

/// Backend strategy serving the data-access operations.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn dashboard_summary(
        &self,
        month: &str,
    ) -> Result<DashboardSummary, Error>;

    async fn transactions(
        &self,
        filters: &TransactionFilters,
    ) -> Result<Vec<Transaction>, Error>;

    async fn update_transaction(
        &self,
        id: &str,
        patch: &TransactionPatch,
    ) -> Result<Transaction, Error>;

    async fn health(&self) -> Result<HealthStatus, Error>;
}

/// Data-access layer. The strategy is fixed once constructed.
#[derive(Clone)]
pub struct Api {
    source: Arc<dyn DataSource>,
}

impl Api {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Api { source }
    }

    pub fn from_config(config: &Config) -> Result<Api, Error> {
        let source: Arc<dyn DataSource> = if config.use_mocks {
            Arc::new(Mock::new())
        } else {
            Arc::new(HTTP::new(config.clone())?)
        };
        info!("Data source: {}", source.name());

        Ok(Api::new(source))
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    pub async fn fetch_dashboard_summary(
        &self,
        month: &str,
    ) -> Result<DashboardSummary, Error> {
        self.source.dashboard_summary(month).await
    }

    pub async fn fetch_transactions(
        &self,
        filters: &TransactionFilters,
    ) -> Result<Vec<Transaction>, Error> {
        self.source.transactions(filters).await
    }

    pub async fn update_transaction(
        &self,
        id: &str,
        patch: &TransactionPatch,
    ) -> Result<Transaction, Error> {
        self.source.update_transaction(id, patch).await
    }

    pub async fn fetch_health(&self) -> Result<HealthStatus, Error> {
        self.source.health().await
    }
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api")
            .field("source", &self.source.name())
            .finish()
    }
}
