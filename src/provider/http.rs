use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client, RequestBuilder,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    configuration::Config,
    error::{Error, GENERIC_API_ERROR},
    model::{DashboardSummary, Transaction, TransactionFilters, TransactionPatch},
    provider::DataSource,
    types::{HealthStatus, MessageBody},
};

#[derive(Debug)]
pub struct HTTP {
    pub config: Config,
    pub http: Client,
}

impl HTTP {
    pub fn new(config: Config) -> Result<HTTP, Error> {
        if config.api_url.is_empty() {
            return Err(Error::ConfigurationError(String::from(
                "API_URL is required when USE_MOCKS is not enabled",
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = match Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout))
            .build()
        {
            Ok(c) => c,
            Err(e) => {
                return Err(Error::ReqwestError(e));
            },
        };

        Ok(HTTP { config, http })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), endpoint)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, Error> {
        let response = request.send().await?;
        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url());

        if !status.is_success() {
            let message = response
                .json::<MessageBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| String::from(GENERIC_API_ERROR));

            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let json = response.json::<T>().await?;
        Ok(json)
    }
}

#[async_trait]
impl DataSource for HTTP {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn dashboard_summary(
        &self,
        month: &str,
    ) -> Result<DashboardSummary, Error> {
        let request = self
            .http
            .get(self.url("/dashboard"))
            .query(&[("month", month)]);
        self.send(request).await
    }

    async fn transactions(
        &self,
        filters: &TransactionFilters,
    ) -> Result<Vec<Transaction>, Error> {
        let request = self
            .http
            .get(self.url("/transactions"))
            .query(&filters.query_pairs());
        self.send(request).await
    }

    async fn update_transaction(
        &self,
        id: &str,
        patch: &TransactionPatch,
    ) -> Result<Transaction, Error> {
        let endpoint = format!("/transactions/{}", id);
        let request = self.http.patch(self.url(&endpoint)).json(patch);
        self.send(request).await
    }

    async fn health(&self) -> Result<HealthStatus, Error> {
        let request = self.http.get(self.url("/health"));
        self.send(request).await
    }
}
