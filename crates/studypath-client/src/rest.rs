//! Typed access to the hosted backend's REST interface.
//!
//! The backend exposes one route per table with filters, ordering, and
//! upsert semantics encoded in the query string. Read queries retry a fixed
//! number of times on transient failures; writes never retry.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use studypath_core::error::BackendError;

use crate::config::BackendConfig;

/// Sort direction for ordered queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    fn suffix(self) -> &'static str {
        match self {
            Order::Ascending => "asc",
            Order::Descending => "desc",
        }
    }
}

/// HTTP client for the backend's table routes.
#[derive(Clone)]
pub struct RestClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    timeout_secs: u64,
    read_retries: u32,
    retry_delay: Duration,
}

#[derive(Deserialize)]
struct RestErrorBody {
    message: String,
}

impl RestClient {
    pub fn new(config: &BackendConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
            timeout_secs: config.timeout_secs,
            read_retries: 2,
            retry_delay: Duration::from_millis(500),
        }
    }

    /// Override the read retry policy.
    pub fn with_retries(mut self, read_retries: u32, retry_delay: Duration) -> Self {
        self.read_retries = read_retries;
        self.retry_delay = retry_delay;
        self
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("authorization", format!("Bearer {}", self.api_key))
    }

    /// Start a read query against a table.
    pub fn select(&self, table: &str) -> SelectQuery<'_> {
        SelectQuery {
            client: self,
            table: table.to_string(),
            params: Vec::new(),
        }
    }

    /// Start a delete against a table.
    pub fn delete(&self, table: &str) -> DeleteQuery<'_> {
        DeleteQuery {
            client: self,
            table: table.to_string(),
            params: Vec::new(),
        }
    }

    /// Start an update against a table.
    pub fn update(&self, table: &str) -> UpdateQuery<'_> {
        UpdateQuery {
            client: self,
            table: table.to_string(),
            params: Vec::new(),
        }
    }

    /// Insert rows into a table.
    #[instrument(skip(self, rows), fields(table = %table))]
    pub async fn insert<T: Serialize + Sync>(
        &self,
        table: &str,
        rows: &[T],
    ) -> Result<(), BackendError> {
        let response = self
            .authed(self.client.post(self.table_url(table)))
            .header("prefer", "return=minimal")
            .json(rows)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.check_status(response, table).await?;
        Ok(())
    }

    /// Insert rows and return the stored representation (with row ids).
    #[instrument(skip(self, rows), fields(table = %table))]
    pub async fn insert_returning<T, R>(&self, table: &str, rows: &[T]) -> Result<Vec<R>, BackendError>
    where
        T: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .authed(self.client.post(self.table_url(table)))
            .header("prefer", "return=representation")
            .json(rows)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = self.check_status(response, table).await?;
        response.json().await.map_err(|e| BackendError::ApiError {
            status: 0,
            message: format!("failed to parse response: {e}"),
        })
    }

    /// Upsert one row, merging on the given conflict target columns.
    #[instrument(skip(self, row), fields(table = %table))]
    pub async fn upsert<T: Serialize + Sync>(
        &self,
        table: &str,
        row: &T,
        on_conflict: &str,
    ) -> Result<(), BackendError> {
        let response = self
            .authed(self.client.post(self.table_url(table)))
            .query(&[("on_conflict", on_conflict)])
            .header("prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[row])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.check_status(response, table).await?;
        Ok(())
    }

    fn map_send_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(self.timeout_secs)
        } else {
            BackendError::Network(e.to_string())
        }
    }

    async fn check_status(
        &self,
        response: reqwest::Response,
        table: &str,
    ) -> Result<reqwest::Response, BackendError> {
        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(BackendError::RateLimited {
                retry_after_ms: retry_after,
            });
        }
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::AuthenticationFailed(body));
        }
        if status == 404 {
            return Err(BackendError::NotFound(table.to_string()));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<RestErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(BackendError::ApiError { status, message });
        }
        Ok(response)
    }
}

/// A filtered, ordered read query.
pub struct SelectQuery<'a> {
    client: &'a RestClient,
    table: String,
    params: Vec<(String, String)>,
}

impl SelectQuery<'_> {
    /// Restrict the returned columns.
    pub fn columns(mut self, columns: &str) -> Self {
        self.params.push(("select".into(), columns.into()));
        self
    }

    /// Equality filter.
    pub fn eq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.params.push((column.into(), format!("eq.{value}")));
        self
    }

    /// Membership filter.
    pub fn in_list(mut self, column: &str, values: &[i64]) -> Self {
        let list = values
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        self.params.push((column.into(), format!("in.({list})")));
        self
    }

    /// Keep only rows where the column is not null.
    pub fn not_null(mut self, column: &str) -> Self {
        self.params.push((column.into(), "not.is.null".into()));
        self
    }

    /// Order by a column.
    pub fn order(mut self, column: &str, order: Order) -> Self {
        self.params
            .push(("order".into(), format!("{column}.{}", order.suffix())));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.params.push(("limit".into(), limit.to_string()));
        self
    }

    /// Execute the query, retrying transient failures.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn fetch<T: DeserializeOwned>(&self) -> Result<Vec<T>, BackendError> {
        let mut retry_delay = self.client.retry_delay;
        let mut last_error = None;

        for attempt in 0..=self.client.read_retries {
            if attempt > 0 {
                tokio::time::sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(Duration::from_secs(30));
            }

            match self.fetch_once().await {
                Ok(rows) => return Ok(rows),
                Err(e) => {
                    if e.is_permanent() {
                        return Err(e);
                    }
                    if let Some(ms) = e.retry_after_ms() {
                        retry_delay = Duration::from_millis(ms);
                    }
                    tracing::debug!(table = %self.table, attempt, error = %e, "read query failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| BackendError::Network("no attempts made".into())))
    }

    async fn fetch_once<T: DeserializeOwned>(&self) -> Result<Vec<T>, BackendError> {
        let response = self
            .client
            .authed(self.client.client.get(self.client.table_url(&self.table)))
            .query(&self.params)
            .send()
            .await
            .map_err(|e| self.client.map_send_error(e))?;
        let response = self.client.check_status(response, &self.table).await?;
        response.json().await.map_err(|e| BackendError::ApiError {
            status: 0,
            message: format!("failed to parse response: {e}"),
        })
    }
}

/// A filtered update.
pub struct UpdateQuery<'a> {
    client: &'a RestClient,
    table: String,
    params: Vec<(String, String)>,
}

impl UpdateQuery<'_> {
    /// Equality filter.
    pub fn eq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.params.push((column.into(), format!("eq.{value}")));
        self
    }

    /// Apply the patch to every matching row.
    #[instrument(skip(self, patch), fields(table = %self.table))]
    pub async fn execute<T: Serialize + Sync>(&self, patch: &T) -> Result<(), BackendError> {
        let response = self
            .client
            .authed(self.client.client.patch(self.client.table_url(&self.table)))
            .query(&self.params)
            .header("prefer", "return=minimal")
            .json(patch)
            .send()
            .await
            .map_err(|e| self.client.map_send_error(e))?;
        self.client.check_status(response, &self.table).await?;
        Ok(())
    }
}

/// A filtered delete.
pub struct DeleteQuery<'a> {
    client: &'a RestClient,
    table: String,
    params: Vec<(String, String)>,
}

impl DeleteQuery<'_> {
    /// Equality filter.
    pub fn eq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.params.push((column.into(), format!("eq.{value}")));
        self
    }

    /// Membership filter.
    pub fn in_list(mut self, column: &str, values: &[i64]) -> Self {
        let list = values
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        self.params.push((column.into(), format!("in.({list})")));
        self
    }

    /// Execute the delete. Deleting zero rows is not an error.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn execute(&self) -> Result<(), BackendError> {
        let response = self
            .client
            .authed(self.client.client.delete(self.client.table_url(&self.table)))
            .query(&self.params)
            .send()
            .await
            .map_err(|e| self.client.map_send_error(e))?;
        self.client.check_status(response, &self.table).await?;
        Ok(())
    }
}
