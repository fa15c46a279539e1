//! PostgREST-compatible table client (the wire contract of the hosted backend).

use super::{Direction, Filter, FilterOp, ListQuery, TableClient};
use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::models::Table;
use async_trait::async_trait;
use reqwest::{header, Response};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, instrument};

/// Error body the backend returns alongside non-2xx statuses
#[derive(Debug, Deserialize)]
struct BackendError {
    message: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

#[derive(Clone)]
pub struct RestTableClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestTableClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ServiceError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        let base_url = config
            .backend_url
            .clone()
            .ok_or_else(|| ServiceError::remote("backend_url is not configured"))?;
        let api_key = config
            .backend_api_key
            .clone()
            .ok_or_else(|| ServiceError::remote("backend_api_key is not configured"))?;
        Self::new(base_url, api_key, config.request_timeout())
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/{}", self.base_url, table)
    }

    fn request(&self, method: reqwest::Method, table: Table) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn check(table: Table, response: Response) -> Result<Response, ServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<BackendError>(&body)
            .ok()
            .and_then(|err| match (err.message, err.hint) {
                (Some(message), Some(hint)) => Some(format!("{} ({})", message, hint)),
                (message, _) => message,
            })
            .unwrap_or_else(|| status.to_string());
        error!(%table, status = status.as_u16(), %detail, "backend request failed");
        Err(ServiceError::remote(format!("{}: {}", table, detail)))
    }
}

/// Renders filters, ordering and limit as PostgREST query parameters.
fn query_params(filters: &[Filter], query: Option<&ListQuery>) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    for filter in filters {
        let op = match filter.op {
            FilterOp::Eq => "eq",
            FilterOp::ILike => "ilike",
        };
        params.push((filter.column.clone(), format!("{}.{}", op, filter.value)));
    }
    if let Some(query) = query {
        if let Some(order) = &query.order {
            let direction = match order.direction {
                Direction::Ascending => "asc",
                Direction::Descending => "desc",
            };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }
        if let Some(limit) = query.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
    }
    params
}

/// Reads the total out of `Content-Range: 0-24/573` (or `*/0`).
fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

#[async_trait]
impl TableClient for RestTableClient {
    #[instrument(skip(self, query), fields(%table))]
    async fn list(&self, table: Table, query: &ListQuery) -> Result<Vec<Value>, ServiceError> {
        let response = self
            .request(reqwest::Method::GET, table)
            .query(&query_params(&query.filters, Some(query)))
            .send()
            .await?;
        let response = Self::check(table, response).await?;
        Ok(response.json::<Vec<Value>>().await?)
    }

    #[instrument(skip(self, record), fields(%table))]
    async fn insert(&self, table: Table, record: Value) -> Result<Value, ServiceError> {
        let response = self
            .request(reqwest::Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&[record])
            .send()
            .await?;
        let response = Self::check(table, response).await?;
        response
            .json::<Vec<Value>>()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::remote(format!("{}: insert returned no row", table)))
    }

    #[instrument(skip(self, filters), fields(%table))]
    async fn count(&self, table: Table, filters: &[Filter]) -> Result<u64, ServiceError> {
        let response = self
            .request(reqwest::Method::HEAD, table)
            .header("Prefer", "count=exact")
            .query(&query_params(filters, None))
            .send()
            .await?;
        let response = Self::check(table, response).await?;
        response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| ServiceError::remote(format!("{}: missing row count", table)))
    }
}
