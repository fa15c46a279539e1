//! Query façade over the hosted tables.
//!
//! Views never ask the backend for a join: each table is fetched on its own
//! and merged client-side. `TableClient` is the seam a backend implements;
//! `QueryFacade` layers typed rows on top of it.

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::models::{Record, Table};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub mod memory;
pub mod rest;

pub use memory::InMemoryTableClient;
pub use rest::RestTableClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Exact match
    Eq,
    /// Case-insensitive pattern match, `%` as wildcard
    ILike,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    pub fn eq(column: &str, value: impl fmt::Display) -> Self {
        Self {
            column: column.to_string(),
            op: FilterOp::Eq,
            value: value.to_string(),
        }
    }

    pub fn ilike(column: &str, pattern: impl Into<String>) -> Self {
        Self {
            column: column.to_string(),
            op: FilterOp::ILike,
            value: pattern.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

/// Filters, ordering and limit of one list call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub filters: Vec<Filter>,
    pub order: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl fmt::Display) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn ilike(mut self, column: &str, pattern: impl Into<String>) -> Self {
        self.filters.push(Filter::ilike(column, pattern));
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some(OrderBy {
            column: column.to_string(),
            direction: Direction::Ascending,
        });
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(OrderBy {
            column: column.to_string(),
            direction: Direction::Descending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A remote table store.
///
/// Implementations never retry and never partially apply an insert; any
/// failure comes back as `ServiceError::RemoteError`.
#[async_trait]
pub trait TableClient: Send + Sync {
    async fn list(&self, table: Table, query: &ListQuery) -> Result<Vec<Value>, ServiceError>;

    /// Inserts one row and returns it as stored.
    async fn insert(&self, table: Table, record: Value) -> Result<Value, ServiceError>;

    /// Counts rows matching `filters` without fetching them.
    async fn count(&self, table: Table, filters: &[Filter]) -> Result<u64, ServiceError>;
}

/// Typed access to the tables
#[derive(Clone)]
pub struct QueryFacade {
    client: Arc<dyn TableClient>,
}

impl QueryFacade {
    pub fn new(client: Arc<dyn TableClient>) -> Self {
        Self { client }
    }

    #[instrument(skip(self), fields(table = %R::TABLE))]
    pub async fn list<R: Record>(&self, query: ListQuery) -> Result<Vec<R>, ServiceError> {
        let rows = self.client.list(R::TABLE, &query).await?;
        debug!(rows = rows.len(), "rows fetched");
        rows.into_iter().map(decode::<R>).collect()
    }

    /// Lists with `limit 1` and returns the only row, if any.
    pub async fn first<R: Record>(&self, query: ListQuery) -> Result<Option<R>, ServiceError> {
        Ok(self.list::<R>(query.limit(1)).await?.into_iter().next())
    }

    #[instrument(skip(self, record), fields(table = %R::TABLE))]
    pub async fn insert<R, P>(&self, record: &P) -> Result<R, ServiceError>
    where
        R: Record,
        P: Serialize + ?Sized,
    {
        let payload = serde_json::to_value(record)?;
        let stored = self.client.insert(R::TABLE, payload).await?;
        decode(stored)
    }

    /// Inserts into `table` without decoding the stored row.
    pub async fn insert_raw<P>(&self, table: Table, record: &P) -> Result<Value, ServiceError>
    where
        P: Serialize + ?Sized,
    {
        let payload = serde_json::to_value(record)?;
        self.client.insert(table, payload).await
    }

    pub async fn count(&self, table: Table, filters: &[Filter]) -> Result<u64, ServiceError> {
        self.client.count(table, filters).await
    }
}

/// Builds the table client selected by `config.backend`.
pub fn connect(config: &AppConfig) -> anyhow::Result<Arc<dyn TableClient>> {
    if config.uses_memory_backend() {
        let client = match &config.memory_seed_path {
            Some(path) => InMemoryTableClient::from_seed_file(path)?,
            None => InMemoryTableClient::new(),
        };
        info!("Using in-memory table backend");
        return Ok(Arc::new(client));
    }
    let client = RestTableClient::from_config(config)?;
    info!(url = ?config.backend_url, "Using REST table backend");
    Ok(Arc::new(client))
}

fn decode<R: Record>(row: Value) -> Result<R, ServiceError> {
    serde_json::from_value(row)
        .map_err(|e| ServiceError::remote(format!("malformed row in {}: {}", R::TABLE, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;
    use assert_matches::assert_matches;
    use mockall::mock;
    use mockall::predicate::*;
    use serde_json::json;
    use uuid::Uuid;

    mock! {
        pub Client {}

        #[async_trait]
        impl TableClient for Client {
            async fn list(&self, table: Table, query: &ListQuery) -> Result<Vec<Value>, ServiceError>;
            async fn insert(&self, table: Table, record: Value) -> Result<Value, ServiceError>;
            async fn count(&self, table: Table, filters: &[Filter]) -> Result<u64, ServiceError>;
        }
    }

    fn product_row(name: &str) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "name": name,
            "created_by": Uuid::new_v4(),
            "unit": "kg"
        })
    }

    #[tokio::test]
    async fn list_reads_the_record_table_and_decodes_rows() {
        let owner = Uuid::new_v4();
        let expected = ListQuery::new()
            .eq("created_by", owner)
            .order_desc("created_at");

        let mut client = MockClient::new();
        client
            .expect_list()
            .with(eq(Table::Products), eq(expected.clone()))
            .times(1)
            .returning(|_, _| Ok(vec![product_row("Ragi"), product_row("Jaggery")]));

        let facade = QueryFacade::new(Arc::new(client));
        let products: Vec<Product> = facade.list(expected).await.unwrap();
        let names: Vec<_> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Ragi", "Jaggery"]);
    }

    #[tokio::test]
    async fn undecodable_rows_are_remote_errors() {
        let mut client = MockClient::new();
        client
            .expect_list()
            .returning(|_, _| Ok(vec![json!({ "id": "nope" })]));

        let facade = QueryFacade::new(Arc::new(client));
        let result = facade.list::<Product>(ListQuery::new()).await;
        assert_matches!(result, Err(ServiceError::RemoteError { message }) if message.contains("products"));
    }

    #[tokio::test]
    async fn first_limits_to_one_row() {
        let mut client = MockClient::new();
        client
            .expect_list()
            .withf(|_, query| query.limit == Some(1))
            .returning(|_, _| Ok(vec![]));

        let facade = QueryFacade::new(Arc::new(client));
        let found = facade.first::<Product>(ListQuery::new()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn failures_propagate_without_retry() {
        let mut client = MockClient::new();
        client
            .expect_count()
            .times(1)
            .returning(|_, _| Err(ServiceError::remote("connection reset")));

        let facade = QueryFacade::new(Arc::new(client));
        let result = facade.count(Table::ExitProducts, &[]).await;
        assert_matches!(result, Err(ServiceError::RemoteError { .. }));
    }
}
