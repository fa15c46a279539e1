//! In-process table store for local runs and tests.

use super::{Direction, Filter, FilterOp, ListQuery, TableClient};
use crate::errors::ServiceError;
use crate::models::Table;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryTableClient {
    tables: DashMap<Table, Vec<Value>>,
    failures: DashMap<Table, String>,
}

impl InMemoryTableClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a JSON object keyed by table name, each value an array of rows.
    pub fn from_seed_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading seed file {}", path.display()))?;
        let seed: HashMap<String, Vec<Value>> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing seed file {}", path.display()))?;

        let client = Self::new();
        for (name, rows) in seed {
            let table =
                Table::from_str(&name).map_err(|_| anyhow!("unknown table in seed: {}", name))?;
            info!(%table, rows = rows.len(), "seeding table");
            client.seed(table, rows);
        }
        Ok(client)
    }

    /// Appends rows as-is, without stamping ids or timestamps.
    pub fn seed(&self, table: Table, rows: impl IntoIterator<Item = Value>) {
        self.tables.entry(table).or_default().extend(rows);
    }

    /// Makes every call against `table` fail with `message`.
    pub fn fail_table(&self, table: Table, message: impl Into<String>) {
        self.failures.insert(table, message.into());
    }

    pub fn clear_failure(&self, table: Table) {
        self.failures.remove(&table);
    }

    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.tables
            .get(&table)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    fn check_failure(&self, table: Table) -> Result<(), ServiceError> {
        match self.failures.get(&table) {
            Some(message) => Err(ServiceError::remote(format!("{}: {}", table, *message))),
            None => Ok(()),
        }
    }

    fn matching(&self, table: Table, filters: &[Filter]) -> Vec<Value> {
        self.tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| filters.iter().all(|filter| matches_filter(row, filter)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Text form of a column, as the backend compares it against filter values.
fn column_text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn matches_filter(row: &Value, filter: &Filter) -> bool {
    let Some(text) = column_text(row, &filter.column) else {
        return false;
    };
    match filter.op {
        FilterOp::Eq => text == filter.value,
        FilterOp::ILike => like(&text.to_lowercase(), &filter.value.to_lowercase()),
    }
}

/// `%` matches any run of characters, `_` exactly one.
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('%') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '_' || c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    t = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| *c == '%')
}

fn compare_present(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x_at), Ok(y_at)) => x_at.cmp(&y_at),
                _ => x.cmp(y),
            }
        }
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Ascending puts nulls last and descending puts them first.
fn compare_rows(a: &Value, b: &Value, column: &str, direction: Direction) -> Ordering {
    let a = a.get(column).filter(|v| !v.is_null());
    let b = b.get(column).filter(|v| !v.is_null());
    let ascending = match (a, b) {
        (Some(a), Some(b)) => compare_present(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    match direction {
        Direction::Ascending => ascending,
        Direction::Descending => ascending.reverse(),
    }
}

#[async_trait]
impl TableClient for InMemoryTableClient {
    async fn list(&self, table: Table, query: &ListQuery) -> Result<Vec<Value>, ServiceError> {
        self.check_failure(table)?;
        let mut rows = self.matching(table, &query.filters);
        if let Some(order) = &query.order {
            rows.sort_by(|a, b| compare_rows(a, b, &order.column, order.direction));
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        debug!(%table, rows = rows.len(), "memory list");
        Ok(rows)
    }

    async fn insert(&self, table: Table, record: Value) -> Result<Value, ServiceError> {
        self.check_failure(table)?;
        let Value::Object(mut row) = record else {
            return Err(ServiceError::remote(format!(
                "{}: insert payload must be an object",
                table
            )));
        };
        stamp(&mut row, "id", || Value::String(Uuid::new_v4().to_string()));
        stamp(&mut row, table.created_column(), || {
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
        });

        let stored = Value::Object(row);
        self.tables.entry(table).or_default().push(stored.clone());
        Ok(stored)
    }

    async fn count(&self, table: Table, filters: &[Filter]) -> Result<u64, ServiceError> {
        self.check_failure(table)?;
        Ok(self.matching(table, filters).len() as u64)
    }
}

fn stamp(row: &mut Map<String, Value>, column: &str, value: impl FnOnce() -> Value) {
    if row.get(column).map_or(true, Value::is_null) {
        row.insert(column.to_string(), value());
    }
}
