use crate::{
    errors::ServiceError,
    index::build_index,
    models::{EntryRecord, Product, SupplyChainEvent, Table},
    query::{ListQuery, QueryFacade},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::instrument;

const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub products: u64,
    pub entries: u64,
    pub exits: u64,
    pub events: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub generated_at: DateTime<Utc>,
    pub totals: Totals,
    /// Entries per product name
    pub entries_by_product: Vec<Bucket>,
    pub events_by_type: Vec<Bucket>,
}

/// Counts labels, keeping buckets in the order labels were first seen.
fn distribution<I>(labels: I) -> Vec<Bucket>
where
    I: IntoIterator<Item = String>,
{
    let mut buckets: Vec<Bucket> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for label in labels {
        match positions.get(&label) {
            Some(&i) => buckets[i].count += 1,
            None => {
                positions.insert(label.clone(), buckets.len());
                buckets.push(Bucket { label, count: 1 });
            }
        }
    }
    buckets
}

#[derive(Clone)]
pub struct AnalyticsService {
    facade: QueryFacade,
}

impl AnalyticsService {
    pub fn new(facade: QueryFacade) -> Self {
        Self { facade }
    }

    #[instrument(skip(self))]
    pub async fn report(&self) -> Result<AnalyticsReport, ServiceError> {
        let (products_total, exits_total, entries, products, events) = tokio::try_join!(
            self.facade.count(Table::Products, &[]),
            self.facade.count(Table::ExitProducts, &[]),
            self.facade.list::<EntryRecord>(ListQuery::new()),
            self.facade.list::<Product>(ListQuery::new()),
            self.facade.list::<SupplyChainEvent>(ListQuery::new()),
        )?;

        let index = build_index(&products, |p| p.id);
        let entries_by_product = distribution(entries.iter().map(|entry| {
            index
                .resolve_opt(entry.product_id.as_ref())
                .map(|product| product.name.clone())
                .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
        }));
        let events_by_type = distribution(events.iter().map(|event| event.event_type.clone()));

        Ok(AnalyticsReport {
            generated_at: Utc::now(),
            totals: Totals {
                products: products_total,
                entries: entries.len() as u64,
                exits: exits_total,
                events: events.len() as u64,
            },
            entries_by_product,
            events_by_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_keep_first_seen_order() {
        let labels = ["exit", "entry", "exit", "transfer", "entry", "exit"];
        let buckets = distribution(labels.iter().map(|s| s.to_string()));
        let got: Vec<_> = buckets.iter().map(|b| (b.label.as_str(), b.count)).collect();
        assert_eq!(got, vec![("exit", 3), ("entry", 2), ("transfer", 1)]);
    }

    #[test]
    fn no_labels_no_buckets() {
        assert!(distribution(Vec::new()).is_empty());
    }
}
