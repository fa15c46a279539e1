//! Consumer-facing chain-of-custody lookup.

use crate::{
    errors::ServiceError,
    index::build_index,
    models::{Product, Profile, SupplyChainEvent},
    query::{ListQuery, QueryFacade},
    timeline::{assemble_timeline, resolve_parties, PartyEvent, TimelineEntry},
    validation::{not_blank, FormContract},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case", tag = "by", content = "value")]
pub enum TraceQuery {
    /// Exact batch number
    Batch(String),
    /// Case-insensitive substring of a product name
    Product(String),
}

#[derive(Debug, Validate)]
struct TraceSearch {
    #[validate(custom = "not_blank")]
    value: String,
}

impl FormContract for TraceSearch {
    const FIELD_ORDER: &'static [&'static str] = &["value"];
}

impl TraceQuery {
    pub fn value(&self) -> &str {
        match self {
            TraceQuery::Batch(value) | TraceQuery::Product(value) => value,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceReport {
    pub product: Product,
    pub timeline: Vec<TimelineEntry<PartyEvent>>,
}

#[derive(Clone)]
pub struct TraceService {
    facade: QueryFacade,
}

impl TraceService {
    pub fn new(facade: QueryFacade) -> Self {
        Self { facade }
    }

    #[instrument(skip(self))]
    pub async fn search(&self, query: &TraceQuery) -> Result<TraceReport, ServiceError> {
        TraceSearch {
            value: query.value().to_string(),
        }
        .check()?;

        let product = match query {
            TraceQuery::Batch(batch) => self.product_for_batch(batch.trim()).await?,
            TraceQuery::Product(name) => self
                .facade
                .first::<Product>(ListQuery::new().ilike("name", format!("%{}%", name.trim())))
                .await?
                .ok_or_else(|| ServiceError::NotFound("No product found".into()))?,
        };

        let timeline = self.timeline(product.id).await?;
        info!(product_id = %product.id, steps = timeline.len(), "Trace assembled");
        Ok(TraceReport { product, timeline })
    }

    async fn product_for_batch(&self, batch: &str) -> Result<Product, ServiceError> {
        let event = self
            .facade
            .first::<SupplyChainEvent>(ListQuery::new().eq("batch_number", batch))
            .await?
            .ok_or_else(|| ServiceError::NotFound("No batch found".into()))?;

        let not_found = || ServiceError::NotFound("Product not found for this batch".into());
        let product_id = event
            .product_id
            .as_ref()
            .and_then(|key| key.id())
            .ok_or_else(not_found)?;
        self.facade
            .first::<Product>(ListQuery::new().eq("id", product_id))
            .await?
            .ok_or_else(not_found)
    }

    async fn timeline(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<TimelineEntry<PartyEvent>>, ServiceError> {
        let (events, profiles) = tokio::try_join!(
            self.facade.list::<SupplyChainEvent>(
                ListQuery::new()
                    .eq("product_id", product_id)
                    .order_asc("timestamp"),
            ),
            self.facade.list::<Profile>(ListQuery::new()),
        )?;

        let profiles = build_index(&profiles, |p| p.id);
        Ok(assemble_timeline(resolve_parties(events, &profiles)))
    }
}
