use crate::{
    assembler::UNKNOWN_PRODUCT,
    auth::Identity,
    errors::ServiceError,
    models::{EntryRecord, Product},
    query::{ListQuery, QueryFacade},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

/// What the QR code of a batch label encodes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelPayload {
    pub batch: String,
    pub product: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchLabel {
    pub payload: LabelPayload,
    /// `payload` serialized, ready to be rendered as a QR code
    pub encoded: String,
    pub file_name: String,
}

#[derive(Clone)]
pub struct LabelService {
    facade: QueryFacade,
}

impl LabelService {
    pub fn new(facade: QueryFacade) -> Self {
        Self { facade }
    }

    /// Builds the label of one of the caller's entries.
    #[instrument(skip(self), fields(user_id = %identity.user_id))]
    pub async fn for_entry(
        &self,
        identity: &Identity,
        entry_id: Uuid,
    ) -> Result<BatchLabel, ServiceError> {
        let entry = self
            .facade
            .first::<EntryRecord>(
                ListQuery::new()
                    .eq("id", entry_id)
                    .eq("user_id", identity.user_id),
            )
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Entry {} not found", entry_id)))?;

        let product = match entry.product_id.as_ref().and_then(|key| key.id()) {
            Some(product_id) => {
                self.facade
                    .first::<Product>(ListQuery::new().eq("id", product_id))
                    .await?
            }
            None => None,
        };

        let payload = LabelPayload {
            product: product
                .map(|p| p.name)
                .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
            batch: entry.batch_number,
            timestamp: Utc::now(),
        };
        Ok(BatchLabel {
            encoded: serde_json::to_string(&payload)?,
            file_name: format!("QR-{}.png", payload.batch),
            payload,
        })
    }
}
