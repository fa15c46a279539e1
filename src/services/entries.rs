use crate::{
    assembler::{assemble_entries, EntryView},
    auth::Identity,
    errors::ServiceError,
    index::build_index,
    models::{
        supply_chain_event::ENTRY_EVENT, EntryRecord, NewEntry, NewSupplyChainEvent, Product,
        Profile, Table, UserOwned,
    },
    query::{ListQuery, QueryFacade},
    validation::FormContract,
};
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Service for batch intake (entries)
#[derive(Clone)]
pub struct EntryService {
    facade: QueryFacade,
}

impl EntryService {
    pub fn new(facade: QueryFacade) -> Self {
        Self { facade }
    }

    /// The caller's entries joined with product and supplier names
    #[instrument(skip(self), fields(user_id = %identity.user_id))]
    pub async fn list(&self, identity: &Identity) -> Result<Vec<EntryView>, ServiceError> {
        let (entries, products, profiles) = tokio::try_join!(
            self.facade.list::<EntryRecord>(
                ListQuery::new()
                    .eq("user_id", identity.user_id)
                    .order_desc("created_at"),
            ),
            self.facade.list::<Product>(ListQuery::new()),
            self.facade.list::<Profile>(ListQuery::new()),
        )?;

        let products = build_index(&products, |p| p.id);
        let profiles = build_index(&profiles, |p| p.id);
        Ok(assemble_entries(entries, &products, &profiles))
    }

    /// Records an entry, then its "entry" supply-chain event, and re-lists.
    #[instrument(skip(self, draft), fields(user_id = %identity.user_id))]
    pub async fn create(
        &self,
        identity: &Identity,
        draft: NewEntry,
    ) -> Result<Vec<EntryView>, ServiceError> {
        let draft = draft.normalize();
        draft.check()?;

        let entry: EntryRecord = self
            .facade
            .insert(&UserOwned {
                user_id: identity.user_id,
                draft: &draft,
            })
            .await?;
        info!(entry_id = %entry.id, batch = %entry.batch_number, "Entry recorded");

        if let Some(product_id) = draft.product_id {
            if let Err(e) = self.record_event(identity, product_id, &draft, entry.id).await {
                warn!(entry_id = %entry.id, error = %e, "Failed to record entry event");
            }
        }

        self.list(identity).await
    }

    async fn record_event(
        &self,
        identity: &Identity,
        product_id: Uuid,
        draft: &NewEntry,
        entry_id: Uuid,
    ) -> Result<(), ServiceError> {
        let mut event = NewSupplyChainEvent::new(product_id, &draft.batch_number, ENTRY_EVENT);
        event.from_user = draft.received_from;
        event.to_user = Some(identity.user_id);
        event.quantity = draft.quantity;
        event.metadata = json!({ "entry_product_id": entry_id });

        self.facade
            .insert_raw(Table::SupplyChainEvents, &event)
            .await
            .map(|_| ())
    }
}
