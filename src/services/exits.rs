use crate::{
    assembler::{assemble_exits, ExitView},
    auth::Identity,
    errors::ServiceError,
    index::build_index,
    models::{
        supply_chain_event::EXIT_EVENT, EntryRecord, ExitRecord, NewExit, NewSupplyChainEvent,
        Product, Profile, Table, UserOwned,
    },
    query::{ListQuery, QueryFacade},
    validation::FormContract,
};
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Service for outgoing transfers (exits)
#[derive(Clone)]
pub struct ExitService {
    facade: QueryFacade,
}

impl ExitService {
    pub fn new(facade: QueryFacade) -> Self {
        Self { facade }
    }

    /// The caller's exits joined through their entries to products, plus
    /// the assignee's name.
    #[instrument(skip(self), fields(user_id = %identity.user_id))]
    pub async fn list(&self, identity: &Identity) -> Result<Vec<ExitView>, ServiceError> {
        let (exits, entries, products, profiles) = tokio::try_join!(
            self.facade.list::<ExitRecord>(
                ListQuery::new()
                    .eq("user_id", identity.user_id)
                    .order_desc("created_at"),
            ),
            self.facade
                .list::<EntryRecord>(ListQuery::new().eq("user_id", identity.user_id)),
            self.facade.list::<Product>(ListQuery::new()),
            self.facade.list::<Profile>(ListQuery::new()),
        )?;

        let entries = build_index(&entries, |e| e.id);
        let products = build_index(&products, |p| p.id);
        let profiles = build_index(&profiles, |p| p.id);
        Ok(assemble_exits(exits, &entries, &products, &profiles))
    }

    /// Records an exit, then its "exit" supply-chain event, and re-lists.
    #[instrument(skip(self, draft), fields(user_id = %identity.user_id))]
    pub async fn create(
        &self,
        identity: &Identity,
        draft: NewExit,
    ) -> Result<Vec<ExitView>, ServiceError> {
        let draft = draft.normalize();
        draft.check()?;

        let exit: ExitRecord = self
            .facade
            .insert(&UserOwned {
                user_id: identity.user_id,
                draft: &draft,
            })
            .await?;
        info!(exit_id = %exit.id, quantity = %exit.quantity, "Exit recorded");

        if let Some(entry_id) = draft.entry_product_id {
            if let Err(e) = self.record_event(identity, entry_id, &draft, exit.id).await {
                warn!(exit_id = %exit.id, error = %e, "Failed to record exit event");
            }
        }

        self.list(identity).await
    }

    /// The event carries the batch and product of the entry being shipped out.
    async fn record_event(
        &self,
        identity: &Identity,
        entry_id: Uuid,
        draft: &NewExit,
        exit_id: Uuid,
    ) -> Result<(), ServiceError> {
        let entry = self
            .facade
            .first::<EntryRecord>(ListQuery::new().eq("id", entry_id))
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("entry {}", entry_id)))?;
        let product_id = entry
            .product_id
            .as_ref()
            .and_then(|key| key.id())
            .ok_or_else(|| ServiceError::NotFound(format!("product of entry {}", entry_id)))?;

        let mut event = NewSupplyChainEvent::new(product_id, entry.batch_number, EXIT_EVENT);
        event.from_user = Some(identity.user_id);
        event.to_user = draft.assigned_to;
        event.quantity = draft.quantity;
        event.metadata = json!({
            "entry_product_id": entry_id,
            "exit_product_id": exit_id,
        });

        self.facade
            .insert_raw(Table::SupplyChainEvents, &event)
            .await
            .map(|_| ())
    }
}
