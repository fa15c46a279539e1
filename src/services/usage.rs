use crate::{
    assembler::{assemble_usage, UsageView},
    auth::Identity,
    errors::ServiceError,
    index::build_index,
    models::{EntryRecord, NewUsage, Product, UsageRecord, UserOwned},
    query::{ListQuery, QueryFacade},
    validation::FormContract,
};
use tracing::{info, instrument};

/// Service for local consumption (used today)
#[derive(Clone)]
pub struct UsageService {
    facade: QueryFacade,
}

impl UsageService {
    pub fn new(facade: QueryFacade) -> Self {
        Self { facade }
    }

    #[instrument(skip(self), fields(user_id = %identity.user_id))]
    pub async fn list(&self, identity: &Identity) -> Result<Vec<UsageView>, ServiceError> {
        let (usage, entries, products) = tokio::try_join!(
            self.facade.list::<UsageRecord>(
                ListQuery::new()
                    .eq("user_id", identity.user_id)
                    .order_desc("created_at"),
            ),
            self.facade.list::<EntryRecord>(ListQuery::new()),
            self.facade.list::<Product>(ListQuery::new()),
        )?;

        let entries = build_index(&entries, |e| e.id);
        let products = build_index(&products, |p| p.id);
        Ok(assemble_usage(usage, &entries, &products))
    }

    #[instrument(skip(self, draft), fields(user_id = %identity.user_id))]
    pub async fn create(
        &self,
        identity: &Identity,
        draft: NewUsage,
    ) -> Result<Vec<UsageView>, ServiceError> {
        let draft = draft.normalize();
        draft.check()?;

        let usage: UsageRecord = self
            .facade
            .insert(&UserOwned {
                user_id: identity.user_id,
                draft: &draft,
            })
            .await?;
        info!(usage_id = %usage.id, quantity = %usage.quantity, "Usage recorded");

        self.list(identity).await
    }
}
