use crate::{
    auth::Identity,
    errors::ServiceError,
    models::{product::ProductInsert, NewProduct, Product},
    query::{ListQuery, QueryFacade},
    validation::FormContract,
};
use tracing::{info, instrument};

/// Service for the products a producer has registered
#[derive(Clone)]
pub struct ProductService {
    facade: QueryFacade,
}

impl ProductService {
    pub fn new(facade: QueryFacade) -> Self {
        Self { facade }
    }

    /// Products owned by the caller, newest first
    #[instrument(skip(self), fields(user_id = %identity.user_id))]
    pub async fn list(&self, identity: &Identity) -> Result<Vec<Product>, ServiceError> {
        self.facade
            .list::<Product>(
                ListQuery::new()
                    .eq("created_by", identity.user_id)
                    .order_desc("created_at"),
            )
            .await
    }

    /// Registers a product and returns the re-listed products
    #[instrument(skip(self, draft), fields(user_id = %identity.user_id))]
    pub async fn create(
        &self,
        identity: &Identity,
        draft: NewProduct,
    ) -> Result<Vec<Product>, ServiceError> {
        let draft = draft.normalize();
        draft.check()?;

        let product: Product = self
            .facade
            .insert(&ProductInsert {
                created_by: identity.user_id,
                draft: &draft,
            })
            .await?;
        info!(product_id = %product.id, name = %product.name, "Product created");

        self.list(identity).await
    }
}
