pub mod account;
pub mod analytics;
pub mod health;
pub mod inventory;
pub mod products;
pub mod trace;

use crate::query::QueryFacade;
use crate::services::{
    AccountService, AnalyticsService, EntryService, ExitService, LabelService, ProductService,
    TraceService, UsageService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<ProductService>,
    pub entries: Arc<EntryService>,
    pub exits: Arc<ExitService>,
    pub usage: Arc<UsageService>,
    pub trace: Arc<TraceService>,
    pub analytics: Arc<AnalyticsService>,
    pub labels: Arc<LabelService>,
    pub account: Arc<AccountService>,
}

impl AppServices {
    /// Builds every service over one shared query façade.
    pub fn new(facade: QueryFacade) -> Self {
        Self {
            products: Arc::new(ProductService::new(facade.clone())),
            entries: Arc::new(EntryService::new(facade.clone())),
            exits: Arc::new(ExitService::new(facade.clone())),
            usage: Arc::new(UsageService::new(facade.clone())),
            trace: Arc::new(TraceService::new(facade.clone())),
            analytics: Arc::new(AnalyticsService::new(facade.clone())),
            labels: Arc::new(LabelService::new(facade.clone())),
            account: Arc::new(AccountService::new(facade)),
        }
    }
}
