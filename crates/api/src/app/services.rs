use std::sync::Arc;

use marketplace_infra::entity_store::EntityStore;
use marketplace_infra::{AccountManager, CatalogManager, Clock, PurchaseWorkflow};

/// The managers shared by every handler, all over the same store and clock.
pub struct AppServices<S> {
    pub accounts: AccountManager<S>,
    pub catalog: CatalogManager<S>,
    pub purchases: PurchaseWorkflow<S>,
}

impl<S: EntityStore> AppServices<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            accounts: AccountManager::new(Arc::clone(&store), Arc::clone(&clock)),
            catalog: CatalogManager::new(Arc::clone(&store), Arc::clone(&clock)),
            purchases: PurchaseWorkflow::new(store, clock),
        }
    }
}

/// Shorthand for the handler extension type.
pub type Services<S> = Arc<AppServices<S>>;
