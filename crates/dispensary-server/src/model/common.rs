//! Shared application state handed to every handler

use std::sync::Arc;

use dispensary_core::{PrescriptionService, StockService};
use dispensary_persistence::PersistenceService;

pub use super::config::{Cli, Configuration, LockStoreKind};

#[derive(Clone)]
pub struct AppState {
    pub stock: Arc<StockService>,
    pub prescriptions: Arc<PrescriptionService>,
    pub persistence: Arc<dyn PersistenceService>,
}

impl AppState {
    pub fn new(stock: StockService, persistence: Arc<dyn PersistenceService>) -> Self {
        Self {
            stock: Arc::new(stock),
            prescriptions: Arc::new(PrescriptionService::new(persistence.clone())),
            persistence,
        }
    }
}
