use std::sync::Arc;

use crate::ledger::UnitOfWork;
use crate::transfer::TransferEngine;

/// Gateway shared state
pub struct AppState<U> {
    /// Backing store, for single-row reads and writes
    pub store: Arc<U>,
    /// Transfer engine over the same store
    pub engine: TransferEngine<U>,
}

impl<U: UnitOfWork> AppState<U> {
    pub fn new(engine: TransferEngine<U>) -> Self {
        Self {
            store: Arc::clone(engine.store()),
            engine,
        }
    }
}
