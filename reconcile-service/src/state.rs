use std::sync::Arc;

use reconcile_core::{InMemoryRepository, Settings};

/// Shared application state for the reconciliation server.
pub struct AppState {
    pub repository: Arc<InMemoryRepository>,
    pub settings: Settings,
}
