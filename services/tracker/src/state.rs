//! Application state shared across handlers

use std::sync::Arc;

use crate::{
    credentials::CredentialStore, lifecycle::TicketLifecycleService, repositories::MemoryStore,
    tally::TallyCache,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub tickets: TicketLifecycleService,
    pub credentials: CredentialStore,
}

impl AppState {
    /// Fully in-process state
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            tickets: TicketLifecycleService::new(store.clone(), TallyCache::in_memory()),
            credentials: CredentialStore::new(store),
        }
    }
}
