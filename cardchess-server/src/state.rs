//! Server state management
//!
//! Shared state handed to every route: the session coordinator.

use crate::coordinator::Coordinator;
use crate::store::{JsonFileStore, MemoryStore, SessionStore, StoreError};
use crate::ServerConfig;
use cardchess_core::RuleConfig;
use std::sync::Arc;

/// Server-wide shared state
pub struct ServerState {
    pub coordinator: Coordinator,
}

impl ServerState {
    /// In-memory sessions with default rules
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), RuleConfig::default())
    }

    pub fn with_store(store: Arc<dyn SessionStore>, rules: RuleConfig) -> Self {
        Self {
            coordinator: Coordinator::new(store, rules),
        }
    }

    /// Pick the store named by the config
    pub fn from_config(config: &ServerConfig) -> Result<Self, StoreError> {
        let store: Arc<dyn SessionStore> = match &config.data_dir {
            Some(dir) => Arc::new(JsonFileStore::open(dir)?),
            None => Arc::new(MemoryStore::new()),
        };
        Ok(Self::with_store(store, config.rules))
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}
