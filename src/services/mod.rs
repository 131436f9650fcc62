//! Core services: the sqlx-backed store, the resolution chain and the
//! lifecycle sync engine.

pub mod resolver;
pub mod store;
pub mod sync;

use crate::config::SeoConfig;
use crate::models::domain::ModelRegistry;
use resolver::MetadataResolver;
use std::sync::Arc;
use store::MetadataStore;
use sync::SyncEngine;

/// Shared handler state: every service plus the pieces they are built from.
#[derive(Clone)]
pub struct AppState {
    pub store: MetadataStore,
    pub resolver: MetadataResolver,
    pub sync: SyncEngine,
    pub config: Arc<SeoConfig>,
    pub registry: Arc<ModelRegistry>,
}

impl AppState {
    pub fn new(store: MetadataStore, config: Arc<SeoConfig>, registry: Arc<ModelRegistry>) -> Self {
        Self {
            resolver: MetadataResolver::new(store.clone(), config.clone(), registry.clone()),
            sync: SyncEngine::new(store.clone(), config.clone(), registry.clone()),
            store,
            config,
            registry,
        }
    }
}
