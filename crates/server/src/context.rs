//! Shared server state built once from configuration.

use std::sync::Arc;

use sigcache_client::{BidirectionalStore, SignatureCache, StoreConfig};
use sigcache_core::{AppConfig, CacheDb, Error, SignatureBuilder, SimilarityEngine};

#[cfg(feature = "render")]
use sigcache_client::render::HeadlessRenderer;

/// Everything a tool call needs.
pub struct AppContext {
    pub config: AppConfig,
    pub store: BidirectionalStore,
    #[cfg(feature = "render")]
    pub renderer: Option<HeadlessRenderer>,
}

impl AppContext {
    /// Wire the store, its signature cache and, when enabled, the renderer.
    ///
    /// Background sweeps are started here, so this must run inside the runtime.
    pub async fn from_config(config: AppConfig) -> Result<Self, Error> {
        let signatures = Arc::new(SignatureCache::new(SignatureBuilder::new(config.builder_config()), config.signature_ttl()));
        signatures.start_sweeper();

        let engine = SimilarityEngine::new(config.cross_env_penalty);
        let store_config = StoreConfig::from(&config);
        let store = match config.persistence_path() {
            Some(path) => {
                let db = CacheDb::open(path).await?;
                BidirectionalStore::open(store_config, signatures, engine, db).await?
            }
            None => BidirectionalStore::new(store_config, signatures, engine),
        };
        store.start_cleanup();

        #[cfg(feature = "render")]
        let renderer = if config.render_enabled { Some(HeadlessRenderer::new().await?) } else { None };

        Ok(Self {
            config,
            store,
            #[cfg(feature = "render")]
            renderer,
        })
    }

    /// Stop background work.
    pub fn shutdown(&self) {
        self.store.close();
        self.store.signatures().close();
    }
}
