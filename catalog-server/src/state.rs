use catalog::ports::CatalogApi;
use catalog::{CatalogCache, Handoff, RenderContext, Visibility};
use shared::config::Config;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Long-lived client-session cache
    pub cache: CatalogCache,
    pub api: Arc<dyn CatalogApi>,
    pub visibility: Visibility,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build the session cache over moka stores, hydrated from `handoff`.
    pub fn new(config: Arc<Config>, api: Arc<dyn CatalogApi>, handoff: Handoff) -> Self {
        let (products, categories) = storage_engine::catalog_stores(config.max_brands);

        let cache = CatalogCache::builder(Arc::clone(&api), products, categories)
            .context(RenderContext::Client)
            .handoff(Arc::new(handoff))
            .refresh_interval(config.refresh_interval)
            .build();

        Self {
            cache,
            api,
            visibility: Visibility::default(),
            config,
        }
    }

    /// A throwaway server-context cache for one render. Its handoff starts empty and
    /// collects whatever the render fetches.
    pub fn render_cache(&self) -> CatalogCache {
        let (products, categories) = storage_engine::catalog_stores(None);
        CatalogCache::builder(Arc::clone(&self.api), products, categories)
            .context(RenderContext::Server)
            .handoff(Arc::new(Handoff::new()))
            .refresh_interval(self.config.refresh_interval)
            .build()
    }
}

/// Read a handoff blob written by an earlier render. A missing or unreadable file yields an
/// empty handoff; the session then starts from the API.
pub async fn load_handoff(path: Option<&str>) -> Handoff {
    let Some(path) = path else {
        return Handoff::new();
    };

    match tokio::fs::read_to_string(Path::new(path)).await {
        Ok(blob) => {
            let handoff = Handoff::from_blob(&blob);
            info!("Loaded handoff from {} (empty: {})", path, handoff.is_empty());
            handoff
        }
        Err(e) => {
            warn!("Failed to read handoff from {}: {}. Starting cold.", path, e);
            Handoff::new()
        }
    }
}
