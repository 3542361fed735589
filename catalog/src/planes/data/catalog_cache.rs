use super::listing::Listing;
use super::operation::CatalogOperations;
use crate::clock::SystemClock;
use crate::domain::response::{ForcedRefresh, SlugLookup, FOUND_IN_CACHE, LOOKUP_FAILED};
use crate::domain::{CacheEntry, Category, Product, RenderContext, Resource};
use crate::events::{CatalogEvent, ProductPatchedEvent, RefreshFailedEvent, UpdateSource};
use crate::handoff::Handoff;
use crate::ports::{CatalogApi, Clock, EntryStore, SeedFuture};
use async_trait::async_trait;
use dashmap::DashSet;
use shared::TimestampMs;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Freshness-aware catalog cache.
///
/// Serves cached lists immediately and refreshes stale ones in the background. In a
/// server context every read goes to the API and is recorded into the handoff; in a
/// client context the handoff is adopted on first read and the stores take over.
///
/// Cloning is cheap and every clone shares the same state.
#[derive(Clone)]
pub struct CatalogCache {
    pub(super) context: RenderContext,
    pub(super) api: Arc<dyn CatalogApi>,
    pub(super) products: Arc<dyn EntryStore<Product>>,
    pub(super) categories: Arc<dyn EntryStore<Category>>,
    pub(super) handoff: Arc<Handoff>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) refresh_interval: Duration,
    in_flight: Arc<DashSet<String>>,
    events: broadcast::Sender<CatalogEvent>,
}

pub struct CatalogCacheBuilder {
    api: Arc<dyn CatalogApi>,
    products: Arc<dyn EntryStore<Product>>,
    categories: Arc<dyn EntryStore<Category>>,
    context: RenderContext,
    handoff: Option<Arc<Handoff>>,
    clock: Option<Arc<dyn Clock>>,
    refresh_interval: Duration,
}

impl CatalogCacheBuilder {
    pub fn new(
        api: Arc<dyn CatalogApi>,
        products: Arc<dyn EntryStore<Product>>,
        categories: Arc<dyn EntryStore<Category>>,
    ) -> Self {
        Self {
            api,
            products,
            categories,
            context: RenderContext::Client,
            handoff: None,
            clock: None,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }

    pub fn context(mut self, context: RenderContext) -> Self {
        self.context = context;
        self
    }

    pub fn handoff(mut self, handoff: Arc<Handoff>) -> Self {
        self.handoff = Some(handoff);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn refresh_interval(mut self, refresh_interval: Duration) -> Self {
        self.refresh_interval = refresh_interval;
        self
    }

    pub fn build(self) -> CatalogCache {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        CatalogCache {
            context: self.context,
            api: self.api,
            products: self.products,
            categories: self.categories,
            handoff: self.handoff.unwrap_or_default(),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            refresh_interval: self.refresh_interval,
            in_flight: Arc::new(DashSet::new()),
            events,
        }
    }
}

impl CatalogCache {
    pub fn builder(
        api: Arc<dyn CatalogApi>,
        products: Arc<dyn EntryStore<Product>>,
        categories: Arc<dyn EntryStore<Category>>,
    ) -> CatalogCacheBuilder {
        CatalogCacheBuilder::new(api, products, categories)
    }

    pub fn context(&self) -> RenderContext {
        self.context
    }

    pub fn handoff(&self) -> &Arc<Handoff> {
        &self.handoff
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }

    /// Force a refresh of `brand_id` when either of its lists is missing or stale.
    /// Returns whether a refresh ran.
    pub async fn refresh_if_stale(&self, brand_id: &str) -> bool {
        let now = self.clock.now();
        let products_due = self.is_due(self.products.get(brand_id).await, now);
        let categories_due = self.is_due(self.categories.get(brand_id).await, now);

        if !(products_due || categories_due) {
            debug!("Catalog for brand '{}' is fresh, skipping refresh", brand_id);
            return false;
        }

        info!("Catalog for brand '{}' is stale, refreshing", brand_id);
        self.force_refresh(brand_id).await;
        true
    }

    fn is_due<T>(&self, entry: Option<CacheEntry<T>>, now: TimestampMs) -> bool {
        entry.is_none_or(|e| e.is_stale(now, self.interval_ms()))
    }

    fn interval_ms(&self) -> u64 {
        self.refresh_interval.as_millis() as u64
    }

    fn publish(&self, event: CatalogEvent) {
        let event_type = event.event_type();
        match self.events.send(event) {
            Ok(subscriber_count) => {
                debug!("Broadcasted {} event to {} subscriber(s)", event_type, subscriber_count);
            }
            Err(_) => debug!("No subscribers for {} event", event_type),
        }
    }

    fn publish_failure(&self, resource: Resource, key: &str, reason: String) {
        self.publish(CatalogEvent::RefreshFailed(RefreshFailedEvent {
            resource,
            key: key.to_string(),
            reason,
            timestamp: self.clock.now(),
        }));
    }

    async fn fetch_list<T: Listing>(&self, brand_id: &str) -> Vec<T> {
        if self.context.is_server() {
            return self.fetch_list_for_render::<T>(brand_id).await;
        }

        let store = T::store(self);

        if let Some(entry) = store.get(brand_id).await {
            self.refresh_list_if_stale::<T>(brand_id, &entry);
            return entry.data.to_vec();
        }

        if let Some((data, captured_at)) = T::take_handoff(&self.handoff, brand_id) {
            let at = captured_at.unwrap_or_else(|| self.clock.now());
            let count = data.len();
            let adopted = CacheEntry::new(data, at, at);
            let seed: SeedFuture<T> = Box::pin(async move { Ok(adopted) });
            if let Ok(entry) = store.get_or_seed(brand_id, seed).await {
                debug!(
                    "Adopted handed-off {} for brand '{}' ({} item(s))",
                    T::RESOURCE.as_str(),
                    brand_id,
                    count
                );
                self.publish(T::updated_event(brand_id, count, UpdateSource::Handoff, at));
                self.refresh_list_if_stale::<T>(brand_id, &entry);
                return entry.data.to_vec();
            }
        }

        let api = Arc::clone(&self.api);
        let clock = Arc::clone(&self.clock);
        let events = self.events.clone();
        let key = brand_id.to_string();
        let seed: SeedFuture<T> = Box::pin(async move {
            let requested_at = clock.now();
            let data = T::fetch(api, key.clone()).await?;
            let refreshed_at = clock.now();
            let _ = events.send(T::updated_event(&key, data.len(), UpdateSource::Seed, refreshed_at));
            Ok(CacheEntry::new(data, requested_at, refreshed_at))
        });

        match store.get_or_seed(brand_id, seed).await {
            Ok(entry) => entry.data.to_vec(),
            Err(e) => {
                error!("Error fetching {} for brand '{}': {}", T::RESOURCE.as_str(), brand_id, e);
                Vec::new()
            }
        }
    }

    async fn fetch_list_for_render<T: Listing>(&self, brand_id: &str) -> Vec<T> {
        match T::fetch(Arc::clone(&self.api), brand_id.to_string()).await {
            Ok(data) => {
                T::record_handoff(&self.handoff, brand_id, &data, self.clock.now());
                data
            }
            Err(e) => {
                error!("Error fetching {} for brand '{}': {}", T::RESOURCE.as_str(), brand_id, e);
                Vec::new()
            }
        }
    }

    /// Write `data` unless the current entry came from a request issued later.
    async fn store_list<T: Listing>(
        &self,
        brand_id: &str,
        data: Vec<T>,
        requested_at: TimestampMs,
        source: UpdateSource,
    ) -> bool {
        let count = data.len();
        let refreshed_at = self.clock.now();
        let entry = CacheEntry::new(data, requested_at, refreshed_at);

        let written = T::store(self)
            .update(
                brand_id,
                Box::new(move |current| match current {
                    Some(existing) if existing.requested_at > entry.requested_at => None,
                    _ => Some(entry),
                }),
            )
            .await;

        if written {
            self.publish(T::updated_event(brand_id, count, source, refreshed_at));
        } else {
            debug!(
                "Discarded {} result for brand '{}': a newer request already landed",
                T::RESOURCE.as_str(),
                brand_id
            );
        }
        written
    }

    fn refresh_list_if_stale<T: Listing>(&self, brand_id: &str, entry: &CacheEntry<T>) {
        if !entry.is_stale(self.clock.now(), self.interval_ms()) {
            return;
        }

        let claim = format!("{}:{}", T::RESOURCE.as_str(), brand_id);
        if !self.in_flight.insert(claim.clone()) {
            debug!("Background refresh already running for {}", claim);
            return;
        }

        let cache = self.clone();
        let brand_id = brand_id.to_string();
        tokio::spawn(async move {
            let requested_at = cache.clock.now();
            match T::fetch(Arc::clone(&cache.api), brand_id.clone()).await {
                Ok(data) => {
                    if cache
                        .store_list::<T>(&brand_id, data, requested_at, UpdateSource::Background)
                        .await
                    {
                        info!("{} for brand '{}' refreshed in background", T::RESOURCE.as_str(), brand_id);
                    }
                }
                Err(e) => {
                    warn!(
                        "Error refreshing {} for brand '{}' in background: {}",
                        T::RESOURCE.as_str(),
                        brand_id,
                        e
                    );
                    cache.publish_failure(T::RESOURCE, &brand_id, e.to_string());
                }
            }
            cache.in_flight.remove(&claim);
        });
    }

    fn refresh_slug_in_background(&self, slug: &str) {
        let claim = format!("{}:{}", Resource::ProductBySlug.as_str(), slug);
        if !self.in_flight.insert(claim.clone()) {
            debug!("Background refresh already running for {}", claim);
            return;
        }

        let cache = self.clone();
        let slug = slug.to_string();
        tokio::spawn(async move {
            let requested_at = cache.clock.now();
            match cache.api.product_by_slug(&slug).await {
                Ok(SlugLookup {
                    correct: true,
                    product: Some(product),
                    ..
                }) => {
                    cache.patch_product(&slug, product, requested_at).await;
                }
                Ok(lookup) => {
                    warn!("Background refresh of product '{}' rejected: {}", slug, lookup.message);
                    cache.publish_failure(Resource::ProductBySlug, &slug, lookup.message);
                }
                Err(e) => {
                    warn!("Error refreshing product '{}' in background: {}", slug, e);
                    cache.publish_failure(Resource::ProductBySlug, &slug, e.to_string());
                }
            }
            cache.in_flight.remove(&claim);
        });
    }

    /// Replace the record matching `slug` in every product entry that holds it.
    /// A patched entry takes the lookup's `requested_at` when that is newer, so a
    /// whole-list result issued before the lookup can no longer overwrite it.
    async fn patch_product(&self, slug: &str, product: Product, requested_at: TimestampMs) {
        let mut patched = Vec::new();

        for (brand_id, _) in self.products.entries().await {
            let refreshed_at = self.clock.now();
            let replacement = product.clone();
            let target = slug.to_string();
            let written = self
                .products
                .update(
                    &brand_id,
                    Box::new(move |current| {
                        let existing = current?;
                        if existing.requested_at > requested_at {
                            return None;
                        }
                        let index = existing.data.iter().position(|p| p.slug == target)?;
                        let mut data = existing.data.as_ref().clone();
                        data[index] = replacement;
                        Some(CacheEntry {
                            data: Arc::new(data),
                            refreshed_at,
                            requested_at: existing.requested_at.max(requested_at),
                        })
                    }),
                )
                .await;

            if written {
                patched.push(brand_id);
            }
        }

        if patched.is_empty() {
            debug!("Product '{}' no longer cached, nothing to patch", slug);
            return;
        }

        info!("Product '{}' refreshed in background in {} list(s)", slug, patched.len());
        self.publish(CatalogEvent::ProductPatched(ProductPatchedEvent {
            slug: slug.to_string(),
            brand_ids: patched,
            timestamp: self.clock.now(),
        }));
    }

    async fn force_list<T: Listing>(&self, brand_id: &str, requested_at: TimestampMs) -> Vec<T> {
        match T::fetch(Arc::clone(&self.api), brand_id.to_string()).await {
            Ok(data) => {
                if self
                    .store_list::<T>(brand_id, data.clone(), requested_at, UpdateSource::Forced)
                    .await
                {
                    return data;
                }
                self.cached_or_empty::<T>(brand_id).await
            }
            Err(e) => {
                error!(
                    "Error forcing refresh of {} for brand '{}': {}",
                    T::RESOURCE.as_str(),
                    brand_id,
                    e
                );
                self.publish_failure(T::RESOURCE, brand_id, e.to_string());
                self.cached_or_empty::<T>(brand_id).await
            }
        }
    }

    async fn cached_or_empty<T: Listing>(&self, brand_id: &str) -> Vec<T> {
        T::store(self)
            .get(brand_id)
            .await
            .map(|entry| entry.data.to_vec())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogCache")
            .field("context", &self.context)
            .field("refresh_interval", &self.refresh_interval)
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

#[async_trait]
impl CatalogOperations for CatalogCache {
    async fn fetch_products(&self, brand_id: &str) -> Vec<Product> {
        self.fetch_list::<Product>(brand_id).await
    }

    async fn fetch_categories(&self, brand_id: &str) -> Vec<Category> {
        self.fetch_list::<Category>(brand_id).await
    }

    /// Cached lists first (client only), then the handoff, then the by-slug endpoint.
    async fn fetch_product_by_slug(&self, slug: &str) -> SlugLookup {
        if !self.context.is_server() {
            let now = self.clock.now();
            for (_, entry) in self.products.entries().await {
                if let Some(product) = entry.data.iter().find(|p| p.slug == slug) {
                    if entry.is_stale(now, self.interval_ms()) {
                        self.refresh_slug_in_background(slug);
                    }
                    return SlugLookup::found(product.clone(), FOUND_IN_CACHE);
                }
            }
        }

        if let Some(product) = self.handoff.find_product(slug) {
            return SlugLookup::found(product, FOUND_IN_CACHE);
        }

        match self.api.product_by_slug(slug).await {
            Ok(lookup) => lookup,
            Err(e) => {
                error!("Error fetching product '{}': {}", slug, e);
                SlugLookup::failed(LOOKUP_FAILED)
            }
        }
    }

    async fn force_refresh(&self, brand_id: &str) -> ForcedRefresh {
        let requested_at = self.clock.now();
        let (products, categories) = tokio::join!(
            self.force_list::<Product>(brand_id, requested_at),
            self.force_list::<Category>(brand_id, requested_at),
        );
        ForcedRefresh {
            products,
            categories,
        }
    }
}
