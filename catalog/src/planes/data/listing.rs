use crate::domain::{Category, Product, Resource};
use crate::events::{CatalogEvent, ListUpdatedEvent, UpdateSource};
use crate::handoff::Handoff;
use crate::ports::{CatalogApi, EntryStore};
use futures::future::BoxFuture;
use shared::{Result, TimestampMs};
use std::sync::Arc;

use super::CatalogCache;

/// A brand-scoped list resource the cache serves. Products and categories share one
/// state machine; this trait supplies the parts that differ.
pub(crate) trait Listing: Clone + Send + Sync + 'static {
    const RESOURCE: Resource;

    fn store(cache: &CatalogCache) -> &Arc<dyn EntryStore<Self>>;

    fn fetch(api: Arc<dyn CatalogApi>, brand_id: String) -> BoxFuture<'static, Result<Vec<Self>>>;

    fn take_handoff(handoff: &Handoff, brand_id: &str) -> Option<(Vec<Self>, Option<TimestampMs>)>;

    fn record_handoff(handoff: &Handoff, brand_id: &str, data: &[Self], at: TimestampMs);

    fn updated(event: ListUpdatedEvent) -> CatalogEvent;

    fn updated_event(
        brand_id: &str,
        count: usize,
        source: UpdateSource,
        timestamp: TimestampMs,
    ) -> CatalogEvent {
        Self::updated(ListUpdatedEvent {
            brand_id: brand_id.to_string(),
            count,
            source,
            timestamp,
        })
    }
}

impl Listing for Product {
    const RESOURCE: Resource = Resource::Products;

    fn store(cache: &CatalogCache) -> &Arc<dyn EntryStore<Self>> {
        &cache.products
    }

    fn fetch(api: Arc<dyn CatalogApi>, brand_id: String) -> BoxFuture<'static, Result<Vec<Self>>> {
        Box::pin(async move { api.products(&brand_id).await })
    }

    fn take_handoff(handoff: &Handoff, brand_id: &str) -> Option<(Vec<Self>, Option<TimestampMs>)> {
        handoff.take_products(brand_id)
    }

    fn record_handoff(handoff: &Handoff, brand_id: &str, data: &[Self], at: TimestampMs) {
        handoff.record_products(brand_id, data, at);
    }

    fn updated(event: ListUpdatedEvent) -> CatalogEvent {
        CatalogEvent::ProductsUpdated(event)
    }
}

impl Listing for Category {
    const RESOURCE: Resource = Resource::Categories;

    fn store(cache: &CatalogCache) -> &Arc<dyn EntryStore<Self>> {
        &cache.categories
    }

    fn fetch(api: Arc<dyn CatalogApi>, brand_id: String) -> BoxFuture<'static, Result<Vec<Self>>> {
        Box::pin(async move { api.categories(&brand_id).await })
    }

    fn take_handoff(handoff: &Handoff, brand_id: &str) -> Option<(Vec<Self>, Option<TimestampMs>)> {
        handoff.take_categories(brand_id)
    }

    fn record_handoff(handoff: &Handoff, brand_id: &str, data: &[Self], at: TimestampMs) {
        handoff.record_categories(brand_id, data, at);
    }

    fn updated(event: ListUpdatedEvent) -> CatalogEvent {
        CatalogEvent::CategoriesUpdated(event)
    }
}
