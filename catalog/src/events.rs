use crate::domain::Resource;
use serde::{Deserialize, Serialize};
use shared::TimestampMs;

/// Pushed to subscribers whenever the cache changes or a refresh fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogEvent {
    ProductsUpdated(ListUpdatedEvent),
    CategoriesUpdated(ListUpdatedEvent),
    ProductPatched(ProductPatchedEvent),
    RefreshFailed(RefreshFailedEvent),
}

impl CatalogEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            CatalogEvent::ProductsUpdated(_) => "products_updated",
            CatalogEvent::CategoriesUpdated(_) => "categories_updated",
            CatalogEvent::ProductPatched(_) => "product_patched",
            CatalogEvent::RefreshFailed(_) => "refresh_failed",
        }
    }

    /// Brand id for list events, slug for patches, the failed key for failures.
    pub fn key(&self) -> &str {
        match self {
            CatalogEvent::ProductsUpdated(e) | CatalogEvent::CategoriesUpdated(e) => &e.brand_id,
            CatalogEvent::ProductPatched(e) => &e.slug,
            CatalogEvent::RefreshFailed(e) => &e.key,
        }
    }
}

/// What caused a list entry to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateSource {
    Seed,
    Handoff,
    Background,
    Forced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListUpdatedEvent {
    pub brand_id: String,
    pub count: usize,
    pub source: UpdateSource,
    pub timestamp: TimestampMs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPatchedEvent {
    pub slug: String,
    pub brand_ids: Vec<String>,
    pub timestamp: TimestampMs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshFailedEvent {
    pub resource: Resource,
    pub key: String,
    pub reason: String,
    pub timestamp: TimestampMs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let event = CatalogEvent::ProductsUpdated(ListUpdatedEvent {
            brand_id: "B1".into(),
            count: 3,
            source: UpdateSource::Background,
            timestamp: TimestampMs(6000),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "products_updated");
        assert_eq!(json["source"], "background");
        assert_eq!(json["timestamp"], 6000);
        assert_eq!(event.event_type(), "products_updated");
        assert_eq!(event.key(), "B1");
    }

    #[test]
    fn test_failure_key() {
        let event = CatalogEvent::RefreshFailed(RefreshFailedEvent {
            resource: Resource::ProductBySlug,
            key: "ivermectina".into(),
            reason: "timeout".into(),
            timestamp: TimestampMs(1),
        });
        assert_eq!(event.key(), "ivermectina");
        assert_eq!(event.event_type(), "refresh_failed");
    }
}
