use crate::domain::response::{ForcedRefresh, SlugLookup};
use crate::domain::{Category, Product};
use async_trait::async_trait;

/// Read-side catalog operations.
///
/// None of these fail: list reads degrade to an empty list, by-slug reads report failure
/// inside [`SlugLookup`], and a forced refresh falls back to whatever is cached.
#[async_trait]
pub trait CatalogOperations: Send + Sync + 'static {
    async fn fetch_products(&self, brand_id: &str) -> Vec<Product>;

    async fn fetch_categories(&self, brand_id: &str) -> Vec<Category>;

    async fn fetch_product_by_slug(&self, slug: &str) -> SlugLookup;

    async fn force_refresh(&self, brand_id: &str) -> ForcedRefresh;
}
