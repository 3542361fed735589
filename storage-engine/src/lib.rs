pub mod moka_store;

pub use moka_store::MokaEntryStore;

use catalog::ports::EntryStore;
use catalog::{Category, Product};
use std::sync::Arc;

/// Product and category stores sharing one capacity setting.
pub fn catalog_stores(
    max_brands: Option<u64>,
) -> (Arc<dyn EntryStore<Product>>, Arc<dyn EntryStore<Category>>) {
    (
        Arc::new(MokaEntryStore::new("products", max_brands)),
        Arc::new(MokaEntryStore::new("categories", max_brands)),
    )
}
