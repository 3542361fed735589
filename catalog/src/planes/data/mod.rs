pub mod catalog_cache;
mod listing;
pub mod operation;

pub use catalog_cache::{CatalogCache, CatalogCacheBuilder, DEFAULT_REFRESH_INTERVAL};
pub use operation::CatalogOperations;
