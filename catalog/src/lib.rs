pub mod clock;
pub mod domain;
pub mod events;
pub mod filter;
pub mod handoff;
pub mod planes;
pub mod ports;

pub use clock::{ManualClock, SystemClock};
pub use domain::response::{ForcedRefresh, SlugLookup};
pub use domain::{CacheEntry, Category, Product, RenderContext, Resource, StockState};
pub use events::CatalogEvent;
pub use filter::ProductFilter;
pub use handoff::{Handoff, HandoffSnapshot};
pub use planes::control::{RefreshScheduler, SchedulerHandle, Visibility};
pub use planes::data::{CatalogCache, CatalogOperations};
