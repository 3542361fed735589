pub mod catalog_ops;
pub mod events;
pub mod health;
pub mod render;
pub mod visibility;

pub use catalog_ops::{force_refresh, get_categories, get_product_by_slug, get_products};
pub use events::stream_events;
pub use health::health_check;
pub use render::render_brand;
pub use visibility::set_visibility;
