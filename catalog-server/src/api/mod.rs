pub mod requests;
pub mod responses;

pub use requests::{EventsQuery, ProductsQuery, VisibilityRequest};
pub use responses::{HealthResponse, RenderResponse, VisibilityResponse};
