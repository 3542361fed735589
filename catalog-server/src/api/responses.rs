use catalog::{Category, Product};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub message: String,
}

/// Body of `GET /render/{brand}`. `handoff` is the blob a client session starts from.
#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub handoff: String,
}

#[derive(Debug, Serialize)]
pub struct VisibilityResponse {
    pub visible: bool,
}
