use catalog::{Product, SlugLookup};
use serde::Deserialize;

/// Body of the list endpoints: `{ "data": [...] }`
#[derive(Debug, Deserialize)]
pub struct ListEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// Body of the by-slug endpoint
#[derive(Debug, Deserialize)]
pub struct SlugEnvelope {
    #[serde(default)]
    pub correcto: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<Product>,
}

impl From<SlugEnvelope> for SlugLookup {
    fn from(envelope: SlugEnvelope) -> Self {
        SlugLookup {
            correct: envelope.correcto && envelope.data.is_some(),
            message: envelope.message,
            product: envelope.data,
        }
    }
}
