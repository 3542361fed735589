use catalog::ProductFilter;
use serde::Deserialize;

/// Query string of `GET /api/brands/{brand}/products`
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    /// Comma separated category ids
    #[serde(default)]
    pub categories: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
}

impl ProductsQuery {
    pub fn to_filter(&self) -> ProductFilter {
        let mut filter = ProductFilter::new().with_categories(split_csv(self.categories.as_deref()));
        if let Some(q) = &self.q {
            filter = filter.with_query(q.as_str());
        }
        filter
    }
}

/// Query string of `GET /events`, e.g. `?type=products_updated,refresh_failed&key=B1`
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
}

impl EventsQuery {
    pub fn event_types(&self) -> Vec<String> {
        split_csv(self.event_type.as_deref())
    }

    pub fn keys(&self) -> Vec<String> {
        split_csv(self.key.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub visible: bool,
}

fn split_csv(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
