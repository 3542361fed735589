//! Product list filtering: category selection plus free-text search on code and name.

use crate::domain::Product;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub query: Option<String>,
}

impl ProductFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Select `category_id` if it was not selected, deselect it otherwise.
    /// Returns whether it is selected afterwards.
    pub fn toggle_category(&mut self, category_id: &str) -> bool {
        if let Some(index) = self.categories.iter().position(|c| c == category_id) {
            self.categories.remove(index);
            false
        } else {
            self.categories.push(category_id.to_string());
            true
        }
    }

    pub fn clear_categories(&mut self) {
        self.categories.clear();
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.matches_category(product) && self.matches_query(product)
    }

    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        products
            .iter()
            .filter(|p| self.matches(p))
            .cloned()
            .collect()
    }

    fn matches_category(&self, product: &Product) -> bool {
        self.categories.is_empty() || self.categories.iter().any(|c| *c == product.category_id)
    }

    fn matches_query(&self, product: &Product) -> bool {
        let Some(needle) = self.normalized_query() else {
            return true;
        };
        product.code.to_lowercase().contains(&needle) || product.name.to_lowercase().contains(&needle)
    }

    fn normalized_query(&self) -> Option<String> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }
}
