//! Facet filters shared by every listing path.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::aggregates::{ColorOption, Product};

/// Facet selection emitted by the filter panel. Empty fields are inactive.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
}

impl FilterState {
    /// Number of facets holding a non-empty, non-default value.
    pub fn active_count(&self) -> usize {
        [
            self.min_price.is_some_and(|p| p > Decimal::ZERO),
            self.max_price.is_some(),
            self.min_rating.is_some_and(|r| r > 0.0),
            self.sizes.as_ref().is_some_and(|s| !s.is_empty()),
            self.colors.as_ref().is_some_and(|c| !c.is_empty()),
            self.in_stock == Some(true),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    pub fn is_empty(&self) -> bool { self.active_count() == 0 }

    pub fn clear(&mut self) { *self = Self::default(); }

    pub fn matches(&self, product: &Product) -> bool {
        if self.min_price.is_some_and(|min| product.price < min) { return false; }
        if self.max_price.is_some_and(|max| product.price > max) { return false; }
        if self.min_rating.is_some_and(|min| product.average_rating.unwrap_or(0.0) < min) { return false; }
        if let Some(sizes) = self.sizes.as_ref().filter(|s| !s.is_empty()) {
            if !sizes.iter().any(|s| product.has_size(s)) { return false; }
        }
        if let Some(colors) = self.colors.as_ref().filter(|c| !c.is_empty()) {
            if !colors.iter().any(|c| product.has_color(c)) { return false; }
        }
        if self.in_stock == Some(true) && !product.is_in_stock() { return false; }
        true
    }
}

/// Products satisfying every active facet, in input order.
pub fn apply_filters(products: &[Product], filters: &FilterState) -> Vec<Product> {
    products.iter().filter(|p| filters.matches(p)).cloned().collect()
}

/// Values the filter panel can offer, computed from the active catalog.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub sizes: Vec<String>,
    pub colors: Vec<ColorOption>,
    pub categories: Vec<String>,
    pub min_price: Decimal,
    pub max_price: Decimal,
}

impl FilterOptions {
    pub fn from_products(products: &[Product]) -> Self {
        let mut sizes = BTreeSet::new();
        let mut color_names = BTreeSet::new();
        let mut colors = Vec::new();
        let mut categories = BTreeSet::new();
        for p in products {
            sizes.extend(p.sizes.iter().cloned());
            categories.insert(p.category.clone());
            for c in &p.colors {
                if color_names.insert(c.name.to_lowercase()) { colors.push(c.clone()); }
            }
        }
        colors.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Self {
            sizes: sizes.into_iter().collect(),
            colors,
            categories: categories.into_iter().collect(),
            min_price: products.iter().map(|p| p.price).min().unwrap_or_default(),
            max_price: products.iter().map(|p| p.price).max().unwrap_or_default(),
        }
    }
}
