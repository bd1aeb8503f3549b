//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::StorefrontError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price in USD.
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    pub stock: i32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    #[sqlx(json)]
    pub colors: Vec<ColorOption>,
    /// Category slug.
    pub category: String,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub total_reviews: Option<i32>,
    #[serde(default)]
    pub views: Option<i64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorOption {
    pub name: String,
    /// CSS color value, e.g. `#1e3a8a`.
    pub value: String,
}

fn default_active() -> bool { true }

impl Product {
    pub fn new(title: impl Into<String>, price: Decimal, category: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), title: title.into(), description: None, price, original_price: None,
            stock: 0, images: vec![], image: None, sizes: vec![], colors: vec![], category: category.into(),
            average_rating: None, total_reviews: None, views: None, is_active: true,
            created_at: now, updated_at: now,
        }
    }

    pub fn is_in_stock(&self) -> bool { self.stock > 0 }

    /// First gallery image, falling back to the single `image` field.
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str).or(self.image.as_deref())
    }

    /// Whole-number discount percentage when `original_price` exceeds `price`.
    pub fn discount_percent(&self) -> Option<Decimal> {
        let original = self.original_price?;
        if original <= self.price || original <= Decimal::ZERO { return None; }
        let pct = (original - self.price) / original * Decimal::ONE_HUNDRED;
        Some(pct.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
    }

    pub fn has_size(&self, size: &str) -> bool {
        self.sizes.iter().any(|s| s.eq_ignore_ascii_case(size))
    }

    pub fn has_color(&self, color: &str) -> bool {
        self.colors.iter().any(|c| c.name.eq_ignore_ascii_case(color))
    }

    pub fn reserve_stock(&mut self, qty: i32) -> Result<(), StorefrontError> {
        if qty <= 0 { return Err(StorefrontError::Validation("quantity must be positive".into())); }
        if qty > self.stock {
            return Err(StorefrontError::InsufficientStock { product_id: self.id.to_string() });
        }
        self.stock -= qty;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

/// Create/update payload for a product.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    #[validate(custom = "non_negative")]
    pub price: Decimal,
    #[validate(custom = "non_negative")]
    pub original_price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock: i32,
    #[serde(default)]
    pub images: Vec<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<ColorOption>,
    #[validate(length(min = 1))]
    pub category: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl NewProduct {
    pub fn into_product(self) -> Product {
        let mut p = Product::new(String::new(), self.price, String::new());
        self.apply_to(&mut p);
        p
    }

    /// Overwrites the editable fields of `product`, keeping id, ratings, views and creation time.
    pub fn apply_to(self, product: &mut Product) {
        product.title = self.title;
        product.description = self.description;
        product.price = self.price;
        product.original_price = self.original_price;
        product.stock = self.stock;
        product.images = self.images;
        product.image = self.image;
        product.sizes = self.sizes;
        product.colors = self.colors;
        product.category = self.category;
        product.is_active = self.is_active;
        product.touch();
    }
}

pub(crate) fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("negative_amount"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_discount_percent() {
        let mut p = Product::new("Linen Shirt", Decimal::new(75, 0), "shirts");
        assert_eq!(p.discount_percent(), None);
        p.original_price = Some(Decimal::new(100, 0));
        assert_eq!(p.discount_percent(), Some(Decimal::new(25, 0)));
        p.original_price = Some(Decimal::new(50, 0));
        assert_eq!(p.discount_percent(), None);
    }
    #[test]
    fn test_reserve_stock() {
        let mut p = Product::new("Cap", Decimal::new(12, 0), "hats");
        p.stock = 3;
        p.reserve_stock(2).unwrap();
        assert_eq!(p.stock, 1);
        assert!(matches!(p.reserve_stock(2), Err(StorefrontError::InsufficientStock { .. })));
    }
    #[test]
    fn test_new_product_rejects_negative_price() {
        let json = serde_json::json!({"title": "Mug", "price": -1.0, "stock": 1, "category": "home"});
        let input: NewProduct = serde_json::from_value(json).unwrap();
        assert!(input.validate().is_err());
    }
    #[test]
    fn test_wire_format_uses_underscore_id() {
        let p = Product::new("Mug", Decimal::new(8, 0), "home");
        let v = serde_json::to_value(&p).unwrap();
        assert!(v.get("_id").is_some());
        assert!(v.get("createdAt").is_some());
        assert!(v.get("originalPrice").is_some());
    }
}
