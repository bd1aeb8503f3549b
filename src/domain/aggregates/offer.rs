//! Offer Aggregate
//!
//! Admin-configured promotional banner or popup with its own validity window.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::aggregates::coupon::DiscountType;
use crate::domain::aggregates::product::{non_negative, Product};
use crate::StorefrontError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferKind { #[default] Banner, Popup }

impl OfferKind {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Banner => "banner", Self::Popup => "popup" }
    }
}

impl FromStr for OfferKind {
    type Err = StorefrontError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "banner" => Ok(Self::Banner),
            "popup" => Ok(Self::Popup),
            other => Err(StorefrontError::Validation(format!("unknown offer kind {other}"))),
        }
    }
}

impl TryFrom<String> for OfferKind {
    type Error = StorefrontError;
    fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub kind: OfferKind,
    #[sqlx(try_from = "String")]
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    /// Empty means the offer covers the whole catalog.
    #[serde(default)]
    pub target_products: Vec<Uuid>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Offer {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.start_date <= now && now <= self.end_date
    }

    pub fn applies_to(&self, product_id: Uuid) -> bool {
        self.target_products.is_empty() || self.target_products.contains(&product_id)
    }

    /// Price of `product` under this offer, or `None` when the offer does not cover it at `now`.
    pub fn sale_price(&self, product: &Product, now: DateTime<Utc>) -> Option<Decimal> {
        if !self.is_live(now) || !self.applies_to(product.id) { return None; }
        Some(product.price - self.discount_type.discount(self.discount_value, product.price))
    }

    /// Time left before the offer closes; zero once it has ended.
    pub fn remaining(&self, now: DateTime<Utc>) -> chrono::Duration {
        (self.end_date - now).max(chrono::Duration::zero())
    }

    pub fn toggle(&mut self) { self.is_active = !self.is_active; }
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "window_is_ordered"))]
pub struct NewOffer {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub kind: OfferKind,
    pub discount_type: DiscountType,
    #[validate(custom = "non_negative")]
    pub discount_value: Decimal,
    #[serde(default)]
    pub target_products: Vec<Uuid>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

fn window_is_ordered(offer: &NewOffer) -> Result<(), ValidationError> {
    if offer.end_date <= offer.start_date {
        return Err(ValidationError::new("end_date_before_start_date"));
    }
    Ok(())
}

impl NewOffer {
    pub fn into_offer(self) -> Offer {
        Offer {
            id: Uuid::now_v7(), title: self.title, description: self.description, kind: self.kind,
            discount_type: self.discount_type, discount_value: self.discount_value,
            target_products: self.target_products, start_date: self.start_date, end_date: self.end_date,
            is_active: self.is_active.unwrap_or(true), created_at: Utc::now(),
        }
    }

    /// Overwrites the editable fields of an existing offer.
    pub fn apply_to(self, offer: &mut Offer) {
        let (id, created_at, was_active) = (offer.id, offer.created_at, offer.is_active);
        let explicit = self.is_active;
        *offer = self.into_offer();
        offer.id = id;
        offer.created_at = created_at;
        offer.is_active = explicit.unwrap_or(was_active);
    }
}
