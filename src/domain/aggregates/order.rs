//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, str::FromStr};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::aggregates::{Coupon, Product};
use crate::domain::events::OrderEvent;
use crate::StorefrontError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Pending, Processing, Shipped, Delivered, Cancelled }

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [Self::Pending, Self::Processing, Self::Shipped, Self::Delivered, Self::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool { matches!(self, Self::Delivered | Self::Cancelled) }

    /// Forward moves along pending -> processing -> shipped -> delivered, or cancellation
    /// from any non-terminal status.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        match (self, next) {
            (s, _) if s.is_terminal() => false,
            (_, Self::Cancelled) => true,
            (Self::Pending, Self::Processing | Self::Shipped | Self::Delivered) => true,
            (Self::Processing, Self::Shipped | Self::Delivered) => true,
            (Self::Shipped, Self::Delivered) => true,
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = StorefrontError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| StorefrontError::Validation(format!("unknown order status {s}")))
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = StorefrontError;
    fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: Uuid,
    pub title: String,
    pub quantity: i32,
    /// Unit price charged, captured at checkout.
    pub price: Decimal,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl OrderLine {
    pub fn line_total(&self) -> Decimal { self.price * Decimal::from(self.quantity) }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 5, max = 20))]
    pub phone: String,
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub order_number: String,
    #[sqlx(json)]
    pub products: Vec<OrderLine>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    #[sqlx(json)]
    pub shipping_info: ShippingInfo,
    /// Absent for guest checkouts.
    #[serde(default)]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn item_count(&self) -> i32 { self.products.iter().map(|l| l.quantity).sum() }
    pub fn is_guest(&self) -> bool { self.user_id.is_none() }
    pub fn counts_as_revenue(&self) -> bool { self.status != OrderStatus::Cancelled }

    pub fn transition_to(&mut self, next: OrderStatus) -> Result<OrderEvent, StorefrontError> {
        if !self.status.can_transition_to(next) {
            return Err(StorefrontError::InvalidStatusTransition { from: self.status, to: next });
        }
        let from = self.status;
        self.status = next;
        self.updated_at = Utc::now();
        Ok(OrderEvent::StatusChanged { order: Box::new(self.clone()), from })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 99))]
    pub quantity: i32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "has_items"))]
pub struct NewOrder {
    #[validate]
    pub products: Vec<OrderItemRequest>,
    #[validate]
    pub shipping_info: ShippingInfo,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

fn has_items(order: &NewOrder) -> Result<(), ValidationError> {
    if order.products.is_empty() { return Err(ValidationError::new("empty_order")); }
    Ok(())
}

impl NewOrder {
    /// Prices the request against the current catalog. Unit prices always come from
    /// `catalog`, never from the client.
    pub fn price(
        self,
        catalog: &HashMap<Uuid, Product>,
        coupon: Option<&Coupon>,
        now: DateTime<Utc>,
    ) -> Result<Order, StorefrontError> {
        let mut requested: HashMap<Uuid, i32> = HashMap::new();
        let mut lines = Vec::with_capacity(self.products.len());
        for item in self.products {
            let product = catalog
                .get(&item.product_id)
                .filter(|p| p.is_active)
                .ok_or(StorefrontError::not_found("Product"))?;
            check_option(item.size.as_deref(), &product.sizes, |s| product.has_size(s), "size")?;
            let colors: Vec<String> = product.colors.iter().map(|c| c.name.clone()).collect();
            check_option(item.color.as_deref(), &colors, |c| product.has_color(c), "color")?;

            let total = requested.entry(product.id).or_insert(0);
            *total += item.quantity;
            if *total > product.stock {
                return Err(StorefrontError::InsufficientStock { product_id: product.id.to_string() });
            }
            lines.push(OrderLine {
                product_id: product.id, title: product.title.clone(), quantity: item.quantity,
                price: product.price, size: item.size, color: item.color,
                image: product.primary_image().map(str::to_string),
            });
        }

        let subtotal: Decimal = lines.iter().map(OrderLine::line_total).sum();
        let discount = match coupon {
            Some(c) => c.discount_for(subtotal, now)?,
            None => Decimal::ZERO,
        };
        Ok(Order {
            id: Uuid::now_v7(),
            order_number: format!("ORD-{:08}", rand::random::<u32>() % 100_000_000),
            products: lines, subtotal, discount, total: subtotal - discount,
            coupon_code: coupon.map(|c| c.code.clone()), status: OrderStatus::Pending,
            shipping_info: self.shipping_info, user_id: self.user_id, created_at: now, updated_at: now,
        })
    }
}

fn check_option(
    chosen: Option<&str>,
    offered: &[String],
    matches: impl Fn(&str) -> bool,
    facet: &str,
) -> Result<(), StorefrontError> {
    match chosen {
        Some(value) if !offered.is_empty() && !matches(value) => {
            Err(StorefrontError::Validation(format!("{facet} {value} is not offered")))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{DiscountType, NewCoupon};

    fn shipping() -> ShippingInfo {
        ShippingInfo {
            name: "Rahim Uddin".into(), email: "rahim@example.com".into(), phone: "01700000000".into(),
            address: "12 Lake Road".into(), city: "Dhaka".into(), postal_code: None, country: None,
        }
    }

    fn catalog() -> (Uuid, HashMap<Uuid, Product>) {
        let mut p = Product::new("Widget", Decimal::new(10, 0), "gadgets");
        p.stock = 3;
        p.sizes = vec!["M".into(), "L".into()];
        (p.id, HashMap::from([(p.id, p)]))
    }

    fn request(id: Uuid, quantity: i32) -> NewOrder {
        NewOrder {
            products: vec![OrderItemRequest { product_id: id, quantity, size: Some("m".into()), color: None }],
            shipping_info: shipping(), coupon_code: None, user_id: Some("user-1".into()),
        }
    }

    #[test]
    fn test_order_workflow() {
        let (id, catalog) = catalog();
        let mut order = request(id, 2).price(&catalog, None, Utc::now()).unwrap();
        assert_eq!(order.subtotal, Decimal::new(20, 0));
        assert_eq!(order.item_count(), 2);
        assert_eq!(order.status, OrderStatus::Pending);
        order.transition_to(OrderStatus::Processing).unwrap();
        order.transition_to(OrderStatus::Shipped).unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        order.transition_to(OrderStatus::Delivered).unwrap();
        assert!(matches!(
            order.transition_to(OrderStatus::Cancelled),
            Err(StorefrontError::InvalidStatusTransition { .. })
        ));
    }

    #[test]
    fn test_same_status_is_rejected() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_price_applies_coupon_and_checks_stock() {
        let (id, catalog) = catalog();
        let coupon = NewCoupon {
            code: "TEN".into(), discount_type: DiscountType::Percentage, discount_value: Decimal::new(10, 0),
            min_order_amount: None, max_discount_amount: None, expires_at: None, usage_limit: None,
        }.into_coupon().unwrap();
        let order = request(id, 3).price(&catalog, Some(&coupon), Utc::now()).unwrap();
        assert_eq!(order.discount, Decimal::new(3, 0));
        assert_eq!(order.total, Decimal::new(27, 0));
        assert_eq!(order.coupon_code.as_deref(), Some("TEN"));
        assert!(order.order_number.starts_with("ORD-"));

        assert!(matches!(
            request(id, 4).price(&catalog, None, Utc::now()),
            Err(StorefrontError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_size() {
        let (id, catalog) = catalog();
        let mut req = request(id, 1);
        req.products[0].size = Some("XXL".into());
        assert!(matches!(req.price(&catalog, None, Utc::now()), Err(StorefrontError::Validation(_))));
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("lost".parse::<OrderStatus>().is_err());
    }
}
