//! Domain events
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{Order, OrderStatus};

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum DomainEvent {
    Product(ProductEvent),
    Order(OrderEvent),
    Review(ReviewEvent),
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductEvent {
    Created { product_id: Uuid },
    LowStock { product_id: Uuid, title: String, stock: i32 },
    OutOfStock { product_id: Uuid, title: String },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order: Box<Order> },
    StatusChanged { order: Box<Order>, from: OrderStatus },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReviewEvent {
    Created { review_id: Uuid, product_id: Uuid },
    Replied { review_id: Uuid, product_id: Uuid },
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Product(ProductEvent::Created { .. }) => "storefront.product.created",
            Self::Product(ProductEvent::LowStock { .. }) => "storefront.product.low_stock",
            Self::Product(ProductEvent::OutOfStock { .. }) => "storefront.product.out_of_stock",
            Self::Order(OrderEvent::Placed { .. }) => "storefront.order.placed",
            Self::Order(OrderEvent::StatusChanged { .. }) => "storefront.order.status_changed",
            Self::Review(ReviewEvent::Created { .. }) => "storefront.review.created",
            Self::Review(ReviewEvent::Replied { .. }) => "storefront.review.replied",
        }
    }
}

impl From<OrderEvent> for DomainEvent {
    fn from(e: OrderEvent) -> Self { Self::Order(e) }
}

impl From<ProductEvent> for DomainEvent {
    fn from(e: ProductEvent) -> Self { Self::Product(e) }
}

impl From<ReviewEvent> for DomainEvent {
    fn from(e: ReviewEvent) -> Self { Self::Review(e) }
}
