//! Cart Aggregate
//!
//! Shopper-side cart. Lines are keyed by product plus the chosen size and color.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::{Coupon, CouponError, OrderItemRequest, Product};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,
    coupon: Option<AppliedCoupon>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: Uuid,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
    pub image: Option<String>,
    /// Stock seen when the line was last touched; quantities are clamped to it.
    pub max_quantity: u32,
}

impl CartLine {
    pub fn from_product(product: &Product, quantity: u32, size: Option<String>, color: Option<String>) -> Self {
        Self {
            product_id: product.id, title: product.title.clone(), unit_price: product.price, quantity,
            size, color, image: product.primary_image().map(str::to_string),
            max_quantity: u32::try_from(product.stock).unwrap_or(0),
        }
    }

    pub fn line_total(&self) -> Decimal { self.unit_price * Decimal::from(self.quantity) }

    fn same_variant(&self, product_id: Uuid, size: Option<&str>, color: Option<&str>) -> bool {
        self.product_id == product_id && self.size.as_deref() == size && self.color.as_deref() == color
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppliedCoupon {
    coupon: Coupon,
    discount: Decimal,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    pub fn lines(&self) -> &[CartLine] { &self.lines }
    pub fn item_count(&self) -> u32 { self.lines.iter().map(|l| l.quantity).sum() }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }
    pub fn subtotal(&self) -> Decimal { self.lines.iter().map(CartLine::line_total).sum() }
    pub fn discount(&self) -> Decimal { self.coupon.as_ref().map_or(Decimal::ZERO, |c| c.discount) }
    pub fn total(&self) -> Decimal { (self.subtotal() - self.discount()).max(Decimal::ZERO) }
    pub fn coupon_code(&self) -> Option<&str> { self.coupon.as_ref().map(|c| c.coupon.code.as_str()) }

    /// Adds a line, merging with an existing line of the same variant. Returns the resulting quantity.
    pub fn add_item(&mut self, item: CartLine) -> Result<u32, CartError> {
        if item.max_quantity == 0 { return Err(CartError::OutOfStock); }
        if item.quantity == 0 { return Err(CartError::InvalidQuantity); }
        let qty = match self.lines.iter_mut().find(|l| l.same_variant(item.product_id, item.size.as_deref(), item.color.as_deref())) {
            Some(existing) => {
                existing.max_quantity = item.max_quantity;
                existing.quantity = (existing.quantity + item.quantity).min(existing.max_quantity);
                existing.quantity
            }
            None => {
                let qty = item.quantity.min(item.max_quantity);
                self.lines.push(CartLine { quantity: qty, ..item });
                qty
            }
        };
        self.recalculate();
        Ok(qty)
    }

    /// Sets a line's quantity; zero removes the line.
    pub fn update_quantity(&mut self, product_id: Uuid, size: Option<&str>, color: Option<&str>, quantity: u32) -> Result<(), CartError> {
        let idx = self.position(product_id, size, color)?;
        if quantity == 0 {
            self.lines.remove(idx);
        } else {
            let line = &mut self.lines[idx];
            line.quantity = quantity.min(line.max_quantity);
        }
        self.recalculate();
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: Uuid, size: Option<&str>, color: Option<&str>) -> Result<(), CartError> {
        let idx = self.position(product_id, size, color)?;
        self.lines.remove(idx);
        self.recalculate();
        Ok(())
    }

    pub fn clear(&mut self) { self.lines.clear(); self.coupon = None; self.recalculate(); }

    pub fn apply_coupon(&mut self, coupon: Coupon, now: DateTime<Utc>) -> Result<Decimal, CouponError> {
        let discount = coupon.discount_for(self.subtotal(), now)?;
        self.coupon = Some(AppliedCoupon { coupon, discount });
        self.touch();
        Ok(discount)
    }

    pub fn remove_coupon(&mut self) { self.coupon = None; self.touch(); }

    /// Checkout payload for `POST /orders`.
    pub fn to_order_items(&self) -> Vec<OrderItemRequest> {
        self.lines
            .iter()
            .map(|l| OrderItemRequest {
                product_id: l.product_id,
                quantity: i32::try_from(l.quantity).unwrap_or(i32::MAX),
                size: l.size.clone(),
                color: l.color.clone(),
            })
            .collect()
    }

    fn position(&self, product_id: Uuid, size: Option<&str>, color: Option<&str>) -> Result<usize, CartError> {
        self.lines.iter().position(|l| l.same_variant(product_id, size, color)).ok_or(CartError::ItemNotFound)
    }

    // Coupon discounts depend on the subtotal, so a coupon that no longer validates is dropped.
    fn recalculate(&mut self) {
        let subtotal = self.subtotal();
        if let Some(applied) = self.coupon.take() {
            if let Ok(discount) = applied.coupon.discount_for(subtotal, Utc::now()) {
                self.coupon = Some(AppliedCoupon { discount, ..applied });
            }
        }
        self.touch();
    }

    fn touch(&mut self) { self.updated_at = Some(Utc::now()); }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum CartError { ItemNotFound, InvalidQuantity, OutOfStock }
impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ItemNotFound => write!(f, "Item not found"),
            Self::InvalidQuantity => write!(f, "Invalid quantity"),
            Self::OutOfStock => write!(f, "Out of stock"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{DiscountType, NewCoupon};

    fn widget(stock: i32) -> Product {
        let mut p = Product::new("Widget", Decimal::new(10, 0), "gadgets");
        p.stock = stock;
        p
    }

    #[test]
    fn test_cart_operations() {
        let p = widget(5);
        let mut cart = Cart::new();
        cart.add_item(CartLine::from_product(&p, 2, Some("M".into()), None)).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.subtotal(), Decimal::new(20, 0));
        cart.add_item(CartLine::from_product(&p, 1, Some("M".into()), None)).unwrap();
        assert_eq!(cart.lines()[0].quantity, 3); // Merged
        assert_eq!(cart.item_count(), 3);
        cart.add_item(CartLine::from_product(&p, 1, Some("L".into()), None)).unwrap();
        assert_eq!(cart.lines().len(), 2);
        cart.update_quantity(p.id, Some("L"), None, 0).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.remove_item(p.id, Some("S"), None), Err(CartError::ItemNotFound));
    }

    #[test]
    fn test_quantity_clamped_to_stock() {
        let p = widget(2);
        let mut cart = Cart::new();
        assert_eq!(cart.add_item(CartLine::from_product(&p, 5, None, None)).unwrap(), 2);
        assert_eq!(cart.add_item(CartLine::from_product(&widget(0), 1, None, None)), Err(CartError::OutOfStock));
    }

    #[test]
    fn test_coupon_dropped_when_minimum_no_longer_met() {
        let p = widget(10);
        let mut cart = Cart::new();
        cart.add_item(CartLine::from_product(&p, 5, None, None)).unwrap();
        let coupon = NewCoupon {
            code: "BIG".into(), discount_type: DiscountType::Fixed, discount_value: Decimal::new(5, 0),
            min_order_amount: Some(Decimal::new(40, 0)), max_discount_amount: None, expires_at: None, usage_limit: None,
        }.into_coupon().unwrap();
        assert_eq!(cart.apply_coupon(coupon.clone(), Utc::now()).unwrap(), Decimal::new(5, 0));
        assert_eq!(cart.total(), Decimal::new(45, 0));
        cart.remove_coupon();
        assert_eq!(cart.total(), Decimal::new(50, 0));
        cart.apply_coupon(coupon, Utc::now()).unwrap();
        cart.update_quantity(p.id, None, None, 1).unwrap();
        assert_eq!(cart.coupon_code(), None);
        assert_eq!(cart.total(), Decimal::new(10, 0));
    }
}
