//! Aggregates module
pub mod cart;
pub mod category;
pub mod coupon;
pub mod offer;
pub mod order;
pub mod product;
pub mod review;

pub use cart::{Cart, CartError, CartLine};
pub use category::{Category, NewCategory};
pub use coupon::{Coupon, CouponError, DiscountType, NewCoupon};
pub use offer::{NewOffer, Offer, OfferKind};
pub use order::{NewOrder, Order, OrderItemRequest, OrderLine, OrderStatus, ShippingInfo};
pub use product::{ColorOption, NewProduct, Product};
pub use review::{NewReview, RatingSummary, Review};
