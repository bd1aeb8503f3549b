//! Storefront Catalog Platform
//!
//! Catalog service and client library for a small e-commerce storefront.
//!
//! ## Features
//! - Product catalog listing with centralized filtering, sorting and pagination
//! - Search suggestions with recent searches and stale-response protection
//! - Derived product badges and star ratings
//! - Orders, reviews, coupons and promotional offers over REST
//! - Admin analytics and inventory views
//! - Email notifications for order lifecycle events

pub mod api;
pub mod catalog;
pub mod client;
pub mod config;
pub mod db;
pub mod domain;
pub mod notify;

use thiserror::Error;

use crate::domain::aggregates::{CouponError, OrderStatus};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Cannot move order from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("Coupon rejected: {0}")]
    Coupon(#[from] CouponError),

    #[error("Insufficient stock for product {product_id}")]
    InsufficientStock { product_id: String },

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl StorefrontError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }
}

impl From<validator::ValidationErrors> for StorefrontError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
