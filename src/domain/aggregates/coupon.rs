//! Coupon Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::product::non_negative;
use crate::domain::value_objects::CouponCode;
use crate::StorefrontError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType { Percentage, Fixed }

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Percentage => "percentage", Self::Fixed => "fixed" }
    }

    /// Discount produced by `value` against `amount`, never more than `amount`.
    pub fn discount(&self, value: Decimal, amount: Decimal) -> Decimal {
        let raw = match self {
            Self::Percentage => amount * value / Decimal::ONE_HUNDRED,
            Self::Fixed => value,
        };
        raw.max(Decimal::ZERO)
            .min(amount.max(Decimal::ZERO))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for DiscountType {
    type Err = StorefrontError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(Self::Percentage),
            "fixed" => Ok(Self::Fixed),
            other => Err(StorefrontError::Validation(format!("unknown discount type {other}"))),
        }
    }
}

impl TryFrom<String> for DiscountType {
    type Error = StorefrontError;
    fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub code: String,
    #[sqlx(try_from = "String")]
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    #[serde(default)]
    pub min_order_amount: Option<Decimal>,
    /// Cap applied to percentage discounts.
    #[serde(default)]
    pub max_discount_amount: Option<Decimal>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage_limit: Option<i32>,
    #[serde(default)]
    pub used_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    #[error("invalid coupon code")]
    UnknownCode,
    #[error("coupon is not active")]
    Inactive,
    #[error("coupon has expired")]
    Expired,
    #[error("coupon usage limit reached")]
    UsageLimitReached,
    #[error("minimum order amount is {minimum}")]
    MinimumNotMet { minimum: Decimal },
}

impl Coupon {
    /// Whether the coupon can be offered to shoppers right now, ignoring order amount.
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.check_state(now).is_ok()
    }

    fn check_state(&self, now: DateTime<Utc>) -> Result<(), CouponError> {
        if !self.is_active { return Err(CouponError::Inactive); }
        if self.expires_at.is_some_and(|at| at < now) { return Err(CouponError::Expired); }
        if self.usage_limit.is_some_and(|limit| self.used_count >= limit) {
            return Err(CouponError::UsageLimitReached);
        }
        Ok(())
    }

    /// Validates the coupon against an order amount and returns the discount it grants.
    pub fn discount_for(&self, order_amount: Decimal, now: DateTime<Utc>) -> Result<Decimal, CouponError> {
        self.check_state(now)?;
        if let Some(minimum) = self.min_order_amount {
            if order_amount < minimum { return Err(CouponError::MinimumNotMet { minimum }); }
        }
        let mut discount = self.discount_type.discount(self.discount_value, order_amount);
        if self.discount_type == DiscountType::Percentage {
            if let Some(cap) = self.max_discount_amount { discount = discount.min(cap); }
        }
        Ok(discount)
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCoupon {
    #[validate(length(min = 1, max = 32))]
    pub code: String,
    pub discount_type: DiscountType,
    #[validate(custom = "non_negative")]
    pub discount_value: Decimal,
    #[validate(custom = "non_negative")]
    pub min_order_amount: Option<Decimal>,
    #[validate(custom = "non_negative")]
    pub max_discount_amount: Option<Decimal>,
    pub expires_at: Option<DateTime<Utc>>,
    #[validate(range(min = 1))]
    pub usage_limit: Option<i32>,
}

impl NewCoupon {
    pub fn into_coupon(self) -> Result<Coupon, StorefrontError> {
        let code = CouponCode::new(self.code).map_err(|e| StorefrontError::Validation(e.to_string()))?;
        if self.discount_type == DiscountType::Percentage && self.discount_value > Decimal::ONE_HUNDRED {
            return Err(StorefrontError::Validation("percentage discount above 100".into()));
        }
        Ok(Coupon {
            id: Uuid::now_v7(), code: code.as_str().to_string(), discount_type: self.discount_type,
            discount_value: self.discount_value, min_order_amount: self.min_order_amount,
            max_discount_amount: self.max_discount_amount, expires_at: self.expires_at,
            usage_limit: self.usage_limit, used_count: 0, is_active: true, created_at: Utc::now(),
        })
    }
}
