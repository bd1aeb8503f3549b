//! Value Objects for the storefront

use serde::{Deserialize, Serialize};
use std::fmt;

/// URL slug derived from a display name, e.g. `"Summer Dresses"` -> `"summer-dresses"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    pub fn new(value: impl AsRef<str>) -> Result<Self, SlugError> {
        let mut slug = String::new();
        let mut pending_dash = false;
        for c in value.as_ref().trim().chars() {
            if c.is_alphanumeric() {
                if pending_dash && !slug.is_empty() { slug.push('-'); }
                pending_dash = false;
                slug.extend(c.to_lowercase());
            } else {
                pending_dash = true;
            }
        }
        if slug.is_empty() { return Err(SlugError::Empty); }
        if slug.len() > 80 { return Err(SlugError::TooLong); }
        Ok(Self(slug))
    }
    pub fn as_str(&self) -> &str { &self.0 }
    pub fn into_inner(self) -> String { self.0 }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum SlugError { Empty, TooLong }
impl std::error::Error for SlugError {}
impl fmt::Display for SlugError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "slug empty"), Self::TooLong => write!(f, "slug too long") }
    }
}

/// Coupon code, normalized to trimmed uppercase so lookups are case-insensitive.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CouponCode(String);

impl CouponCode {
    pub fn new(value: impl Into<String>) -> Result<Self, CouponCodeError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() { return Err(CouponCodeError::Empty); }
        if value.len() > 32 { return Err(CouponCodeError::TooLong); }
        if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(CouponCodeError::InvalidCharacter);
        }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum CouponCodeError { Empty, TooLong, InvalidCharacter }
impl std::error::Error for CouponCodeError {}
impl fmt::Display for CouponCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "coupon code empty"),
            Self::TooLong => write!(f, "coupon code too long"),
            Self::InvalidCharacter => write!(f, "coupon code has invalid characters"),
        }
    }
}

/// Review rating, 1 to 5 stars inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: u8) -> Result<Self, RatingError> {
        if (1..=5).contains(&value) { Ok(Self(value)) } else { Err(RatingError(value)) }
    }
    pub fn value(&self) -> u8 { self.0 }
}

impl TryFrom<u8> for Rating {
    type Error = RatingError;
    fn try_from(value: u8) -> Result<Self, Self::Error> { Self::new(value) }
}

impl TryFrom<i16> for Rating {
    type Error = RatingError;
    fn try_from(value: i16) -> Result<Self, Self::Error> {
        u8::try_from(value).map_err(|_| RatingError(0)).and_then(Self::new)
    }
}

impl From<Rating> for u8 {
    fn from(r: Rating) -> u8 { r.0 }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub struct RatingError(pub u8);
impl std::error::Error for RatingError {}
impl fmt::Display for RatingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "rating {} outside 1..=5", self.0) }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_slug() {
        assert_eq!(Slug::new("  Summer Dresses & Tops ").unwrap().as_str(), "summer-dresses-tops");
        assert_eq!(Slug::new("---"), Err(SlugError::Empty));
    }
    #[test]
    fn test_coupon_code() {
        assert_eq!(CouponCode::new(" save10 ").unwrap().as_str(), "SAVE10");
        assert_eq!(CouponCode::new("bad code"), Err(CouponCodeError::InvalidCharacter));
    }
    #[test]
    fn test_rating_bounds() {
        assert!(Rating::new(0).is_err());
        assert_eq!(Rating::new(5).unwrap().value(), 5);
        assert!(serde_json::from_str::<Rating>("6").is_err());
    }
}
