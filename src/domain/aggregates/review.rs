//! Review Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::value_objects::Rating;
use crate::StorefrontError;

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_name: String,
    #[sqlx(try_from = "i16")]
    pub rating: Rating,
    pub comment: String,
    #[serde(default)]
    pub helpful_count: i32,
    #[serde(default)]
    pub admin_reply: Option<String>,
    #[serde(default)]
    pub admin_replied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn reply(&mut self, text: impl Into<String>) -> Result<(), StorefrontError> {
        let text = text.into();
        if text.trim().is_empty() { return Err(StorefrontError::Validation("reply is empty".into())); }
        self.admin_reply = Some(text.trim().to_string());
        self.admin_replied_at = Some(Utc::now());
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub product_id: Uuid,
    #[validate(length(min = 1, max = 80))]
    pub user_name: String,
    pub rating: Rating,
    #[validate(length(min = 1, max = 2000))]
    pub comment: String,
}

impl NewReview {
    pub fn into_review(self) -> Review {
        Review {
            id: Uuid::now_v7(), product_id: self.product_id, user_name: self.user_name.trim().to_string(),
            rating: self.rating, comment: self.comment.trim().to_string(), helpful_count: 0,
            admin_reply: None, admin_replied_at: None, created_at: Utc::now(),
        }
    }
}

/// Aggregate rating stored back onto the product after each new review.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub average_rating: f64,
    pub total_reviews: i32,
}

impl RatingSummary {
    pub fn from_ratings(ratings: impl IntoIterator<Item = Rating>) -> Self {
        let (sum, count) = ratings
            .into_iter()
            .fold((0u32, 0i32), |(sum, count), r| (sum + u32::from(r.value()), count + 1));
        if count == 0 { return Self::default(); }
        // One decimal place, as shown next to the stars.
        let average = (f64::from(sum) / f64::from(count) * 10.0).round() / 10.0;
        Self { average_rating: average, total_reviews: count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_rating_summary() {
        let ratings = [5, 4, 4].map(|r| Rating::new(r).unwrap());
        let summary = RatingSummary::from_ratings(ratings);
        assert_eq!(summary.total_reviews, 3);
        assert!((summary.average_rating - 4.3).abs() < f64::EPSILON);
        assert_eq!(RatingSummary::from_ratings([]), RatingSummary::default());
    }
    #[test]
    fn test_reply_rejects_blank() {
        let mut review = NewReview {
            product_id: Uuid::now_v7(), user_name: "Nadia".into(), rating: Rating::new(4).unwrap(), comment: "Fits well".into(),
        }.into_review();
        assert!(review.reply("   ").is_err());
        review.reply("Thanks!").unwrap();
        assert!(review.admin_replied_at.is_some());
    }
}
