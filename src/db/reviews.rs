//! `reviews` table.

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::db::products;
use crate::domain::aggregates::{RatingSummary, Review};
use crate::domain::value_objects::Rating;
use crate::{Result, StorefrontError};

pub async fn list_for_product(pool: &PgPool, product_id: Uuid) -> Result<Vec<Review>> {
    let reviews = sqlx::query_as::<_, Review>(
        "SELECT * FROM reviews WHERE product_id = $1 ORDER BY created_at DESC",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(reviews)
}

pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<Review>> {
    let review = sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(review)
}

/// Stores a review on an active product and refreshes the product's rating in the
/// same transaction. The product row stays locked until commit, so concurrent
/// reviews cannot write a stale average.
pub async fn create(pool: &PgPool, r: &Review) -> Result<(Review, RatingSummary)> {
    let mut tx = pool.begin().await?;
    products::lock_active(&mut tx, r.product_id).await?;
    let review = insert(&mut tx, r).await?;
    let summary = rating_summary(&mut tx, r.product_id).await?;
    products::update_rating(&mut tx, r.product_id, summary).await?;
    tx.commit().await?;
    Ok((review, summary))
}

async fn insert(tx: &mut Transaction<'_, Postgres>, r: &Review) -> Result<Review> {
    let review = sqlx::query_as::<_, Review>(
        "INSERT INTO reviews (id, product_id, user_name, rating, comment, helpful_count, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(r.id)
    .bind(r.product_id)
    .bind(&r.user_name)
    .bind(i16::from(r.rating.value()))
    .bind(&r.comment)
    .bind(r.helpful_count)
    .bind(r.created_at)
    .fetch_one(&mut **tx)
    .await?;
    Ok(review)
}

/// Recomputes the rating summary for `product_id` from its stored reviews.
async fn rating_summary(tx: &mut Transaction<'_, Postgres>, product_id: Uuid) -> Result<RatingSummary> {
    let rows: Vec<(i16,)> = sqlx::query_as("SELECT rating FROM reviews WHERE product_id = $1")
        .bind(product_id)
        .fetch_all(&mut **tx)
        .await?;
    let ratings = rows.into_iter().filter_map(|(r,)| Rating::try_from(r).ok());
    Ok(RatingSummary::from_ratings(ratings))
}

pub async fn mark_helpful(pool: &PgPool, id: Uuid) -> Result<Review> {
    sqlx::query_as::<_, Review>(
        "UPDATE reviews SET helpful_count = helpful_count + 1 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(StorefrontError::not_found("Review"))
}

pub async fn save_reply(pool: &PgPool, r: &Review) -> Result<Review> {
    sqlx::query_as::<_, Review>(
        "UPDATE reviews SET admin_reply = $2, admin_replied_at = $3 WHERE id = $1 RETURNING *",
    )
    .bind(r.id)
    .bind(&r.admin_reply)
    .bind(r.admin_replied_at)
    .fetch_optional(pool)
    .await?
    .ok_or(StorefrontError::not_found("Review"))
}
