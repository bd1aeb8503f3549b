//! `offers` table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::aggregates::Offer;
use crate::{Result, StorefrontError};

pub async fn list(pool: &PgPool) -> Result<Vec<Offer>> {
    let offers = sqlx::query_as::<_, Offer>("SELECT * FROM offers ORDER BY start_date DESC")
        .fetch_all(pool)
        .await?;
    Ok(offers)
}

pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<Offer>> {
    let offer = sqlx::query_as::<_, Offer>("SELECT * FROM offers WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(offer)
}

pub async fn insert(pool: &PgPool, o: &Offer) -> Result<Offer> {
    let offer = sqlx::query_as::<_, Offer>(
        "INSERT INTO offers (id, title, description, kind, discount_type, discount_value, \
         target_products, start_date, end_date, is_active, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
    )
    .bind(o.id)
    .bind(&o.title)
    .bind(&o.description)
    .bind(o.kind.as_str())
    .bind(o.discount_type.as_str())
    .bind(o.discount_value)
    .bind(&o.target_products)
    .bind(o.start_date)
    .bind(o.end_date)
    .bind(o.is_active)
    .bind(o.created_at)
    .fetch_one(pool)
    .await?;
    Ok(offer)
}

pub async fn update(pool: &PgPool, o: &Offer) -> Result<Offer> {
    sqlx::query_as::<_, Offer>(
        "UPDATE offers SET title = $2, description = $3, kind = $4, discount_type = $5, \
         discount_value = $6, target_products = $7, start_date = $8, end_date = $9, is_active = $10 \
         WHERE id = $1 RETURNING *",
    )
    .bind(o.id)
    .bind(&o.title)
    .bind(&o.description)
    .bind(o.kind.as_str())
    .bind(o.discount_type.as_str())
    .bind(o.discount_value)
    .bind(&o.target_products)
    .bind(o.start_date)
    .bind(o.end_date)
    .bind(o.is_active)
    .fetch_optional(pool)
    .await?
    .ok_or(StorefrontError::not_found("Offer"))
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM offers WHERE id = $1").bind(id).execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(StorefrontError::not_found("Offer"));
    }
    Ok(())
}
