//! `coupons` table.

use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::aggregates::Coupon;
use crate::Result;

pub async fn list_active(pool: &PgPool) -> Result<Vec<Coupon>> {
    let coupons = sqlx::query_as::<_, Coupon>(
        "SELECT * FROM coupons WHERE is_active AND (expires_at IS NULL OR expires_at > NOW()) \
         ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(coupons)
}

/// Looks up a code already normalized to upper case.
pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Coupon>> {
    let coupon = sqlx::query_as::<_, Coupon>("SELECT * FROM coupons WHERE code = $1")
        .bind(code)
        .fetch_optional(pool)
        .await?;
    Ok(coupon)
}

pub async fn insert(pool: &PgPool, c: &Coupon) -> Result<Coupon> {
    let coupon = sqlx::query_as::<_, Coupon>(
        "INSERT INTO coupons (id, code, discount_type, discount_value, min_order_amount, \
         max_discount_amount, expires_at, usage_limit, used_count, is_active, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
    )
    .bind(c.id)
    .bind(&c.code)
    .bind(c.discount_type.as_str())
    .bind(c.discount_value)
    .bind(c.min_order_amount)
    .bind(c.max_discount_amount)
    .bind(c.expires_at)
    .bind(c.usage_limit)
    .bind(c.used_count)
    .bind(c.is_active)
    .bind(c.created_at)
    .fetch_one(pool)
    .await?;
    Ok(coupon)
}

/// Counts one redemption. Returns false when the usage limit was reached concurrently.
pub async fn redeem(tx: &mut Transaction<'_, Postgres>, code: &str) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE coupons SET used_count = used_count + 1 \
         WHERE code = $1 AND (usage_limit IS NULL OR used_count < usage_limit)",
    )
    .bind(code)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected() == 1)
}
