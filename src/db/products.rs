//! `products` table.

use sqlx::{types::Json, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::aggregates::{Product, RatingSummary};
use crate::{Result, StorefrontError};

/// Active products, newest first. Listing pages filter, sort and page this in memory.
pub async fn list_active(pool: &PgPool) -> Result<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE is_active ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(products)
}

/// Every product including deactivated ones, for admin views.
pub async fn list_all(pool: &PgPool) -> Result<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at DESC")
        .fetch_all(pool)
        .await?;
    Ok(products)
}

/// Case-insensitive substring search over title, category and description.
pub async fn search(pool: &PgPool, term: &str, limit: i64) -> Result<Vec<Product>> {
    let pattern = format!("%{}%", escape_like(term.trim()));
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products \
         WHERE is_active AND (title ILIKE $1 OR category ILIKE $1 OR description ILIKE $1) \
         ORDER BY (title ILIKE $1) DESC, views DESC NULLS LAST, created_at DESC \
         LIMIT $2",
    )
    .bind(&pattern)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(products)
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(product)
}

pub async fn find_many(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;
    Ok(products)
}

pub async fn insert(pool: &PgPool, p: &Product) -> Result<Product> {
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (id, title, description, price, original_price, stock, images, image, \
         sizes, colors, category, average_rating, total_reviews, views, is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) RETURNING *",
    )
    .bind(p.id)
    .bind(&p.title)
    .bind(&p.description)
    .bind(p.price)
    .bind(p.original_price)
    .bind(p.stock)
    .bind(&p.images)
    .bind(&p.image)
    .bind(&p.sizes)
    .bind(Json(&p.colors))
    .bind(&p.category)
    .bind(p.average_rating)
    .bind(p.total_reviews)
    .bind(p.views)
    .bind(p.is_active)
    .bind(p.created_at)
    .bind(p.updated_at)
    .fetch_one(pool)
    .await?;
    Ok(product)
}

pub async fn update(pool: &PgPool, p: &Product) -> Result<Product> {
    sqlx::query_as::<_, Product>(
        "UPDATE products SET title = $2, description = $3, price = $4, original_price = $5, stock = $6, \
         images = $7, image = $8, sizes = $9, colors = $10, category = $11, is_active = $12, updated_at = $13 \
         WHERE id = $1 RETURNING *",
    )
    .bind(p.id)
    .bind(&p.title)
    .bind(&p.description)
    .bind(p.price)
    .bind(p.original_price)
    .bind(p.stock)
    .bind(&p.images)
    .bind(&p.image)
    .bind(&p.sizes)
    .bind(Json(&p.colors))
    .bind(&p.category)
    .bind(p.is_active)
    .bind(p.updated_at)
    .fetch_optional(pool)
    .await?
    .ok_or(StorefrontError::not_found("Product"))
}

/// Soft delete: the row stays so past orders and reviews keep resolving.
pub async fn deactivate(pool: &PgPool, id: Uuid) -> Result<()> {
    let result = sqlx::query("UPDATE products SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StorefrontError::not_found("Product"));
    }
    Ok(())
}

pub async fn increment_views(pool: &PgPool, id: Uuid) -> Result<()> {
    sqlx::query("UPDATE products SET views = COALESCE(views, 0) + 1 WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Takes `quantity` units out of stock, failing if that would go negative.
/// Returns the remaining stock.
pub async fn take_stock(tx: &mut Transaction<'_, Postgres>, id: Uuid, quantity: i32) -> Result<i32> {
    let remaining: Option<(i32,)> = sqlx::query_as(
        "UPDATE products SET stock = stock - $2, updated_at = NOW() \
         WHERE id = $1 AND stock >= $2 RETURNING stock",
    )
    .bind(id)
    .bind(quantity)
    .fetch_optional(&mut **tx)
    .await?;
    remaining
        .map(|(stock,)| stock)
        .ok_or_else(|| StorefrontError::InsufficientStock { product_id: id.to_string() })
}

/// Row-locks an active product until `tx` ends. Rating writes for one product run
/// one at a time behind this lock.
pub async fn lock_active(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<()> {
    let found: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1 AND is_active FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
    found.map(|_| ()).ok_or(StorefrontError::not_found("Product"))
}

pub async fn update_rating(tx: &mut Transaction<'_, Postgres>, id: Uuid, summary: RatingSummary) -> Result<()> {
    sqlx::query("UPDATE products SET average_rating = $2, total_reviews = $3, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(summary.average_rating)
        .bind(summary.total_reviews)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
