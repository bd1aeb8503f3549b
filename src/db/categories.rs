//! `categories` table.

use sqlx::PgPool;

use crate::domain::aggregates::Category;
use crate::Result;

pub async fn list(pool: &PgPool) -> Result<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(categories)
}

pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Category>> {
    let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    Ok(category)
}

/// Fails with a unique violation when the slug is taken.
pub async fn insert(pool: &PgPool, c: &Category) -> Result<Category> {
    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (id, name, slug, image, description, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(c.id)
    .bind(&c.name)
    .bind(&c.slug)
    .bind(&c.image)
    .bind(&c.description)
    .bind(c.created_at)
    .fetch_one(pool)
    .await?;
    Ok(category)
}
