//! Repository tests against a real Postgres using `#[sqlx::test]`.
//!
//! Each test gets a fresh database with `./migrations` applied. They need
//! `DATABASE_URL` pointing at a server the harness can create databases on, so
//! they are ignored by default: `cargo test --test live -- --ignored`.

use rust_decimal::Decimal;
use storefront::db;
use storefront::domain::aggregates::{NewReview, Product, Review};
use storefront::domain::value_objects::Rating;
use storefront::StorefrontError;

async fn seed_product(pool: &sqlx::PgPool, is_active: bool) -> Product {
    let mut product = Product::new("Slim Jeans", Decimal::new(25, 0), "jeans");
    product.is_active = is_active;
    db::products::insert(pool, &product)
        .await
        .unwrap_or_else(|e| panic!("seed_product failed: {e}"))
}

fn review_for(product: &Product, user_name: &str, stars: u8) -> Review {
    NewReview {
        product_id: product.id,
        user_name: user_name.to_string(),
        rating: Rating::new(stars).expect("rating"),
        comment: "Fits well".to_string(),
    }
    .into_review()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a live Postgres (DATABASE_URL)"]
async fn concurrent_reviews_both_count_toward_rating(pool: sqlx::PgPool) {
    let product = seed_product(&pool, true).await;

    let rahim = review_for(&product, "Rahim", 5);
    let karim = review_for(&product, "Karim", 4);
    let (first, second) = tokio::join!(
        db::reviews::create(&pool, &rahim),
        db::reviews::create(&pool, &karim),
    );
    first.expect("first review");
    second.expect("second review");

    let stored = db::products::find(&pool, product.id).await.expect("find").expect("product exists");
    assert_eq!(stored.total_reviews, Some(2));
    assert_eq!(stored.average_rating, Some(4.5));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a live Postgres (DATABASE_URL)"]
async fn review_on_inactive_product_writes_nothing(pool: sqlx::PgPool) {
    let product = seed_product(&pool, false).await;

    let err = db::reviews::create(&pool, &review_for(&product, "Rahim", 5)).await.unwrap_err();
    assert!(matches!(err, StorefrontError::NotFound { entity: "Product" }), "{err:?}");
    assert!(db::reviews::list_for_product(&pool, product.id).await.expect("list").is_empty());
}
