use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{middleware::AdminSession, ApiResult, AppState, ValidatedJson};
use crate::catalog::{display_badges, run_listing, Badge, FilterOptions, ListingQuery, Page, StarBreakdown};
use crate::db;
use crate::domain::aggregates::{NewProduct, Product};
use crate::domain::events::ProductEvent;
use crate::StorefrontError;

const DEFAULT_SEARCH_LIMIT: i64 = 5;
const MAX_SEARCH_LIMIT: i64 = 20;

/// GET /api/products
pub(super) async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> ApiResult<Json<Page<Product>>> {
    let products = db::products::list_active(&state.pool).await?;
    Ok(Json(run_listing(&products, &query)))
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchParams {
    #[serde(default)]
    q: String,
    limit: Option<i64>,
}

/// GET /api/products/search
pub(super) async fn search_products(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<Product>>> {
    if params.q.trim().is_empty() {
        return Ok(Json(Vec::new()));
    }
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).clamp(1, MAX_SEARCH_LIMIT);
    Ok(Json(db::products::search(&state.pool, &params.q, limit).await?))
}

/// GET /api/products/filter-options
pub(super) async fn filter_options(State(state): State<AppState>) -> ApiResult<Json<FilterOptions>> {
    let products = db::products::list_active(&state.pool).await?;
    Ok(Json(FilterOptions::from_products(&products)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProductDetail {
    #[serde(flatten)]
    product: Product,
    badges: Vec<Badge>,
    stars: StarBreakdown,
    /// Best price from live offers covering this product.
    #[serde(skip_serializing_if = "Option::is_none")]
    sale_price: Option<Decimal>,
}

/// GET /api/products/:id
pub(super) async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProductDetail>> {
    let product = db::products::find(&state.pool, id)
        .await?
        .filter(|p| p.is_active)
        .ok_or(StorefrontError::not_found("Product"))?;
    if let Err(e) = db::products::increment_views(&state.pool, id).await {
        tracing::warn!(product_id = %id, error = %e, "failed to count product view");
    }

    let now = Utc::now();
    let offers = db::offers::list(&state.pool).await?;
    let sale_price = offers.iter().filter_map(|o| o.sale_price(&product, now)).min();
    Ok(Json(ProductDetail {
        badges: display_badges(&product, &state.badge_rules, now),
        stars: StarBreakdown::from_rating(product.average_rating),
        sale_price,
        product,
    }))
}

/// POST /api/products
pub(super) async fn create_product(
    State(state): State<AppState>,
    _admin: AdminSession,
    ValidatedJson(body): ValidatedJson<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = db::products::insert(&state.pool, &body.into_product()).await?;
    tracing::info!(product_id = %product.id, title = %product.title, "product created");
    state.notifier.notify(ProductEvent::Created { product_id: product.id });
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/products/:id
pub(super) async fn update_product(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<NewProduct>,
) -> ApiResult<Json<Product>> {
    let mut product = db::products::find(&state.pool, id)
        .await?
        .ok_or(StorefrontError::not_found("Product"))?;
    body.apply_to(&mut product);
    Ok(Json(db::products::update(&state.pool, &product).await?))
}

/// DELETE /api/products/:id
pub(super) async fn delete_product(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    db::products::deactivate(&state.pool, id).await?;
    tracing::info!(product_id = %id, "product deactivated");
    Ok(StatusCode::NO_CONTENT)
}
