use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::api::{middleware::AdminSession, ApiResult, AppState, ValidatedJson};
use crate::db;
use crate::domain::aggregates::{Category, NewCategory};
use crate::StorefrontError;

/// GET /api/categories
pub(super) async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(db::categories::list(&state.pool).await?))
}

/// GET /api/categories/:slug
pub(super) async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Category>> {
    let category = db::categories::find_by_slug(&state.pool, &slug.to_lowercase())
        .await?
        .ok_or(StorefrontError::not_found("Category"))?;
    Ok(Json(category))
}

/// POST /api/categories
pub(super) async fn create_category(
    State(state): State<AppState>,
    _admin: AdminSession,
    ValidatedJson(body): ValidatedJson<NewCategory>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = db::categories::insert(&state.pool, &body.into_category()?).await?;
    tracing::info!(slug = %category.slug, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}
