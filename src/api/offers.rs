use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::api::{middleware::AdminSession, ApiResult, AppState, ValidatedJson};
use crate::db;
use crate::domain::aggregates::{NewOffer, Offer};
use crate::StorefrontError;

/// GET /api/offers
pub(super) async fn list_offers(State(state): State<AppState>) -> ApiResult<Json<Vec<Offer>>> {
    Ok(Json(db::offers::list(&state.pool).await?))
}

/// GET /api/offers/active
pub(super) async fn active_offers(State(state): State<AppState>) -> ApiResult<Json<Vec<Offer>>> {
    let now = Utc::now();
    let live = db::offers::list(&state.pool)
        .await?
        .into_iter()
        .filter(|o| o.is_live(now))
        .collect();
    Ok(Json(live))
}

async fn load(state: &AppState, id: Uuid) -> Result<Offer, StorefrontError> {
    db::offers::find(&state.pool, id).await?.ok_or(StorefrontError::not_found("Offer"))
}

/// GET /api/offers/:id
pub(super) async fn get_offer(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Offer>> {
    Ok(Json(load(&state, id).await?))
}

/// POST /api/offers
pub(super) async fn create_offer(
    State(state): State<AppState>,
    _admin: AdminSession,
    ValidatedJson(body): ValidatedJson<NewOffer>,
) -> ApiResult<(StatusCode, Json<Offer>)> {
    let offer = db::offers::insert(&state.pool, &body.into_offer()).await?;
    tracing::info!(offer_id = %offer.id, title = %offer.title, "offer created");
    Ok((StatusCode::CREATED, Json(offer)))
}

/// PUT /api/offers/:id
pub(super) async fn update_offer(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<NewOffer>,
) -> ApiResult<Json<Offer>> {
    let mut offer = load(&state, id).await?;
    body.apply_to(&mut offer);
    Ok(Json(db::offers::update(&state.pool, &offer).await?))
}

/// DELETE /api/offers/:id
pub(super) async fn delete_offer(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    db::offers::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/offers/:id/toggle
pub(super) async fn toggle_offer(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Offer>> {
    let mut offer = load(&state, id).await?;
    offer.toggle();
    let saved = db::offers::update(&state.pool, &offer).await?;
    tracing::info!(offer_id = %saved.id, active = saved.is_active, "offer toggled");
    Ok(Json(saved))
}
