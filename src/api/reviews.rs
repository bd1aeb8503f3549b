use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::{middleware::AdminSession, ApiResult, AppState, ValidatedJson};
use crate::db;
use crate::domain::aggregates::{NewReview, RatingSummary, Review};
use crate::domain::events::ReviewEvent;
use crate::StorefrontError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ReviewParams {
    product_id: Uuid,
}

/// GET /api/reviews?productId=
pub(super) async fn list_reviews(
    State(state): State<AppState>,
    Query(params): Query<ReviewParams>,
) -> ApiResult<Json<Vec<Review>>> {
    Ok(Json(db::reviews::list_for_product(&state.pool, params.product_id).await?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreatedReview {
    review: Review,
    rating_summary: RatingSummary,
}

/// POST /api/reviews
///
/// Stores the review and refreshes the product's average rating and review count.
pub(super) async fn create_review(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<NewReview>,
) -> ApiResult<(StatusCode, Json<CreatedReview>)> {
    let (review, rating_summary) = db::reviews::create(&state.pool, &body.into_review()).await?;
    state.notifier.notify(ReviewEvent::Created { review_id: review.id, product_id: review.product_id });
    Ok((StatusCode::CREATED, Json(CreatedReview { review, rating_summary })))
}

/// POST /api/reviews/:id/helpful
pub(super) async fn mark_helpful(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Review>> {
    Ok(Json(db::reviews::mark_helpful(&state.pool, id).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub(super) struct ReplyRequest {
    #[validate(length(min = 1, max = 2000))]
    reply: String,
}

/// POST /api/reviews/:id/reply
pub(super) async fn reply(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<ReplyRequest>,
) -> ApiResult<Json<Review>> {
    let mut review = db::reviews::find(&state.pool, id)
        .await?
        .ok_or(StorefrontError::not_found("Review"))?;
    review.reply(body.reply)?;
    let saved = db::reviews::save_reply(&state.pool, &review).await?;
    state.notifier.notify(ReviewEvent::Replied { review_id: saved.id, product_id: saved.product_id });
    Ok(Json(saved))
}
