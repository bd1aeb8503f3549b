use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::api::{
    middleware::{AdminSession, Session},
    ApiError, ApiResult, AppState, ValidatedJson,
};
use crate::db;
use crate::domain::aggregates::{CouponError, NewOrder, Order, OrderStatus};
use crate::domain::events::{OrderEvent, ProductEvent};
use crate::domain::value_objects::CouponCode;
use crate::StorefrontError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OrderListParams {
    user_id: Option<String>,
}

/// GET /api/orders
///
/// With `?userId=` a signed-in shopper sees their own history; without it the full
/// list is admin-only.
pub(super) async fn list_orders(
    State(state): State<AppState>,
    session: Option<Session>,
    Query(params): Query<OrderListParams>,
) -> ApiResult<Json<Vec<Order>>> {
    match params.user_id.as_deref().filter(|id| !id.is_empty()) {
        Some(user_id) => {
            if session.is_none() {
                return Err(ApiError::new("unauthorized", "sign in to view your orders"));
            }
            Ok(Json(db::orders::list(&state.pool, Some(user_id)).await?))
        }
        None => {
            let token = session.as_ref().map(|s| s.token.as_str());
            if !state.auth.allows(token) {
                return Err(ApiError::new("unauthorized", "admin access requires a valid bearer token"));
            }
            Ok(Json(db::orders::list(&state.pool, None).await?))
        }
    }
}

/// GET /api/orders/:id
///
/// Orders carry shipping details, so a bearer token is required.
pub(super) async fn get_order(
    State(state): State<AppState>,
    _session: Session,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    let order = db::orders::find(&state.pool, id)
        .await?
        .ok_or(StorefrontError::not_found("Order"))?;
    Ok(Json(order))
}

/// POST /api/orders
pub(super) async fn create_order(
    State(state): State<AppState>,
    _session: Session,
    ValidatedJson(body): ValidatedJson<NewOrder>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    if body.user_id.as_deref().map_or(true, str::is_empty) {
        return Err(StorefrontError::Validation("userId is required for signed-in orders".into()).into());
    }
    place_order(&state, body).await
}

/// POST /api/orders/guest
pub(super) async fn create_guest_order(
    State(state): State<AppState>,
    ValidatedJson(mut body): ValidatedJson<NewOrder>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    body.user_id = None;
    place_order(&state, body).await
}

async fn place_order(state: &AppState, body: NewOrder) -> ApiResult<(StatusCode, Json<Order>)> {
    let now = Utc::now();
    let ids: Vec<Uuid> = body.products.iter().map(|item| item.product_id).collect();
    let catalog: HashMap<Uuid, _> = db::products::find_many(&state.pool, &ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let coupon = match body.coupon_code.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(raw) => {
            let code = CouponCode::new(raw).map_err(|_| StorefrontError::from(CouponError::UnknownCode))?;
            let coupon = db::coupons::find_by_code(&state.pool, code.as_str())
                .await?
                .ok_or(StorefrontError::from(CouponError::UnknownCode))?;
            Some(coupon)
        }
        None => None,
    };

    let priced = body.price(&catalog, coupon.as_ref(), now)?;
    let (order, levels) = db::orders::place(&state.pool, &priced).await?;
    tracing::info!(
        order_number = %order.order_number,
        total = %order.total,
        guest = order.is_guest(),
        "order placed"
    );

    for level in levels {
        let Some(product) = catalog.get(&level.product_id) else { continue };
        if level.remaining == 0 {
            state.notifier.notify(ProductEvent::OutOfStock { product_id: product.id, title: product.title.clone() });
        } else if level.remaining <= state.badge_rules.low_stock_max {
            state.notifier.notify(ProductEvent::LowStock {
                product_id: product.id,
                title: product.title.clone(),
                stock: level.remaining,
            });
        }
    }
    state.notifier.notify(OrderEvent::Placed { order: Box::new(order.clone()) });
    Ok((StatusCode::CREATED, Json(order)))
}

#[derive(Debug, Deserialize, Validate)]
pub(super) struct StatusUpdate {
    status: OrderStatus,
}

/// PATCH /api/orders/:id/status
pub(super) async fn update_status(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<StatusUpdate>,
) -> ApiResult<Json<Order>> {
    let mut order = db::orders::find(&state.pool, id)
        .await?
        .ok_or(StorefrontError::not_found("Order"))?;
    let from = order.status;
    let event = order.transition_to(body.status)?;
    let updated = db::orders::update_status(&state.pool, &order, from.as_str())
        .await?
        // Another request moved the order between our read and write.
        .ok_or(StorefrontError::InvalidStatusTransition { from, to: body.status })?;
    tracing::info!(order_number = %updated.order_number, %from, to = %updated.status, "order status changed");
    state.notifier.notify(event);
    Ok(Json(updated))
}
