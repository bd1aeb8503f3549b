use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::{middleware::AdminSession, ApiResult, AppState, ValidatedJson};
use crate::db;
use crate::domain::aggregates::{Coupon, CouponError, NewCoupon};
use crate::domain::value_objects::CouponCode;
use crate::StorefrontError;

/// GET /api/coupons/active
pub(super) async fn active_coupons(State(state): State<AppState>) -> ApiResult<Json<Vec<Coupon>>> {
    let now = Utc::now();
    let coupons = db::coupons::list_active(&state.pool)
        .await?
        .into_iter()
        .filter(|c| c.is_redeemable(now))
        .collect();
    Ok(Json(coupons))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(super) struct ValidateCouponRequest {
    #[validate(length(min = 1))]
    code: String,
    #[validate(custom = "crate::domain::aggregates::product::non_negative")]
    order_amount: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CouponQuote {
    valid: bool,
    code: String,
    discount: Decimal,
    total: Decimal,
    coupon: Coupon,
}

/// POST /api/coupons/validate
pub(super) async fn validate_coupon(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<ValidateCouponRequest>,
) -> ApiResult<Json<CouponQuote>> {
    let code = CouponCode::new(&body.code).map_err(|_| StorefrontError::from(CouponError::UnknownCode))?;
    let coupon = db::coupons::find_by_code(&state.pool, code.as_str())
        .await?
        .ok_or(StorefrontError::from(CouponError::UnknownCode))?;
    let discount = coupon.discount_for(body.order_amount, Utc::now()).map_err(StorefrontError::from)?;
    Ok(Json(CouponQuote {
        valid: true,
        code: coupon.code.clone(),
        discount,
        total: body.order_amount - discount,
        coupon,
    }))
}

/// POST /api/coupons
pub(super) async fn create_coupon(
    State(state): State<AppState>,
    _admin: AdminSession,
    ValidatedJson(body): ValidatedJson<NewCoupon>,
) -> ApiResult<(StatusCode, Json<Coupon>)> {
    let coupon = db::coupons::insert(&state.pool, &body.into_coupon()?).await?;
    tracing::info!(code = %coupon.code, "coupon created");
    Ok((StatusCode::CREATED, Json(coupon)))
}
