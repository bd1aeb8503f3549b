//! REST service over the catalog, orders, reviews, coupons and offers.

mod admin;
mod categories;
mod coupons;
mod offers;
mod orders;
mod products;
mod reviews;

pub mod middleware;

use axum::{
    async_trait,
    extract::{FromRef, FromRequest, Request, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use validator::Validate;

use crate::catalog::BadgeRules;
use crate::notify::Notifier;
use crate::StorefrontError;
use middleware::{request_id, AuthState};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub pool: PgPool,
    pub notifier: Notifier,
    pub auth: AuthState,
    pub badge_rules: Arc<BadgeRules>,
}

impl AppState {
    pub fn new(pool: PgPool, notifier: Notifier, auth: AuthState) -> Self {
        Self { pool, notifier, auth, badge_rules: Arc::new(BadgeRules::default()) }
    }
}

/// Error envelope: `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { error: ErrorBody { code: code.into(), message: message.into() } }
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" | "invalid_transition" | "insufficient_stock" => StatusCode::CONFLICT,
            "coupon_rejected" => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<StorefrontError> for ApiError {
    fn from(err: StorefrontError) -> Self {
        match &err {
            StorefrontError::NotFound { .. } => ApiError::new("not_found", err.to_string()),
            StorefrontError::Validation(msg) => ApiError::new("validation_error", msg.clone()),
            StorefrontError::InvalidStatusTransition { .. } => ApiError::new("invalid_transition", err.to_string()),
            StorefrontError::Coupon(reason) => ApiError::new("coupon_rejected", reason.to_string()),
            StorefrontError::InsufficientStock { .. } => ApiError::new("insufficient_stock", err.to_string()),
            StorefrontError::Storage(e) if crate::db::is_unique_violation(e) => {
                ApiError::new("conflict", "a record with that key already exists")
            }
            StorefrontError::Storage(e) => {
                tracing::error!(error = %e, "database query failed");
                ApiError::new("internal_error", "database query failed")
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// JSON body that has passed its `validator` rules.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::new("bad_request", rejection.body_text()))?;
        value.validate().map_err(StorefrontError::from)?;
        Ok(Self(value))
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/products", get(products::list_products).post(products::create_product))
        .route("/products/search", get(products::search_products))
        .route("/products/filter-options", get(products::filter_options))
        .route(
            "/products/:id",
            get(products::get_product).put(products::update_product).delete(products::delete_product),
        )
        .route("/categories", get(categories::list_categories).post(categories::create_category))
        .route("/categories/:slug", get(categories::get_category))
        .route("/orders", get(orders::list_orders).post(orders::create_order))
        .route("/orders/guest", post(orders::create_guest_order))
        .route("/orders/:id", get(orders::get_order))
        .route("/orders/:id/status", patch(orders::update_status))
        .route("/reviews", get(reviews::list_reviews).post(reviews::create_review))
        .route("/reviews/:id/helpful", post(reviews::mark_helpful))
        .route("/reviews/:id/reply", post(reviews::reply))
        .route("/coupons", post(coupons::create_coupon))
        .route("/coupons/active", get(coupons::active_coupons))
        .route("/coupons/validate", post(coupons::validate_coupon))
        .route("/offers", get(offers::list_offers).post(offers::create_offer))
        .route("/offers/active", get(offers::active_offers))
        .route("/offers/:id", get(offers::get_offer).put(offers::update_offer).delete(offers::delete_offer))
        .route("/offers/:id/toggle", patch(offers::toggle_offer))
        .route("/admin/analytics", get(admin::analytics))
        .route("/admin/inventory", get(admin::inventory))
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http())
                .layer(build_cors()),
        )
        .with_state(state)
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match crate::db::health_check(&state.pool).await {
        Ok(()) => (StatusCode::OK, Json(HealthData { status: "ok", database: "ok" })),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthData { status: "degraded", database: "unavailable" }),
            )
        }
    }
}
