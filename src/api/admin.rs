use axum::{extract::State, Json};

use crate::api::{middleware::AdminSession, ApiResult, AppState};
use crate::catalog::{inventory as inventory_view, DashboardMetrics, InventoryItem};
use crate::db;

/// GET /api/admin/analytics
pub(super) async fn analytics(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> ApiResult<Json<DashboardMetrics>> {
    let (orders, products) = futures::try_join!(
        db::orders::list(&state.pool, None),
        db::products::list_all(&state.pool)
    )?;
    Ok(Json(DashboardMetrics::compute(&orders, &products, &state.badge_rules)))
}

/// GET /api/admin/inventory
pub(super) async fn inventory(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> ApiResult<Json<Vec<InventoryItem>>> {
    let products = db::products::list_all(&state.pool).await?;
    Ok(Json(inventory_view(&products, &state.badge_rules)))
}
