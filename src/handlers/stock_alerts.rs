use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::stock_alert;
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

#[derive(Debug, Deserialize)]
pub struct AlertListParams {
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
    pub wholesaler_id: Uuid,
    #[serde(default)]
    pub unresolved_only: bool,
}

/// GET /api/v1/stock-alerts
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(params): Query<AlertListParams>,
) -> ApiResult<PaginatedResponse<stock_alert::Model>> {
    let (items, total) = state
        .services
        .alerts
        .list_alerts(
            params.wholesaler_id,
            params.unresolved_only,
            params.page,
            params.limit,
        )
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse {
        total_pages: total.div_ceil(params.limit.max(1)),
        items,
        total,
        page: params.page,
        limit: params.limit,
    })))
}

/// POST /api/v1/products/{id}/check-alerts
pub async fn check_product_alerts(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Option<stock_alert::Model>> {
    let created = state
        .services
        .alerts
        .check_product_by_id(product_id)
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

/// POST /api/v1/stock-alerts/{id}/resolve
pub async fn resolve_alert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<stock_alert::Model> {
    let alert = state.services.alerts.resolve_alert(id).await?;
    Ok(Json(ApiResponse::success(alert)))
}

/// POST /api/v1/stock-alerts/{id}/read
pub async fn mark_alert_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<stock_alert::Model> {
    let alert = state.services.alerts.mark_read(id).await?;
    Ok(Json(ApiResponse::success(alert)))
}
