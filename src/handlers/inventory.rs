use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::product;
use crate::errors::ServiceError;
use crate::services::inventory::{AvailabilityResponse, MovementResponse, RecordMovementRequest};
use crate::{ApiResponse, ApiResult, AppState, ListQuery, PaginatedResponse};

/// Movement payload as posted to a product-scoped route; the product id comes
/// from the path.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MovementBody {
    pub movement_type: String,
    pub quantity: i64,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LowStockParams {
    pub wholesaler_id: Uuid,
}

/// POST /api/v1/products/{id}/movements
pub async fn record_movement(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(body): Json<MovementBody>,
) -> Result<(StatusCode, Json<ApiResponse<MovementResponse>>), ServiceError> {
    let movement = state
        .services
        .inventory
        .record_stock_movement(RecordMovementRequest {
            product_id,
            movement_type: body.movement_type,
            quantity: body.quantity,
            reason: body.reason,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(movement))))
}

/// GET /api/v1/products/{id}/movements
pub async fn list_movements(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<MovementResponse>> {
    let (items, total) = state
        .services
        .inventory
        .list_movements(product_id, query.page, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse {
        total_pages: total.div_ceil(query.limit.max(1)),
        items,
        total,
        page: query.page,
        limit: query.limit,
    })))
}

/// GET /api/v1/products/{id}/availability
pub async fn get_availability(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<AvailabilityResponse> {
    let availability = state.services.inventory.get_availability(product_id).await?;
    Ok(Json(ApiResponse::success(availability)))
}

/// GET /api/v1/inventory/low-stock
pub async fn list_low_stock(
    State(state): State<AppState>,
    Query(params): Query<LowStockParams>,
) -> ApiResult<Vec<product::Model>> {
    let products = state
        .services
        .inventory
        .list_low_stock(params.wholesaler_id)
        .await?;
    Ok(Json(ApiResponse::success(products)))
}
