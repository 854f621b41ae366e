use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::services::customers::{ResolveQuery, ResolvedCustomer};
use crate::{ApiResponse, ApiResult, AppState};

/// Resolution outcome: "no match" is a successful response, not an error.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResolveOutcome {
    pub matched: bool,
    pub customer: Option<ResolvedCustomer>,
}

/// POST /api/v1/customers/resolve
pub async fn resolve_customer(
    State(state): State<AppState>,
    Json(query): Json<ResolveQuery>,
) -> ApiResult<ResolveOutcome> {
    let resolved = state.services.resolver.resolve(query).await?;
    Ok(Json(ApiResponse::success(ResolveOutcome {
        matched: resolved.is_some(),
        customer: resolved,
    })))
}
