use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::errors::ErrorResponse;
use crate::handlers;
use crate::services::{customers, inventory, orders};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tradestack API",
        description = r#"
# Tradestack Wholesale Ordering API

Order ingestion and inventory reconciliation for wholesale tenants.

- **Orders**: transactional multi-line order creation with per-wholesaler
  order numbers and unit/pallet-aware stock decrement
- **Inventory**: append-only stock movement ledger and derived availability
- **Stock alerts**: threshold breaches with explicit resolution
- **Customers**: phone-suffix identity resolution

Order creation is all-or-nothing: an order, its items, the stock mutations
and the audit ledger rows commit in one transaction or not at all.
        "#,
        contact(
            name = "Tradestack Support",
            email = "support@tradestack.dev"
        ),
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080/api/v1", description = "Local development")
    ),
    tags(
        (name = "Orders", description = "Order ingestion and lifecycle"),
        (name = "Inventory", description = "Stock movements and availability"),
        (name = "Stock Alerts", description = "Threshold alerting"),
        (name = "Customers", description = "Identity resolution")
    ),
    components(schemas(
        ErrorResponse,
        orders::CreateOrderRequest,
        orders::CreateOrderItem,
        orders::UpdateOrderStatusRequest,
        orders::OrderResponse,
        orders::OrderItemResponse,
        orders::OrderListResponse,
        inventory::RecordMovementRequest,
        inventory::MovementResponse,
        inventory::AvailabilityResponse,
        customers::ResolveQuery,
        customers::ResolvedCustomer,
        handlers::customers::ResolveOutcome,
        handlers::inventory::MovementBody,
        handlers::orders::CancelOrderBody,
    ))
)]
pub struct ApiDoc;

/// Swagger UI router serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
