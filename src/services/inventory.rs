//! Stock mutation and the append-only movement ledger.
//!
//! Every change to `base_unit_stock` goes through [`apply_stock_delta`], an
//! atomic `stock = stock + delta` statement rather than a read-then-write,
//! and is recorded by [`insert_movement_row`] on the same connection. Order
//! placement (`services::orders`) and manual adjustments both route through
//! here.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{
    product::{self, Entity as ProductEntity},
    stock_movement::{self, Entity as StockMovementEntity, MovementType},
    wholesaler::Entity as WholesalerEntity,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::reconciliation::{availability, Availability, StockSnapshot};
use crate::services::stock_alerts::StockAlertService;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordMovementRequest {
    pub product_id: Uuid,
    /// One of `manual_increase`, `manual_decrease`, `initial`. Purchase
    /// movements are created by order placement, not through this endpoint.
    pub movement_type: String,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i64,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MovementResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub movement_type: String,
    pub quantity: i64,
    pub stock_before: i64,
    pub stock_after: i64,
    pub reason: Option<String>,
    pub order_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityResponse {
    pub product_id: Uuid,
    pub base_unit_stock: i64,
    pub available_units: i64,
    pub available_pallets: i64,
}

/// Applies a signed base-unit delta to a product with a single atomic UPDATE
/// and refreshes the legacy display mirrors. Returns the post-update row.
///
/// The row lock taken by the UPDATE covers the read-back and mirror refresh
/// until the surrounding transaction commits.
pub(crate) async fn apply_stock_delta<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    delta: i64,
) -> Result<product::Model, ServiceError> {
    let updated = ProductEntity::update_many()
        .col_expr(
            product::Column::BaseUnitStock,
            Expr::col(product::Column::BaseUnitStock).add(delta),
        )
        .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(product::Column::Id.eq(product_id))
        .exec(conn)
        .await
        .map_err(ServiceError::DatabaseError)?;

    if updated.rows_affected == 0 {
        return Err(ServiceError::NotFound(format!(
            "Product {} not found",
            product_id
        )));
    }

    let product = ProductEntity::find_by_id(product_id)
        .one(conn)
        .await
        .map_err(ServiceError::DatabaseError)?
        .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

    if product.base_unit_stock < 0 {
        warn!(
            product_id = %product_id,
            base_unit_stock = product.base_unit_stock,
            "Product oversold; deficit left visible for reconciliation"
        );
    }

    let view = availability(&StockSnapshot::from(&product));
    let mut active: product::ActiveModel = product.into();
    active.stock = Set(view.units);
    active.pallet_stock = Set(view.pallets);

    active.update(conn).await.map_err(ServiceError::DatabaseError)
}

/// Appends one ledger row. `stock_after - stock_before` must equal
/// `quantity`; callers derive all three from the same atomic update.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn insert_movement_row<C: ConnectionTrait>(
    conn: &C,
    product: &product::Model,
    movement_type: MovementType,
    quantity: i64,
    stock_before: i64,
    reason: Option<String>,
    order_id: Option<Uuid>,
    customer_name: Option<String>,
) -> Result<stock_movement::Model, ServiceError> {
    debug_assert_eq!(stock_before + quantity, product.base_unit_stock);

    let movement = stock_movement::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        wholesaler_id: Set(product.wholesaler_id),
        movement_type: Set(movement_type.as_str().to_string()),
        quantity: Set(quantity),
        stock_before: Set(stock_before),
        stock_after: Set(product.base_unit_stock),
        reason: Set(reason),
        order_id: Set(order_id),
        customer_name: Set(customer_name),
        created_at: Set(Utc::now()),
    };

    movement.insert(conn).await.map_err(ServiceError::DatabaseError)
}

/// Service for manual stock operations and inventory views.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    alerts: StockAlertService,
}

impl InventoryService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        alerts: StockAlertService,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            alerts,
        }
    }

    /// Records a manual or initial stock movement in its own transaction:
    /// atomic stock update, ledger append, alert check.
    #[instrument(skip(self, request), fields(product_id = %request.product_id, movement_type = %request.movement_type))]
    pub async fn record_stock_movement(
        &self,
        request: RecordMovementRequest,
    ) -> Result<MovementResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let movement_type = MovementType::from_str(&request.movement_type).ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "Unknown movement type: {}",
                request.movement_type
            ))
        })?;
        if movement_type == MovementType::Purchase {
            return Err(ServiceError::ValidationError(
                "Purchase movements are created by order placement".to_string(),
            ));
        }

        let db = self.db_pool.as_ref();
        let alerts = self.alerts.clone();
        let quantity = request.quantity;
        let product_id = request.product_id;
        let reason = request.reason.clone();

        let movement = db
            .transaction::<_, stock_movement::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let product = ProductEntity::find_by_id(product_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Product {} not found", product_id))
                        })?;

                    let wholesaler = WholesalerEntity::find_by_id(product.wholesaler_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Wholesaler {} not found",
                                product.wholesaler_id
                            ))
                        })?;

                    let delta = match movement_type {
                        MovementType::ManualIncrease => quantity,
                        MovementType::ManualDecrease => -quantity,
                        // `initial` states an absolute count; the recorded
                        // quantity is the delta that reaches it.
                        MovementType::Initial => quantity - product.base_unit_stock,
                        MovementType::Purchase => unreachable!("rejected above"),
                    };

                    let stock_before = product.base_unit_stock;
                    let updated = apply_stock_delta(txn, product.id, delta).await?;

                    let movement = insert_movement_row(
                        txn,
                        &updated,
                        movement_type,
                        delta,
                        stock_before,
                        reason,
                        None,
                        None,
                    )
                    .await?;

                    alerts
                        .check_product(txn, &updated, wholesaler.default_low_stock_threshold)
                        .await?;

                    Ok(movement)
                })
            })
            .await
            .map_err(|e| match e {
                sea_orm::TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                sea_orm::TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            movement_id = %movement.id,
            product_id = %movement.product_id,
            stock_after = movement.stock_after,
            "Stock movement recorded"
        );

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender
                .send(Event::StockMovementRecorded {
                    product_id: movement.product_id,
                    movement_type: movement.movement_type.clone(),
                    quantity: movement.quantity,
                    stock_after: movement.stock_after,
                })
                .await
            {
                error!(error = %e, "Failed to send stock movement event");
            }
        }

        Ok(Self::movement_to_response(movement))
    }

    /// Derived availability view for display and alerting.
    #[instrument(skip(self))]
    pub async fn get_availability(
        &self,
        product_id: Uuid,
    ) -> Result<AvailabilityResponse, ServiceError> {
        let db = self.db_pool.as_ref();

        let product = ProductEntity::find_by_id(product_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let view: Availability = availability(&StockSnapshot::from(&product));
        Ok(AvailabilityResponse {
            product_id: product.id,
            base_unit_stock: product.base_unit_stock,
            available_units: view.units,
            available_pallets: view.pallets,
        })
    }

    /// Products of a wholesaler at or under their effective threshold.
    #[instrument(skip(self))]
    pub async fn list_low_stock(
        &self,
        wholesaler_id: Uuid,
    ) -> Result<Vec<product::Model>, ServiceError> {
        let db = self.db_pool.as_ref();

        let wholesaler = WholesalerEntity::find_by_id(wholesaler_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Wholesaler {} not found", wholesaler_id))
            })?;

        let products = ProductEntity::find()
            .filter(product::Column::WholesalerId.eq(wholesaler_id))
            .order_by_asc(product::Column::Name)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(products
            .into_iter()
            .filter(|p| {
                let units = availability(&StockSnapshot::from(p)).units;
                let threshold = self
                    .alerts
                    .effective_threshold(p, wholesaler.default_low_stock_threshold);
                units <= threshold
            })
            .collect())
    }

    /// Reads a product's movement ledger, newest first.
    #[instrument(skip(self))]
    pub async fn list_movements(
        &self,
        product_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<MovementResponse>, u64), ServiceError> {
        let db = self.db_pool.as_ref();

        let paginator = StockMovementEntity::find()
            .filter(stock_movement::Column::ProductId.eq(product_id))
            .order_by_desc(stock_movement::Column::CreatedAt)
            .paginate(db, limit.max(1));

        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let movements = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((
            movements
                .into_iter()
                .map(Self::movement_to_response)
                .collect(),
            total,
        ))
    }

    fn movement_to_response(model: stock_movement::Model) -> MovementResponse {
        MovementResponse {
            id: model.id,
            product_id: model.product_id,
            movement_type: model.movement_type,
            quantity: model.quantity,
            stock_before: model.stock_before,
            stock_after: model.stock_after,
            reason: model.reason,
            order_id: model.order_id,
        }
    }
}
