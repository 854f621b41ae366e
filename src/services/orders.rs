//! Order ingestion: the transactional coordinator for order + line items +
//! stock decrement + ledger + alerting.
//!
//! An order either commits completely (order row, every item, every stock
//! mutation, every movement row, any alerts) or nothing persists. Write
//! conflicts (order-number collision, counter seeding race) retry the whole
//! transaction from scratch, bounded by configuration.

use chrono::Utc;
use lazy_static::lazy_static;
use prometheus::IntCounter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{
    customer::Entity as CustomerEntity,
    order::{self, Entity as OrderEntity, OrderStatus},
    order_item::{self, Entity as OrderItemEntity, SellingType},
    product::{self, Entity as ProductEntity},
    stock_movement::MovementType,
    wholesaler::Entity as WholesalerEntity,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::fees::FeePolicy;
use crate::services::inventory::{apply_stock_delta, insert_movement_row};
use crate::services::order_numbers;
use crate::services::reconciliation::{reconcile_sale, StockSnapshot};
use crate::services::stock_alerts::StockAlertService;

lazy_static! {
    static ref ORDER_CREATIONS: IntCounter =
        IntCounter::new("order_creations_total", "Total number of orders created")
            .expect("metric can be created");
    static ref ORDER_CREATION_FAILURES: IntCounter = IntCounter::new(
        "order_creation_failures_total",
        "Total number of failed order creations"
    )
    .expect("metric can be created");
    static ref ORDER_CREATION_RETRIES: IntCounter = IntCounter::new(
        "order_creation_retries_total",
        "Order creation attempts retried after a write conflict"
    )
    .expect("metric can be created");
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    pub wholesaler_id: Uuid,
    pub retailer_id: Uuid,
    /// Normally allocated server-side; importers may supply one explicitly.
    pub order_number: Option<String>,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<CreateOrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderItem {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i64,
    pub unit_price: Decimal,
    /// "units" or "pallets"
    pub selling_type: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderStatusRequest {
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub total: Decimal,
    pub selling_type: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub wholesaler_id: Uuid,
    pub retailer_id: Uuid,
    pub status: String,
    pub subtotal: Decimal,
    pub platform_fee: Decimal,
    pub total: Decimal,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub created_at: chrono::DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for creating and managing orders.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    fee_policy: Arc<dyn FeePolicy>,
    alerts: StockAlertService,
    max_attempts: u32,
}

impl OrderService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        fee_policy: Arc<dyn FeePolicy>,
        alerts: StockAlertService,
        max_attempts: u32,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            fee_policy,
            alerts,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Creates an order with all its items in a single transaction, retrying
    /// the whole transaction on write conflicts.
    #[instrument(skip(self, request), fields(wholesaler_id = %request.wholesaler_id, retailer_id = %request.retailer_id))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        self.validate_request(&request).map_err(|e| {
            ORDER_CREATION_FAILURES.inc();
            e
        })?;

        let mut attempt = 0;
        let (saved_order, items) = loop {
            attempt += 1;
            match self.run_order_transaction(&request).await {
                Ok(result) => break result,
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    ORDER_CREATION_RETRIES.inc();
                    warn!(
                        attempt,
                        error = %e,
                        "Order creation hit a write conflict, retrying"
                    );
                }
                Err(e) => {
                    ORDER_CREATION_FAILURES.inc();
                    error!(error = %e, attempt, "Order creation failed");
                    return Err(e);
                }
            }
        };

        ORDER_CREATIONS.inc();
        info!(
            order_id = %saved_order.id,
            order_number = %saved_order.order_number,
            items_count = items.len(),
            "Order created successfully"
        );

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender
                .send(Event::OrderCreated {
                    order_id: saved_order.id,
                    wholesaler_id: saved_order.wholesaler_id,
                    order_number: saved_order.order_number.clone(),
                })
                .await
            {
                warn!(error = %e, order_id = %saved_order.id, "Failed to send order created event");
            }
        }

        Ok(Self::to_response(saved_order, items))
    }

    fn validate_request(&self, request: &CreateOrderRequest) -> Result<(), ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        for (idx, item) in request.items.iter().enumerate() {
            item.validate()
                .map_err(|e| ServiceError::ValidationError(format!("Item {}: {}", idx, e)))?;
            if item.unit_price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "Item {}: unit price must not be negative",
                    idx
                )));
            }
            if SellingType::from_str(&item.selling_type).is_none() {
                return Err(ServiceError::ValidationError(format!(
                    "Item {}: unknown selling type '{}'",
                    idx, item.selling_type
                )));
            }
        }
        Ok(())
    }

    /// One attempt: everything inside a single database transaction.
    async fn run_order_transaction(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<(order::Model, Vec<order_item::Model>), ServiceError> {
        let db = self.db_pool.as_ref();
        let request = request.clone();
        let fee_policy = self.fee_policy.clone();
        let alerts = self.alerts.clone();

        db.transaction::<_, (order::Model, Vec<order_item::Model>), ServiceError>(move |txn| {
            Box::pin(async move {
                let wholesaler = WholesalerEntity::find_by_id(request.wholesaler_id)
                    .one(txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!(
                            "Wholesaler {} not found",
                            request.wholesaler_id
                        ))
                    })?;

                // Precondition: every referenced product exists and belongs to
                // this wholesaler. Checked before any write.
                let product_ids: Vec<Uuid> =
                    request.items.iter().map(|i| i.product_id).collect();
                let products = ProductEntity::find()
                    .filter(product::Column::Id.is_in(product_ids.clone()))
                    .filter(product::Column::WholesalerId.eq(wholesaler.id))
                    .all(txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?;
                for id in &product_ids {
                    if !products.iter().any(|p| p.id == *id) {
                        return Err(ServiceError::NotFound(format!(
                            "Product {} not found for wholesaler {}",
                            id, wholesaler.id
                        )));
                    }
                }

                let customer_name = CustomerEntity::find_by_id(request.retailer_id)
                    .one(txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?
                    .map(|c| c.full_name);

                let order_number = match &request.order_number {
                    Some(explicit) => explicit.clone(),
                    None => order_numbers::allocate(txn, &wholesaler).await?,
                };

                let line_totals: Vec<Decimal> = request
                    .items
                    .iter()
                    .map(|i| (i.unit_price * Decimal::from(i.quantity)).round_dp(2))
                    .collect();
                let subtotal: Decimal = line_totals.iter().copied().sum();
                let platform_fee = fee_policy.platform_fee(&wholesaler, subtotal);

                let now = Utc::now();
                let order_id = Uuid::new_v4();
                let new_order = order::ActiveModel {
                    id: Set(order_id),
                    order_number: Set(order_number.clone()),
                    wholesaler_id: Set(wholesaler.id),
                    retailer_id: Set(request.retailer_id),
                    status: Set(OrderStatus::Pending.as_ref().to_string()),
                    subtotal: Set(subtotal),
                    platform_fee: Set(platform_fee),
                    // The fee is deducted from the wholesaler payout, not
                    // added on top of the retailer total.
                    total: Set(subtotal),
                    delivery_address: Set(request.delivery_address.clone()),
                    notes: Set(request.notes.clone()),
                    created_at: Set(now),
                    updated_at: Set(Some(now)),
                };

                let saved_order = new_order.insert(txn).await.map_err(|e| {
                    if matches!(
                        e.sql_err(),
                        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
                    ) {
                        ServiceError::Concurrency(format!(
                            "Order number {} was taken concurrently",
                            order_number
                        ))
                    } else {
                        ServiceError::DatabaseError(e)
                    }
                })?;

                let mut saved_items = Vec::with_capacity(request.items.len());
                for (item, line_total) in request.items.iter().zip(line_totals) {
                    let selling_type =
                        SellingType::from_str(&item.selling_type).ok_or_else(|| {
                            ServiceError::ValidationError(format!(
                                "Unknown selling type '{}'",
                                item.selling_type
                            ))
                        })?;

                    let new_item = order_item::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        order_id: Set(saved_order.id),
                        product_id: Set(item.product_id),
                        quantity: Set(item.quantity),
                        unit_price: Set(item.unit_price),
                        total: Set(line_total),
                        selling_type: Set(selling_type.as_str().to_string()),
                        created_at: Set(now),
                    };
                    let saved_item = new_item
                        .insert(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?;

                    // Pack sizes come from the pre-checked product row; the
                    // decrement itself is applied atomically below.
                    let product_snapshot = products
                        .iter()
                        .find(|p| p.id == item.product_id)
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Product {} not found",
                                item.product_id
                            ))
                        })?;
                    let decrement = reconcile_sale(
                        item.quantity,
                        selling_type,
                        &StockSnapshot::from(product_snapshot),
                    )?;

                    let updated = apply_stock_delta(
                        txn,
                        item.product_id,
                        -decrement.consumed_base_units,
                    )
                    .await?;
                    let stock_before = updated.base_unit_stock + decrement.consumed_base_units;

                    insert_movement_row(
                        txn,
                        &updated,
                        MovementType::Purchase,
                        -decrement.consumed_base_units,
                        stock_before,
                        Some(decrement.conversion_trail),
                        Some(saved_order.id),
                        customer_name.clone(),
                    )
                    .await?;

                    alerts
                        .check_product(txn, &updated, wholesaler.default_low_stock_threshold)
                        .await?;

                    saved_items.push(saved_item);
                }

                Ok((saved_order, saved_items))
            })
        })
        .await
        .map_err(|e| match e {
            sea_orm::TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
            sea_orm::TransactionError::Transaction(service_err) => service_err,
        })
    }

    /// Retrieves an order with its items.
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let db = self.db_pool.as_ref();

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let items = self.load_items(order.id).await?;
        Ok(Self::to_response(order, items))
    }

    /// Retrieves an order by its human-readable number.
    #[instrument(skip(self))]
    pub async fn get_order_by_number(
        &self,
        order_number: &str,
    ) -> Result<OrderResponse, ServiceError> {
        let db = self.db_pool.as_ref();

        let order = OrderEntity::find()
            .filter(order::Column::OrderNumber.eq(order_number))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order {} not found", order_number))
            })?;

        let items = self.load_items(order.id).await?;
        Ok(Self::to_response(order, items))
    }

    /// Lists orders, optionally scoped to one wholesaler, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        wholesaler_id: Option<Uuid>,
        page: u64,
        per_page: u64,
    ) -> Result<OrderListResponse, ServiceError> {
        let db = self.db_pool.as_ref();

        let mut query = OrderEntity::find();
        if let Some(wid) = wholesaler_id {
            query = query.filter(order::Column::WholesalerId.eq(wid));
        }

        let paginator = query
            .order_by_desc(order::Column::CreatedAt)
            .paginate(db, per_page.max(1));

        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let orders = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut responses = Vec::with_capacity(orders.len());
        for order in orders {
            let items = self.load_items(order.id).await?;
            responses.push(Self::to_response(order, items));
        }

        Ok(OrderListResponse {
            orders: responses,
            total,
            page,
            per_page,
        })
    }

    /// Items of an order, in insertion order.
    #[instrument(skip(self))]
    pub async fn get_order_items(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<OrderItemResponse>, ServiceError> {
        // 404 for a missing order rather than an empty list
        let db = self.db_pool.as_ref();
        OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let items = self.load_items(order_id).await?;
        Ok(items.into_iter().map(Self::item_to_response).collect())
    }

    /// Updates an order's status within the allowed state machine. The order
    /// number never changes.
    #[instrument(skip(self, request), fields(order_id = %order_id, new_status = %request.status))]
    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        request: UpdateOrderStatusRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let new_status = OrderStatus::from_str(&request.status).map_err(|_| {
            ServiceError::InvalidStatus(format!("Unknown order status: {}", request.status))
        })?;

        let db = self.db_pool.as_ref();
        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let old_status = order.status.clone();
        if matches!(
            OrderStatus::from_str(&old_status),
            Ok(OrderStatus::Completed) | Ok(OrderStatus::Cancelled)
        ) {
            return Err(ServiceError::InvalidStatus(format!(
                "Order {} is {} and can no longer change status",
                order_id, old_status
            )));
        }

        let mut active: order::ActiveModel = order.into();
        active.status = Set(new_status.as_ref().to_string());
        active.updated_at = Set(Some(Utc::now()));
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }

        let updated = active.update(db).await.map_err(ServiceError::DatabaseError)?;

        info!(order_id = %order_id, old_status = %old_status, new_status = %updated.status, "Order status updated");

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender
                .send(Event::OrderStatusChanged {
                    order_id,
                    old_status,
                    new_status: updated.status.clone(),
                })
                .await
            {
                warn!(error = %e, order_id = %order_id, "Failed to send status changed event");
            }
        }

        let items = self.load_items(updated.id).await?;
        Ok(Self::to_response(updated, items))
    }

    /// Cancels an order. Stock is not restocked automatically: recovery is an
    /// explicit manual_increase movement so the ledger stays complete.
    #[instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        order_id: Uuid,
        reason: Option<String>,
    ) -> Result<OrderResponse, ServiceError> {
        let response = self
            .update_order_status(
                order_id,
                UpdateOrderStatusRequest {
                    status: OrderStatus::Cancelled.as_ref().to_string(),
                    notes: reason,
                },
            )
            .await?;

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(Event::OrderCancelled(order_id)).await {
                warn!(error = %e, order_id = %order_id, "Failed to send order cancelled event");
            }
        }

        Ok(response)
    }

    async fn load_items(&self, order_id: Uuid) -> Result<Vec<order_item::Model>, ServiceError> {
        let db = self.db_pool.as_ref();
        OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::CreatedAt)
            .order_by_asc(order_item::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    fn item_to_response(model: order_item::Model) -> OrderItemResponse {
        OrderItemResponse {
            id: model.id,
            product_id: model.product_id,
            quantity: model.quantity,
            unit_price: model.unit_price,
            total: model.total,
            selling_type: model.selling_type,
        }
    }

    fn to_response(order: order::Model, items: Vec<order_item::Model>) -> OrderResponse {
        OrderResponse {
            id: order.id,
            order_number: order.order_number,
            wholesaler_id: order.wholesaler_id,
            retailer_id: order.retailer_id,
            status: order.status,
            subtotal: order.subtotal,
            platform_fee: order.platform_fee,
            total: order.total,
            delivery_address: order.delivery_address,
            notes: order.notes,
            created_at: order.created_at,
            items: items.into_iter().map(Self::item_to_response).collect(),
        }
    }
}
