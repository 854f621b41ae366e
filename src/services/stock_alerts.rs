//! Threshold-based stock alerting.
//!
//! `check_product` runs on the same connection as the stock mutation that
//! triggered it; the open-alert check is what enforces "at most one
//! unresolved alert per product". Alerts close only through explicit
//! resolution, restocking never auto-resolves them.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{
    product::{self, Entity as ProductEntity},
    stock_alert::{self, AlertType, Entity as StockAlertEntity},
    wholesaler::Entity as WholesalerEntity,
};
use crate::errors::ServiceError;
use crate::services::reconciliation::{availability, StockSnapshot};

#[derive(Clone)]
pub struct StockAlertService {
    db_pool: Arc<DbPool>,
    /// Platform-wide fallback when neither product nor wholesaler defines one.
    default_threshold: i64,
}

impl StockAlertService {
    pub fn new(db_pool: Arc<DbPool>, default_threshold: i64) -> Self {
        Self {
            db_pool,
            default_threshold,
        }
    }

    /// Effective threshold for a product: product override, then wholesaler
    /// default, then the platform fallback.
    pub fn effective_threshold(
        &self,
        product: &product::Model,
        wholesaler_default: Option<i64>,
    ) -> i64 {
        product
            .low_stock_threshold
            .or(wholesaler_default)
            .unwrap_or(self.default_threshold)
    }

    /// Evaluates a product's stock against its threshold after a mutation.
    /// Runs on the caller's connection so the check commits (or rolls back)
    /// with the mutation itself. Returns the created alert, if any.
    pub async fn check_product<C: ConnectionTrait>(
        &self,
        conn: &C,
        product: &product::Model,
        wholesaler_default: Option<i64>,
    ) -> Result<Option<stock_alert::Model>, ServiceError> {
        let threshold = self.effective_threshold(product, wholesaler_default);
        let units = availability(&StockSnapshot::from(product)).units;

        let alert_type = if units <= 0 {
            // Oversell counts as out-of-stock for alerting purposes.
            AlertType::OutOfStock
        } else if units <= threshold {
            AlertType::LowStock
        } else {
            return Ok(None);
        };

        // An open alert suppresses new ones: at most one unresolved per product.
        let open = StockAlertEntity::find()
            .filter(stock_alert::Column::ProductId.eq(product.id))
            .filter(stock_alert::Column::IsResolved.eq(false))
            .one(conn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if let Some(existing) = open {
            info!(
                product_id = %product.id,
                alert_id = %existing.id,
                "Skipping alert creation, unresolved alert already open"
            );
            return Ok(None);
        }

        let alert = stock_alert::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product.id),
            wholesaler_id: Set(product.wholesaler_id),
            alert_type: Set(alert_type.as_ref().to_string()),
            current_stock: Set(units),
            threshold: Set(threshold),
            is_read: Set(false),
            is_resolved: Set(false),
            created_at: Set(Utc::now()),
            resolved_at: Set(None),
        };

        let created = alert.insert(conn).await.map_err(ServiceError::DatabaseError)?;
        warn!(
            product_id = %product.id,
            alert_type = %created.alert_type,
            current_stock = units,
            threshold,
            "Stock alert raised"
        );
        Ok(Some(created))
    }

    /// On-demand re-evaluation of a product outside any mutation, e.g. after
    /// threshold configuration changes.
    #[instrument(skip(self))]
    pub async fn check_product_by_id(
        &self,
        product_id: Uuid,
    ) -> Result<Option<stock_alert::Model>, ServiceError> {
        let db = self.db_pool.as_ref();

        let product = ProductEntity::find_by_id(product_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let wholesaler_default = WholesalerEntity::find_by_id(product.wholesaler_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .and_then(|w| w.default_low_stock_threshold);

        self.check_product(db, &product, wholesaler_default).await
    }

    /// Explicitly closes an alert. Resolving an already-resolved alert is an
    /// invalid-status error so callers notice double resolution.
    #[instrument(skip(self))]
    pub async fn resolve_alert(&self, alert_id: Uuid) -> Result<stock_alert::Model, ServiceError> {
        let db = self.db_pool.as_ref();

        let alert = StockAlertEntity::find_by_id(alert_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock alert {} not found", alert_id)))?;

        if alert.is_resolved {
            return Err(ServiceError::InvalidStatus(format!(
                "Stock alert {} is already resolved",
                alert_id
            )));
        }

        let mut active: stock_alert::ActiveModel = alert.into();
        active.is_resolved = Set(true);
        active.resolved_at = Set(Some(Utc::now()));

        let resolved = active.update(db).await.map_err(ServiceError::DatabaseError)?;
        info!(alert_id = %alert_id, "Stock alert resolved");
        Ok(resolved)
    }

    #[instrument(skip(self))]
    pub async fn mark_read(&self, alert_id: Uuid) -> Result<stock_alert::Model, ServiceError> {
        let db = self.db_pool.as_ref();

        let alert = StockAlertEntity::find_by_id(alert_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock alert {} not found", alert_id)))?;

        let mut active: stock_alert::ActiveModel = alert.into();
        active.is_read = Set(true);

        active.update(db).await.map_err(ServiceError::DatabaseError)
    }

    /// Lists a wholesaler's alerts, newest first.
    #[instrument(skip(self))]
    pub async fn list_alerts(
        &self,
        wholesaler_id: Uuid,
        unresolved_only: bool,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_alert::Model>, u64), ServiceError> {
        let db = self.db_pool.as_ref();

        let mut query = StockAlertEntity::find()
            .filter(stock_alert::Column::WholesalerId.eq(wholesaler_id));
        if unresolved_only {
            query = query.filter(stock_alert::Column::IsResolved.eq(false));
        }

        let paginator = query
            .order_by_desc(stock_alert::Column::CreatedAt)
            .paginate(db, limit.max(1));

        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let alerts = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((alerts, total))
    }
}
