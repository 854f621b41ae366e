use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::fees::PercentPlusFixed;
use crate::services::{CustomerResolver, InventoryService, OrderService, StockAlertService};

pub mod customers;
pub mod inventory;
pub mod orders;
pub mod stock_alerts;

/// Aggregated services used by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub inventory: Arc<InventoryService>,
    pub alerts: Arc<StockAlertService>,
    pub resolver: Arc<CustomerResolver>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        let alerts = StockAlertService::new(db.clone(), config.default_low_stock_threshold);
        let orders = Arc::new(OrderService::new(
            db.clone(),
            Some(event_sender.clone()),
            Arc::new(PercentPlusFixed),
            alerts.clone(),
            config.order_create_retries,
        ));
        let inventory = Arc::new(InventoryService::new(
            db.clone(),
            Some(event_sender),
            alerts.clone(),
        ));
        let resolver = Arc::new(CustomerResolver::new(db));

        Self {
            orders,
            inventory,
            alerts: Arc::new(alerts),
            resolver,
        }
    }
}
