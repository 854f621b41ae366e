pub mod customers;
pub mod fees;
pub mod inventory;
pub mod order_numbers;
pub mod orders;
pub mod reconciliation;
pub mod stock_alerts;

pub use customers::{CustomerAccessAdapter, CustomerResolver};
pub use inventory::InventoryService;
pub use orders::OrderService;
pub use stock_alerts::StockAlertService;
