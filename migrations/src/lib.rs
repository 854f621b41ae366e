pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_wholesalers_table;
mod m20240301_000002_create_customers_table;
mod m20240301_000003_create_customer_link_tables;
mod m20240301_000004_create_products_table;
mod m20240301_000005_create_orders_table;
mod m20240301_000006_create_order_items_table;
mod m20240301_000007_create_stock_movements_table;
mod m20240301_000008_create_stock_alerts_table;
mod m20240301_000009_create_order_number_counters_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_wholesalers_table::Migration),
            Box::new(m20240301_000002_create_customers_table::Migration),
            Box::new(m20240301_000003_create_customer_link_tables::Migration),
            Box::new(m20240301_000004_create_products_table::Migration),
            Box::new(m20240301_000005_create_orders_table::Migration),
            Box::new(m20240301_000006_create_order_items_table::Migration),
            Box::new(m20240301_000007_create_stock_movements_table::Migration),
            Box::new(m20240301_000008_create_stock_alerts_table::Migration),
            Box::new(m20240301_000009_create_order_number_counters_table::Migration),
        ]
    }
}
