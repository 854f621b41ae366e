//! Shared test fixtures: an in-memory SQLite database with migrations applied
//! and seed helpers for the core entities.

#![allow(dead_code)]

use chrono::Utc;
use migrations::{Migrator, MigratorTrait};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use std::sync::Arc;
use uuid::Uuid;

use tradestack_api::entities::{
    customer, customer_group, customer_group_member, product, wholesaler, wholesaler_customer,
};
use tradestack_api::services::fees::PercentPlusFixed;
use tradestack_api::services::{
    CustomerResolver, InventoryService, OrderService, StockAlertService,
};

pub const TEST_DEFAULT_THRESHOLD: i64 = 10;

/// In-memory SQLite with a single connection: a pooled `sqlite::memory:`
/// would hand every connection its own empty database.
pub async fn setup_test_db() -> Arc<DatabaseConnection> {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1).sqlx_logging(false);

    let db = Database::connect(opt).await.expect("db connect");
    Migrator::up(&db, None).await.expect("migrations");
    Arc::new(db)
}

pub fn order_service(db: Arc<DatabaseConnection>) -> OrderService {
    let alerts = StockAlertService::new(db.clone(), TEST_DEFAULT_THRESHOLD);
    OrderService::new(db, None, Arc::new(PercentPlusFixed), alerts, 3)
}

pub fn inventory_service(db: Arc<DatabaseConnection>) -> InventoryService {
    let alerts = StockAlertService::new(db.clone(), TEST_DEFAULT_THRESHOLD);
    InventoryService::new(db, None, alerts)
}

pub fn alert_service(db: Arc<DatabaseConnection>) -> StockAlertService {
    StockAlertService::new(db, TEST_DEFAULT_THRESHOLD)
}

pub fn resolver(db: Arc<DatabaseConnection>) -> CustomerResolver {
    CustomerResolver::new(db)
}

pub async fn seed_wholesaler(db: &DatabaseConnection, business_name: &str) -> wholesaler::Model {
    seed_wholesaler_with(db, business_name, None, dec!(0), dec!(0)).await
}

pub async fn seed_wholesaler_with(
    db: &DatabaseConnection,
    business_name: &str,
    contact_email: Option<&str>,
    fee_percent: Decimal,
    fee_fixed: Decimal,
) -> wholesaler::Model {
    wholesaler::ActiveModel {
        id: Set(Uuid::new_v4()),
        business_name: Set(business_name.to_string()),
        contact_email: Set(contact_email.map(str::to_string)),
        default_low_stock_threshold: Set(None),
        platform_fee_percent: Set(fee_percent),
        platform_fee_fixed: Set(fee_fixed),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("seed wholesaler")
}

pub async fn seed_product(
    db: &DatabaseConnection,
    wholesaler_id: Uuid,
    name: &str,
    base_unit_stock: i64,
    quantity_in_pack: i64,
    units_per_pallet: i64,
) -> product::Model {
    product::ActiveModel {
        id: Set(Uuid::new_v4()),
        wholesaler_id: Set(wholesaler_id),
        name: Set(name.to_string()),
        unit_price: Set(dec!(4.50)),
        pallet_price: Set(None),
        base_unit_stock: Set(base_unit_stock),
        quantity_in_pack: Set(quantity_in_pack),
        units_per_pallet: Set(units_per_pallet),
        low_stock_threshold: Set(None),
        stock: Set(if quantity_in_pack > 0 {
            base_unit_stock.div_euclid(quantity_in_pack)
        } else {
            0
        }),
        pallet_stock: Set(if units_per_pallet > 0 {
            base_unit_stock.div_euclid(units_per_pallet)
        } else {
            0
        }),
        created_at: Set(Utc::now()),
        updated_at: Set(Some(Utc::now())),
    }
    .insert(db)
    .await
    .expect("seed product")
}

pub async fn seed_customer(
    db: &DatabaseConnection,
    full_name: &str,
    email: Option<&str>,
    phone: Option<&str>,
    legacy_wholesaler: Option<Uuid>,
) -> customer::Model {
    customer::ActiveModel {
        id: Set(Uuid::new_v4()),
        full_name: Set(full_name.to_string()),
        email: Set(email.map(str::to_string)),
        phone: Set(phone.map(str::to_string)),
        wholesaler_id: Set(legacy_wholesaler),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("seed customer")
}

pub async fn link_customer(
    db: &DatabaseConnection,
    wholesaler_id: Uuid,
    customer_id: Uuid,
    status: &str,
) -> wholesaler_customer::Model {
    wholesaler_customer::ActiveModel {
        id: Set(Uuid::new_v4()),
        wholesaler_id: Set(wholesaler_id),
        customer_id: Set(customer_id),
        status: Set(status.to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("seed relationship")
}

pub async fn seed_group_with_member(
    db: &DatabaseConnection,
    wholesaler_id: Uuid,
    group_name: &str,
    customer_id: Uuid,
) -> customer_group::Model {
    let group = customer_group::ActiveModel {
        id: Set(Uuid::new_v4()),
        wholesaler_id: Set(wholesaler_id),
        name: Set(group_name.to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("seed group");

    customer_group_member::ActiveModel {
        id: Set(Uuid::new_v4()),
        group_id: Set(group.id),
        customer_id: Set(customer_id),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("seed membership");

    group
}
