//! Manual stock movements, the audit ledger, and threshold alerting.

mod common;

use rust_decimal_macros::dec;
use sea_orm::EntityTrait;

use common::*;
use tradestack_api::entities::{product, stock_alert};
use tradestack_api::errors::ServiceError;
use tradestack_api::services::inventory::RecordMovementRequest;
use tradestack_api::services::orders::{CreateOrderItem, CreateOrderRequest};

fn movement(product_id: uuid::Uuid, movement_type: &str, quantity: i64) -> RecordMovementRequest {
    RecordMovementRequest {
        product_id,
        movement_type: movement_type.to_string(),
        quantity,
        reason: Some("cycle count".to_string()),
    }
}

#[tokio::test]
async fn manual_movements_update_stock_and_ledger() {
    let db = setup_test_db().await;
    let svc = inventory_service(db.clone());

    let wholesaler = seed_wholesaler(&db, "Smith Foods").await;
    let prod = seed_product(&db, wholesaler.id, "Beans", 100, 6, 48).await;

    let increase = svc
        .record_stock_movement(movement(prod.id, "manual_increase", 50))
        .await
        .expect("increase");
    assert_eq!(increase.stock_before, 100);
    assert_eq!(increase.stock_after, 150);
    assert_eq!(increase.quantity, 50);

    let decrease = svc
        .record_stock_movement(movement(prod.id, "manual_decrease", 30))
        .await
        .expect("decrease");
    assert_eq!(decrease.stock_before, 150);
    assert_eq!(decrease.stock_after, 120);
    assert_eq!(decrease.quantity, -30);

    let (ledger, total) = svc.list_movements(prod.id, 1, 20).await.expect("ledger");
    assert_eq!(total, 2);
    for row in &ledger {
        assert_eq!(row.stock_after, row.stock_before + row.quantity);
    }
}

#[tokio::test]
async fn initial_movement_states_an_absolute_count() {
    let db = setup_test_db().await;
    let svc = inventory_service(db.clone());

    let wholesaler = seed_wholesaler(&db, "Smith Foods").await;
    let prod = seed_product(&db, wholesaler.id, "Beans", 40, 6, 48).await;

    let initial = svc
        .record_stock_movement(movement(prod.id, "initial", 100))
        .await
        .expect("initial");
    assert_eq!(initial.stock_before, 40);
    assert_eq!(initial.stock_after, 100);
    assert_eq!(initial.quantity, 60);
}

#[tokio::test]
async fn purchase_movements_are_not_accepted_manually() {
    let db = setup_test_db().await;
    let svc = inventory_service(db.clone());

    let wholesaler = seed_wholesaler(&db, "Smith Foods").await;
    let prod = seed_product(&db, wholesaler.id, "Beans", 100, 6, 48).await;

    let result = svc
        .record_stock_movement(movement(prod.id, "purchase", 10))
        .await;
    assert!(matches!(result, Err(ServiceError::ValidationError(_))));
}

#[tokio::test]
async fn unknown_product_is_not_found() {
    let db = setup_test_db().await;
    let svc = inventory_service(db.clone());
    seed_wholesaler(&db, "Smith Foods").await;

    let result = svc
        .record_stock_movement(movement(uuid::Uuid::new_v4(), "manual_increase", 10))
        .await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn threshold_breach_creates_exactly_one_alert() {
    let db = setup_test_db().await;
    let svc = inventory_service(db.clone());

    let wholesaler = seed_wholesaler(&db, "Smith Foods").await;
    // 90 base units = 15 packs; default threshold is 10 packs
    let prod = seed_product(&db, wholesaler.id, "Beans", 90, 6, 48).await;

    // Down to 5 packs: low_stock alert
    svc.record_stock_movement(movement(prod.id, "manual_decrease", 60))
        .await
        .expect("first decrease");

    let alerts = stock_alert::Entity::find().all(db.as_ref()).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, "low_stock");
    assert_eq!(alerts[0].current_stock, 5);
    assert_eq!(alerts[0].threshold, TEST_DEFAULT_THRESHOLD);

    // A further reduction while the alert is open creates no second alert
    svc.record_stock_movement(movement(prod.id, "manual_decrease", 12))
        .await
        .expect("second decrease");
    let alerts = stock_alert::Entity::find().all(db.as_ref()).await.unwrap();
    assert_eq!(alerts.len(), 1);
}

#[tokio::test]
async fn resolving_reopens_the_alerting_path() {
    let db = setup_test_db().await;
    let inventory = inventory_service(db.clone());
    let alerts = alert_service(db.clone());

    let wholesaler = seed_wholesaler(&db, "Smith Foods").await;
    let prod = seed_product(&db, wholesaler.id, "Beans", 90, 6, 48).await;

    inventory
        .record_stock_movement(movement(prod.id, "manual_decrease", 60))
        .await
        .expect("breach");

    let open = stock_alert::Entity::find().all(db.as_ref()).await.unwrap();
    let alert_id = open[0].id;

    let resolved = alerts.resolve_alert(alert_id).await.expect("resolve");
    assert!(resolved.is_resolved);
    assert!(resolved.resolved_at.is_some());

    // Double resolution is flagged
    let again = alerts.resolve_alert(alert_id).await;
    assert!(matches!(again, Err(ServiceError::InvalidStatus(_))));

    // Next breach after resolution creates a fresh alert
    inventory
        .record_stock_movement(movement(prod.id, "manual_decrease", 12))
        .await
        .expect("further decrease");
    let all = stock_alert::Entity::find().all(db.as_ref()).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn restocking_does_not_auto_resolve() {
    let db = setup_test_db().await;
    let svc = inventory_service(db.clone());

    let wholesaler = seed_wholesaler(&db, "Smith Foods").await;
    let prod = seed_product(&db, wholesaler.id, "Beans", 90, 6, 48).await;

    svc.record_stock_movement(movement(prod.id, "manual_decrease", 60))
        .await
        .expect("breach");
    svc.record_stock_movement(movement(prod.id, "manual_increase", 600))
        .await
        .expect("restock");

    let alerts = stock_alert::Entity::find().all(db.as_ref()).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert!(!alerts[0].is_resolved);
}

#[tokio::test]
async fn out_of_stock_beats_low_stock() {
    let db = setup_test_db().await;
    let svc = inventory_service(db.clone());

    let wholesaler = seed_wholesaler(&db, "Smith Foods").await;
    let prod = seed_product(&db, wholesaler.id, "Beans", 90, 6, 48).await;

    svc.record_stock_movement(movement(prod.id, "manual_decrease", 90))
        .await
        .expect("empty the shelf");

    let alerts = stock_alert::Entity::find().all(db.as_ref()).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, "out_of_stock");
    assert_eq!(alerts[0].current_stock, 0);
}

#[tokio::test]
async fn order_placement_also_feeds_alerting() {
    let db = setup_test_db().await;
    let orders = order_service(db.clone());

    let wholesaler = seed_wholesaler(&db, "Smith Foods").await;
    let retailer = seed_customer(&db, "Corner Shop", None, None, None).await;
    let prod = seed_product(&db, wholesaler.id, "Beans", 90, 6, 48).await;

    orders
        .create_order(CreateOrderRequest {
            wholesaler_id: wholesaler.id,
            retailer_id: retailer.id,
            order_number: None,
            delivery_address: None,
            notes: None,
            items: vec![CreateOrderItem {
                product_id: prod.id,
                quantity: 10,
                unit_price: dec!(4.50),
                selling_type: "units".to_string(),
            }],
        })
        .await
        .expect("order");

    // 90 - 60 = 30 base units = 5 packs, under the threshold of 10
    let alerts = stock_alert::Entity::find().all(db.as_ref()).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, "low_stock");
}

#[tokio::test]
async fn on_demand_check_catches_preexisting_breaches() {
    let db = setup_test_db().await;
    let alerts = alert_service(db.clone());

    let wholesaler = seed_wholesaler(&db, "Smith Foods").await;
    // Seeded already under threshold; no movement has run yet
    let prod = seed_product(&db, wholesaler.id, "Beans", 30, 6, 48).await;

    let created = alerts
        .check_product_by_id(prod.id)
        .await
        .expect("check runs");
    let alert = created.expect("alert expected");
    assert_eq!(alert.alert_type, "low_stock");
    assert_eq!(alert.current_stock, 5);

    // Re-checking while the alert is open creates nothing new
    let again = alerts
        .check_product_by_id(prod.id)
        .await
        .expect("check runs");
    assert!(again.is_none());
}

#[tokio::test]
async fn availability_and_low_stock_views() {
    let db = setup_test_db().await;
    let svc = inventory_service(db.clone());

    let wholesaler = seed_wholesaler(&db, "Smith Foods").await;
    let healthy = seed_product(&db, wholesaler.id, "Beans", 10_000, 6, 48).await;
    let low = seed_product(&db, wholesaler.id, "Rice", 30, 6, 48).await;

    let view = svc.get_availability(healthy.id).await.expect("availability");
    assert_eq!(view.available_units, 1666);
    assert_eq!(view.available_pallets, 208);

    let listed = svc.list_low_stock(wholesaler.id).await.expect("low stock");
    let ids: Vec<uuid::Uuid> = listed.iter().map(|p: &product::Model| p.id).collect();
    assert!(ids.contains(&low.id));
    assert!(!ids.contains(&healthy.id));
}
