//! Order-number allocation under parallel writers.
//!
//! The parallel test needs a real Postgres database (set
//! `TEST_DATABASE_URL`) because the in-memory SQLite fixture runs on a
//! single connection and serializes everything.
//! Run with: cargo test -- --ignored order_number_concurrency

mod common;

use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::sync::Arc;

use common::*;
use migrations::{Migrator, MigratorTrait};
use tradestack_api::services::orders::{CreateOrderItem, CreateOrderRequest};

fn request(wholesaler_id: uuid::Uuid, retailer_id: uuid::Uuid, product_id: uuid::Uuid) -> CreateOrderRequest {
    CreateOrderRequest {
        wholesaler_id,
        retailer_id,
        order_number: None,
        delivery_address: None,
        notes: None,
        items: vec![CreateOrderItem {
            product_id,
            quantity: 1,
            unit_price: dec!(4.50),
            selling_type: "units".to_string(),
        }],
    }
}

#[tokio::test]
async fn sequential_allocation_is_strictly_increasing() {
    let db = setup_test_db().await;
    let svc = order_service(db.clone());

    let wholesaler = seed_wholesaler(&db, "Smith Foods").await;
    let retailer = seed_customer(&db, "Corner Shop", None, None, None).await;
    let product = seed_product(&db, wholesaler.id, "Beans", 100_000, 6, 48).await;

    let mut previous = 0i64;
    for _ in 0..25 {
        let created = svc
            .create_order(request(wholesaler.id, retailer.id, product.id))
            .await
            .expect("order created");
        let suffix: i64 = created
            .order_number
            .strip_prefix("SF-")
            .unwrap()
            .parse()
            .unwrap();
        assert!(suffix > previous, "expected strictly increasing numbers");
        previous = suffix;
    }
}

#[tokio::test]
#[ignore]
async fn order_number_concurrency_produces_no_duplicates() {
    let url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must point at a Postgres database");
    let db = tradestack_api::db::establish_connection(&url)
        .await
        .expect("db connect");
    Migrator::up(&db, None).await.expect("migrations");
    let db = Arc::new(db);

    let svc = Arc::new(order_service(db.clone()));
    let wholesaler = seed_wholesaler(&db, "Smith Foods").await;
    let retailer = seed_customer(&db, "Corner Shop", None, None, None).await;
    let product = seed_product(&db, wholesaler.id, "Beans", 1_000_000, 6, 48).await;

    let mut tasks = Vec::new();
    for _ in 0..20 {
        let svc = svc.clone();
        let req = request(wholesaler.id, retailer.id, product.id);
        tasks.push(tokio::spawn(async move { svc.create_order(req).await }));
    }

    let mut numbers = HashSet::new();
    let mut successes = 0;
    for task in tasks {
        if let Ok(Ok(order)) = task.await {
            successes += 1;
            assert!(
                numbers.insert(order.order_number.clone()),
                "duplicate order number {}",
                order.order_number
            );
        }
    }

    // Bounded retry means every writer should eventually succeed
    assert_eq!(successes, 20, "all concurrent orders should be created");
}
