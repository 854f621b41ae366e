//! Phone-suffix identity resolution across the three relationship paths.

mod common;

use rust_decimal_macros::dec;
use uuid::Uuid;

use common::*;
use tradestack_api::errors::ServiceError;
use tradestack_api::services::customers::ResolveQuery;
use tradestack_api::services::orders::{CreateOrderItem, CreateOrderRequest};

fn query(wholesaler_id: Uuid, last_four: &str) -> ResolveQuery {
    ResolveQuery {
        wholesaler_id,
        last_four: last_four.to_string(),
        full_phone: None,
    }
}

#[tokio::test]
async fn all_three_relationship_paths_surface_candidates() {
    let db = setup_test_db().await;
    let resolver = resolver(db.clone());

    let wholesaler = seed_wholesaler(&db, "Smith Foods").await;

    // Path 1: explicit active relationship record
    let via_link = seed_customer(&db, "Link Customer", None, Some("07700900001"), None).await;
    link_customer(&db, wholesaler.id, via_link.id, "active").await;

    // Path 2: legacy direct foreign key
    let via_legacy =
        seed_customer(&db, "Legacy Customer", None, Some("07700900002"), Some(wholesaler.id))
            .await;

    // Path 3: customer group membership
    let via_group = seed_customer(&db, "Group Customer", None, Some("07700900003"), None).await;
    seed_group_with_member(&db, wholesaler.id, "North Retailers", via_group.id).await;

    for (customer, suffix) in [
        (&via_link, "0001"),
        (&via_legacy, "0002"),
        (&via_group, "0003"),
    ] {
        let resolved = resolver
            .resolve(query(wholesaler.id, suffix))
            .await
            .expect("resolve")
            .expect("match expected");
        assert_eq!(resolved.customer_id, customer.id);
    }
}

#[tokio::test]
async fn suspended_relationships_grant_no_access() {
    let db = setup_test_db().await;
    let resolver = resolver(db.clone());

    let wholesaler = seed_wholesaler(&db, "Smith Foods").await;
    let suspended = seed_customer(&db, "Suspended", None, Some("07700900009"), None).await;
    link_customer(&db, wholesaler.id, suspended.id, "suspended").await;

    let resolved = resolver
        .resolve(query(wholesaler.id, "0009"))
        .await
        .expect("resolve");
    assert!(resolved.is_none());
}

#[tokio::test]
async fn prior_order_count_breaks_suffix_ties() {
    let db = setup_test_db().await;
    let resolver = resolver(db.clone());
    let orders = order_service(db.clone());

    let wholesaler = seed_wholesaler(&db, "Smith Foods").await;
    let prod = seed_product(&db, wholesaler.id, "Beans", 100_000, 6, 48).await;

    // Alice (3 prior orders) and Bob (0) share the suffix 1234
    let alice = seed_customer(
        &db,
        "Alice",
        Some("alice@gmail.com"),
        Some("07700901234"),
        None,
    )
    .await;
    let bob = seed_customer(&db, "Bob", None, Some("07811901234"), None).await;
    link_customer(&db, wholesaler.id, alice.id, "active").await;
    link_customer(&db, wholesaler.id, bob.id, "active").await;

    for _ in 0..3 {
        orders
            .create_order(CreateOrderRequest {
                wholesaler_id: wholesaler.id,
                retailer_id: alice.id,
                order_number: None,
                delivery_address: None,
                notes: None,
                items: vec![CreateOrderItem {
                    product_id: prod.id,
                    quantity: 1,
                    unit_price: dec!(4.50),
                    selling_type: "units".to_string(),
                }],
            })
            .await
            .expect("alice order");
    }

    let resolved = resolver
        .resolve(query(wholesaler.id, "1234"))
        .await
        .expect("resolve")
        .expect("match expected");
    assert_eq!(resolved.customer_id, alice.id);
    assert_eq!(resolved.full_name, "Alice");
    assert_eq!(resolved.prior_orders, 3);
}

#[tokio::test]
async fn full_phone_pins_the_exact_account() {
    let db = setup_test_db().await;
    let resolver = resolver(db.clone());

    let wholesaler = seed_wholesaler(&db, "Smith Foods").await;
    let alice =
        seed_customer(&db, "Alice", Some("alice@gmail.com"), Some("+447700901234"), None).await;
    let bob = seed_customer(&db, "Bob", None, Some("+447811901234"), None).await;
    link_customer(&db, wholesaler.id, alice.id, "active").await;
    link_customer(&db, wholesaler.id, bob.id, "active").await;

    let resolved = resolver
        .resolve(ResolveQuery {
            wholesaler_id: wholesaler.id,
            last_four: "1234".to_string(),
            full_phone: Some("0044 7811 901234".to_string()),
        })
        .await
        .expect("resolve")
        .expect("match expected");
    assert_eq!(resolved.customer_id, bob.id);
    assert_eq!(resolved.matched_by, "exact_international_match");
}

#[tokio::test]
async fn wholesaler_owned_emails_do_not_count() {
    let db = setup_test_db().await;
    let resolver = resolver(db.clone());

    let wholesaler = seed_wholesaler_with(
        &db,
        "Smith Foods",
        Some("info@smithfoods.com"),
        dec!(0),
        dec!(0),
    )
    .await;

    // First-created candidate has a wholesaler-owned address, second a real one
    let shop_account = seed_customer(
        &db,
        "Shop Account",
        Some("orders@smithfoods.com"),
        Some("07700901234"),
        None,
    )
    .await;
    let real = seed_customer(
        &db,
        "Real Person",
        Some("person@gmail.com"),
        Some("07811901234"),
        None,
    )
    .await;
    link_customer(&db, wholesaler.id, shop_account.id, "active").await;
    link_customer(&db, wholesaler.id, real.id, "active").await;

    let resolved = resolver
        .resolve(query(wholesaler.id, "1234"))
        .await
        .expect("resolve")
        .expect("match expected");
    assert_eq!(resolved.customer_id, real.id);
}

#[tokio::test]
async fn no_match_is_a_clean_none() {
    let db = setup_test_db().await;
    let resolver = resolver(db.clone());
    let wholesaler = seed_wholesaler(&db, "Smith Foods").await;

    let resolved = resolver
        .resolve(query(wholesaler.id, "9999"))
        .await
        .expect("resolve");
    assert!(resolved.is_none());
}

#[tokio::test]
async fn malformed_suffix_is_rejected() {
    let db = setup_test_db().await;
    let resolver = resolver(db.clone());
    let wholesaler = seed_wholesaler(&db, "Smith Foods").await;

    for bad in ["123", "12345", "12a4", ""] {
        let result = resolver.resolve(query(wholesaler.id, bad)).await;
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }
}

#[tokio::test]
async fn unknown_wholesaler_is_not_found() {
    let db = setup_test_db().await;
    let resolver = resolver(db.clone());

    let result = resolver.resolve(query(Uuid::new_v4(), "1234")).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn resolution_is_idempotent() {
    let db = setup_test_db().await;
    let resolver = resolver(db.clone());

    let wholesaler = seed_wholesaler(&db, "Smith Foods").await;
    let ann = seed_customer(&db, "Ann", None, Some("07700901234"), None).await;
    let mae = seed_customer(&db, "Mae", None, Some("07811901234"), None).await;
    link_customer(&db, wholesaler.id, ann.id, "active").await;
    link_customer(&db, wholesaler.id, mae.id, "active").await;

    let first = resolver
        .resolve(query(wholesaler.id, "1234"))
        .await
        .expect("resolve")
        .expect("match expected");
    let second = resolver
        .resolve(query(wholesaler.id, "1234"))
        .await
        .expect("resolve")
        .expect("match expected");
    assert_eq!(first.customer_id, second.customer_id);
}
