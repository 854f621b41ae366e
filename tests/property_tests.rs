//! Property-based tests for the conversion arithmetic and number formatting.

use proptest::prelude::*;

use tradestack_api::entities::order_item::SellingType;
use tradestack_api::services::order_numbers::{
    derive_prefix, format_order_number, parse_suffix,
};
use tradestack_api::services::reconciliation::{
    availability, reconcile_sale, StockSnapshot,
};

fn snapshot_strategy() -> impl Strategy<Value = StockSnapshot> {
    (-10_000i64..1_000_000, 1i64..500, 1i64..5_000).prop_map(
        |(base_unit_stock, quantity_in_pack, units_per_pallet)| StockSnapshot {
            base_unit_stock,
            quantity_in_pack,
            units_per_pallet,
        },
    )
}

fn selling_type_strategy() -> impl Strategy<Value = SellingType> {
    prop_oneof![Just(SellingType::Units), Just(SellingType::Pallets)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn decrement_matches_the_declared_conversion_rule(
        quantity in 1i64..10_000,
        selling_type in selling_type_strategy(),
        snapshot in snapshot_strategy(),
    ) {
        let result = reconcile_sale(quantity, selling_type, &snapshot).unwrap();

        let expected = match selling_type {
            SellingType::Units => quantity * snapshot.quantity_in_pack,
            SellingType::Pallets => quantity * snapshot.units_per_pallet,
        };
        prop_assert_eq!(result.consumed_base_units, expected);
        // The ledger invariant: after = before - consumed, never clamped
        prop_assert_eq!(
            result.new_base_unit_stock,
            snapshot.base_unit_stock - result.consumed_base_units
        );
    }

    #[test]
    fn non_positive_quantities_never_reconcile(
        quantity in -10_000i64..=0,
        selling_type in selling_type_strategy(),
        snapshot in snapshot_strategy(),
    ) {
        prop_assert!(reconcile_sale(quantity, selling_type, &snapshot).is_err());
    }

    #[test]
    fn availability_never_overstates_stock(snapshot in snapshot_strategy()) {
        let view = availability(&snapshot);
        // Whole packs/pallets, floored: converting back never exceeds stock
        prop_assert!(view.units * snapshot.quantity_in_pack <= snapshot.base_unit_stock);
        prop_assert!(view.pallets * snapshot.units_per_pallet <= snapshot.base_unit_stock);
        // But never understates by a full pack either
        prop_assert!((view.units + 1) * snapshot.quantity_in_pack > snapshot.base_unit_stock);
        prop_assert!((view.pallets + 1) * snapshot.units_per_pallet > snapshot.base_unit_stock);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn order_numbers_round_trip_through_the_parser(
        prefix in "[A-Z]{2}",
        value in 1i64..1_000_000,
    ) {
        let formatted = format_order_number(&prefix, value);
        prop_assert_eq!(parse_suffix(&formatted, &prefix), Some(value));
    }

    #[test]
    fn derived_prefixes_are_short_uppercase_ascii(name in ".{0,60}") {
        let prefix = derive_prefix(Some(&name));
        prop_assert!(!prefix.is_empty());
        prop_assert!(prefix.len() <= 2);
        prop_assert!(prefix.chars().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn formatting_pads_to_at_least_three_digits(value in 1i64..1_000_000) {
        let formatted = format_order_number("SF", value);
        let suffix = formatted.strip_prefix("SF-").unwrap();
        prop_assert!(suffix.len() >= 3);
        prop_assert_eq!(suffix.parse::<i64>().unwrap(), value);
    }
}
