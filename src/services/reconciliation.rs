//! Unit-conversion arithmetic between selling formats and base-unit stock.
//!
//! Everything here is pure and synchronous; the transactional code in
//! `services::orders` and `services::inventory` applies the results.

use serde::{Deserialize, Serialize};

use crate::entities::{order_item::SellingType, product};
use crate::errors::ServiceError;

/// Inventory facts needed to convert a sale into a base-unit delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockSnapshot {
    pub base_unit_stock: i64,
    pub quantity_in_pack: i64,
    pub units_per_pallet: i64,
}

impl From<&product::Model> for StockSnapshot {
    fn from(product: &product::Model) -> Self {
        Self {
            base_unit_stock: product.base_unit_stock,
            quantity_in_pack: product.quantity_in_pack,
            units_per_pallet: product.units_per_pallet,
        }
    }
}

/// Outcome of converting one order line into a stock decrement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDecrement {
    pub consumed_base_units: i64,
    pub new_base_unit_stock: i64,
    /// Human-readable conversion trail recorded on the movement ledger,
    /// e.g. "3 pallets × 48 units/pallet = 144 base units".
    pub conversion_trail: String,
}

/// Derived display view of a base-unit stock count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub units: i64,
    pub pallets: i64,
}

/// Converts an ordered quantity in the given selling format into a base-unit
/// decrement. The result may drive `base_unit_stock` negative: oversell is a
/// visible deficit, not an error here.
pub fn reconcile_sale(
    ordered_quantity: i64,
    selling_type: SellingType,
    snapshot: &StockSnapshot,
) -> Result<StockDecrement, ServiceError> {
    if ordered_quantity <= 0 {
        return Err(ServiceError::ValidationError(format!(
            "Ordered quantity must be positive, got {}",
            ordered_quantity
        )));
    }
    if snapshot.quantity_in_pack <= 0 || snapshot.units_per_pallet <= 0 {
        return Err(ServiceError::ValidationError(format!(
            "Product has degenerate pack sizes (quantity_in_pack={}, units_per_pallet={})",
            snapshot.quantity_in_pack, snapshot.units_per_pallet
        )));
    }

    let (consumed, trail) = match selling_type {
        SellingType::Units => {
            let consumed = ordered_quantity * snapshot.quantity_in_pack;
            (
                consumed,
                format!(
                    "{} units × {} units/pack = {} base units",
                    ordered_quantity, snapshot.quantity_in_pack, consumed
                ),
            )
        }
        SellingType::Pallets => {
            let consumed = ordered_quantity * snapshot.units_per_pallet;
            (
                consumed,
                format!(
                    "{} pallets × {} units/pallet = {} base units",
                    ordered_quantity, snapshot.units_per_pallet, consumed
                ),
            )
        }
    };

    Ok(StockDecrement {
        consumed_base_units: consumed,
        new_base_unit_stock: snapshot.base_unit_stock - consumed,
        conversion_trail: trail,
    })
}

/// Floor-division view of stock in whole packs and pallets. Degenerate pack
/// sizes yield zero availability rather than an error so that display paths
/// never fail.
pub fn availability(snapshot: &StockSnapshot) -> Availability {
    let units = if snapshot.quantity_in_pack > 0 {
        snapshot.base_unit_stock.div_euclid(snapshot.quantity_in_pack)
    } else {
        0
    };
    let pallets = if snapshot.units_per_pallet > 0 {
        snapshot.base_unit_stock.div_euclid(snapshot.units_per_pallet)
    } else {
        0
    };
    Availability { units, pallets }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn snapshot(stock: i64) -> StockSnapshot {
        StockSnapshot {
            base_unit_stock: stock,
            quantity_in_pack: 6,
            units_per_pallet: 48,
        }
    }

    #[test]
    fn unit_sale_consumes_pack_multiples() {
        // 2 units of a 6-per-pack product consume 12 base units
        let result = reconcile_sale(2, SellingType::Units, &snapshot(100)).unwrap();
        assert_eq!(result.consumed_base_units, 12);
        assert_eq!(result.new_base_unit_stock, 88);
        assert_eq!(result.conversion_trail, "2 units × 6 units/pack = 12 base units");
    }

    #[test]
    fn pallet_sale_consumes_pallet_multiples() {
        // Follow-up order of 1 pallet against the 88 left by the unit sale
        let result = reconcile_sale(1, SellingType::Pallets, &snapshot(88)).unwrap();
        assert_eq!(result.consumed_base_units, 48);
        assert_eq!(result.new_base_unit_stock, 40);
        assert_eq!(
            result.conversion_trail,
            "1 pallets × 48 units/pallet = 48 base units"
        );
    }

    #[test]
    fn oversell_goes_negative_instead_of_clamping() {
        let result = reconcile_sale(3, SellingType::Pallets, &snapshot(100)).unwrap();
        assert_eq!(result.consumed_base_units, 144);
        assert_eq!(result.new_base_unit_stock, -44);
    }

    #[test_case(0 ; "zero quantity")]
    #[test_case(-4 ; "negative quantity")]
    fn non_positive_quantities_are_rejected(quantity: i64) {
        let result = reconcile_sale(quantity, SellingType::Units, &snapshot(100));
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }

    #[test]
    fn degenerate_pack_sizes_are_rejected() {
        let bad = StockSnapshot {
            base_unit_stock: 100,
            quantity_in_pack: 0,
            units_per_pallet: 48,
        };
        let result = reconcile_sale(1, SellingType::Units, &bad);
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }

    #[test]
    fn availability_floors_partial_packs() {
        let view = availability(&snapshot(100));
        assert_eq!(view.units, 16); // 100 / 6
        assert_eq!(view.pallets, 2); // 100 / 48
    }

    #[test]
    fn availability_of_negative_stock_shows_the_deficit() {
        let view = availability(&snapshot(-5));
        assert_eq!(view.units, -1);
        assert_eq!(view.pallets, -1);
    }

    #[test]
    fn availability_with_degenerate_sizes_is_zero() {
        let bad = StockSnapshot {
            base_unit_stock: 100,
            quantity_in_pack: 0,
            units_per_pallet: 0,
        };
        let view = availability(&bad);
        assert_eq!(view.units, 0);
        assert_eq!(view.pallets, 0);
    }
}
