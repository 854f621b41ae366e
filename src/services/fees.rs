//! Platform fee policy.
//!
//! The fee is a pure input to the order totals: percent-plus-fixed, deducted
//! from the wholesaler's payout. Kept behind a trait so billing experiments
//! never touch order logic.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::entities::wholesaler;

pub trait FeePolicy: Send + Sync {
    /// Platform fee for a gross sale of `subtotal` by the given wholesaler.
    fn platform_fee(&self, wholesaler: &wholesaler::Model, subtotal: Decimal) -> Decimal;
}

/// Percentage-plus-fixed deduction using the rates stored on the wholesaler.
#[derive(Debug, Default, Clone)]
pub struct PercentPlusFixed;

impl FeePolicy for PercentPlusFixed {
    fn platform_fee(&self, wholesaler: &wholesaler::Model, subtotal: Decimal) -> Decimal {
        if subtotal <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let percent_part = (subtotal * wholesaler.platform_fee_percent / dec!(100)).round_dp(2);
        let fee = percent_part + wholesaler.platform_fee_fixed;
        // A fee can never exceed the sale itself.
        fee.min(subtotal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn wholesaler(percent: Decimal, fixed: Decimal) -> wholesaler::Model {
        wholesaler::Model {
            id: Uuid::new_v4(),
            business_name: "Smith Foods".into(),
            contact_email: None,
            default_low_stock_threshold: None,
            platform_fee_percent: percent,
            platform_fee_fixed: fixed,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn percent_plus_fixed_rounds_to_cents() {
        let policy = PercentPlusFixed;
        let fee = policy.platform_fee(&wholesaler(dec!(2.5), dec!(0.30)), dec!(123.45));
        // 2.5% of 123.45 = 3.08625 -> 3.09, plus 0.30
        assert_eq!(fee, dec!(3.39));
    }

    #[test]
    fn zero_subtotal_charges_nothing() {
        let policy = PercentPlusFixed;
        assert_eq!(
            policy.platform_fee(&wholesaler(dec!(2.5), dec!(0.30)), Decimal::ZERO),
            Decimal::ZERO
        );
    }

    #[test]
    fn fee_is_capped_at_the_subtotal() {
        let policy = PercentPlusFixed;
        let fee = policy.platform_fee(&wholesaler(dec!(10), dec!(5.00)), dec!(1.00));
        assert_eq!(fee, dec!(1.00));
    }
}
