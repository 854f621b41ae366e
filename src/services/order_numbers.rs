//! Per-wholesaler order-number allocation.
//!
//! Numbers look like `SF-004`: a two-letter prefix from the wholesaler's
//! business name plus a zero-padded sequence. Allocation bumps a dedicated
//! counter row with an atomic increment on the order-creation transaction;
//! a missing counter is seeded once from the highest existing order number
//! so legacy tenants keep their sequence.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::entities::{
    order::{self, Entity as OrderEntity},
    order_number_counter::{self, Entity as CounterEntity},
    wholesaler,
};
use crate::errors::ServiceError;

/// Fallback prefix when a wholesaler has no usable business name.
pub const DEFAULT_PREFIX: &str = "WS";

/// Derives the 2-letter prefix from a business name: initials of the first
/// two words, or the first two letters of a single-word name. Non-alphabetic
/// characters are skipped.
pub fn derive_prefix(business_name: Option<&str>) -> String {
    let name = match business_name {
        Some(n) if !n.trim().is_empty() => n,
        _ => return DEFAULT_PREFIX.to_string(),
    };

    let words: Vec<&str> = name
        .split_whitespace()
        .filter(|w| w.chars().any(|c| c.is_ascii_alphabetic()))
        .collect();

    let prefix: String = match words.as_slice() {
        [] => return DEFAULT_PREFIX.to_string(),
        [only] => only
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .take(2)
            .collect(),
        [first, second, ..] => {
            let mut p = String::new();
            if let Some(c) = first.chars().find(|c| c.is_ascii_alphabetic()) {
                p.push(c);
            }
            if let Some(c) = second.chars().find(|c| c.is_ascii_alphabetic()) {
                p.push(c);
            }
            p
        }
    };

    if prefix.is_empty() {
        DEFAULT_PREFIX.to_string()
    } else {
        prefix.to_ascii_uppercase()
    }
}

/// Formats a sequence value as `PREFIX-NNN`; values past 999 widen naturally.
pub fn format_order_number(prefix: &str, value: i64) -> String {
    format!("{}-{:03}", prefix, value)
}

/// Extracts the numeric suffix of `PREFIX-NNN` style numbers for the given
/// prefix. Used only to seed a missing counter from legacy rows.
pub fn parse_suffix(order_number: &str, prefix: &str) -> Option<i64> {
    let rest = order_number.strip_prefix(prefix)?.strip_prefix('-')?;
    rest.parse::<i64>().ok().filter(|n| *n >= 0)
}

/// Allocates the next order number for the wholesaler on the supplied
/// connection (normally the order-creation transaction).
///
/// A counter-insert race between two first orders surfaces as a unique
/// violation mapped to `ServiceError::Concurrency`; the caller retries the
/// whole order transaction.
pub async fn allocate<C: ConnectionTrait>(
    conn: &C,
    wholesaler: &wholesaler::Model,
) -> Result<String, ServiceError> {
    let prefix = derive_prefix(Some(&wholesaler.business_name));

    let bumped = CounterEntity::update_many()
        .col_expr(
            order_number_counter::Column::LastValue,
            Expr::col(order_number_counter::Column::LastValue).add(1),
        )
        .filter(order_number_counter::Column::WholesalerId.eq(wholesaler.id))
        .exec(conn)
        .await
        .map_err(ServiceError::DatabaseError)?;

    if bumped.rows_affected > 0 {
        // The row lock taken by the increment covers this read-back.
        let counter = CounterEntity::find_by_id(wholesaler.id)
            .one(conn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "Order number counter vanished for wholesaler {}",
                    wholesaler.id
                ))
            })?;
        debug!(wholesaler_id = %wholesaler.id, value = counter.last_value, "Bumped order number counter");
        return Ok(format_order_number(&counter.prefix, counter.last_value));
    }

    // First order for this wholesaler: seed the counter from legacy rows.
    let next = seed_value_from_existing_orders(conn, wholesaler.id, &prefix).await?;

    let counter = order_number_counter::ActiveModel {
        wholesaler_id: Set(wholesaler.id),
        prefix: Set(prefix.clone()),
        last_value: Set(next),
    };
    counter.insert(conn).await.map_err(|e| {
        if matches!(e.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_))) {
            ServiceError::Concurrency(format!(
                "Order number counter for wholesaler {} was initialized concurrently",
                wholesaler.id
            ))
        } else {
            ServiceError::DatabaseError(e)
        }
    })?;

    info!(wholesaler_id = %wholesaler.id, prefix = %prefix, seeded = next, "Seeded order number counter");
    Ok(format_order_number(&prefix, next))
}

/// Scans existing `PREFIX-%` order numbers of the wholesaler and returns the
/// next free sequence value.
async fn seed_value_from_existing_orders<C: ConnectionTrait>(
    conn: &C,
    wholesaler_id: Uuid,
    prefix: &str,
) -> Result<i64, ServiceError> {
    let pattern = format!("{}-%", prefix);
    let existing = OrderEntity::find()
        .filter(order::Column::WholesalerId.eq(wholesaler_id))
        .filter(order::Column::OrderNumber.like(pattern.as_str()))
        .all(conn)
        .await
        .map_err(ServiceError::DatabaseError)?;

    let max = existing
        .iter()
        .filter_map(|o| parse_suffix(&o.order_number, prefix))
        .max()
        .unwrap_or(0);

    Ok(max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Some("Smith Foods"), "SF" ; "two words")]
    #[test_case(Some("Smith Fine Foods"), "SF" ; "extra words ignored")]
    #[test_case(Some("Acme"), "AC" ; "single word takes two letters")]
    #[test_case(Some("smith foods"), "SF" ; "lowercased input")]
    #[test_case(Some("  "), "WS" ; "blank name falls back")]
    #[test_case(None, "WS" ; "missing name falls back")]
    #[test_case(Some("123 Wholesale"), "WH" ; "numeric word skipped")]
    #[test_case(Some("7-Eleven Supplies"), "ES" ; "leading digits in word skipped")]
    fn prefix_derivation(name: Option<&str>, expected: &str) {
        assert_eq!(derive_prefix(name), expected);
    }

    #[test]
    fn formatting_zero_pads_to_three_digits() {
        assert_eq!(format_order_number("SF", 4), "SF-004");
        assert_eq!(format_order_number("SF", 135), "SF-135");
        assert_eq!(format_order_number("SF", 1042), "SF-1042");
    }

    #[test]
    fn suffix_parsing_is_prefix_scoped() {
        assert_eq!(parse_suffix("SF-003", "SF"), Some(3));
        assert_eq!(parse_suffix("SF-1042", "SF"), Some(1042));
        assert_eq!(parse_suffix("GF-003", "SF"), None);
        assert_eq!(parse_suffix("SF-abc", "SF"), None);
        assert_eq!(parse_suffix("SF003", "SF"), None);
    }
}
