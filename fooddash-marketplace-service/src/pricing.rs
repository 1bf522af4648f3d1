//! Integer pricing of order and cart lines.
//!
//! All amounts are minor currency units. Every sum and product is checked so
//! an absurd quantity or adjustment surfaces as a validation error instead of
//! wrapping.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::MarketplaceError;

/// One chosen option value and the amount it adds to the unit price.
#[derive(Serialize, Copy, Clone, Debug, PartialEq, Eq)]
pub struct SelectedValue {
    pub option_id: i64,
    pub option_value_id: i64,
    pub price_delta: i64,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct PricedLine {
    pub menu_id: i64,
    pub qty: i32,
    pub unit_price: i64,
    pub total: i64,
    pub selections: Vec<SelectedValue>,
}

pub fn unit_price(menu_price: i64, selections: &[SelectedValue]) -> Result<i64, MarketplaceError> {
    let price = selections
        .iter()
        .try_fold(menu_price, |acc, s| acc.checked_add(s.price_delta))
        .ok_or(MarketplaceError::PriceOutOfRange)?;
    if price < 0 {
        return Err(MarketplaceError::PriceOutOfRange);
    }
    Ok(price)
}

pub fn line_total(unit_price: i64, qty: i32) -> Result<i64, MarketplaceError> {
    if qty < 1 {
        return Err(MarketplaceError::InvalidQuantity);
    }
    unit_price
        .checked_mul(i64::from(qty))
        .ok_or(MarketplaceError::PriceOutOfRange)
}

pub fn price_line(
    menu_id: i64,
    menu_price: i64,
    qty: i32,
    selections: Vec<SelectedValue>,
) -> Result<PricedLine, MarketplaceError> {
    let unit_price = unit_price(menu_price, &selections)?;
    let total = line_total(unit_price, qty)?;
    Ok(PricedLine {
        menu_id,
        qty,
        unit_price,
        total,
        selections,
    })
}

#[derive(Serialize, Copy, Clone, Debug, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: i64,
    pub discount: i64,
    pub delivery_fee: i64,
    pub total: i64,
}

impl OrderTotals {
    /// Discount is always zero: promotions are not applied at order creation.
    pub fn compute(lines: &[PricedLine], delivery_fee: i64) -> Result<Self, MarketplaceError> {
        let subtotal = lines
            .iter()
            .try_fold(0i64, |acc, line| acc.checked_add(line.total))
            .ok_or(MarketplaceError::PriceOutOfRange)?;
        let discount = 0;
        let total = subtotal
            .checked_sub(discount)
            .and_then(|t| t.checked_add(delivery_fee))
            .ok_or(MarketplaceError::PriceOutOfRange)?;
        Ok(Self {
            subtotal,
            discount,
            delivery_fee,
            total,
        })
    }
}

/// Rejects repeated option value ids within one line.
pub fn ensure_distinct(option_value_ids: &[i64]) -> Result<(), MarketplaceError> {
    let mut seen = HashSet::with_capacity(option_value_ids.len());
    for id in option_value_ids {
        if !seen.insert(*id) {
            return Err(MarketplaceError::DuplicateOptionValue(*id));
        }
    }
    Ok(())
}

/// Order-independent identity of a set of option values, used as part of the
/// cart merge key.
pub fn selection_key(option_value_ids: &[i64]) -> String {
    let mut ids = option_value_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(option_value_id: i64, price_delta: i64) -> SelectedValue {
        SelectedValue {
            option_id: 1,
            option_value_id,
            price_delta,
        }
    }

    #[test]
    fn prices_a_line_with_one_adjustment() {
        let line = price_line(1, 100, 2, vec![value(5, 20)]).unwrap();
        assert_eq!(line.unit_price, 120);
        assert_eq!(line.total, 240);

        let totals = OrderTotals::compute(&[line], 20).unwrap();
        assert_eq!(totals.subtotal, 240);
        assert_eq!(totals.discount, 0);
        assert_eq!(totals.total, 260);
    }

    #[test]
    fn subtotal_sums_every_line() {
        let lines = vec![
            price_line(1, 50, 1, vec![]).unwrap(),
            price_line(2, 80, 3, vec![value(7, -10), value(8, 5)]).unwrap(),
        ];
        assert_eq!(lines[1].unit_price, 75);

        let totals = OrderTotals::compute(&lines, 0).unwrap();
        assert_eq!(totals.subtotal, 50 + 225);
        assert_eq!(totals.total, totals.subtotal);
    }

    #[test]
    fn zero_quantity_is_rejected() {
        assert!(matches!(
            price_line(1, 100, 0, vec![]),
            Err(MarketplaceError::InvalidQuantity)
        ));
    }

    #[test]
    fn negative_unit_price_is_rejected() {
        assert!(matches!(
            price_line(1, 10, 1, vec![value(3, -11)]),
            Err(MarketplaceError::PriceOutOfRange)
        ));
    }

    #[test]
    fn overflow_is_rejected() {
        assert!(matches!(
            price_line(1, i64::MAX / 2, i32::MAX, vec![]),
            Err(MarketplaceError::PriceOutOfRange)
        ));
    }

    #[test]
    fn selection_key_ignores_order() {
        assert_eq!(selection_key(&[9, 3, 5]), selection_key(&[5, 9, 3]));
        assert_eq!(selection_key(&[9, 3, 5]), "3,5,9");
        assert_eq!(selection_key(&[]), "");
        assert_ne!(selection_key(&[3]), selection_key(&[3, 5]));
    }

    #[test]
    fn duplicate_values_are_rejected() {
        assert!(ensure_distinct(&[1, 2, 3]).is_ok());
        assert!(matches!(
            ensure_distinct(&[1, 2, 1]),
            Err(MarketplaceError::DuplicateOptionValue(1))
        ));
    }
}
