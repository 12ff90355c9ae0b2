use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::error::ValidationError;
use super::types::{LineItem, Totals};
use super::validation::validate_line_item;

/// Currency amounts carry two decimal places.
pub const CURRENCY_SCALE: u32 = 2;

/// Compute invoice aggregates from line items.
///
/// Each line is validated first (quantity > 0, rate ≥ 0, tax/discount within
/// 0..=100); the first offending field is returned as the error.
///
/// Line amounts are summed at full precision and only the four aggregates are
/// rounded, half away from zero, to [`CURRENCY_SCALE`].
///
/// ```
/// use tally::core::*;
/// use rust_decimal_macros::dec;
///
/// let items = [LineItemBuilder::new("Consulting", dec!(2), dec!(50)).tax_rate(dec!(10)).build()];
/// let totals = compute_totals(&items).unwrap();
/// assert_eq!(totals.subtotal, dec!(100));
/// assert_eq!(totals.tax_total, dec!(10));
/// assert_eq!(totals.total, dec!(110));
/// ```
pub fn compute_totals(line_items: &[LineItem]) -> Result<Totals, ValidationError> {
    let mut subtotal = Decimal::ZERO;
    let mut tax_total = Decimal::ZERO;
    let mut discount_total = Decimal::ZERO;

    for (i, item) in line_items.iter().enumerate() {
        validate_line_item(item, i)?;

        let overflow = || ValidationError::new(format!("line_items[{i}]"), "amount overflows");
        let base = item.quantity.checked_mul(item.rate).ok_or_else(overflow)?;
        let tax = percent_of(base, item.tax_rate).ok_or_else(overflow)?;
        let discount = percent_of(base, item.discount).ok_or_else(overflow)?;

        subtotal = subtotal.checked_add(base).ok_or_else(overflow)?;
        tax_total = tax_total.checked_add(tax).ok_or_else(overflow)?;
        discount_total = discount_total.checked_add(discount).ok_or_else(overflow)?;
    }

    let total = subtotal
        .checked_add(tax_total)
        .and_then(|t| t.checked_sub(discount_total))
        .ok_or_else(|| ValidationError::new("totals.total", "amount overflows"))?;

    Ok(Totals {
        subtotal: round_currency(subtotal),
        tax_total: round_currency(tax_total),
        discount_total: round_currency(discount_total),
        total: round_currency(total),
    })
}

fn percent_of(base: Decimal, rate: Option<Decimal>) -> Option<Decimal> {
    base.checked_mul(rate.unwrap_or_default())?.checked_div(dec!(100))
}

/// Full-precision total of a single line:
/// `quantity * rate * (1 + tax_rate/100 - discount/100)`.
///
/// Returns `None` when the amount does not fit in a [`Decimal`].
pub fn line_total(item: &LineItem) -> Option<Decimal> {
    let base = item.quantity.checked_mul(item.rate)?;
    let tax = percent_of(base, item.tax_rate)?;
    let discount = percent_of(base, item.discount)?;
    base.checked_add(tax)?.checked_sub(discount)
}

/// Round to currency precision, half away from zero.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LineItemBuilder;

    #[test]
    fn single_taxed_line() {
        let items = [LineItemBuilder::new("Widget", dec!(2), dec!(50))
            .tax_rate(dec!(10))
            .build()];
        let totals = compute_totals(&items).unwrap();
        assert_eq!(
            totals,
            Totals {
                subtotal: dec!(100),
                tax_total: dec!(10),
                discount_total: dec!(0),
                total: dec!(110),
            }
        );
    }

    #[test]
    fn empty_lines_are_zero() {
        assert_eq!(compute_totals(&[]).unwrap(), Totals::default());
    }

    #[test]
    fn rounds_only_the_aggregates() {
        // 3 lines of 0.333 * 1 at 10% tax: per-line rounding would give 0.99 / 0.09,
        // summing first gives 0.999 → 1.00 and 0.0999 → 0.10.
        let items: Vec<_> = (0..3)
            .map(|_| {
                LineItemBuilder::new("Fraction", dec!(1), dec!(0.333))
                    .tax_rate(dec!(10))
                    .build()
            })
            .collect();
        let totals = compute_totals(&items).unwrap();
        assert_eq!(totals.subtotal, dec!(1.00));
        assert_eq!(totals.tax_total, dec!(0.10));
        assert_eq!(totals.total, dec!(1.10));
    }

    #[test]
    fn discount_reduces_total() {
        let items = [LineItemBuilder::new("Retainer", dec!(1), dec!(200))
            .tax_rate(dec!(8.25))
            .discount(dec!(15))
            .build()];
        let totals = compute_totals(&items).unwrap();
        assert_eq!(totals.tax_total, dec!(16.50));
        assert_eq!(totals.discount_total, dec!(30.00));
        assert_eq!(totals.total, dec!(186.50));
    }

    #[test]
    fn full_discount_nets_to_zero() {
        let items = [LineItemBuilder::new("Goodwill", dec!(1), dec!(80))
            .discount(dec!(100))
            .build()];
        assert_eq!(compute_totals(&items).unwrap().total, dec!(0));
    }

    #[test]
    fn rejects_invalid_quantity_with_field_path() {
        let items = [
            LineItemBuilder::new("Ok", dec!(1), dec!(10)).build(),
            LineItemBuilder::new("Bad", dec!(0), dec!(10)).build(),
        ];
        let err = compute_totals(&items).unwrap_err();
        assert_eq!(err.field, "line_items[1].quantity");
    }

    #[test]
    fn line_total_matches_formula() {
        let item = LineItemBuilder::new("Hours", dec!(3), dec!(40))
            .tax_rate(dec!(20))
            .discount(dec!(5))
            .build();
        // 120 * 1.15
        assert_eq!(line_total(&item), Some(dec!(138)));
    }

    #[test]
    fn overflow_is_an_error() {
        let items = [LineItemBuilder::new("Huge", Decimal::MAX, dec!(2)).build()];
        assert_eq!(compute_totals(&items).unwrap_err().field, "line_items[0]");
    }

    #[test]
    fn line_total_overflow_is_none() {
        let item = LineItemBuilder::new("Huge", Decimal::MAX, dec!(2)).build();
        assert!(validate_line_item(&item, 0).is_ok());
        assert_eq!(line_total(&item), None);

        let taxed = LineItemBuilder::new("Taxed", Decimal::MAX, dec!(1))
            .tax_rate(dec!(50))
            .build();
        assert_eq!(line_total(&taxed), None);
    }

    #[test]
    fn half_up_rounding() {
        assert_eq!(round_currency(dec!(0.005)), dec!(0.01));
        assert_eq!(round_currency(dec!(2.344)), dec!(2.34));
        assert_eq!(round_currency(dec!(-0.005)), dec!(-0.01));
    }
}
