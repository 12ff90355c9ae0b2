use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::ValidationError;
use super::totals::compute_totals;
use super::types::*;

/// Check a single line item's ranges.
///
/// `index` is used to build the field path (`line_items[{index}].…`).
pub fn validate_line_item(item: &LineItem, index: usize) -> Result<(), ValidationError> {
    let field = |name: &str| format!("line_items[{index}].{name}");

    if item.quantity <= Decimal::ZERO {
        return Err(ValidationError::new(
            field("quantity"),
            format!("must be greater than zero, got {}", item.quantity),
        ));
    }
    if item.rate < Decimal::ZERO {
        return Err(ValidationError::new(
            field("rate"),
            format!("must not be negative, got {}", item.rate),
        ));
    }
    if let Some(tax_rate) = item.tax_rate {
        check_percentage(tax_rate, field("tax_rate"))?;
    }
    if let Some(discount) = item.discount {
        check_percentage(discount, field("discount"))?;
    }
    Ok(())
}

fn check_percentage(value: Decimal, field: String) -> Result<(), ValidationError> {
    if value < Decimal::ZERO || value > dec!(100) {
        return Err(ValidationError::new(
            field,
            format!("percentage must be within 0..=100, got {value}"),
        ));
    }
    Ok(())
}

/// Compare stored totals against a fresh computation.
/// Returns all mismatches (not just the first); empty means consistent.
pub fn verify_totals(invoice: &Invoice) -> Vec<ValidationError> {
    let expected = match compute_totals(&invoice.line_items) {
        Ok(totals) => totals,
        Err(e) => return vec![e],
    };
    let stored = &invoice.totals;

    [
        ("totals.subtotal", stored.subtotal, expected.subtotal),
        ("totals.tax_total", stored.tax_total, expected.tax_total),
        ("totals.discount_total", stored.discount_total, expected.discount_total),
        ("totals.total", stored.total, expected.total),
    ]
    .into_iter()
    .filter(|(_, stored, expected)| stored != expected)
    .map(|(field, stored, expected)| {
        ValidationError::new(
            field,
            format!("stored value {stored} does not match recomputed {expected}"),
        )
    })
    .collect()
}

/// Check a payment amount before it is recorded.
pub fn validate_payment_amount(amount: Decimal) -> Result<(), ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::new(
            "payment.amount",
            format!("must be greater than zero, got {amount}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn invoice() -> Invoice {
        InvoiceBuilder::new("INV-0001", date(2024, 6, 1), date(2024, 7, 1))
            .add_line(
                LineItemBuilder::new("Design", dec!(4), dec!(75))
                    .tax_rate(dec!(7))
                    .build(),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn accepts_boundary_percentages() {
        let item = LineItemBuilder::new("Free", dec!(1), dec!(0))
            .tax_rate(dec!(0))
            .discount(dec!(100))
            .build();
        assert!(validate_line_item(&item, 0).is_ok());
    }

    #[test]
    fn rejects_negative_rate() {
        let item = LineItemBuilder::new("Refund", dec!(1), dec!(-5)).build();
        let err = validate_line_item(&item, 3).unwrap_err();
        assert_eq!(err.field, "line_items[3].rate");
    }

    #[test]
    fn rejects_out_of_range_percentages() {
        let tax = LineItemBuilder::new("X", dec!(1), dec!(1))
            .tax_rate(dec!(100.01))
            .build();
        assert_eq!(validate_line_item(&tax, 0).unwrap_err().field, "line_items[0].tax_rate");

        let discount = LineItemBuilder::new("X", dec!(1), dec!(1))
            .discount(dec!(-1))
            .build();
        assert_eq!(
            validate_line_item(&discount, 0).unwrap_err().field,
            "line_items[0].discount"
        );
    }

    #[test]
    fn fresh_invoice_verifies_clean() {
        assert!(verify_totals(&invoice()).is_empty());
    }

    #[test]
    fn stale_totals_are_reported() {
        let mut inv = invoice();
        inv.line_items[0].quantity = dec!(5);
        let errors = verify_totals(&inv);
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["totals.subtotal", "totals.tax_total", "totals.total"]);
    }

    #[test]
    fn payment_amount_must_be_positive() {
        assert!(validate_payment_amount(dec!(0.01)).is_ok());
        assert!(validate_payment_amount(dec!(0)).is_err());
        assert!(validate_payment_amount(dec!(-10)).is_err());
    }
}
