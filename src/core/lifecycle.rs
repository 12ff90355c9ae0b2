//! Status transitions that are triggered by the user rather than by payments.
//!
//! Each function takes a snapshot and returns a new one; status is always
//! re-derived through [`derive_status`](super::status::derive_status) instead
//! of being assigned directly, `void` being the one exception.

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;

use super::config::ReconcileConfig;
use super::error::ValidationError;
use super::reminders::{LATE_FEE_DESCRIPTION, ReminderSettings};
use super::status::{payment_summary, refresh_status};
use super::totals::compute_totals;
use super::types::*;

/// Mark a draft as sent. The resulting status accounts for payments already
/// recorded and for the due date, so a draft past its due date goes straight
/// to `overdue`.
pub fn send(invoice: &Invoice, now: DateTime<Utc>) -> Result<Invoice, ValidationError> {
    if invoice.status == InvoiceStatus::Void {
        return Err(ValidationError::new(
            "status",
            format!("invoice {} is void and cannot be sent", invoice.number),
        ));
    }
    let mut updated = invoice.clone();
    if updated.status == InvoiceStatus::Draft {
        updated.status = InvoiceStatus::Sent;
    }
    updated.status = refresh_status(&updated, now);
    Ok(updated)
}

/// Void an invoice. Once void, no payment or date change moves it again.
pub fn void(invoice: &Invoice) -> Invoice {
    Invoice {
        status: InvoiceStatus::Void,
        ..invoice.clone()
    }
}

/// Replace the line items, recompute totals and re-derive status.
///
/// Recorded payments are kept. Lowering the total below what was already
/// paid leaves a surplus that is not bounded here; it shows up as
/// [`PaymentSummary::credit`] and callers holding a [`ReconcileConfig`]
/// check it with [`check_credit`].
pub fn replace_line_items(
    invoice: &Invoice,
    line_items: Vec<LineItem>,
    now: DateTime<Utc>,
) -> Result<Invoice, ValidationError> {
    if invoice.status == InvoiceStatus::Void {
        return Err(ValidationError::new(
            "status",
            format!("invoice {} is void and cannot be edited", invoice.number),
        ));
    }
    let totals = compute_totals(&line_items)?;
    let mut updated = Invoice {
        line_items,
        totals,
        ..invoice.clone()
    };
    updated.status = refresh_status(&updated, now);
    Ok(updated)
}

/// Reject an invoice whose paid surplus exceeds the overpayment tolerance.
pub fn check_credit(invoice: &Invoice, config: &ReconcileConfig) -> Result<(), ValidationError> {
    let credit = payment_summary(invoice).credit;
    if credit > config.overpayment_tolerance {
        return Err(ValidationError::new(
            "line_items",
            format!(
                "total {} is {} below the amount already paid",
                invoice.total(),
                credit
            ),
        ));
    }
    Ok(())
}

/// Copy an invoice into a new draft dated `issue_date`.
///
/// Contact, currency, notes and line items carry over; payments do not. The
/// due date keeps the original payment term.
pub fn duplicate(
    invoice: &Invoice,
    number: impl Into<String>,
    issue_date: NaiveDate,
) -> Result<Invoice, ValidationError> {
    let terms = u64::try_from(invoice.payment_terms_days()).map_err(|_| {
        ValidationError::new(
            "due_date",
            format!(
                "due date {} is before issue date {}",
                invoice.due_date, invoice.issue_date
            ),
        )
    })?;
    let due_date = issue_date
        .checked_add_days(Days::new(terms))
        .ok_or_else(|| ValidationError::new("due_date", "payment term overflows the calendar"))?;

    Ok(Invoice {
        id: String::new(),
        number: number.into(),
        status: InvoiceStatus::Draft,
        issue_date,
        due_date,
        totals: compute_totals(&invoice.line_items)?,
        payments: Vec::new(),
        ..invoice.clone()
    })
}

/// Add the configured late fee as a line item when one is owed.
///
/// Returns `Ok(None)` when no fee applies or a late fee line already exists.
pub fn apply_late_fee(
    invoice: &Invoice,
    settings: &ReminderSettings,
    now: DateTime<Utc>,
) -> Result<Option<Invoice>, ValidationError> {
    let already_charged = invoice
        .line_items
        .iter()
        .any(|l| l.description == LATE_FEE_DESCRIPTION);
    if already_charged {
        return Ok(None);
    }
    let Some(fee) = settings.late_fee_for(invoice, now) else {
        return Ok(None);
    };

    let mut line_items = invoice.line_items.clone();
    line_items.push(LineItem {
        description: LATE_FEE_DESCRIPTION.to_string(),
        quantity: Decimal::ONE,
        rate: fee,
        tax_rate: None,
        discount: None,
    });
    replace_line_items(invoice, line_items, now).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn draft(due: NaiveDate) -> Invoice {
        InvoiceBuilder::new("INV-0003", date(2024, 6, 1), due)
            .id("inv-3")
            .add_line(LineItemBuilder::new("Audit", dec!(1), dec!(300)).build())
            .build()
            .unwrap()
    }

    #[test]
    fn send_draft() {
        let sent = send(&draft(date(2024, 7, 1)), now()).unwrap();
        assert_eq!(sent.status, InvoiceStatus::Sent);
    }

    #[test]
    fn send_past_due_draft_is_overdue() {
        let sent = send(&draft(date(2024, 6, 10)), now()).unwrap();
        assert_eq!(sent.status, InvoiceStatus::Overdue);
    }

    #[test]
    fn void_cannot_be_sent_or_edited() {
        let voided = void(&draft(date(2024, 7, 1)));
        assert_eq!(voided.status, InvoiceStatus::Void);
        assert!(send(&voided, now()).is_err());
        assert!(replace_line_items(&voided, vec![], now()).is_err());
    }

    #[test]
    fn replacing_lines_recomputes_totals_and_status() {
        let inv = send(&draft(date(2024, 7, 1)), now()).unwrap();
        let inv = record_payment(
            &inv,
            PaymentBuilder::new("inv-3", dec!(300), PaymentMethod::Card).build(),
            &ReconcileConfig::default(),
            now(),
        )
        .unwrap();
        assert_eq!(inv.status, InvoiceStatus::Paid);

        let mut lines = inv.line_items.clone();
        lines.push(LineItemBuilder::new("Follow-up", dec!(2), dec!(50)).build());
        let updated = replace_line_items(&inv, lines, now()).unwrap();
        assert_eq!(updated.totals.total, dec!(400));
        assert_eq!(updated.status, InvoiceStatus::Partial);
        assert!(verify_totals(&updated).is_empty());
    }

    #[test]
    fn duplicate_keeps_terms_and_drops_payments() {
        let mut inv = send(&draft(date(2024, 7, 1)), now()).unwrap();
        inv.payments
            .push(PaymentBuilder::new("inv-3", dec!(10), PaymentMethod::Card).build());

        let copy = duplicate(&inv, "INV-0004", date(2024, 8, 1)).unwrap();
        assert_eq!(copy.number, "INV-0004");
        assert!(copy.id.is_empty());
        assert_eq!(copy.status, InvoiceStatus::Draft);
        assert_eq!(copy.due_date, date(2024, 8, 31));
        assert!(copy.payments.is_empty());
        assert_eq!(copy.line_items, inv.line_items);
    }

    #[test]
    fn duplicate_rejects_due_date_before_issue_date() {
        let mut inv = draft(date(2024, 7, 1));
        inv.due_date = date(2024, 5, 20);
        let err = duplicate(&inv, "INV-0005", date(2024, 8, 1)).unwrap_err();
        assert_eq!(err.field, "due_date");
    }

    #[test]
    fn shrinking_a_paid_invoice_leaves_unbounded_credit() {
        let inv = send(&draft(date(2024, 7, 1)), now()).unwrap();
        let inv = record_payment(
            &inv,
            PaymentBuilder::new("inv-3", dec!(300), PaymentMethod::Card).build(),
            &ReconcileConfig::default(),
            now(),
        )
        .unwrap();

        let smaller = vec![LineItemBuilder::new("Audit (partial)", dec!(1), dec!(120)).build()];
        let updated = replace_line_items(&inv, smaller, now()).unwrap();
        assert_eq!(updated.status, InvoiceStatus::Paid);
        assert_eq!(payment_summary(&updated).credit, dec!(180));

        let err = check_credit(&updated, &ReconcileConfig::default()).unwrap_err();
        assert_eq!(err.field, "line_items");
        let lenient = ReconcileConfig::default().with_overpayment_tolerance(dec!(200));
        assert!(check_credit(&updated, &lenient).is_ok());
        assert!(check_credit(&inv, &ReconcileConfig::default()).is_ok());
    }

    #[test]
    fn late_fee_is_applied_once() {
        let settings = ReminderSettings {
            late_fee: Some(LateFee {
                kind: LateFeeKind::Fixed,
                value: dec!(25),
                grace_period: 2,
            }),
            ..Default::default()
        };
        let overdue = send(&draft(date(2024, 6, 10)), now()).unwrap();

        let charged = apply_late_fee(&overdue, &settings, now()).unwrap().unwrap();
        assert_eq!(charged.totals.total, dec!(325));
        assert_eq!(charged.status, InvoiceStatus::Overdue);

        assert!(apply_late_fee(&charged, &settings, now()).unwrap().is_none());
    }
}
