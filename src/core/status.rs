//! Payment-driven status derivation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::types::*;

/// Σ amount over completed payments. Failed and pending payments are ignored.
pub fn total_paid(payments: &[Payment]) -> Decimal {
    payments
        .iter()
        .filter(|p| p.counts_toward_paid())
        .fold(Decimal::ZERO, |sum, p| sum.saturating_add(p.amount))
}

/// Derive an invoice's status from its total, due date and payments.
///
/// `invoice.status` is only consulted to detect `void` (terminal) and `draft`
/// (not yet sent, so never overdue). Everything else is recomputed from
/// scratch, so calling this twice with the same inputs gives the same answer.
///
/// # Order
///
/// 1. `void` stays `void`
/// 2. paid ≥ total → `paid` (covers zero-total invoices and overpayment)
/// 3. paid > 0 → `partial`
/// 4. `draft` stays `draft`
/// 5. `now` after the due date → `overdue`
/// 6. otherwise `sent`
///
/// The due date is a calendar day in UTC; an invoice is overdue from the
/// following day on.
pub fn derive_status(invoice: &Invoice, payments: &[Payment], now: DateTime<Utc>) -> InvoiceStatus {
    if invoice.status == InvoiceStatus::Void {
        return InvoiceStatus::Void;
    }

    let paid = total_paid(payments);
    if paid >= invoice.total() {
        InvoiceStatus::Paid
    } else if paid > Decimal::ZERO {
        InvoiceStatus::Partial
    } else if invoice.status == InvoiceStatus::Draft {
        InvoiceStatus::Draft
    } else if now.date_naive() > invoice.due_date {
        InvoiceStatus::Overdue
    } else {
        InvoiceStatus::Sent
    }
}

/// [`derive_status`] over the invoice's own payment history.
pub fn refresh_status(invoice: &Invoice, now: DateTime<Utc>) -> InvoiceStatus {
    derive_status(invoice, &invoice.payments, now)
}

/// Paid, remaining balance and surplus credit for an invoice.
pub fn payment_summary(invoice: &Invoice) -> PaymentSummary {
    let paid = total_paid(&invoice.payments);
    let total = invoice.total();
    PaymentSummary {
        paid,
        remaining: total.saturating_sub(paid).max(Decimal::ZERO),
        credit: paid.saturating_sub(total).max(Decimal::ZERO),
    }
}
