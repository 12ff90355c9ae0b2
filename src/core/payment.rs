use chrono::{DateTime, Utc};
use tracing::debug;

use super::config::ReconcileConfig;
use super::error::ValidationError;
use super::status::{refresh_status, total_paid};
use super::types::*;
use super::validation::validate_payment_amount;

/// Record a payment against an invoice and re-derive its status.
///
/// The payment is appended as [`PaymentStatus::Completed`]. It is rejected
/// when the amount is not positive, when the invoice is void, when it belongs
/// to another invoice, or when it would push the paid total past the invoice
/// total by more than `config.overpayment_tolerance`.
///
/// Returns the updated invoice; the input is left untouched.
pub fn record_payment(
    invoice: &Invoice,
    mut payment: Payment,
    config: &ReconcileConfig,
    now: DateTime<Utc>,
) -> Result<Invoice, ValidationError> {
    validate_payment_amount(payment.amount)?;

    if invoice.status == InvoiceStatus::Void {
        return Err(ValidationError::new(
            "status",
            format!("cannot record a payment against void invoice {}", invoice.number),
        ));
    }

    if payment.invoice_id.is_empty() {
        payment.invoice_id = invoice.id.clone();
    } else if !invoice.id.is_empty() && payment.invoice_id != invoice.id {
        return Err(ValidationError::new(
            "payment.invoice_id",
            format!(
                "payment belongs to invoice {}, not {}",
                payment.invoice_id, invoice.id
            ),
        ));
    }

    let paid = total_paid(&invoice.payments);
    let excess = paid
        .saturating_add(payment.amount)
        .saturating_sub(invoice.total());
    if excess > config.overpayment_tolerance {
        return Err(ValidationError::new(
            "payment.amount",
            format!(
                "amount {} exceeds the remaining balance of {}",
                payment.amount,
                invoice.total().saturating_sub(paid).max(rust_decimal::Decimal::ZERO)
            ),
        ));
    }

    payment.status = PaymentStatus::Completed;
    debug!(
        invoice = %invoice.number,
        amount = %payment.amount,
        method = payment.method.as_str(),
        "recording payment"
    );

    let mut updated = invoice.clone();
    updated.payments.push(payment);
    updated.status = refresh_status(&updated, now);
    Ok(updated)
}
