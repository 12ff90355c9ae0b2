//! Storage and notification collaborators, and the service that drives them.
//!
//! The reconciliation engine in [`crate::core`] is pure; this module wires it
//! to whatever backend holds invoices. Implement [`InvoiceStore`] and
//! [`Notifier`] for your backend, or use [`MemoryStore`] and [`LogNotifier`]
//! in tests and development.

mod memory;
mod service;

pub use memory::*;
pub use service::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::{Invoice, InvoiceFilter, Payment, PaymentFilter, PersistenceError, Reminder};

/// Persistence collaborator.
///
/// Implementations own atomicity: two payments recorded at the same time
/// against one invoice must be serialized (transaction or retry-on-conflict)
/// by the store, not by the caller.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Fetch an invoice with its line items and payments.
    async fn fetch_invoice(&self, id: &str) -> Result<Option<Invoice>, PersistenceError>;

    /// List invoices matching `filter`, newest issue date first.
    async fn list_invoices(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>, PersistenceError>;

    /// Insert a new invoice. Assigns an id when `invoice.id` is empty.
    async fn insert_invoice(&self, invoice: Invoice) -> Result<Invoice, PersistenceError>;

    /// Overwrite an existing invoice's fields and line items. Payments are
    /// stored separately and left untouched.
    async fn update_invoice(&self, invoice: &Invoice) -> Result<(), PersistenceError>;

    /// Delete an invoice and its payments. Returns false if it did not exist.
    async fn delete_invoice(&self, id: &str) -> Result<bool, PersistenceError>;

    /// Insert a payment row. Assigns an id when `payment.id` is empty.
    async fn insert_payment(&self, payment: Payment) -> Result<Payment, PersistenceError>;

    /// Remove one payment row. Returns false if it did not exist.
    async fn delete_payment(
        &self,
        invoice_id: &str,
        payment_id: &str,
    ) -> Result<bool, PersistenceError>;

    /// All payments for an invoice, oldest first.
    async fn list_payments(&self, invoice_id: &str) -> Result<Vec<Payment>, PersistenceError>;

    /// Payments across all invoices matching `filter`, newest first.
    async fn query_payments(&self, filter: &PaymentFilter) -> Result<Vec<Payment>, PersistenceError>;

    /// Every invoice number in use, for sequencing new ones.
    async fn invoice_numbers(&self) -> Result<Vec<String>, PersistenceError>;
}

/// Delivery options for sending an invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SendOptions {
    /// Overrides the contact's email.
    pub to: Option<String>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub message: Option<String>,
}

/// Notification collaborator for invoice emails/SMS.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_invoice(
        &self,
        invoice: &Invoice,
        options: &SendOptions,
    ) -> Result<(), PersistenceError>;

    async fn send_reminder(
        &self,
        invoice: &Invoice,
        reminder: &Reminder,
    ) -> Result<(), PersistenceError>;
}

/// Notifier that only logs. Useful when no delivery channel is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_invoice(
        &self,
        invoice: &Invoice,
        options: &SendOptions,
    ) -> Result<(), PersistenceError> {
        let to = options
            .to
            .as_deref()
            .or_else(|| invoice.contact.as_ref().and_then(|c| c.email.as_deref()))
            .unwrap_or("<no recipient>");
        info!(invoice = %invoice.number, to, "invoice sent");
        Ok(())
    }

    async fn send_reminder(
        &self,
        invoice: &Invoice,
        reminder: &Reminder,
    ) -> Result<(), PersistenceError> {
        info!(
            invoice = %invoice.number,
            kind = ?reminder.kind,
            days = reminder.days,
            "reminder sent"
        );
        Ok(())
    }
}
