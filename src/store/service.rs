use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::{InvoiceStore, Notifier, SendOptions};
use crate::core::{
    Contact, Invoice, InvoiceBuilder, InvoiceFilter, InvoiceNumberSequence, InvoiceStatus,
    LineItem, Payment, PaymentBuilder, PaymentFilter, PaymentMethod, ReconcileConfig,
    ReconcileError, Result, ValidationError, derive_status, lifecycle, payment_summary,
    record_payment,
};

/// Input for [`InvoiceService::create_invoice`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvoice {
    pub contact: Option<Contact>,
    pub issue_date: NaiveDate,
    /// Defaults to `issue_date + config.default_terms_days`.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Defaults to `config.currency_code`.
    #[serde(default)]
    pub currency_code: Option<String>,
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Input for [`InvoiceService::record_payment`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    pub amount: Decimal,
    pub method: PaymentMethod,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Runs fetch → reconcile → persist flows against a store and notifier.
///
/// Holds no invoice state of its own. The engine never retries; a
/// [`ReconcileError::Persistence`] flagged retryable may be retried by the
/// caller.
pub struct InvoiceService<S, N> {
    store: S,
    notifier: N,
    config: ReconcileConfig,
    clock: Clock,
}

impl<S, N> fmt::Debug for InvoiceService<S, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvoiceService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: InvoiceStore, N: Notifier> InvoiceService<S, N> {
    pub fn new(store: S, notifier: N, config: ReconcileConfig) -> Self {
        Self {
            store,
            notifier,
            config,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock, e.g. with a fixed instant in tests.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Fetch an invoice or fail with `NotFound`.
    pub async fn get_invoice(&self, id: &str) -> Result<Invoice> {
        self.store
            .fetch_invoice(id)
            .await?
            .ok_or_else(|| ReconcileError::NotFound(format!("invoice {id}")))
    }

    pub async fn list_invoices(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>> {
        Ok(self.store.list_invoices(filter).await?)
    }

    /// Create a draft with the next free invoice number and computed totals.
    #[instrument(skip(self, new), fields(lines = new.line_items.len()))]
    pub async fn create_invoice(&self, new: NewInvoice) -> Result<Invoice> {
        let number = self.next_number().await?;
        let due_date = match new.due_date {
            Some(date) => date,
            None => new
                .issue_date
                .checked_add_days(Days::new(self.config.default_terms_days.into()))
                .ok_or_else(|| ReconcileError::Builder("due date overflows the calendar".into()))?,
        };

        let mut builder = InvoiceBuilder::new(number, new.issue_date, due_date)
            .currency(new.currency_code.unwrap_or_else(|| self.config.currency_code.clone()))
            .line_items(new.line_items);
        if let Some(contact) = new.contact {
            builder = builder.contact(contact);
        }
        if let Some(notes) = new.notes {
            builder = builder.notes(notes);
        }

        let invoice = self.store.insert_invoice(builder.build()?).await?;
        info!(id = %invoice.id, number = %invoice.number, total = %invoice.total(), "invoice created");
        Ok(invoice)
    }

    /// Replace line items, recomputing totals and status.
    ///
    /// Rejected when the new total would leave more credit than
    /// `config.overpayment_tolerance` against the payments already recorded.
    #[instrument(skip(self, line_items), fields(lines = line_items.len()))]
    pub async fn update_line_items(&self, id: &str, line_items: Vec<LineItem>) -> Result<Invoice> {
        let invoice = self.get_invoice(id).await?;
        let updated = lifecycle::replace_line_items(&invoice, line_items, self.now())?;
        lifecycle::check_credit(&updated, &self.config)?;
        self.store.update_invoice(&updated).await?;
        info!(total = %updated.total(), status = %updated.status, "line items replaced");
        Ok(updated)
    }

    /// Mark as sent and hand the invoice to the notifier.
    #[instrument(skip(self, options))]
    pub async fn send_invoice(&self, id: &str, options: &SendOptions) -> Result<Invoice> {
        let invoice = self.get_invoice(id).await?;
        let sent = lifecycle::send(&invoice, self.now())?;
        self.store.update_invoice(&sent).await?;
        self.notifier.send_invoice(&sent, options).await?;
        info!(status = %sent.status, "invoice sent");
        Ok(sent)
    }

    /// Record a completed payment and persist the re-derived status.
    #[instrument(skip(self, payment), fields(amount = %payment.amount))]
    pub async fn record_payment(&self, id: &str, payment: NewPayment) -> Result<Invoice> {
        let invoice = self.get_invoice(id).await?;
        let now = self.now();

        let mut builder = PaymentBuilder::new(invoice.id.clone(), payment.amount, payment.method)
            .created_at(now);
        for (key, value) in payment.metadata {
            builder = builder.metadata(key, value);
        }

        let mut updated = record_payment(&invoice, builder.build(), &self.config, now)?;
        let Some(pending) = updated.payments.pop() else {
            return Err(ReconcileError::Builder("payment was not appended".into()));
        };
        let stored = self.store.insert_payment(pending).await?;

        // Other payments may have landed since the fetch; derive from what is stored.
        updated.payments = self.store.list_payments(id).await?;
        let credit = payment_summary(&updated).credit;
        if credit > self.config.overpayment_tolerance {
            self.store.delete_payment(id, &stored.id).await?;
            warn!(payment = %stored.id, %credit, "payment rolled back, invoice already settled");
            return Err(ValidationError::new(
                "payment.amount",
                format!(
                    "amount {} exceeds the remaining balance after concurrent payments",
                    stored.amount
                ),
            )
            .into());
        }
        updated.status = derive_status(&updated, &updated.payments, now);
        self.store.update_invoice(&updated).await?;

        info!(status = %updated.status, "payment recorded");
        Ok(updated)
    }

    /// Payments across all invoices, newest first.
    pub async fn list_payments(&self, filter: &PaymentFilter) -> Result<Vec<Payment>> {
        Ok(self.store.query_payments(filter).await?)
    }

    /// Recompute status from stored payments and persist it if it changed.
    #[instrument(skip(self))]
    pub async fn refresh_status(&self, id: &str) -> Result<Invoice> {
        let mut invoice = self.get_invoice(id).await?;
        let payments = self.store.list_payments(id).await?;
        let status = derive_status(&invoice, &payments, self.now());
        invoice.payments = payments;

        if status != invoice.status {
            debug!(from = %invoice.status, to = %status, "status changed");
            invoice.status = status;
            self.store.update_invoice(&invoice).await?;
        }
        Ok(invoice)
    }

    #[instrument(skip(self))]
    pub async fn void_invoice(&self, id: &str) -> Result<Invoice> {
        let voided = lifecycle::void(&self.get_invoice(id).await?);
        self.store.update_invoice(&voided).await?;
        info!("invoice voided");
        Ok(voided)
    }

    /// Copy an invoice into a new draft issued today.
    #[instrument(skip(self))]
    pub async fn duplicate_invoice(&self, id: &str) -> Result<Invoice> {
        let source = self.get_invoice(id).await?;
        let number = self.next_number().await?;
        let copy = lifecycle::duplicate(&source, number, self.now().date_naive())?;
        let copy = self.store.insert_invoice(copy).await?;
        info!(copy = %copy.id, number = %copy.number, "invoice duplicated");
        Ok(copy)
    }

    pub async fn delete_invoice(&self, id: &str) -> Result<()> {
        if !self.store.delete_invoice(id).await? {
            return Err(ReconcileError::NotFound(format!("invoice {id}")));
        }
        info!(%id, "invoice deleted");
        Ok(())
    }

    /// Send every reminder scheduled for `date`. Returns how many went out.
    ///
    /// A failed delivery is logged and skipped so one bad address does not
    /// block the rest of the batch.
    #[instrument(skip(self))]
    pub async fn send_due_reminders(&self, date: NaiveDate) -> Result<usize> {
        let filter = InvoiceFilter::new()
            .status(InvoiceStatus::Sent)
            .status(InvoiceStatus::Partial)
            .status(InvoiceStatus::Overdue);
        let mut sent = 0;
        for invoice in self.store.list_invoices(&filter).await? {
            let Some(reminder) = self.config.reminders.reminder_due_on(&invoice, date) else {
                continue;
            };
            match self.notifier.send_reminder(&invoice, &reminder).await {
                Ok(()) => sent += 1,
                Err(e) => warn!(invoice = %invoice.number, error = %e, "reminder failed"),
            }
        }
        info!(sent, "reminders processed");
        Ok(sent)
    }

    /// Add late fees to overdue invoices past their grace period.
    /// Returns the updated invoices.
    #[instrument(skip(self))]
    pub async fn apply_late_fees(&self) -> Result<Vec<Invoice>> {
        let now = self.now();
        let filter = InvoiceFilter::new()
            .status(InvoiceStatus::Overdue)
            .status(InvoiceStatus::Partial);
        let mut charged = Vec::new();
        for invoice in self.store.list_invoices(&filter).await? {
            if let Some(updated) = lifecycle::apply_late_fee(&invoice, &self.config.reminders, now)? {
                self.store.update_invoice(&updated).await?;
                debug!(invoice = %updated.number, total = %updated.total(), "late fee applied");
                charged.push(updated);
            }
        }
        Ok(charged)
    }

    async fn next_number(&self) -> Result<String> {
        let numbers = self.store.invoice_numbers().await?;
        InvoiceNumberSequence::continue_after(
            self.config.number_prefix.as_str(),
            numbers.iter().map(String::as_str),
        )
        .next_number()
    }
}
