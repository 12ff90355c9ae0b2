use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use super::InvoiceStore;
use crate::core::{Invoice, InvoiceFilter, Payment, PaymentFilter, PersistenceError};

/// In-memory store for tests and development.
///
/// Cloning shares the underlying maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    invoices: Arc<RwLock<HashMap<String, Invoice>>>,
    payments: Arc<RwLock<HashMap<String, Vec<Payment>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored invoices.
    pub fn len(&self) -> Result<usize, PersistenceError> {
        Ok(self.invoices.read().map_err(poisoned)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, PersistenceError> {
        Ok(self.len()? == 0)
    }

    fn with_payments(&self, mut invoice: Invoice) -> Result<Invoice, PersistenceError> {
        invoice.payments = self
            .payments
            .read()
            .map_err(poisoned)?
            .get(&invoice.id)
            .cloned()
            .unwrap_or_default();
        Ok(invoice)
    }
}

fn poisoned<T>(_: PoisonError<T>) -> PersistenceError {
    PersistenceError::new("memory store lock poisoned")
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn fetch_invoice(&self, id: &str) -> Result<Option<Invoice>, PersistenceError> {
        let invoice = self.invoices.read().map_err(poisoned)?.get(id).cloned();
        invoice.map(|i| self.with_payments(i)).transpose()
    }

    async fn list_invoices(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>, PersistenceError> {
        let matched: Vec<Invoice> = {
            let invoices = self.invoices.read().map_err(poisoned)?;
            filter.apply(invoices.values()).into_iter().cloned().collect()
        };
        matched.into_iter().map(|i| self.with_payments(i)).collect()
    }

    async fn insert_invoice(&self, mut invoice: Invoice) -> Result<Invoice, PersistenceError> {
        if invoice.id.is_empty() {
            invoice.id = Uuid::new_v4().to_string();
        }
        let mut invoices = self.invoices.write().map_err(poisoned)?;
        if invoices.contains_key(&invoice.id) {
            return Err(PersistenceError::new(format!(
                "invoice {} already exists",
                invoice.id
            )));
        }

        let payments = std::mem::take(&mut invoice.payments);
        invoices.insert(invoice.id.clone(), invoice.clone());
        if !payments.is_empty() {
            self.payments
                .write()
                .map_err(poisoned)?
                .insert(invoice.id.clone(), payments.clone());
        }
        invoice.payments = payments;
        Ok(invoice)
    }

    async fn update_invoice(&self, invoice: &Invoice) -> Result<(), PersistenceError> {
        let mut invoices = self.invoices.write().map_err(poisoned)?;
        let Some(stored) = invoices.get_mut(&invoice.id) else {
            return Err(PersistenceError::new(format!(
                "invoice {} does not exist",
                invoice.id
            )));
        };
        *stored = Invoice {
            payments: Vec::new(),
            ..invoice.clone()
        };
        Ok(())
    }

    async fn delete_invoice(&self, id: &str) -> Result<bool, PersistenceError> {
        let removed = self.invoices.write().map_err(poisoned)?.remove(id).is_some();
        self.payments.write().map_err(poisoned)?.remove(id);
        Ok(removed)
    }

    async fn insert_payment(&self, mut payment: Payment) -> Result<Payment, PersistenceError> {
        if !self
            .invoices
            .read()
            .map_err(poisoned)?
            .contains_key(&payment.invoice_id)
        {
            return Err(PersistenceError::new(format!(
                "invoice {} does not exist",
                payment.invoice_id
            )));
        }
        if payment.id.is_empty() {
            payment.id = Uuid::new_v4().to_string();
        }
        self.payments
            .write()
            .map_err(poisoned)?
            .entry(payment.invoice_id.clone())
            .or_default()
            .push(payment.clone());
        Ok(payment)
    }

    async fn delete_payment(
        &self,
        invoice_id: &str,
        payment_id: &str,
    ) -> Result<bool, PersistenceError> {
        let mut payments = self.payments.write().map_err(poisoned)?;
        let Some(rows) = payments.get_mut(invoice_id) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|p| p.id != payment_id);
        Ok(rows.len() != before)
    }

    async fn list_payments(&self, invoice_id: &str) -> Result<Vec<Payment>, PersistenceError> {
        Ok(self
            .payments
            .read()
            .map_err(poisoned)?
            .get(invoice_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn query_payments(&self, filter: &PaymentFilter) -> Result<Vec<Payment>, PersistenceError> {
        let payments = self.payments.read().map_err(poisoned)?;
        Ok(filter
            .apply(payments.values().flatten())
            .into_iter()
            .cloned()
            .collect())
    }

    async fn invoice_numbers(&self) -> Result<Vec<String>, PersistenceError> {
        Ok(self
            .invoices
            .read()
            .map_err(poisoned)?
            .values()
            .map(|i| i.number.clone())
            .collect())
    }
}
