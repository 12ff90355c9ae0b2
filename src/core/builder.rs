use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use super::error::ReconcileError;
use super::totals::compute_totals;
use super::types::*;

/// Builder for constructing invoices with computed totals.
///
/// New invoices always start in [`InvoiceStatus::Draft`].
///
/// ```
/// use tally::core::*;
/// use rust_decimal_macros::dec;
/// use chrono::NaiveDate;
///
/// let invoice = InvoiceBuilder::new(
///     "INV-0001",
///     NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
/// )
/// .contact(ContactBuilder::new("c-1", "Ada", "Lovelace").email("ada@example.com").build())
/// .add_line(LineItemBuilder::new("Consulting", dec!(10), dec!(150)).tax_rate(dec!(8)).build())
/// .build()
/// .unwrap();
///
/// assert_eq!(invoice.status, InvoiceStatus::Draft);
/// assert_eq!(invoice.totals.total, dec!(1620.00));
/// ```
pub struct InvoiceBuilder {
    id: String,
    number: String,
    contact: Option<Contact>,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    currency_code: String,
    line_items: Vec<LineItem>,
    notes: Option<String>,
}

impl InvoiceBuilder {
    pub fn new(number: impl Into<String>, issue_date: NaiveDate, due_date: NaiveDate) -> Self {
        Self {
            id: String::new(),
            number: number.into(),
            contact: None,
            issue_date,
            due_date,
            currency_code: "USD".to_string(),
            line_items: Vec::new(),
            notes: None,
        }
    }

    /// Set the row id. Stores assign one on insert when left empty.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn contact(mut self, contact: Contact) -> Self {
        self.contact = Some(contact);
        self
    }

    pub fn currency(mut self, code: impl Into<String>) -> Self {
        self.currency_code = code.into();
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn add_line(mut self, line: LineItem) -> Self {
        self.line_items.push(line);
        self
    }

    pub fn line_items(mut self, lines: impl IntoIterator<Item = LineItem>) -> Self {
        self.line_items.extend(lines);
        self
    }

    /// Build the invoice, validating line items and computing totals.
    pub fn build(self) -> Result<Invoice, ReconcileError> {
        if self.number.trim().is_empty() {
            return Err(ReconcileError::Builder("invoice number is required".into()));
        }
        if self.number.len() > 200 {
            return Err(ReconcileError::Builder(
                "invoice number cannot exceed 200 characters".into(),
            ));
        }
        if self.line_items.is_empty() {
            return Err(ReconcileError::Builder(
                "at least one line item is required".into(),
            ));
        }
        if self.line_items.len() > 10_000 {
            return Err(ReconcileError::Builder(
                "invoice cannot have more than 10,000 line items".into(),
            ));
        }
        if self.due_date < self.issue_date {
            return Err(ReconcileError::Builder(format!(
                "due date {} is before issue date {}",
                self.due_date, self.issue_date
            )));
        }

        self.build_unchecked()
    }

    /// Build without the structural checks, for importing rows that
    /// already exist in storage. Line items are still validated.
    pub fn build_unchecked(self) -> Result<Invoice, ReconcileError> {
        let totals = compute_totals(&self.line_items)?;

        Ok(Invoice {
            id: self.id,
            number: self.number,
            contact: self.contact,
            status: InvoiceStatus::Draft,
            issue_date: self.issue_date,
            due_date: self.due_date,
            currency_code: self.currency_code,
            line_items: self.line_items,
            totals,
            payments: Vec::new(),
            notes: self.notes,
        })
    }
}

/// Builder for LineItem.
pub struct LineItemBuilder {
    description: String,
    quantity: Decimal,
    rate: Decimal,
    tax_rate: Option<Decimal>,
    discount: Option<Decimal>,
}

impl LineItemBuilder {
    pub fn new(description: impl Into<String>, quantity: Decimal, rate: Decimal) -> Self {
        Self {
            description: description.into(),
            quantity,
            rate,
            tax_rate: None,
            discount: None,
        }
    }

    /// Tax percentage (0..=100).
    pub fn tax_rate(mut self, rate: Decimal) -> Self {
        self.tax_rate = Some(rate);
        self
    }

    /// Discount percentage (0..=100).
    pub fn discount(mut self, discount: Decimal) -> Self {
        self.discount = Some(discount);
        self
    }

    pub fn build(self) -> LineItem {
        LineItem {
            description: self.description,
            quantity: self.quantity,
            rate: self.rate,
            tax_rate: self.tax_rate,
            discount: self.discount,
        }
    }
}

/// Builder for Payment. Defaults to a completed manual payment created now.
pub struct PaymentBuilder {
    id: String,
    invoice_id: String,
    amount: Decimal,
    method: PaymentMethod,
    status: PaymentStatus,
    processor: String,
    metadata: serde_json::Map<String, serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl PaymentBuilder {
    pub fn new(invoice_id: impl Into<String>, amount: Decimal, method: PaymentMethod) -> Self {
        Self {
            id: String::new(),
            invoice_id: invoice_id.into(),
            amount,
            method,
            status: PaymentStatus::Completed,
            processor: "manual".to_string(),
            metadata: serde_json::Map::new(),
            created_at: Utc::now(),
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn status(mut self, status: PaymentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn processor(mut self, processor: impl Into<String>) -> Self {
        self.processor = processor.into();
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    pub fn build(self) -> Payment {
        Payment {
            id: self.id,
            invoice_id: self.invoice_id,
            amount: self.amount,
            method: self.method,
            status: self.status,
            processor: self.processor,
            metadata: self.metadata,
            created_at: self.created_at,
        }
    }
}

/// Builder for Contact.
pub struct ContactBuilder {
    id: String,
    first_name: String,
    last_name: String,
    email: Option<String>,
    phone: Option<String>,
}

impl ContactBuilder {
    pub fn new(
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            phone: None,
        }
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn build(self) -> Contact {
        Contact {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
        }
    }
}
