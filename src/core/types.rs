use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// An invoice snapshot: line items, stored totals, payments and status.
///
/// Values of this type are treated as immutable inputs by the reconciliation
/// functions; every operation returns a fresh snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Backend row identifier.
    pub id: String,
    /// Human-facing invoice number (e.g. "INV-0042").
    pub number: String,
    /// Billed contact, if one is attached.
    pub contact: Option<Contact>,
    /// Persisted status. Recomputed by `derive_status`, never edited in place.
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    /// ISO 4217 currency code.
    pub currency_code: String,
    /// Ordered billable rows.
    pub line_items: Vec<LineItem>,
    /// Aggregates computed from `line_items`.
    pub totals: Totals,
    /// Payment history, all statuses included.
    #[serde(default)]
    pub payments: Vec<Payment>,
    pub notes: Option<String>,
}

impl Invoice {
    /// Invoice total, shorthand for `totals.total`.
    pub fn total(&self) -> Decimal {
        self.totals.total
    }

    /// Days between issue and due date, used when duplicating.
    pub fn payment_terms_days(&self) -> i64 {
        (self.due_date - self.issue_date).num_days()
    }
}

/// A billed contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Contact {
    /// "First Last", as shown in the invoice list.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A single billable row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    /// Must be greater than zero.
    pub quantity: Decimal,
    /// Unit price. Must not be negative.
    pub rate: Decimal,
    /// Tax percentage in 0..=100. Absent means untaxed.
    #[serde(default)]
    pub tax_rate: Option<Decimal>,
    /// Discount percentage in 0..=100. Absent means no discount.
    #[serde(default)]
    pub discount: Option<Decimal>,
}

/// Invoice aggregates, rounded to currency precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Σ quantity * rate.
    pub subtotal: Decimal,
    /// Σ quantity * rate * tax_rate / 100.
    pub tax_total: Decimal,
    /// Σ quantity * rate * discount / 100.
    pub discount_total: Decimal,
    /// subtotal + tax_total - discount_total.
    pub total: Decimal,
}

/// Invoice lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Partial,
    Overdue,
    /// Terminal: never left by automatic derivation.
    Void,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 6] = [
        Self::Draft,
        Self::Sent,
        Self::Paid,
        Self::Partial,
        Self::Overdue,
        Self::Void,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Paid => "paid",
            Self::Partial => "partial",
            Self::Overdue => "overdue",
            Self::Void => "void",
        }
    }

    /// True for statuses that still expect money from the customer.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Sent | Self::Partial | Self::Overdue)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::new("status", format!("unknown invoice status '{s}'")))
    }
}

/// A recorded payment against an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub invoice_id: String,
    /// Must be greater than zero.
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Who captured the payment ("manual", "stripe", ...).
    pub processor: String,
    /// Free-form processor data.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Only completed payments count toward the paid total.
    pub fn counts_toward_paid(&self) -> bool {
        self.status == PaymentStatus::Completed
    }
}

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Ach,
    Wallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Ach => "ach",
            Self::Wallet => "wallet",
        }
    }
}

/// Processor-reported payment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Completed,
    Failed,
    Pending,
}

/// Paid / remaining / credit breakdown for display and reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSummary {
    /// Σ completed payment amounts.
    pub paid: Decimal,
    /// max(total - paid, 0).
    pub remaining: Decimal,
    /// max(paid - total, 0). Non-zero only when an overpayment was tolerated.
    pub credit: Decimal,
}
