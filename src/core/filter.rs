//! Invoice and payment list filtering.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::types::{Invoice, InvoiceStatus, Payment, PaymentMethod, PaymentStatus};

/// Criteria for narrowing an invoice list. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceFilter {
    /// Match any of these statuses. Empty means all.
    pub statuses: Vec<InvoiceStatus>,
    pub contact_id: Option<String>,
    /// Inclusive issue-date range.
    pub issue_date_range: Option<(NaiveDate, NaiveDate)>,
    /// Case-insensitive text matched against the number and contact name.
    pub search: Option<String>,
}

impl InvoiceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: InvoiceStatus) -> Self {
        if !self.statuses.contains(&status) {
            self.statuses.push(status);
        }
        self
    }

    pub fn contact(mut self, contact_id: impl Into<String>) -> Self {
        self.contact_id = Some(contact_id.into());
        self
    }

    pub fn issued_between(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.issue_date_range = Some((start, end));
        self
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    pub fn matches(&self, invoice: &Invoice) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&invoice.status) {
            return false;
        }

        if let Some(contact_id) = &self.contact_id {
            if invoice.contact.as_ref().map(|c| &c.id) != Some(contact_id) {
                return false;
            }
        }

        if let Some((start, end)) = self.issue_date_range {
            if invoice.issue_date < start || invoice.issue_date > end {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim) {
            Some(query) if !query.is_empty() => {
                let query = query.to_lowercase();
                invoice.number.to_lowercase().contains(&query)
                    || invoice
                        .contact
                        .as_ref()
                        .is_some_and(|c| c.full_name().to_lowercase().contains(&query))
            }
            _ => true,
        }
    }

    /// Matching invoices, newest issue date first.
    pub fn apply<'a>(&self, invoices: impl IntoIterator<Item = &'a Invoice>) -> Vec<&'a Invoice> {
        let mut matched: Vec<&Invoice> = invoices.into_iter().filter(|i| self.matches(i)).collect();
        matched.sort_by(|a, b| b.issue_date.cmp(&a.issue_date));
        matched
    }
}

/// Criteria for narrowing a payment list. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentFilter {
    pub invoice_id: Option<String>,
    /// Match any of these statuses. Empty means all.
    pub statuses: Vec<PaymentStatus>,
    /// Match any of these methods. Empty means all.
    pub methods: Vec<PaymentMethod>,
    /// Inclusive `created_at` range.
    pub created_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl PaymentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invoice(mut self, invoice_id: impl Into<String>) -> Self {
        self.invoice_id = Some(invoice_id.into());
        self
    }

    pub fn status(mut self, status: PaymentStatus) -> Self {
        if !self.statuses.contains(&status) {
            self.statuses.push(status);
        }
        self
    }

    pub fn method(mut self, method: PaymentMethod) -> Self {
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
        self
    }

    pub fn created_between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.created_range = Some((start, end));
        self
    }

    pub fn matches(&self, payment: &Payment) -> bool {
        if self
            .invoice_id
            .as_ref()
            .is_some_and(|id| *id != payment.invoice_id)
        {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&payment.status) {
            return false;
        }
        if !self.methods.is_empty() && !self.methods.contains(&payment.method) {
            return false;
        }
        match self.created_range {
            Some((start, end)) => payment.created_at >= start && payment.created_at <= end,
            None => true,
        }
    }

    /// Matching payments, newest first.
    pub fn apply<'a>(&self, payments: impl IntoIterator<Item = &'a Payment>) -> Vec<&'a Payment> {
        let mut matched: Vec<&Payment> = payments.into_iter().filter(|p| self.matches(p)).collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn invoice(number: &str, issued: NaiveDate, status: InvoiceStatus, contact: Contact) -> Invoice {
        let mut inv = InvoiceBuilder::new(number, issued, issued + chrono::Duration::days(30))
            .contact(contact)
            .add_line(LineItemBuilder::new("Service", dec!(1), dec!(100)).build())
            .build()
            .unwrap();
        inv.status = status;
        inv
    }

    fn fixtures() -> Vec<Invoice> {
        let ada = ContactBuilder::new("c-1", "Ada", "Lovelace").build();
        let alan = ContactBuilder::new("c-2", "Alan", "Turing").build();
        vec![
            invoice("INV-0001", date(2024, 1, 10), InvoiceStatus::Paid, ada.clone()),
            invoice("INV-0002", date(2024, 2, 10), InvoiceStatus::Overdue, alan.clone()),
            invoice("INV-0003", date(2024, 3, 10), InvoiceStatus::Sent, ada),
            invoice("INV-0004", date(2024, 4, 10), InvoiceStatus::Draft, alan),
        ]
    }

    fn numbers(found: &[&Invoice]) -> Vec<String> {
        found.iter().map(|i| i.number.clone()).collect()
    }

    #[test]
    fn empty_filter_returns_all_newest_first() {
        let all = fixtures();
        let found = InvoiceFilter::new().apply(&all);
        assert_eq!(numbers(&found), ["INV-0004", "INV-0003", "INV-0002", "INV-0001"]);
    }

    #[test]
    fn status_set() {
        let all = fixtures();
        let found = InvoiceFilter::new()
            .status(InvoiceStatus::Sent)
            .status(InvoiceStatus::Overdue)
            .apply(&all);
        assert_eq!(numbers(&found), ["INV-0003", "INV-0002"]);
    }

    #[test]
    fn contact_and_date_range() {
        let all = fixtures();
        let found = InvoiceFilter::new()
            .contact("c-1")
            .issued_between(date(2024, 1, 1), date(2024, 3, 10))
            .apply(&all);
        assert_eq!(numbers(&found), ["INV-0003", "INV-0001"]);
    }

    #[test]
    fn search_matches_number_or_contact_name() {
        let all = fixtures();
        assert_eq!(numbers(&InvoiceFilter::new().search("0002").apply(&all)), ["INV-0002"]);
        assert_eq!(
            numbers(&InvoiceFilter::new().search("ALAN tur").apply(&all)),
            ["INV-0004", "INV-0002"]
        );
        assert_eq!(InvoiceFilter::new().search("   ").apply(&all).len(), 4);
        assert!(InvoiceFilter::new().search("grace").apply(&all).is_empty());
    }

    fn payments() -> Vec<Payment> {
        use chrono::TimeZone;
        let at = |d: u32| Utc.with_ymd_and_hms(2024, 6, d, 12, 0, 0).unwrap();
        vec![
            PaymentBuilder::new("inv-1", dec!(10), PaymentMethod::Card)
                .id("p-1")
                .created_at(at(1))
                .build(),
            PaymentBuilder::new("inv-1", dec!(20), PaymentMethod::Ach)
                .id("p-2")
                .status(PaymentStatus::Failed)
                .created_at(at(5))
                .build(),
            PaymentBuilder::new("inv-2", dec!(30), PaymentMethod::Wallet)
                .id("p-3")
                .created_at(at(10))
                .build(),
            PaymentBuilder::new("inv-1", dec!(40), PaymentMethod::Card)
                .id("p-4")
                .status(PaymentStatus::Pending)
                .created_at(at(15))
                .build(),
        ]
    }

    fn ids(found: &[&Payment]) -> Vec<String> {
        found.iter().map(|p| p.id.clone()).collect()
    }

    #[test]
    fn payments_newest_first() {
        let all = payments();
        assert_eq!(ids(&PaymentFilter::new().apply(&all)), ["p-4", "p-3", "p-2", "p-1"]);
    }

    #[test]
    fn payments_by_invoice_status_and_method() {
        let all = payments();
        assert_eq!(
            ids(&PaymentFilter::new().invoice("inv-1").apply(&all)),
            ["p-4", "p-2", "p-1"]
        );
        assert_eq!(
            ids(&PaymentFilter::new()
                .invoice("inv-1")
                .status(PaymentStatus::Completed)
                .status(PaymentStatus::Pending)
                .apply(&all)),
            ["p-4", "p-1"]
        );
        assert_eq!(
            ids(&PaymentFilter::new()
                .method(PaymentMethod::Ach)
                .method(PaymentMethod::Wallet)
                .apply(&all)),
            ["p-3", "p-2"]
        );
    }

    #[test]
    fn payments_created_range_is_inclusive() {
        use chrono::TimeZone;
        let all = payments();
        let found = PaymentFilter::new()
            .created_between(
                Utc.with_ymd_and_hms(2024, 6, 5, 12, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap(),
            )
            .apply(&all);
        assert_eq!(ids(&found), ["p-3", "p-2"]);
    }
}
