//! # tally
//!
//! Invoice reconciliation: line-item totals, payment-driven status, partial
//! payments, reminders and late fees, and typed payment-gateway credentials.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//! The engine in [`core`] is pure: it takes invoice snapshots and returns new
//! ones. Storage and delivery live behind the traits in `store`.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{NaiveDate, TimeZone, Utc};
//! use tally::core::*;
//! use rust_decimal_macros::dec;
//!
//! let invoice = InvoiceBuilder::new(
//!     "INV-0001",
//!     NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
//! )
//! .id("inv-1")
//! .add_line(LineItemBuilder::new("Widget", dec!(2), dec!(50)).tax_rate(dec!(10)).build())
//! .build()
//! .unwrap();
//! assert_eq!(invoice.totals.total, dec!(110));
//!
//! let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
//! let sent = lifecycle::send(&invoice, now).unwrap();
//! let payment = PaymentBuilder::new("inv-1", dec!(50), PaymentMethod::Card).build();
//! let updated = record_payment(&sent, payment, &ReconcileConfig::default(), now).unwrap();
//!
//! assert_eq!(updated.status, InvoiceStatus::Partial);
//! assert_eq!(payment_summary(&updated).remaining, dec!(60));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Invoice types, totals, status derivation, payments, reminders, filtering |
//! | `gateway` | Payment provider credentials and default-method selection |
//! | `store` | Async store/notifier traits, in-memory store, `InvoiceService` |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "gateway")]
pub mod gateway;

#[cfg(feature = "store")]
pub mod store;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
