//! Invoice types, totals, payment-driven status, and the helpers around them.
//!
//! Everything in this module is pure: functions take invoice snapshots and
//! return new values, with no I/O and no shared state.

mod builder;
mod config;
mod error;
mod filter;
pub mod lifecycle;
mod numbering;
mod payment;
mod reminders;
mod status;
mod totals;
mod types;
mod validation;

pub use builder::*;
pub use config::*;
pub use error::*;
pub use filter::*;
pub use numbering::*;
pub use payment::*;
pub use reminders::*;
pub use status::*;
pub use totals::*;
pub use types::*;
pub use validation::*;
