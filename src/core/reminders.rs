//! Payment reminder schedule and late fees.

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use super::status::payment_summary;
use super::totals::round_currency;
use super::types::{Invoice, InvoiceStatus};

/// Description used for the line item added by late-fee application.
pub const LATE_FEE_DESCRIPTION: &str = "Late fee";

/// When to remind customers about an invoice, and whether to charge a late fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    /// Days before the due date on which to send a reminder.
    pub before_due: Vec<u32>,
    /// Days after the due date on which to send a reminder.
    pub after_due: Vec<u32>,
    pub late_fee: Option<LateFee>,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            before_due: vec![1, 3, 7],
            after_due: vec![1, 3, 7, 14],
            late_fee: None,
        }
    }
}

/// Late fee charged once the grace period after the due date has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LateFee {
    #[serde(rename = "type")]
    pub kind: LateFeeKind,
    /// Percentage of the remaining balance, or a fixed amount.
    pub value: Decimal,
    /// Days after the due date before the fee applies.
    pub grace_period: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LateFeeKind {
    Percentage,
    Fixed,
}

/// Which side of the due date a reminder falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    BeforeDue,
    AfterDue,
}

/// A reminder that should go out on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub kind: ReminderKind,
    /// Distance from the due date in days.
    pub days: u32,
    pub date: NaiveDate,
}

impl ReminderSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(days) = self.before_due.iter().chain(&self.after_due).find(|d| **d == 0) {
            return Err(ValidationError::new(
                "reminders",
                format!("reminder offsets must be at least one day, got {days}"),
            ));
        }
        if let Some(fee) = &self.late_fee {
            if fee.value < Decimal::ZERO {
                return Err(ValidationError::new(
                    "reminders.late_fee.value",
                    "late fee must not be negative",
                ));
            }
            if fee.kind == LateFeeKind::Percentage && fee.value > dec!(100) {
                return Err(ValidationError::new(
                    "reminders.late_fee.value",
                    "percentage late fee must be within 0..=100",
                ));
            }
        }
        Ok(())
    }

    /// Every reminder for an invoice due on `due_date`, in date order.
    /// Offsets listed twice produce a single reminder.
    pub fn schedule(&self, due_date: NaiveDate) -> Vec<Reminder> {
        let before = self.before_due.iter().filter_map(|&days| {
            due_date
                .checked_sub_days(Days::new(days.into()))
                .map(|date| Reminder {
                    kind: ReminderKind::BeforeDue,
                    days,
                    date,
                })
        });
        let after = self.after_due.iter().filter_map(|&days| {
            due_date
                .checked_add_days(Days::new(days.into()))
                .map(|date| Reminder {
                    kind: ReminderKind::AfterDue,
                    days,
                    date,
                })
        });

        let mut reminders: Vec<Reminder> = before.chain(after).collect();
        reminders.sort_by_key(|r| r.date);
        reminders.dedup_by_key(|r| r.date);
        reminders
    }

    /// Reminder dates only.
    pub fn reminder_dates(&self, due_date: NaiveDate) -> Vec<NaiveDate> {
        self.schedule(due_date).into_iter().map(|r| r.date).collect()
    }

    /// The reminder to send for `invoice` on `date`, if any.
    ///
    /// Draft, paid and void invoices never get reminders. Before-due
    /// reminders only go to invoices that are not yet overdue.
    pub fn reminder_due_on(&self, invoice: &Invoice, date: NaiveDate) -> Option<Reminder> {
        if !invoice.status.is_open() {
            return None;
        }
        self.schedule(invoice.due_date)
            .into_iter()
            .find(|r| r.date == date)
            .filter(|r| r.kind == ReminderKind::AfterDue || invoice.status != InvoiceStatus::Overdue)
    }

    /// Late fee owed on `invoice` at `now`, if any.
    ///
    /// A fee applies only to open invoices with a remaining balance, once
    /// `now` is more than `grace_period` days past the due date. Percentage
    /// fees are taken from the remaining balance and rounded to cents.
    pub fn late_fee_for(&self, invoice: &Invoice, now: DateTime<Utc>) -> Option<Decimal> {
        let fee = self.late_fee.as_ref()?;
        if !invoice.status.is_open() {
            return None;
        }

        let remaining = payment_summary(invoice).remaining;
        if remaining <= Decimal::ZERO {
            return None;
        }

        let days_late = (now.date_naive() - invoice.due_date).num_days();
        if days_late <= i64::from(fee.grace_period) {
            return None;
        }

        let amount = match fee.kind {
            LateFeeKind::Percentage => round_currency(remaining * fee.value / dec!(100)),
            LateFeeKind::Fixed => fee.value,
        };
        (amount > Decimal::ZERO).then_some(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
    }

    fn invoice(status: InvoiceStatus) -> Invoice {
        let mut inv = InvoiceBuilder::new("INV-0100", date(2024, 5, 1), date(2024, 6, 1))
            .add_line(LineItemBuilder::new("Monthly plan", dec!(1), dec!(400)).build())
            .build()
            .unwrap();
        inv.status = status;
        inv
    }

    fn with_fee(kind: LateFeeKind, value: Decimal, grace_period: u32) -> ReminderSettings {
        ReminderSettings {
            late_fee: Some(LateFee {
                kind,
                value,
                grace_period,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn default_schedule() {
        let dates = ReminderSettings::default().reminder_dates(date(2024, 6, 10));
        assert_eq!(
            dates,
            vec![
                date(2024, 6, 3),
                date(2024, 6, 7),
                date(2024, 6, 9),
                date(2024, 6, 11),
                date(2024, 6, 13),
                date(2024, 6, 17),
                date(2024, 6, 24),
            ]
        );
    }

    #[test]
    fn duplicate_offsets_collapse() {
        let settings = ReminderSettings {
            before_due: vec![3, 3],
            after_due: vec![],
            late_fee: None,
        };
        assert_eq!(settings.schedule(date(2024, 6, 10)).len(), 1);
    }

    #[test]
    fn reminders_skip_closed_invoices() {
        let settings = ReminderSettings::default();
        for status in [InvoiceStatus::Draft, InvoiceStatus::Paid, InvoiceStatus::Void] {
            assert!(settings.reminder_due_on(&invoice(status), date(2024, 5, 31)).is_none());
        }
        let reminder = settings
            .reminder_due_on(&invoice(InvoiceStatus::Sent), date(2024, 5, 31))
            .unwrap();
        assert_eq!(reminder.kind, ReminderKind::BeforeDue);
        assert_eq!(reminder.days, 1);

        let reminder = settings
            .reminder_due_on(&invoice(InvoiceStatus::Overdue), date(2024, 6, 4))
            .unwrap();
        assert_eq!(reminder.kind, ReminderKind::AfterDue);
    }

    #[test]
    fn percentage_fee_after_grace_period() {
        let settings = with_fee(LateFeeKind::Percentage, dec!(1.5), 5);
        let inv = invoice(InvoiceStatus::Overdue);
        assert_eq!(settings.late_fee_for(&inv, at(2024, 6, 6)), None);
        assert_eq!(settings.late_fee_for(&inv, at(2024, 6, 7)), Some(dec!(6.00)));
    }

    #[test]
    fn percentage_fee_uses_remaining_balance() {
        let settings = with_fee(LateFeeKind::Percentage, dec!(10), 0);
        let mut inv = invoice(InvoiceStatus::Partial);
        inv.payments
            .push(PaymentBuilder::new("INV-0100", dec!(150), PaymentMethod::Card).build());
        assert_eq!(settings.late_fee_for(&inv, at(2024, 6, 2)), Some(dec!(25.00)));
    }

    #[test]
    fn fixed_fee_and_closed_invoices() {
        let settings = with_fee(LateFeeKind::Fixed, dec!(35), 0);
        assert_eq!(
            settings.late_fee_for(&invoice(InvoiceStatus::Overdue), at(2024, 6, 2)),
            Some(dec!(35))
        );
        assert_eq!(
            settings.late_fee_for(&invoice(InvoiceStatus::Void), at(2024, 6, 2)),
            None
        );
        assert_eq!(
            ReminderSettings::default().late_fee_for(&invoice(InvoiceStatus::Overdue), at(2024, 7, 1)),
            None
        );
    }

    #[test]
    fn validate_rejects_bad_settings() {
        assert!(ReminderSettings::default().validate().is_ok());
        let zero = ReminderSettings {
            before_due: vec![0],
            ..Default::default()
        };
        assert!(zero.validate().is_err());
        assert!(with_fee(LateFeeKind::Percentage, dec!(150), 0).validate().is_err());
        assert!(with_fee(LateFeeKind::Fixed, dec!(150), 0).validate().is_ok());
        assert!(with_fee(LateFeeKind::Fixed, dec!(-1), 0).validate().is_err());
    }

    #[test]
    fn deserializes_backend_shape() {
        let json = r#"{"before_due":[2],"after_due":[5],"late_fee":{"type":"fixed","value":"20","grace_period":3}}"#;
        let settings: ReminderSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.before_due, vec![2]);
        assert_eq!(settings.late_fee.unwrap().kind, LateFeeKind::Fixed);

        let defaults: ReminderSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults, ReminderSettings::default());
    }
}
