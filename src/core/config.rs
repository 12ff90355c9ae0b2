use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ReconcileError;
use super::reminders::ReminderSettings;

/// Tunables for reconciliation and the invoice service.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use tally::core::ReconcileConfig;
/// use rust_decimal_macros::dec;
///
/// let config = ReconcileConfig::from_json(r#"{"overpayment_tolerance": "0.50"}"#).unwrap();
/// assert_eq!(config.overpayment_tolerance, dec!(0.50));
/// assert_eq!(config.default_terms_days, 30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// How far recorded payments may exceed the invoice total. The surplus is
    /// reported as credit; anything beyond is rejected.
    pub overpayment_tolerance: Decimal,
    /// Currency for invoices created without one.
    pub currency_code: String,
    /// Days between issue and due date for new invoices.
    pub default_terms_days: u32,
    /// Prefix for generated invoice numbers.
    pub number_prefix: String,
    pub reminders: ReminderSettings,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            overpayment_tolerance: Decimal::ZERO,
            currency_code: "USD".to_string(),
            default_terms_days: 30,
            number_prefix: "INV-".to_string(),
            reminders: ReminderSettings::default(),
        }
    }
}

impl ReconcileConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json(json: &str) -> Result<Self, ReconcileError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ReconcileError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconcileError> {
        if self.overpayment_tolerance < Decimal::ZERO {
            return Err(ReconcileError::Config(
                "overpayment_tolerance must not be negative".into(),
            ));
        }
        if self.currency_code.len() != 3 {
            return Err(ReconcileError::Config(format!(
                "currency code '{}' must be 3 characters (ISO 4217)",
                self.currency_code
            )));
        }
        self.reminders
            .validate()
            .map_err(|e| ReconcileError::Config(e.to_string()))
    }

    pub fn with_overpayment_tolerance(mut self, tolerance: Decimal) -> Self {
        self.overpayment_tolerance = tolerance;
        self
    }

    pub fn with_reminders(mut self, reminders: ReminderSettings) -> Self {
        self.reminders = reminders;
        self
    }

    pub fn with_number_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.number_prefix = prefix.into();
        self
    }
}
