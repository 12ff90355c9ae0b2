use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::core::ValidationError;

/// Credentials for connecting a payment provider, tagged by `provider`.
///
/// ```
/// use tally::gateway::*;
///
/// let creds: GatewayCredentials = serde_json::from_str(
///     r#"{"provider": "stripe", "api_key": "sk_test_123", "publishable_key": "pk_test_123"}"#,
/// ).unwrap();
/// assert_eq!(creds.provider(), Provider::Stripe);
/// assert!(creds.validate().is_ok());
/// assert!(!format!("{creds:?}").contains("sk_test_123"));
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum GatewayCredentials {
    Stripe {
        api_key: SecretString,
        publishable_key: String,
    },
    #[serde(rename = "paypal")]
    PayPal {
        client_id: String,
        client_secret: SecretString,
        #[serde(default)]
        environment: Environment,
    },
    #[serde(rename = "authnet")]
    AuthorizeNet {
        api_login_id: String,
        transaction_key: SecretString,
        #[serde(default)]
        environment: Environment,
    },
    Nmi {
        gateway_id: String,
        api_key: SecretString,
    },
    Ach {
        #[serde(default)]
        ach_provider: AchProvider,
        api_key: SecretString,
    },
}

/// Provider identifiers as stored in the payment methods table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Stripe,
    #[serde(rename = "paypal")]
    PayPal,
    #[serde(rename = "authnet")]
    AuthorizeNet,
    Nmi,
    Ach,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::PayPal => "paypal",
            Self::AuthorizeNet => "authnet",
            Self::Nmi => "nmi",
            Self::Ach => "ach",
        }
    }
}

/// Gateway environment; new connections default to the sandbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

/// Bank-account verification backend for ACH.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchProvider {
    #[default]
    Plaid,
    StripeAch,
}

impl GatewayCredentials {
    pub fn provider(&self) -> Provider {
        match self {
            Self::Stripe { .. } => Provider::Stripe,
            Self::PayPal { .. } => Provider::PayPal,
            Self::AuthorizeNet { .. } => Provider::AuthorizeNet,
            Self::Nmi { .. } => Provider::Nmi,
            Self::Ach { .. } => Provider::Ach,
        }
    }

    /// Environment for providers that distinguish sandbox from production.
    pub fn environment(&self) -> Option<Environment> {
        match self {
            Self::PayPal { environment, .. } | Self::AuthorizeNet { environment, .. } => {
                Some(*environment)
            }
            _ => None,
        }
    }

    /// Reject blank fields and obviously swapped Stripe keys.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Stripe {
                api_key,
                publishable_key,
            } => {
                require_secret("credentials.api_key", api_key)?;
                require("credentials.publishable_key", publishable_key)?;
                if !publishable_key.starts_with("pk_") {
                    return Err(ValidationError::new(
                        "credentials.publishable_key",
                        "Stripe publishable keys start with 'pk_'",
                    ));
                }
                if api_key.expose_secret().starts_with("pk_") {
                    return Err(ValidationError::new(
                        "credentials.api_key",
                        "a publishable key was given where the secret key belongs",
                    ));
                }
            }
            Self::PayPal {
                client_id,
                client_secret,
                ..
            } => {
                require("credentials.client_id", client_id)?;
                require_secret("credentials.client_secret", client_secret)?;
            }
            Self::AuthorizeNet {
                api_login_id,
                transaction_key,
                ..
            } => {
                require("credentials.api_login_id", api_login_id)?;
                require_secret("credentials.transaction_key", transaction_key)?;
            }
            Self::Nmi {
                gateway_id,
                api_key,
            } => {
                require("credentials.gateway_id", gateway_id)?;
                require_secret("credentials.api_key", api_key)?;
            }
            Self::Ach { api_key, .. } => {
                require_secret("credentials.api_key", api_key)?;
            }
        }
        Ok(())
    }
}

fn require(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(())
}

fn require_secret(field: &str, value: &SecretString) -> Result<(), ValidationError> {
    require(field, value.expose_secret())
}
