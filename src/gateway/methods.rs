use serde::Deserialize;
use tracing::info;

use super::credentials::{GatewayCredentials, Provider};
use crate::core::ValidationError;

/// A connected payment provider.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentMethodConfig {
    pub id: String,
    pub credentials: GatewayCredentials,
    #[serde(default)]
    pub is_default: bool,
    /// Provider-specific display and checkout settings.
    #[serde(default)]
    pub settings: serde_json::Map<String, serde_json::Value>,
}

impl PaymentMethodConfig {
    pub fn provider(&self) -> Provider {
        self.credentials.provider()
    }
}

/// The set of connected providers for an account.
///
/// At most one provider is connected per kind and at most one is the
/// default; the first connection becomes the default automatically.
#[derive(Debug, Clone, Default)]
pub struct PaymentMethods {
    methods: Vec<PaymentMethodConfig>,
}

impl PaymentMethods {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load existing rows, keeping only the first default if several are flagged.
    pub fn from_configs(configs: impl IntoIterator<Item = PaymentMethodConfig>) -> Self {
        let mut seen_default = false;
        let methods = configs
            .into_iter()
            .map(|mut m| {
                m.is_default = m.is_default && !seen_default;
                seen_default |= m.is_default;
                m
            })
            .collect();
        Self { methods }
    }

    /// Validate and add a provider connection.
    pub fn connect(
        &mut self,
        id: impl Into<String>,
        credentials: GatewayCredentials,
    ) -> Result<&PaymentMethodConfig, ValidationError> {
        credentials.validate()?;
        let provider = credentials.provider();
        if self.by_provider(provider).is_some() {
            return Err(ValidationError::new(
                "provider",
                format!("{} is already connected", provider.as_str()),
            ));
        }

        let is_default = self.methods.is_empty();
        let id = id.into();
        info!(provider = provider.as_str(), %id, is_default, "payment method connected");
        self.methods.push(PaymentMethodConfig {
            id,
            credentials,
            is_default,
            settings: serde_json::Map::new(),
        });
        Ok(&self.methods[self.methods.len() - 1])
    }

    /// Remove a connection. Returns the removed entry if it existed.
    pub fn disconnect(&mut self, id: &str) -> Option<PaymentMethodConfig> {
        let index = self.methods.iter().position(|m| m.id == id)?;
        let removed = self.methods.remove(index);
        info!(provider = removed.provider().as_str(), %id, "payment method disconnected");
        Some(removed)
    }

    /// Make `id` the default, clearing the flag everywhere else.
    pub fn set_default(&mut self, id: &str) -> Result<(), ValidationError> {
        if !self.methods.iter().any(|m| m.id == id) {
            return Err(ValidationError::new(
                "id",
                format!("no payment method with id '{id}'"),
            ));
        }
        for method in &mut self.methods {
            method.is_default = method.id == id;
        }
        Ok(())
    }

    pub fn default_method(&self) -> Option<&PaymentMethodConfig> {
        self.methods.iter().find(|m| m.is_default)
    }

    pub fn by_provider(&self, provider: Provider) -> Option<&PaymentMethodConfig> {
        self.methods.iter().find(|m| m.provider() == provider)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PaymentMethodConfig> {
        self.methods.iter()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
