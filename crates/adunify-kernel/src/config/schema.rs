//! Configuration value objects for adapters, providers and the service.
//!
//! These are handed fully formed to constructors. How they are produced
//! (code, a file via [`load_config`](super::load_config), a remote source)
//! is up to the application.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MediationError, MediationResult};

/// Service-wide switch for showing ads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdStatus {
    #[default]
    Enabled,
    /// Ads are suppressed (e.g. after an ad-free purchase)
    Disabled,
}

impl fmt::Display for AdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdStatus::Enabled => write!(f, "enabled"),
            AdStatus::Disabled => write!(f, "disabled"),
        }
    }
}

/// How a provider picks among its own adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterSelection {
    /// Most specific adapter by kind, deterministic
    #[default]
    Resolve,
    /// Weighted draw among every compatible ready adapter
    Weighted,
}

/// Configuration for a single adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Unique identifier within the owning provider
    pub id: String,
    /// Selection weight, only used in [`AdapterSelection::Weighted`] mode
    #[serde(default)]
    pub weight: u32,
}

impl AdapterConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            weight: 0,
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn validate(&self) -> MediationResult<()> {
        if self.id.trim().is_empty() {
            return Err(MediationError::InvalidConfig(
                "adapter id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for a provider (one mediation source).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    /// Share of provider-tier draws; 0 keeps the provider out of rotation
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub adapter_selection: AdapterSelection,
}

impl ProviderConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            weight: 0,
            adapter_selection: AdapterSelection::default(),
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_adapter_selection(mut self, selection: AdapterSelection) -> Self {
        self.adapter_selection = selection;
        self
    }

    pub fn validate(&self) -> MediationResult<()> {
        if self.id.trim().is_empty() {
            return Err(MediationError::InvalidConfig(
                "provider id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level configuration of the mediation service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Seed for the provider draw; `None` seeds from OS entropy
    #[serde(default)]
    pub seed: Option<u64>,
    /// Status the service starts with
    #[serde(default)]
    pub status: AdStatus,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_status(mut self, status: AdStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_provider(mut self, provider: ProviderConfig) -> Self {
        self.providers.push(provider);
        self
    }

    /// Find a provider's configuration by id.
    pub fn provider(&self, id: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.id == id)
    }

    pub fn validate(&self) -> MediationResult<()> {
        let mut seen = HashSet::new();
        for provider in &self.providers {
            provider.validate()?;
            if !seen.insert(provider.id.as_str()) {
                return Err(MediationError::InvalidConfig(format!(
                    "provider '{}' configured twice",
                    provider.id
                )));
            }
        }
        Ok(())
    }
}
