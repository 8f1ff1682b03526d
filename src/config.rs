use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::decimal::Rate;
use crate::errors::{RegistryError, Result};

/// default config file when `CONFIG_PATH` is unset
pub const DEFAULT_CONFIG_PATH: &str = "registry.toml";

/// registry configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub credit: CreditConfig,
}

/// how phone numbers are reduced before the uniqueness comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhoneNormalization {
    /// strip whitespace, parentheses and hyphens
    KeepPlus,
    /// additionally strip `+`
    StripPlus,
}

/// client validation bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// lowest age any stored client may have
    pub min_age: i32,
    pub max_age: i32,
    /// lowest age accepted by the registration entry point
    pub min_registration_age: i32,
    /// phone handling for registration and updates
    pub registration_phones: PhoneNormalization,
    /// phone handling for bulk imports
    pub import_phones: PhoneNormalization,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_age: 1,
            max_age: 99,
            min_registration_age: 18,
            registration_phones: PhoneNormalization::KeepPlus,
            import_phones: PhoneNormalization::StripPlus,
        }
    }
}

/// credit defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditConfig {
    /// annual rate applied when a credit omits one
    pub default_interest_rate: Rate,
}

impl Default for CreditConfig {
    fn default() -> Self {
        Self {
            default_interest_rate: Rate::from_percent(dec!(12.00)),
        }
    }
}

impl RegistryConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RegistryConfig = toml::from_str(content).map_err(|e| RegistryError::InvalidConfiguration {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| RegistryError::InvalidConfiguration {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// `CONFIG_PATH` or `registry.toml`; a missing file yields the defaults
    pub fn load_default() -> Result<Self> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        if !Path::new(&path).exists() {
            tracing::debug!(path = %path, "config_file_missing_using_defaults");
            return Ok(Self::default());
        }
        Self::load_from_file(&path)
    }

    pub fn validate(&self) -> Result<()> {
        let v = &self.validation;
        if v.min_age < 1 {
            return Err(invalid("validation.min_age must be >= 1"));
        }
        if v.min_age > v.min_registration_age {
            return Err(invalid("validation.min_age must be <= validation.min_registration_age"));
        }
        if v.min_registration_age > v.max_age {
            return Err(invalid("validation.min_registration_age must be <= validation.max_age"));
        }
        if !self.credit.default_interest_rate.is_positive() {
            return Err(invalid("credit.default_interest_rate must be > 0"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> RegistryError {
    RegistryError::InvalidConfiguration {
        message: message.to_string(),
    }
}
