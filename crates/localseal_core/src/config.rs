//! Key manager configuration.

use crate::error::{CoreError, CoreResult};
use localseal_vault::{DEFAULT_KEY_PAIR_VALIDITY, KEY_PAIR_SIZE_BITS};
use std::time::Duration;

/// Configuration for key resolution and stream encryption.
#[derive(Debug, Clone)]
pub struct Config {
    /// Lowest platform level with any local encryption support.
    pub baseline_level: u32,

    /// Lowest platform level whose vault can hold symmetric keys directly.
    pub modern_level: u32,

    /// Size of the content-protection key in bits (128 or 256).
    pub key_size_bits: u32,

    /// Size of the wrapping key pair in bits.
    pub key_pair_size_bits: u32,

    /// How long a generated wrapping key pair stays valid.
    pub key_pair_validity: Duration,

    /// Vault alias of the directly held symmetric key.
    pub symmetric_alias: String,

    /// Vault alias of the wrapping key pair.
    pub wrap_alias: String,

    /// Settings key under which the wrapped key blob is stored.
    pub wrapped_key_setting: String,

    /// Settings key under which the generating platform level is stored.
    pub level_setting: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            baseline_level: 19,
            modern_level: 23,
            key_size_bits: 128,
            key_pair_size_bits: KEY_PAIR_SIZE_BITS,
            key_pair_validity: DEFAULT_KEY_PAIR_VALIDITY, // 10 years
            symmetric_alias: "aes_local_protection".to_string(),
            wrap_alias: "wrap_local_protection".to_string(),
            wrapped_key_setting: "aes_wrapped_local_protection".to_string(),
            level_setting: "platform_level_when_key_generated".to_string(),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tier thresholds.
    #[must_use]
    pub const fn levels(mut self, baseline: u32, modern: u32) -> Self {
        self.baseline_level = baseline;
        self.modern_level = modern;
        self
    }

    /// Sets the content-protection key size.
    #[must_use]
    pub const fn key_size_bits(mut self, bits: u32) -> Self {
        self.key_size_bits = bits;
        self
    }

    /// Sets the wrapping key pair size.
    #[must_use]
    pub const fn key_pair_size_bits(mut self, bits: u32) -> Self {
        self.key_pair_size_bits = bits;
        self
    }

    /// Sets the wrapping key pair validity.
    #[must_use]
    pub const fn key_pair_validity(mut self, validity: Duration) -> Self {
        self.key_pair_validity = validity;
        self
    }

    /// Sets the vault aliases.
    #[must_use]
    pub fn aliases(mut self, symmetric: impl Into<String>, wrap: impl Into<String>) -> Self {
        self.symmetric_alias = symmetric.into();
        self.wrap_alias = wrap.into();
        self
    }

    /// Checks the configuration for inconsistencies.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the key size is not 128 or
    /// 256 bits, the thresholds are out of order, or an alias is empty.
    pub fn validate(&self) -> CoreResult<()> {
        if self.key_size_bits != 128 && self.key_size_bits != 256 {
            return Err(CoreError::invalid_config(format!(
                "key size must be 128 or 256 bits, got {}",
                self.key_size_bits
            )));
        }
        if self.baseline_level > self.modern_level {
            return Err(CoreError::invalid_config(format!(
                "baseline level {} is above modern level {}",
                self.baseline_level, self.modern_level
            )));
        }
        if self.symmetric_alias.is_empty() || self.wrap_alias.is_empty() {
            return Err(CoreError::invalid_config("vault aliases must not be empty"));
        }
        if self.symmetric_alias == self.wrap_alias {
            return Err(CoreError::invalid_config(
                "symmetric and wrap aliases must differ",
            ));
        }
        Ok(())
    }
}
