//! Capability tiers and the host classifier.
//!
//! A host falls into one of three tiers depending on its platform level:
//!
//! | Level                      | Tier            | Key protection                         |
//! |----------------------------|-----------------|----------------------------------------|
//! | below baseline             | `Unsupported`   | none, streams pass through             |
//! | baseline up to modern      | `LegacyWrapped` | symmetric key wrapped by vault key pair |
//! | modern and above           | `ModernDirect`  | symmetric key held by the vault        |

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::stream::{CipherParams, IV_SIZE, TAG_SIZE};

/// Environment variable consulted by [`HostProfile::from_env`].
pub const PLATFORM_LEVEL_ENV: &str = "LOCALSEAL_PLATFORM_LEVEL";

/// The protection capability of a host, or of the host that produced a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityTier {
    /// No local encryption support.
    Unsupported,
    /// Symmetric key wrapped by a vault-held key pair.
    LegacyWrapped,
    /// Symmetric key generated and held by the vault.
    ModernDirect,
}

impl CapabilityTier {
    /// Returns true unless the tier is [`Unsupported`](Self::Unsupported).
    #[must_use]
    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::Unsupported)
    }

    /// Short lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unsupported => "unsupported",
            Self::LegacyWrapped => "legacy-wrapped",
            Self::ModernDirect => "modern-direct",
        }
    }

    /// Builds decrypt-side cipher parameters for a key produced under this tier.
    ///
    /// Modern keys carry an authenticated-mode parameter set with an explicit tag
    /// length; legacy keys carry the bare IV.
    #[must_use]
    pub fn cipher_params(self, iv: [u8; IV_SIZE]) -> CipherParams {
        match self {
            Self::ModernDirect => CipherParams::Gcm {
                tag_bits: (TAG_SIZE * 8) as u32,
                iv,
            },
            Self::LegacyWrapped | Self::Unsupported => CipherParams::Iv(iv),
        }
    }
}

impl std::fmt::Display for CapabilityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes the host a key manager runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostProfile {
    /// Host platform level (OS API level or equivalent version number).
    pub platform_level: u32,
}

impl HostProfile {
    /// Creates a profile for the given platform level.
    #[must_use]
    pub const fn new(platform_level: u32) -> Self {
        Self { platform_level }
    }

    /// Reads the platform level from `LOCALSEAL_PLATFORM_LEVEL`, falling
    /// back to `default_level` when the variable is unset.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the variable is not a number.
    pub fn from_env(default_level: u32) -> CoreResult<Self> {
        match std::env::var(PLATFORM_LEVEL_ENV) {
            Ok(raw) => raw.trim().parse().map(Self::new).map_err(|_| {
                CoreError::invalid_config(format!("{PLATFORM_LEVEL_ENV}={raw} is not a number"))
            }),
            Err(_) => Ok(Self::new(default_level)),
        }
    }
}

/// Maps platform levels to capability tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierClassifier {
    baseline_level: u32,
    modern_level: u32,
}

impl TierClassifier {
    /// Creates a classifier with explicit thresholds.
    #[must_use]
    pub const fn new(baseline_level: u32, modern_level: u32) -> Self {
        Self {
            baseline_level,
            modern_level,
        }
    }

    /// Creates a classifier from the thresholds in `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.baseline_level, config.modern_level)
    }

    /// Classifies a platform level.
    #[must_use]
    pub const fn classify(&self, platform_level: u32) -> CapabilityTier {
        if platform_level < self.baseline_level {
            CapabilityTier::Unsupported
        } else if platform_level < self.modern_level {
            CapabilityTier::LegacyWrapped
        } else {
            CapabilityTier::ModernDirect
        }
    }

    /// Classifies a host.
    #[must_use]
    pub const fn classify_host(&self, host: &HostProfile) -> CapabilityTier {
        self.classify(host.platform_level)
    }

    /// Tier of a key whose generating platform level was recorded as `marker`.
    ///
    /// Any key below the modern threshold was produced by the wrapped scheme.
    #[must_use]
    pub fn key_tier(&self, marker: i64) -> CapabilityTier {
        if marker >= i64::from(self.modern_level) {
            CapabilityTier::ModernDirect
        } else {
            CapabilityTier::LegacyWrapped
        }
    }
}

impl Default for TierClassifier {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
