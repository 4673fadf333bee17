//! Protection key resolution.
//!
//! The [`ProtectionKeyManager`] owns the single long-lived content key. On
//! the first [`resolve`](ProtectionKeyManager::resolve) it looks the key up
//! in the vault, migrates a wrapped key left by an older host, or generates
//! a new one; later calls return the cached key.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::random::RandomSource;
use crate::tier::{CapabilityTier, HostProfile, TierClassifier};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use localseal_vault::{KeyPairSpec, KeyVault, SettingValue, SettingsStore, SymmetricKey, VaultError};
use parking_lot::Mutex;
use std::sync::Arc;
use zeroize::Zeroizing;

/// How the key was obtained when it was first resolved.
///
/// Callers served from the cache see the source of that first resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Fetched from the vault under the modern alias.
    VaultDirect,
    /// Recovered by unwrapping the persisted blob.
    MigratedLegacy,
    /// Freshly generated inside the vault.
    GeneratedModern,
    /// Freshly generated and wrapped with a vault key pair.
    GeneratedLegacy,
}

impl KeySource {
    /// Returns true if the key did not exist before this resolution.
    #[must_use]
    pub const fn is_generated(self) -> bool {
        matches!(self, Self::GeneratedModern | Self::GeneratedLegacy)
    }
}

/// A resolved content-protection key.
///
/// Immutable. The tier is the one recorded when the key was generated, which
/// may be older than the current host's tier.
pub struct ProtectionKey {
    key: SymmetricKey,
    tier: CapabilityTier,
    source: KeySource,
    platform_level: i64,
}

impl ProtectionKey {
    /// The symmetric key material.
    #[must_use]
    pub fn key(&self) -> &SymmetricKey {
        &self.key
    }

    /// The tier under which the key was produced.
    #[must_use]
    pub fn tier(&self) -> CapabilityTier {
        self.tier
    }

    /// How the key was obtained when it was first resolved.
    #[must_use]
    pub fn source(&self) -> KeySource {
        self.source
    }

    /// The platform level recorded for the key.
    #[must_use]
    pub fn platform_level(&self) -> i64 {
        self.platform_level
    }
}

impl std::fmt::Debug for ProtectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtectionKey")
            .field("tier", &self.tier)
            .field("source", &self.source)
            .field("platform_level", &self.platform_level)
            .field("size_bits", &self.key.size_bits())
            .finish()
    }
}

/// Read-only snapshot of persisted key state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStatus {
    /// Current host platform level.
    pub host_level: u32,
    /// Current host tier.
    pub host_tier: CapabilityTier,
    /// Platform level recorded when the key was generated, if any.
    pub marker: Option<i64>,
    /// Tier implied by the marker.
    pub key_tier: Option<CapabilityTier>,
    /// The vault holds a symmetric key under the modern alias.
    pub has_direct_key: bool,
    /// The vault holds the wrapping key pair.
    pub has_wrap_key: bool,
    /// A wrapped key blob is persisted.
    pub has_wrapped_blob: bool,
    /// A key is cached in this manager.
    pub cached: bool,
}

/// Resolves and caches the content-protection key.
///
/// The cache mutex is held for the whole resolution, so concurrent first
/// callers run exactly one lookup/migration/generation sequence and all
/// observe its result.
pub struct ProtectionKeyManager {
    vault: Arc<dyn KeyVault>,
    settings: Arc<dyn SettingsStore>,
    host: HostProfile,
    config: Config,
    classifier: TierClassifier,
    random: Arc<RandomSource>,
    cached: Mutex<Option<Arc<ProtectionKey>>>,
}

impl ProtectionKeyManager {
    /// Creates a manager for `host`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if `config` does not validate.
    pub fn new(
        vault: Arc<dyn KeyVault>,
        settings: Arc<dyn SettingsStore>,
        host: HostProfile,
        config: Config,
        random: Arc<RandomSource>,
    ) -> CoreResult<Self> {
        config.validate()?;
        let classifier = TierClassifier::from_config(&config);
        Ok(Self {
            vault,
            settings,
            host,
            config,
            classifier,
            random,
            cached: Mutex::new(None),
        })
    }

    /// The host this manager runs on.
    #[must_use]
    pub fn host(&self) -> HostProfile {
        self.host
    }

    /// The host's current capability tier.
    #[must_use]
    pub fn host_tier(&self) -> CapabilityTier {
        self.classifier.classify_host(&self.host)
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The cached key, if one has been resolved.
    #[must_use]
    pub fn cached(&self) -> Option<Arc<ProtectionKey>> {
        self.cached.lock().clone()
    }

    /// Drops the cached key; the next resolution runs the full protocol.
    pub fn invalidate(&self) {
        if self.cached.lock().take().is_some() {
            tracing::debug!("Local protection key cache invalidated");
        }
    }

    /// Returns the protection key, resolving it on first use.
    ///
    /// # Errors
    ///
    /// - [`CoreError::UnsupportedPlatform`] if the host has no local encryption support
    /// - [`CoreError::KeyVault`] if the vault fails
    /// - [`CoreError::KeyGeneration`] if the vault rejects a generation request
    /// - [`CoreError::Settings`] if the settings store fails
    /// - [`CoreError::CorruptWrappedKey`] if the persisted blob is not base64
    pub fn resolve(&self) -> CoreResult<Arc<ProtectionKey>> {
        let host_tier = self.host_tier();
        let mut cached = self.cached.lock();
        if let Some(key) = cached.as_ref() {
            tracing::debug!(tier = ?key.tier(), "Using cached local protection key");
            return Ok(Arc::clone(key));
        }

        tracing::info!(
            platform_level = self.host.platform_level,
            tier = ?host_tier,
            "Loading local protection key"
        );
        let key = match host_tier {
            CapabilityTier::ModernDirect => self.resolve_modern()?,
            CapabilityTier::LegacyWrapped => self.resolve_legacy()?,
            CapabilityTier::Unsupported => {
                return Err(CoreError::UnsupportedPlatform {
                    platform_level: self.host.platform_level,
                })
            }
        };
        tracing::info!(
            tier = ?key.tier(),
            source = ?key.source(),
            "Local protection key ready"
        );

        let key = Arc::new(key);
        *cached = Some(Arc::clone(&key));
        Ok(key)
    }

    /// Reports persisted key state without resolving or generating anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault or the settings store fails.
    pub fn status(&self) -> CoreResult<KeyStatus> {
        let marker = match self.settings.get(&self.config.level_setting)? {
            Some(SettingValue::Int(level)) => Some(level),
            Some(_) | None => None,
        };
        Ok(KeyStatus {
            host_level: self.host.platform_level,
            host_tier: self.host_tier(),
            marker,
            key_tier: marker.map(|level| self.classifier.key_tier(level)),
            has_direct_key: self.vault.has_key(&self.config.symmetric_alias)?,
            has_wrap_key: self.vault.has_key(&self.config.wrap_alias)?,
            has_wrapped_blob: self
                .settings
                .get_string(&self.config.wrapped_key_setting)?
                .is_some(),
            cached: self.cached.lock().is_some(),
        })
    }

    fn host_level(&self) -> i64 {
        i64::from(self.host.platform_level)
    }

    fn read_marker(&self) -> CoreResult<i64> {
        Ok(self
            .settings
            .get_int(&self.config.level_setting, self.host_level())?)
    }

    fn protection_key(&self, key: SymmetricKey, marker: i64, source: KeySource) -> ProtectionKey {
        ProtectionKey {
            key,
            tier: self.classifier.key_tier(marker),
            source,
            platform_level: marker,
        }
    }

    fn resolve_modern(&self) -> CoreResult<ProtectionKey> {
        let marker = self.read_marker()?;
        let alias = &self.config.symmetric_alias;

        if self.vault.has_key(alias)? {
            tracing::info!(alias = %alias, "Found symmetric key in vault");
            let key = self
                .vault
                .get_symmetric_key(alias)?
                .ok_or_else(|| VaultError::key_not_found(alias.as_str()))?;
            return Ok(self.protection_key(key, marker, KeySource::VaultDirect));
        }

        if let Some(key) = self.recover_legacy_key()? {
            return Ok(self.protection_key(key, marker, KeySource::MigratedLegacy));
        }

        tracing::info!(
            alias = %alias,
            size_bits = self.config.key_size_bits,
            "Generating symmetric key in vault"
        );
        let key = self
            .vault
            .generate_symmetric_key(alias, self.config.key_size_bits)
            .map_err(|e| generation_error(alias, e))?;
        let level = self.host_level();
        self.settings
            .put(&self.config.level_setting, SettingValue::Int(level))?;

        Ok(self.protection_key(key, level, KeySource::GeneratedModern))
    }

    fn resolve_legacy(&self) -> CoreResult<ProtectionKey> {
        let marker = self.read_marker()?;
        if let Some(key) = self.recover_legacy_key()? {
            return Ok(self.protection_key(key, marker, KeySource::MigratedLegacy));
        }

        let alias = &self.config.wrap_alias;
        tracing::info!(alias = %alias, "Generating wrapping key pair in vault");
        let spec = KeyPairSpec::valid_for(self.config.key_pair_size_bits, self.config.key_pair_validity);
        let pair = self
            .vault
            .generate_key_pair(alias, &spec)
            .map_err(|e| generation_error(alias, e))?;

        let material = Zeroizing::new(self.random.bytes(self.config.key_size_bits as usize / 8));
        let key = SymmetricKey::from_bytes(&material)?;
        let wrapped = self.vault.wrap(&pair.public, &key)?;

        let level = self.host_level();
        self.settings.put_all(&[
            (
                self.config.wrapped_key_setting.as_str(),
                SettingValue::Str(STANDARD.encode(&wrapped)),
            ),
            (self.config.level_setting.as_str(), SettingValue::Int(level)),
        ])?;
        tracing::info!(wrapped_len = wrapped.len(), "Persisted wrapped local protection key");

        Ok(self.protection_key(key, level, KeySource::GeneratedLegacy))
    }

    /// Unwraps the persisted blob with the vault's private key.
    ///
    /// `Ok(None)` when either the blob or the private key is absent.
    fn recover_legacy_key(&self) -> CoreResult<Option<SymmetricKey>> {
        let Some(blob) = self.settings.get_string(&self.config.wrapped_key_setting)? else {
            tracing::debug!("No wrapped key blob persisted");
            return Ok(None);
        };
        let Some(private) = self.vault.private_key(&self.config.wrap_alias)? else {
            tracing::warn!(
                alias = %self.config.wrap_alias,
                "Wrapped key blob present but wrapping key pair is missing"
            );
            return Ok(None);
        };

        let compact: String = blob.chars().filter(|c| !c.is_whitespace()).collect();
        let wrapped = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| CoreError::corrupt_wrapped_key(e.to_string()))?;
        let key = self.vault.unwrap(&private, &wrapped)?;

        tracing::info!(alias = %self.config.wrap_alias, "Recovered wrapped local protection key");
        Ok(Some(key))
    }
}

impl std::fmt::Debug for ProtectionKeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtectionKeyManager")
            .field("host", &self.host)
            .field("host_tier", &self.host_tier())
            .field("protection_level", &self.vault.protection_level())
            .field("cached", &self.cached.lock().is_some())
            .finish()
    }
}

fn generation_error(alias: &str, err: VaultError) -> CoreError {
    if err.is_generation_rejected() {
        CoreError::key_generation(alias, err)
    } else {
        CoreError::KeyVault(err)
    }
}
