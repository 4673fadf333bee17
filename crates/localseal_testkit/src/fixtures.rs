//! Test fixtures for simulated hosts.
//!
//! A host's durable state is its vault and its settings store. Building
//! several managers over the same state, with different platform levels,
//! simulates process restarts and platform upgrades.

use crate::doubles::CountingVault;
use localseal_core::{Config, HostProfile, ProtectionKeyManager, RandomSource, StreamCipherCodec};
use localseal_vault::{FileSettings, InMemorySettings, KeyVault, SettingsStore, SoftwareVault};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Platform level of a host without local encryption support.
pub const UNSUPPORTED_LEVEL: u32 = 18;

/// Platform level of a legacy-tier host.
pub const LEGACY_LEVEL: u32 = 21;

/// Platform level of a modern-tier host.
pub const MODERN_LEVEL: u32 = 23;

/// In-memory host state shared by every manager built from it.
pub struct TestHost {
    vault: Arc<CountingVault<SoftwareVault>>,
    settings: Arc<InMemorySettings>,
    random: Arc<RandomSource>,
    config: Config,
}

impl TestHost {
    /// Creates a host with empty state and the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a host with empty state and `config`.
    pub fn with_config(config: Config) -> Self {
        Self {
            vault: Arc::new(CountingVault::new(SoftwareVault::in_memory())),
            settings: Arc::new(InMemorySettings::new()),
            random: Arc::new(RandomSource::new()),
            config,
        }
    }

    /// The instrumented vault.
    pub fn vault(&self) -> &Arc<CountingVault<SoftwareVault>> {
        &self.vault
    }

    /// The settings store.
    pub fn settings(&self) -> &Arc<InMemorySettings> {
        &self.settings
    }

    /// The shared random source.
    pub fn random(&self) -> &Arc<RandomSource> {
        &self.random
    }

    /// Builds a fresh manager (as after a process start) at `level`.
    pub fn manager(&self, level: u32) -> Arc<ProtectionKeyManager> {
        build_manager(
            self.vault.clone(),
            self.settings.clone(),
            level,
            self.config.clone(),
            Arc::clone(&self.random),
        )
    }

    /// Builds a codec over a fresh manager at `level`.
    pub fn codec(&self, level: u32) -> StreamCipherCodec {
        StreamCipherCodec::new(self.manager(level), Arc::clone(&self.random))
    }
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}

/// Host state persisted in a temporary directory.
///
/// Every call to [`codec`](Self::codec) reopens the files, so nothing
/// survives between codecs except what reached disk.
pub struct FileHost {
    dir: PathBuf,
    _temp_dir: TempDir,
}

impl FileHost {
    /// Creates an empty state directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        Self {
            dir: temp_dir.path().to_path_buf(),
            _temp_dir: temp_dir,
        }
    }

    /// The state directory.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Path of the vault file.
    pub fn vault_path(&self) -> PathBuf {
        self.dir.join("vault.json")
    }

    /// Path of the settings file.
    pub fn settings_path(&self) -> PathBuf {
        self.dir.join("settings.json")
    }

    /// Reopens the state and builds a codec at `level`.
    pub fn codec(&self, level: u32) -> StreamCipherCodec {
        let vault = SoftwareVault::open(&self.vault_path()).expect("Failed to open vault");
        let settings = FileSettings::open(&self.settings_path()).expect("Failed to open settings");
        let random = Arc::new(RandomSource::new());
        let keys = build_manager(
            Arc::new(vault),
            Arc::new(settings),
            level,
            Config::default(),
            Arc::clone(&random),
        );
        StreamCipherCodec::new(keys, random)
    }
}

impl Default for FileHost {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a manager, panicking on an invalid configuration.
pub fn build_manager(
    vault: Arc<dyn KeyVault>,
    settings: Arc<dyn SettingsStore>,
    level: u32,
    config: Config,
    random: Arc<RandomSource>,
) -> Arc<ProtectionKeyManager> {
    Arc::new(
        ProtectionKeyManager::new(vault, settings, HostProfile::new(level), config, random)
            .expect("Failed to build key manager"),
    )
}

/// Runs a test with a codec over fresh in-memory state at `level`.
///
/// # Example
///
/// ```rust
/// use localseal_testkit::{with_codec, MODERN_LEVEL};
///
/// with_codec(MODERN_LEVEL, |codec| {
///     let sealed = codec.encrypt_to_vec(b"abc").unwrap();
///     assert_eq!(codec.decrypt_slice(&sealed).unwrap(), b"abc");
/// });
/// ```
pub fn with_codec<F, R>(level: u32, f: F) -> R
where
    F: FnOnce(&StreamCipherCodec) -> R,
{
    let host = TestHost::new();
    f(&host.codec(level))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doubles::VaultCall;
    use localseal_core::KeySource;

    #[test]
    fn managers_share_state() {
        let host = TestHost::new();
        let first = host.manager(MODERN_LEVEL).resolve().unwrap();
        let second = host.manager(MODERN_LEVEL).resolve().unwrap();

        assert_eq!(first.key(), second.key());
        assert_eq!(second.source(), KeySource::VaultDirect);
        assert_eq!(host.vault().count(VaultCall::GenerateSymmetricKey), 1);
    }

    #[test]
    fn file_host_reopens_state() {
        let host = FileHost::new();
        let sealed = host.codec(LEGACY_LEVEL).encrypt_to_vec(b"persisted").unwrap();
        assert!(host.vault_path().exists());
        assert!(host.settings_path().exists());

        assert_eq!(
            host.codec(LEGACY_LEVEL).decrypt_slice(&sealed).unwrap(),
            b"persisted"
        );
    }

    #[test]
    fn with_codec_unsupported_is_passthrough() {
        let out = with_codec(UNSUPPORTED_LEVEL, |codec| codec.encrypt_to_vec(b"x").unwrap());
        assert_eq!(out, b"x");
    }
}
