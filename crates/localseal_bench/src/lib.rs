//! Benchmark utilities.

use localseal_core::{Config, HostProfile, ProtectionKeyManager, RandomSource, StreamCipherCodec};
use localseal_vault::{FileSettings, InMemorySettings, SoftwareVault};
use rand::Rng;
use std::path::Path;
use std::sync::Arc;

/// Platform level of a legacy-tier host.
pub const LEGACY_LEVEL: u32 = 21;

/// Platform level of a modern-tier host.
pub const MODERN_LEVEL: u32 = 23;

/// Generate random payload data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Build a key manager over fresh in-memory state.
pub fn memory_manager(level: u32, config: Config) -> Arc<ProtectionKeyManager> {
    Arc::new(
        ProtectionKeyManager::new(
            Arc::new(SoftwareVault::in_memory()),
            Arc::new(InMemorySettings::new()),
            HostProfile::new(level),
            config,
            Arc::new(RandomSource::new()),
        )
        .unwrap(),
    )
}

/// Build a key manager over state persisted in `dir`.
pub fn file_manager(dir: &Path, level: u32) -> Arc<ProtectionKeyManager> {
    Arc::new(
        ProtectionKeyManager::new(
            Arc::new(SoftwareVault::open(&dir.join("vault.json")).unwrap()),
            Arc::new(FileSettings::open(&dir.join("settings.json")).unwrap()),
            HostProfile::new(level),
            Config::default(),
            Arc::new(RandomSource::new()),
        )
        .unwrap(),
    )
}

/// Build a codec with a resolved key over fresh in-memory state.
pub fn warm_codec(level: u32, config: Config) -> StreamCipherCodec {
    let keys = memory_manager(level, config);
    keys.resolve().unwrap();
    StreamCipherCodec::new(keys, Arc::new(RandomSource::new()))
}
