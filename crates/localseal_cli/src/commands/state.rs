//! Opens the on-disk vault and settings store shared by all commands.

use localseal_core::{Config, HostProfile, ProtectionKeyManager, RandomSource, StreamCipherCodec};
use localseal_vault::{FileSettings, SoftwareVault};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// File name of the persisted software vault inside the state directory.
pub const VAULT_FILE: &str = "vault.json";

/// File name of the settings store inside the state directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Builds a codec over the state kept in `state_dir`.
///
/// The platform level comes from `platform_level` if given, else from
/// `LOCALSEAL_PLATFORM_LEVEL`, else the modern threshold.
pub fn open(
    state_dir: &Path,
    platform_level: Option<u32>,
) -> Result<StreamCipherCodec, Box<dyn std::error::Error>> {
    fs::create_dir_all(state_dir)?;

    let config = Config::default();
    let host = match platform_level {
        Some(level) => HostProfile::new(level),
        None => HostProfile::from_env(config.modern_level)?,
    };

    let vault = SoftwareVault::open(&state_dir.join(VAULT_FILE))?;
    let settings = FileSettings::open(&state_dir.join(SETTINGS_FILE))?;
    tracing::debug!(
        state_dir = %state_dir.display(),
        platform_level = host.platform_level,
        "Opened local state"
    );

    let random = Arc::new(RandomSource::new());
    let keys = ProtectionKeyManager::new(
        Arc::new(vault),
        Arc::new(settings),
        host,
        config,
        Arc::clone(&random),
    )?;
    Ok(StreamCipherCodec::new(Arc::new(keys), random))
}
