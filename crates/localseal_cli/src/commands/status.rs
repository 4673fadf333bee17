//! Status command implementation.

use localseal_core::{KeyStatus, ProtectionKeyManager};
use serde::Serialize;

/// Key status as printed by the CLI.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    /// Current host platform level.
    pub host_level: u32,
    /// Current host tier.
    pub host_tier: String,
    /// Platform level recorded when the key was generated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_platform_level: Option<i64>,
    /// Tier implied by the recorded level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_tier: Option<String>,
    /// Symmetric key held directly by the vault.
    pub direct_key: bool,
    /// Wrapping key pair held by the vault.
    pub wrap_key: bool,
    /// Wrapped key blob persisted in settings.
    pub wrapped_blob: bool,
    /// A key is already resolved in this process.
    pub cached: bool,
}

impl From<KeyStatus> for StatusReport {
    fn from(status: KeyStatus) -> Self {
        Self {
            host_level: status.host_level,
            host_tier: status.host_tier.to_string(),
            key_platform_level: status.marker,
            key_tier: status.key_tier.map(|tier| tier.to_string()),
            direct_key: status.has_direct_key,
            wrap_key: status.has_wrap_key,
            wrapped_blob: status.has_wrapped_blob,
            cached: status.cached,
        }
    }
}

/// Runs the status command.
pub fn run(keys: &ProtectionKeyManager, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let report = StatusReport::from(keys.status()?);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => print_text_output(&report),
    }
    Ok(())
}

fn print_text_output(report: &StatusReport) {
    println!("LocalSeal Key Status");
    println!("====================");
    println!("Host platform level: {}", report.host_level);
    println!("Host tier:           {}", report.host_tier);
    match (&report.key_platform_level, &report.key_tier) {
        (Some(level), Some(tier)) => {
            println!("Key generated at:    level {level} ({tier})");
        }
        _ => println!("Key generated at:    (no key recorded)"),
    }
    println!();
    println!("Vault symmetric key: {}", yes_no(report.direct_key));
    println!("Vault wrapping pair: {}", yes_no(report.wrap_key));
    println!("Wrapped key blob:    {}", yes_no(report.wrapped_blob));
    println!(
        "Key cache:           {}",
        if report.cached { "resolved" } else { "empty" }
    );
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "present"
    } else {
        "absent"
    }
}
