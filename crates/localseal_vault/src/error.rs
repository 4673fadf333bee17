//! Error types for vault and settings operations.

use std::io;
use thiserror::Error;

/// Result type for key vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

/// Result type for settings store operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Errors raised by a [`KeyVault`](crate::KeyVault).
#[derive(Debug, Error)]
pub enum VaultError {
    /// The key store cannot be reached.
    #[error("key vault unavailable: {0}")]
    Unavailable(String),

    /// The key store is locked (e.g. the device has not been unlocked yet).
    #[error("key vault is locked")]
    Locked,

    /// Persisted vault state could not be interpreted.
    #[error("key vault corrupted: {0}")]
    Corrupted(String),

    /// The alias exists but holds a different kind of key, or is missing
    /// where the operation requires it.
    #[error("key not found: {alias}")]
    KeyNotFound {
        /// The alias that was looked up.
        alias: String,
    },

    /// The key pair is outside its validity window.
    #[error("key {alias} is outside its validity window")]
    KeyExpired {
        /// The alias of the expired key pair.
        alias: String,
    },

    /// The vault rejected a key generation request.
    #[error("unsupported key spec: {0}")]
    UnsupportedSpec(String),

    /// Wrapping a key failed.
    #[error("key wrap failed: {0}")]
    Wrap(String),

    /// Unwrapping a key failed (wrong key pair or tampered blob).
    #[error("key unwrap failed: {0}")]
    Unwrap(String),

    /// An I/O error occurred while persisting vault state.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl VaultError {
    /// Creates a key-not-found error.
    pub fn key_not_found(alias: impl Into<String>) -> Self {
        Self::KeyNotFound {
            alias: alias.into(),
        }
    }

    /// Creates an unsupported spec error.
    pub fn unsupported_spec(message: impl Into<String>) -> Self {
        Self::UnsupportedSpec(message.into())
    }

    /// Returns true if the vault refused to generate a key for the given spec.
    #[must_use]
    pub fn is_generation_rejected(&self) -> bool {
        matches!(self, Self::UnsupportedSpec(_))
    }
}

/// Errors raised by a [`SettingsStore`](crate::SettingsStore).
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The settings file could not be parsed.
    #[error("settings corrupted: {0}")]
    Corrupted(String),

    /// A value exists under the key but has a different type.
    #[error("setting {key} has type {actual}, expected {expected}")]
    TypeMismatch {
        /// The settings key.
        key: String,
        /// The expected value type.
        expected: &'static str,
        /// The stored value type.
        actual: &'static str,
    },
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Corrupted(err.to_string())
    }
}
