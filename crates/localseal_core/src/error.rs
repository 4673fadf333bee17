//! Error types for LocalSeal core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while resolving keys or wrapping streams.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The key vault is unreachable, locked, or corrupted.
    #[error("key vault error: {0}")]
    KeyVault(#[from] localseal_vault::VaultError),

    /// The vault rejected a key generation request.
    #[error("key generation rejected for {alias}: {source}")]
    KeyGeneration {
        /// Alias the key was to be generated under.
        alias: String,
        /// The vault's rejection.
        source: localseal_vault::VaultError,
    },

    /// The settings store failed.
    #[error("settings error: {0}")]
    Settings(#[from] localseal_vault::SettingsError),

    /// I/O error on the wrapped stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The host has no local encryption support.
    ///
    /// Stream wrapping never returns this; it falls back to passthrough.
    #[error("platform level {platform_level} has no local encryption support")]
    UnsupportedPlatform {
        /// The host platform level.
        platform_level: u32,
    },

    /// The stream header carries an IV of the wrong length.
    #[error("invalid IV length: expected {expected}, got {actual}")]
    InvalidIvLength {
        /// Required IV length.
        expected: usize,
        /// Observed IV length.
        actual: usize,
    },

    /// The stream ended before a complete header was read.
    #[error("stream header truncated")]
    TruncatedHeader,

    /// The persisted wrapped key could not be decoded.
    #[error("corrupt wrapped key: {message}")]
    CorruptWrappedKey {
        /// Description of the failure.
        message: String,
    },

    /// Encryption failed.
    #[error("encryption failed: {message}")]
    EncryptionFailed {
        /// Description of the failure.
        message: String,
    },

    /// Decryption or authentication failed.
    #[error("decryption failed: {message}")]
    DecryptionFailed {
        /// Description of the failure.
        message: String,
    },

    /// Invalid key size.
    #[error("invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize {
        /// Expected size description in bytes.
        expected: &'static str,
        /// Actual size in bytes.
        actual: usize,
    },

    /// Configuration is inconsistent.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates a key generation error.
    pub fn key_generation(alias: impl Into<String>, source: localseal_vault::VaultError) -> Self {
        Self::KeyGeneration {
            alias: alias.into(),
            source,
        }
    }

    /// Creates a corrupt wrapped key error.
    pub fn corrupt_wrapped_key(message: impl Into<String>) -> Self {
        Self::CorruptWrappedKey {
            message: message.into(),
        }
    }

    /// Creates an encryption failed error.
    pub fn encryption_failed(message: impl Into<String>) -> Self {
        Self::EncryptionFailed {
            message: message.into(),
        }
    }

    /// Creates a decryption failed error.
    pub fn decryption_failed(message: impl Into<String>) -> Self {
        Self::DecryptionFailed {
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns true if the error signals a corrupt stream header.
    ///
    /// When this is true for a decrypt call, header bytes have already been
    /// consumed from the source; it must not be re-read as plaintext.
    #[must_use]
    pub fn is_corrupt_header(&self) -> bool {
        matches!(self, Self::InvalidIvLength { .. } | Self::TruncatedHeader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_header_classification() {
        assert!(CoreError::TruncatedHeader.is_corrupt_header());
        assert!(CoreError::InvalidIvLength {
            expected: 12,
            actual: 7
        }
        .is_corrupt_header());
        assert!(!CoreError::encryption_failed("x").is_corrupt_header());
    }

    #[test]
    fn vault_errors_convert() {
        let err: CoreError = localseal_vault::VaultError::Locked.into();
        assert!(matches!(err, CoreError::KeyVault(_)));
        assert!(err.to_string().contains("locked"));
    }
}
