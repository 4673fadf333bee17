//! Key material and handles exchanged with a key vault.

use crate::error::{VaultError, VaultResult};
use std::time::{Duration, SystemTime};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a 128-bit symmetric key in bytes.
pub const KEY_SIZE_128: usize = 16;
/// Size of a 256-bit symmetric key in bytes.
pub const KEY_SIZE_256: usize = 32;
/// Size of an X25519 public key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Validity of generated key pairs when none is requested explicitly.
pub const DEFAULT_KEY_PAIR_VALIDITY: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// A symmetric content-protection key.
///
/// The key is automatically zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop, PartialEq, Eq)]
pub struct SymmetricKey {
    bytes: Vec<u8>,
}

impl SymmetricKey {
    /// Creates a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::UnsupportedSpec`] unless the slice is 16 or 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> VaultResult<Self> {
        if bytes.len() != KEY_SIZE_128 && bytes.len() != KEY_SIZE_256 {
            return Err(VaultError::unsupported_spec(format!(
                "symmetric key must be {KEY_SIZE_128} or {KEY_SIZE_256} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// Returns the raw key bytes.
    ///
    /// # Security
    ///
    /// Don't log or serialize the result.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the key size in bits.
    #[must_use]
    pub fn size_bits(&self) -> u32 {
        (self.bytes.len() * 8) as u32
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bits", &self.size_bits())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Public half of a vault-held key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyHandle {
    alias: String,
    bytes: [u8; PUBLIC_KEY_SIZE],
}

impl PublicKeyHandle {
    /// Creates a handle from the alias and raw public key.
    #[must_use]
    pub fn new(alias: impl Into<String>, bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self {
            alias: alias.into(),
            bytes,
        }
    }

    /// The alias of the key pair this public key belongs to.
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Raw public key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.bytes
    }
}

/// Reference to a private key that never leaves the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateKeyHandle {
    alias: String,
}

impl PrivateKeyHandle {
    /// Creates a handle for the private key stored under `alias`.
    #[must_use]
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
        }
    }

    /// The alias of the key pair.
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }
}

/// Handles for a freshly generated key pair.
#[derive(Debug, Clone)]
pub struct KeyPairHandle {
    /// Public half, usable for wrapping.
    pub public: PublicKeyHandle,
    /// Private half, usable for unwrapping through the vault.
    pub private: PrivateKeyHandle,
}

/// Parameters for generating an asymmetric key pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPairSpec {
    /// Requested key size in bits.
    pub size_bits: u32,
    /// Start of the validity window.
    pub not_before: SystemTime,
    /// End of the validity window.
    pub not_after: SystemTime,
}

impl KeyPairSpec {
    /// Creates a spec valid from now for `validity`.
    #[must_use]
    pub fn valid_for(size_bits: u32, validity: Duration) -> Self {
        let now = SystemTime::now();
        Self {
            size_bits,
            not_before: now,
            not_after: now + validity,
        }
    }

    /// Returns true if `at` lies within the validity window.
    #[must_use]
    pub fn is_valid_at(&self, at: SystemTime) -> bool {
        at >= self.not_before && at <= self.not_after
    }
}

/// The trust boundary a vault enforces for its keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectionLevel {
    /// Keys live in dedicated secure hardware.
    Hardware,
    /// Keys are protected by the operating system or process only.
    Software,
}
