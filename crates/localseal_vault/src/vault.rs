//! Key vault trait definition.

use crate::error::VaultResult;
use crate::keys::{
    KeyPairHandle, KeyPairSpec, PrivateKeyHandle, ProtectionLevel, PublicKeyHandle, SymmetricKey,
};

/// A secure key storage facility.
///
/// Vaults hold named keys behind a trust boundary that LocalSeal does not
/// control (a hardware keystore, an OS keychain, or a software store). Keys
/// are addressed by alias.
///
/// # Invariants
///
/// - `has_key` reports both symmetric keys and key pairs
/// - private keys never leave the vault; `unwrap` runs inside it
/// - generating under an existing alias replaces the previous key
/// - implementations must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::SoftwareVault`] - Process-local vault with optional file persistence
pub trait KeyVault: Send + Sync {
    /// The trust boundary this vault enforces.
    fn protection_level(&self) -> ProtectionLevel;

    /// Returns true if any key is stored under `alias`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault cannot be accessed.
    fn has_key(&self, alias: &str) -> VaultResult<bool>;

    /// Retrieves the symmetric key stored under `alias`.
    ///
    /// Returns `Ok(None)` if no symmetric key exists under that alias.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault cannot be accessed.
    fn get_symmetric_key(&self, alias: &str) -> VaultResult<Option<SymmetricKey>>;

    /// Generates a symmetric key of `size_bits` inside the vault.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::UnsupportedSpec`](crate::VaultError::UnsupportedSpec)
    /// if the vault rejects the request, or another error if the vault
    /// cannot be accessed.
    fn generate_symmetric_key(&self, alias: &str, size_bits: u32) -> VaultResult<SymmetricKey>;

    /// Generates an asymmetric key pair inside the vault.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::UnsupportedSpec`](crate::VaultError::UnsupportedSpec)
    /// if the vault rejects the spec, or another error if the vault
    /// cannot be accessed.
    fn generate_key_pair(&self, alias: &str, spec: &KeyPairSpec) -> VaultResult<KeyPairHandle>;

    /// Returns a handle to the private key stored under `alias`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault cannot be accessed.
    fn private_key(&self, alias: &str) -> VaultResult<Option<PrivateKeyHandle>>;

    /// Wraps `key` for the holder of the private half of `public`.
    ///
    /// # Errors
    ///
    /// Returns an error if wrapping fails.
    fn wrap(&self, public: &PublicKeyHandle, key: &SymmetricKey) -> VaultResult<Vec<u8>>;

    /// Recovers a symmetric key previously produced by [`wrap`](Self::wrap).
    ///
    /// # Errors
    ///
    /// Returns an error if the private key is missing or expired, or if the
    /// wrapped bytes do not authenticate.
    fn unwrap(&self, private: &PrivateKeyHandle, wrapped: &[u8]) -> VaultResult<SymmetricKey>;

    /// Deletes whatever key is stored under `alias`.
    ///
    /// Returns true if a key was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault cannot be accessed.
    fn delete_key(&self, alias: &str) -> VaultResult<bool>;
}
