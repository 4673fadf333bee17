//! # LocalSeal Vault
//!
//! Key vault and settings store abstractions for LocalSeal.
//!
//! This crate provides the lowest-level collaborators of the protection key
//! manager. Neither abstraction knows anything about stream encryption or
//! capability tiers.
//!
//! ## Design Principles
//!
//! - A [`KeyVault`] generates, stores and uses keys by alias; private keys
//!   never leave it
//! - A [`SettingsStore`] is a small durable key-value store
//! - Both must be `Send + Sync` for concurrent access
//!
//! ## Available Implementations
//!
//! - [`SoftwareVault`] - In-memory vault, optionally persisted to JSON
//! - [`InMemorySettings`] - For testing and ephemeral state
//! - [`FileSettings`] - JSON file on disk
//!
//! ## Example
//!
//! ```rust
//! use localseal_vault::{KeyPairSpec, KeyVault, SoftwareVault, DEFAULT_KEY_PAIR_VALIDITY};
//!
//! let vault = SoftwareVault::in_memory();
//! let pair = vault
//!     .generate_key_pair("wrap", &KeyPairSpec::valid_for(256, DEFAULT_KEY_PAIR_VALIDITY))
//!     .unwrap();
//! let key = vault.generate_symmetric_key("content", 128).unwrap();
//! let wrapped = vault.wrap(&pair.public, &key).unwrap();
//! assert_eq!(vault.unwrap(&pair.private, &wrapped).unwrap(), key);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod keys;
mod memory;
mod settings;
mod software;
mod vault;

pub use error::{SettingsError, SettingsResult, VaultError, VaultResult};
pub use file::FileSettings;
pub use keys::{
    KeyPairHandle, KeyPairSpec, PrivateKeyHandle, ProtectionLevel, PublicKeyHandle, SymmetricKey,
    DEFAULT_KEY_PAIR_VALIDITY, KEY_SIZE_128, KEY_SIZE_256, PUBLIC_KEY_SIZE,
};
pub use memory::InMemorySettings;
pub use settings::{SettingValue, SettingsStore};
pub use software::{SoftwareVault, KEY_PAIR_SIZE_BITS, WRAP_NONCE_SIZE, WRAP_TAG_SIZE};
pub use vault::KeyVault;
