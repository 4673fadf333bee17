//! # LocalSeal Core
//!
//! Envelope encryption for local data streams.
//!
//! This crate provides:
//! - A shared random source for IVs and wrapped key material
//! - The capability classifier mapping platform levels to protection tiers
//! - The protection key manager (lookup, legacy migration, generation, caching)
//! - The stream cipher codec (IV header plus AES-GCM)
//!
//! ## Example
//!
//! ```rust
//! use localseal_core::{Config, HostProfile, ProtectionKeyManager, RandomSource, StreamCipherCodec};
//! use localseal_vault::{InMemorySettings, SoftwareVault};
//! use std::sync::Arc;
//!
//! let random = Arc::new(RandomSource::new());
//! let keys = ProtectionKeyManager::new(
//!     Arc::new(SoftwareVault::in_memory()),
//!     Arc::new(InMemorySettings::new()),
//!     HostProfile::new(23),
//!     Config::default(),
//!     Arc::clone(&random),
//! )?;
//! let codec = StreamCipherCodec::new(Arc::new(keys), random);
//!
//! let sealed = codec.encrypt_to_vec(b"hello")?;
//! assert_eq!(sealed.len(), 1 + 12 + 5 + 16);
//! assert_eq!(codec.decrypt_slice(&sealed)?, b"hello");
//! # Ok::<(), localseal_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod protection;
mod random;
mod stream;
mod tier;

pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use protection::{KeySource, KeyStatus, ProtectionKey, ProtectionKeyManager};
pub use random::RandomSource;
pub use stream::{
    read_header, write_header, CipherParams, DecryptReader, DecryptingStream, EncryptWriter,
    EncryptingStream, StreamCipherCodec, IV_SIZE, TAG_SIZE,
};
pub use tier::{CapabilityTier, HostProfile, TierClassifier, PLATFORM_LEVEL_ENV};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
