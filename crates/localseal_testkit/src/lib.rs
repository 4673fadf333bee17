//! # LocalSeal Testkit
//!
//! Test utilities for LocalSeal.
//!
//! This crate provides:
//! - Simulated hosts whose vault and settings outlive individual managers
//! - Instrumented vault and settings doubles
//! - Property-based test generators using proptest
//! - Cross-crate integration test helpers
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust
//! use localseal_testkit::prelude::*;
//!
//! let host = TestHost::new();
//! let sealed = host.codec(LEGACY_LEVEL).encrypt_to_vec(b"data").unwrap();
//! // Same state, upgraded platform: the legacy key is migrated.
//! assert_eq!(host.codec(MODERN_LEVEL).decrypt_slice(&sealed).unwrap(), b"data");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod doubles;
pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::doubles::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::stress::*;
}

pub use doubles::*;
pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use stress::*;
