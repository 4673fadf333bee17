//! CLI command implementations.

pub mod decrypt;
pub mod encrypt;
pub mod state;
pub mod status;
