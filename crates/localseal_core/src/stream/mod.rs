//! Stream encryption.
//!
//! Every encrypted stream has the layout
//!
//! ```text
//! byte 0       IV length (always 12)
//! bytes 1..12  IV
//! bytes 13..   AES-GCM ciphertext with the 16-byte tag appended
//! ```
//!
//! There is no version byte. The cipher parameters are chosen from the tier
//! recorded with the resolved key, not from anything in the header.

mod cipher;
mod codec;
mod header;
mod reader;
mod writer;

pub use cipher::CipherParams;
pub use codec::StreamCipherCodec;
pub use header::{read_header, write_header};
pub use reader::{DecryptReader, DecryptingStream};
pub use writer::{EncryptWriter, EncryptingStream};

/// IV length for AES-GCM in bytes.
pub const IV_SIZE: usize = 12;

/// Authentication tag length in bytes.
pub const TAG_SIZE: usize = 16;
