//! Stream header: `iv_len (1 byte) || iv (iv_len bytes)`.

use crate::error::{CoreError, CoreResult};
use std::io::{self, Read, Write};

use super::IV_SIZE;

/// Writes the header for `iv` to `out`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidIvLength`] if `iv` is not [`IV_SIZE`] bytes,
/// before anything is written.
pub fn write_header<W: Write>(out: &mut W, iv: &[u8]) -> CoreResult<()> {
    if iv.len() != IV_SIZE {
        tracing::error!(len = iv.len(), "Invalid IV length");
        return Err(CoreError::InvalidIvLength {
            expected: IV_SIZE,
            actual: iv.len(),
        });
    }

    let mut header = [0u8; 1 + IV_SIZE];
    header[0] = IV_SIZE as u8;
    header[1..].copy_from_slice(iv);
    out.write_all(&header)?;
    Ok(())
}

/// Reads a header from `input` and returns the IV.
///
/// Exactly one byte is consumed when the length byte is wrong, and
/// `1 + IV_SIZE` bytes on success.
///
/// # Errors
///
/// - [`CoreError::TruncatedHeader`] if the stream ends inside the header
/// - [`CoreError::InvalidIvLength`] if the length byte is not [`IV_SIZE`]
pub fn read_header<R: Read>(input: &mut R) -> CoreResult<[u8; IV_SIZE]> {
    let mut len = [0u8; 1];
    read_exact_or_truncated(input, &mut len)?;

    if usize::from(len[0]) != IV_SIZE {
        tracing::error!(len = len[0], "Invalid IV length");
        return Err(CoreError::InvalidIvLength {
            expected: IV_SIZE,
            actual: usize::from(len[0]),
        });
    }

    let mut iv = [0u8; IV_SIZE];
    read_exact_or_truncated(input, &mut iv)?;
    Ok(iv)
}

fn read_exact_or_truncated<R: Read>(input: &mut R, buf: &mut [u8]) -> CoreResult<()> {
    input.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => CoreError::TruncatedHeader,
        _ => CoreError::Io(e),
    })
}
