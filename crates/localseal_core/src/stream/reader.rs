//! Decrypting stream adapter.

use std::io::{self, Read};
use zeroize::Zeroizing;

use super::cipher::{CipherParams, GcmCipher};

/// Decrypts the ciphertext remaining in the wrapped reader.
///
/// The header has already been consumed when this is constructed. On the
/// first read the rest of the stream is read and authenticated in one step,
/// so no unauthenticated plaintext is ever returned. Authentication failure
/// surfaces as [`io::ErrorKind::InvalidData`].
///
/// A failed first read is final: the ciphertext consumed so far is gone, so
/// later reads repeat the original error instead of retrying.
pub struct DecryptReader<R: Read> {
    inner: R,
    cipher: GcmCipher,
    params: CipherParams,
    plaintext: Option<Zeroizing<Vec<u8>>>,
    position: usize,
    failure: Option<(io::ErrorKind, String)>,
}

impl<R: Read> DecryptReader<R> {
    pub(crate) fn new(inner: R, cipher: GcmCipher, params: CipherParams) -> Self {
        Self {
            inner,
            cipher,
            params,
            plaintext: None,
            position: 0,
            failure: None,
        }
    }

    /// The cipher parameters built from the header and the key's tier.
    #[must_use]
    pub fn params(&self) -> &CipherParams {
        &self.params
    }

    /// Returns the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn fill(&mut self) -> io::Result<&[u8]> {
        if let Some((kind, message)) = &self.failure {
            return Err(io::Error::new(*kind, message.clone()));
        }
        if self.plaintext.is_none() {
            match self.open_remaining() {
                Ok(opened) => self.plaintext = Some(opened),
                Err(e) => {
                    self.failure = Some((e.kind(), e.to_string()));
                    return Err(e);
                }
            }
        }

        Ok(match &self.plaintext {
            Some(plaintext) => &plaintext[self.position..],
            None => &[],
        })
    }

    fn open_remaining(&mut self) -> io::Result<Zeroizing<Vec<u8>>> {
        let mut sealed = Vec::new();
        self.inner.read_to_end(&mut sealed)?;
        self.cipher
            .open(&self.params, &sealed)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl<R: Read> Read for DecryptReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill()?;
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.position += n;
        Ok(n)
    }
}

impl<R: Read> std::fmt::Debug for DecryptReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptReader")
            .field("cipher", &self.cipher)
            .field("decrypted", &self.plaintext.is_some())
            .field("failed", &self.failure.is_some())
            .field("position", &self.position)
            .finish()
    }
}

/// Result of wrapping a reader: either decrypting or, on hosts without
/// local encryption support, the original reader untouched.
#[derive(Debug)]
pub enum DecryptingStream<R: Read> {
    /// No decryption; bytes are returned as-is.
    Passthrough(R),
    /// Bytes are decrypted before being returned.
    Sealed(DecryptReader<R>),
}

impl<R: Read> DecryptingStream<R> {
    /// Returns true if no decryption is applied.
    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Passthrough(_))
    }
}

impl<R: Read> Read for DecryptingStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Passthrough(inner) => inner.read(buf),
            Self::Sealed(reader) => reader.read(buf),
        }
    }
}
