//! Encrypting stream adapter.

use std::io::{self, Write};
use zeroize::Zeroizing;

use super::cipher::GcmCipher;
use super::IV_SIZE;

/// Encrypts everything written to it and forwards the ciphertext to the
/// wrapped writer.
///
/// The stream header has already been written when this is constructed.
/// Plaintext is buffered (and zeroized when dropped) so the authentication
/// tag can be computed over the whole payload; [`finish`](Self::finish)
/// writes `ciphertext || tag` and returns the inner writer.
///
/// Only `finish` writes ciphertext. Dropping an unfinished writer abandons
/// the stream: the buffered plaintext is discarded and nothing follows the
/// header, so the output never authenticates.
pub struct EncryptWriter<W: Write> {
    inner: Option<W>,
    cipher: GcmCipher,
    iv: [u8; IV_SIZE],
    buffer: Zeroizing<Vec<u8>>,
    finished: bool,
}

impl<W: Write> EncryptWriter<W> {
    pub(crate) fn new(inner: W, cipher: GcmCipher, iv: [u8; IV_SIZE]) -> Self {
        Self {
            inner: Some(inner),
            cipher,
            iv,
            buffer: Zeroizing::new(Vec::new()),
            finished: false,
        }
    }

    /// The IV written in the stream header.
    #[must_use]
    pub fn iv(&self) -> &[u8; IV_SIZE] {
        &self.iv
    }

    /// Number of plaintext bytes buffered so far.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Seals the buffered plaintext, writes it, and returns the inner writer.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption or the final write fails.
    pub fn finish(mut self) -> io::Result<W> {
        self.try_finish()?;
        self.inner
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "writer already finished"))
    }

    fn try_finish(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        // One attempt only: a failed seal must not be retried under the same IV.
        self.finished = true;

        let inner = self
            .inner
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "writer already finished"))?;
        let sealed = self
            .cipher
            .seal(&self.iv, &self.buffer)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        self.buffer.clear();

        inner.write_all(&sealed)?;
        inner.flush()
    }
}

impl<W: Write> Write for EncryptWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.finished {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "write after encrypted stream was finished",
            ));
        }
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.as_mut() {
            Some(inner) => inner.flush(),
            None => Ok(()),
        }
    }
}

impl<W: Write> Drop for EncryptWriter<W> {
    fn drop(&mut self) {
        if !self.finished {
            self.finished = true;
            tracing::warn!(
                buffered = self.buffer.len(),
                "Encrypted stream dropped without finish; discarding buffered plaintext"
            );
            self.buffer.clear();
        }
    }
}

impl<W: Write> std::fmt::Debug for EncryptWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptWriter")
            .field("cipher", &self.cipher)
            .field("buffered", &self.buffer.len())
            .field("finished", &self.finished)
            .finish()
    }
}

/// Result of wrapping a writer: either sealed or, on hosts without local
/// encryption support, the original writer untouched.
#[derive(Debug)]
pub enum EncryptingStream<W: Write> {
    /// No encryption; bytes are forwarded as-is.
    Passthrough(W),
    /// Bytes are encrypted before reaching the inner writer.
    Sealed(EncryptWriter<W>),
}

impl<W: Write> EncryptingStream<W> {
    /// Returns true if no encryption is applied.
    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Passthrough(_))
    }

    /// Completes the stream and returns the inner writer.
    ///
    /// # Errors
    ///
    /// Returns an error if sealing or flushing fails.
    pub fn finish(self) -> io::Result<W> {
        match self {
            Self::Passthrough(mut inner) => {
                inner.flush()?;
                Ok(inner)
            }
            Self::Sealed(writer) => writer.finish(),
        }
    }
}

impl<W: Write> Write for EncryptingStream<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Passthrough(inner) => inner.write(buf),
            Self::Sealed(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Passthrough(inner) => inner.flush(),
            Self::Sealed(writer) => writer.flush(),
        }
    }
}
