//! Wraps byte streams with the protection key.

use crate::error::{CoreError, CoreResult};
use crate::protection::ProtectionKeyManager;
use crate::random::RandomSource;
use crate::tier::CapabilityTier;
use std::io::{Read, Write};
use std::sync::Arc;

use super::cipher::GcmCipher;
use super::header::{read_header, write_header};
use super::reader::{DecryptReader, DecryptingStream};
use super::writer::{EncryptWriter, EncryptingStream};
use super::IV_SIZE;

/// Encrypts and decrypts streams under the resolved protection key.
///
/// On hosts without local encryption support both directions pass the
/// stream through untouched, with no header.
#[derive(Debug, Clone)]
pub struct StreamCipherCodec {
    keys: Arc<ProtectionKeyManager>,
    random: Arc<RandomSource>,
}

impl StreamCipherCodec {
    /// Creates a codec.
    #[must_use]
    pub fn new(keys: Arc<ProtectionKeyManager>, random: Arc<RandomSource>) -> Self {
        Self { keys, random }
    }

    /// The key manager backing this codec.
    #[must_use]
    pub fn keys(&self) -> &Arc<ProtectionKeyManager> {
        &self.keys
    }

    /// Wraps `out` so that everything written to it is encrypted.
    ///
    /// The header is written to `out` before this returns. Call
    /// [`EncryptingStream::finish`] to write the ciphertext and tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be resolved, the IV has the wrong
    /// length, or writing the header fails.
    pub fn wrap_encrypt<W: Write>(&self, mut out: W) -> CoreResult<EncryptingStream<W>> {
        if !self.keys.host_tier().is_supported() {
            tracing::debug!("Local encryption unsupported, passing stream through");
            return Ok(EncryptingStream::Passthrough(out));
        }

        let key = self.keys.resolve()?;
        let cipher = GcmCipher::new(key.key())?;
        let iv = match key.tier() {
            CapabilityTier::ModernDirect => cipher.generate_iv(),
            CapabilityTier::LegacyWrapped | CapabilityTier::Unsupported => {
                self.random.iv().to_vec()
            }
        };
        let iv: [u8; IV_SIZE] = iv.as_slice().try_into().map_err(|_| {
            tracing::error!(len = iv.len(), "Invalid IV length");
            CoreError::InvalidIvLength {
                expected: IV_SIZE,
                actual: iv.len(),
            }
        })?;

        write_header(&mut out, &iv)?;
        Ok(EncryptingStream::Sealed(EncryptWriter::new(out, cipher, iv)))
    }

    /// Reads the header from `input` and wraps the rest for decryption.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidIvLength`] or [`CoreError::TruncatedHeader`]
    /// if the header is corrupt. Header bytes have been consumed by then and
    /// `input` must not be re-read as plaintext. Key resolution errors are
    /// returned as-is.
    pub fn wrap_decrypt<R: Read>(&self, mut input: R) -> CoreResult<DecryptingStream<R>> {
        if !self.keys.host_tier().is_supported() {
            tracing::debug!("Local encryption unsupported, passing stream through");
            return Ok(DecryptingStream::Passthrough(input));
        }

        let iv = read_header(&mut input)?;
        let key = self.keys.resolve()?;
        let cipher = GcmCipher::new(key.key())?;
        let params = key.tier().cipher_params(iv);
        Ok(DecryptingStream::Sealed(DecryptReader::new(
            input, cipher, params,
        )))
    }

    /// Encrypts `plaintext` into a new buffer.
    ///
    /// # Errors
    ///
    /// See [`wrap_encrypt`](Self::wrap_encrypt).
    pub fn encrypt_to_vec(&self, plaintext: &[u8]) -> CoreResult<Vec<u8>> {
        let mut stream = self.wrap_encrypt(Vec::with_capacity(plaintext.len() + 32))?;
        stream.write_all(plaintext)?;
        Ok(stream.finish()?)
    }

    /// Decrypts a complete encrypted buffer.
    ///
    /// # Errors
    ///
    /// See [`wrap_decrypt`](Self::wrap_decrypt). Authentication failure is
    /// returned as [`CoreError::Io`] with kind `InvalidData`.
    pub fn decrypt_slice(&self, sealed: &[u8]) -> CoreResult<Vec<u8>> {
        let mut stream = self.wrap_decrypt(sealed)?;
        let mut plaintext = Vec::new();
        stream.read_to_end(&mut plaintext)?;
        Ok(plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::protection::KeySource;
    use crate::stream::TAG_SIZE;
    use crate::tier::HostProfile;
    use localseal_vault::{InMemorySettings, SoftwareVault};
    use std::io::{self, Cursor};

    fn codec(level: u32) -> StreamCipherCodec {
        let random = Arc::new(RandomSource::new());
        let keys = ProtectionKeyManager::new(
            Arc::new(SoftwareVault::in_memory()),
            Arc::new(InMemorySettings::new()),
            HostProfile::new(level),
            Config::default(),
            Arc::clone(&random),
        )
        .unwrap();
        StreamCipherCodec::new(Arc::new(keys), random)
    }

    #[test]
    fn five_byte_payload_is_34_bytes() {
        let codec = codec(23);
        let payload = [0x01, 0x02, 0x03, 0x04, 0x05];

        let sealed = codec.encrypt_to_vec(&payload).unwrap();
        assert_eq!(sealed.len(), 34);
        assert_eq!(sealed[0], 0x0C);
        assert_eq!(sealed.len(), 1 + IV_SIZE + payload.len() + TAG_SIZE);
        assert_eq!(
            codec.keys().cached().unwrap().source(),
            KeySource::GeneratedModern
        );

        assert_eq!(codec.decrypt_slice(&sealed).unwrap(), payload);
    }

    #[test]
    fn legacy_roundtrip() {
        let codec = codec(20);
        let sealed = codec.encrypt_to_vec(b"legacy tier payload").unwrap();
        assert_eq!(sealed[0], 12);
        assert_eq!(codec.decrypt_slice(&sealed).unwrap(), b"legacy tier payload");
    }

    #[test]
    fn each_stream_gets_a_fresh_iv() {
        let codec = codec(23);
        let a = codec.encrypt_to_vec(b"same").unwrap();
        let b = codec.encrypt_to_vec(b"same").unwrap();
        assert_ne!(a[1..1 + IV_SIZE], b[1..1 + IV_SIZE]);
        assert_ne!(a, b);
    }

    #[test]
    fn unsupported_host_passes_through() {
        let codec = codec(18);
        let stream = codec.wrap_encrypt(Vec::new()).unwrap();
        assert!(stream.is_passthrough());

        assert_eq!(codec.encrypt_to_vec(b"plain").unwrap(), b"plain");
        assert_eq!(codec.decrypt_slice(b"plain").unwrap(), b"plain");
        assert!(codec.keys().cached().is_none());
    }

    #[test]
    fn bad_length_byte_consumes_one_byte() {
        let codec = codec(23);
        let mut input = Cursor::new(vec![0x10u8, 0xAA, 0xBB, 0xCC]);

        let err = codec.wrap_decrypt(&mut input).unwrap_err();
        assert!(err.is_corrupt_header());
        assert!(matches!(
            err,
            CoreError::InvalidIvLength {
                expected: 12,
                actual: 16
            }
        ));
        assert_eq!(input.position(), 1);
        // The header is rejected before any key is resolved.
        assert!(codec.keys().cached().is_none());
    }

    #[test]
    fn truncated_iv_is_corrupt_header() {
        let codec = codec(23);
        let err = codec.decrypt_slice(&[12, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, CoreError::TruncatedHeader));
    }

    #[test]
    fn tampered_ciphertext_is_invalid_data() {
        let codec = codec(23);
        let mut sealed = codec.encrypt_to_vec(b"authenticated").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x80;

        match codec.decrypt_slice(&sealed) {
            Err(CoreError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::InvalidData),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn streaming_write_and_read() {
        let codec = codec(21);
        let mut stream = codec.wrap_encrypt(Vec::new()).unwrap();
        for chunk in [&b"part one, "[..], &b"part two, "[..], &b"part three"[..]] {
            stream.write_all(chunk).unwrap();
        }
        let sealed = stream.finish().unwrap();

        let mut reader = codec.wrap_decrypt(sealed.as_slice()).unwrap();
        assert!(!reader.is_passthrough());
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "part one, part two, part three");
    }

    #[test]
    fn empty_payload_roundtrip() {
        let codec = codec(23);
        let sealed = codec.encrypt_to_vec(b"").unwrap();
        assert_eq!(sealed.len(), 1 + IV_SIZE + TAG_SIZE);
        assert!(codec.decrypt_slice(&sealed).unwrap().is_empty());
    }

    struct BrokenSource;

    impl Read for BrokenSource {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "source failed"))
        }
    }

    fn copy_sealed<R: Read>(
        codec: &StreamCipherCodec,
        mut source: R,
        out: &mut Vec<u8>,
    ) -> CoreResult<()> {
        let mut stream = codec.wrap_encrypt(out)?;
        io::copy(&mut source, &mut stream)?;
        stream.finish()?;
        Ok(())
    }

    #[test]
    fn abandoned_write_does_not_authenticate() {
        let codec = codec(23);
        let mut out = Vec::new();
        let source = (&b"first half of the record|"[..]).chain(BrokenSource);

        assert!(copy_sealed(&codec, source, &mut out).is_err());
        assert_eq!(out.len(), 1 + IV_SIZE);
        match codec.decrypt_slice(&out) {
            Err(CoreError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::InvalidData),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
