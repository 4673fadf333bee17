//! AES-GCM cipher selection and parameters.

use crate::error::{CoreError, CoreResult};
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};
use localseal_vault::{SymmetricKey, KEY_SIZE_128, KEY_SIZE_256};
use zeroize::Zeroizing;

use super::{IV_SIZE, TAG_SIZE};

/// Decrypt-side parameters for the stream cipher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherParams {
    /// Authenticated-mode parameters with an explicit tag length.
    Gcm {
        /// Authentication tag length in bits.
        tag_bits: u32,
        /// The IV read from the stream header.
        iv: [u8; IV_SIZE],
    },
    /// A bare IV; the tag length is the mode default.
    Iv([u8; IV_SIZE]),
}

impl CipherParams {
    /// The IV carried by these parameters.
    #[must_use]
    pub fn iv(&self) -> &[u8; IV_SIZE] {
        match self {
            Self::Gcm { iv, .. } | Self::Iv(iv) => iv,
        }
    }

    /// The authentication tag length in bits.
    #[must_use]
    pub fn tag_bits(&self) -> u32 {
        match self {
            Self::Gcm { tag_bits, .. } => *tag_bits,
            Self::Iv(_) => (TAG_SIZE * 8) as u32,
        }
    }
}

/// AES-GCM keyed with a protection key; the variant follows the key size.
pub(crate) enum GcmCipher {
    Aes128(Aes128Gcm),
    Aes256(Aes256Gcm),
}

impl GcmCipher {
    pub(crate) fn new(key: &SymmetricKey) -> CoreResult<Self> {
        let bytes = key.as_bytes();
        let invalid = || CoreError::InvalidKeySize {
            expected: "16 or 32",
            actual: bytes.len(),
        };
        match bytes.len() {
            KEY_SIZE_128 => Aes128Gcm::new_from_slice(bytes)
                .map(Self::Aes128)
                .map_err(|_| invalid()),
            KEY_SIZE_256 => Aes256Gcm::new_from_slice(bytes)
                .map(Self::Aes256)
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }

    /// Lets the cipher pick a fresh random IV.
    pub(crate) fn generate_iv(&self) -> Vec<u8> {
        match self {
            Self::Aes128(_) => Aes128Gcm::generate_nonce(&mut OsRng).to_vec(),
            Self::Aes256(_) => Aes256Gcm::generate_nonce(&mut OsRng).to_vec(),
        }
    }

    /// Encrypts `plaintext`, returning `ciphertext || tag`.
    pub(crate) fn seal(&self, iv: &[u8; IV_SIZE], plaintext: &[u8]) -> CoreResult<Vec<u8>> {
        let nonce = Nonce::from_slice(iv);
        let sealed = match self {
            Self::Aes128(cipher) => cipher.encrypt(nonce, plaintext),
            Self::Aes256(cipher) => cipher.encrypt(nonce, plaintext),
        };
        sealed.map_err(|_| CoreError::encryption_failed("encryption error"))
    }

    /// Authenticates and decrypts `ciphertext || tag`.
    pub(crate) fn open(
        &self,
        params: &CipherParams,
        ciphertext: &[u8],
    ) -> CoreResult<Zeroizing<Vec<u8>>> {
        if params.tag_bits() as usize != TAG_SIZE * 8 {
            return Err(CoreError::invalid_config(format!(
                "unsupported tag length {} bits",
                params.tag_bits()
            )));
        }
        if ciphertext.len() < TAG_SIZE {
            return Err(CoreError::decryption_failed("ciphertext too short"));
        }

        let nonce = Nonce::from_slice(params.iv());
        let opened = match self {
            Self::Aes128(cipher) => cipher.decrypt(nonce, ciphertext),
            Self::Aes256(cipher) => cipher.decrypt(nonce, ciphertext),
        };
        opened
            .map(Zeroizing::new)
            .map_err(|_| CoreError::decryption_failed("authentication failed"))
    }
}

impl std::fmt::Debug for GcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Aes128(_) => "Aes128Gcm",
            Self::Aes256(_) => "Aes256Gcm",
        };
        f.debug_struct("GcmCipher").field("cipher", &name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(len: usize, fill: u8) -> SymmetricKey {
        SymmetricKey::from_bytes(&vec![fill; len]).unwrap()
    }

    #[test]
    fn seal_open_roundtrip_both_sizes() {
        for len in [KEY_SIZE_128, KEY_SIZE_256] {
            let cipher = GcmCipher::new(&key(len, 0x42)).unwrap();
            let iv = [9u8; IV_SIZE];
            let sealed = cipher.seal(&iv, b"Hello, LocalSeal!").unwrap();
            assert_eq!(sealed.len(), 17 + TAG_SIZE);

            let opened = cipher.open(&CipherParams::Iv(iv), &sealed).unwrap();
            assert_eq!(opened.as_slice(), b"Hello, LocalSeal!");
        }
    }

    #[test]
    fn gcm_and_iv_params_are_interchangeable() {
        let cipher = GcmCipher::new(&key(16, 1)).unwrap();
        let iv = [5u8; IV_SIZE];
        let sealed = cipher.seal(&iv, b"data").unwrap();

        let gcm = CipherParams::Gcm { tag_bits: 128, iv };
        assert_eq!(cipher.open(&gcm, &sealed).unwrap().as_slice(), b"data");
        assert_eq!(
            cipher.open(&CipherParams::Iv(iv), &sealed).unwrap().as_slice(),
            b"data"
        );
    }

    #[test]
    fn wrong_tag_length_rejected() {
        let cipher = GcmCipher::new(&key(16, 1)).unwrap();
        let params = CipherParams::Gcm {
            tag_bits: 96,
            iv: [0u8; IV_SIZE],
        };
        assert!(matches!(
            cipher.open(&params, &[0u8; 32]),
            Err(CoreError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let cipher = GcmCipher::new(&key(16, 7)).unwrap();
        let iv = [1u8; IV_SIZE];
        let mut sealed = cipher.seal(&iv, b"secret").unwrap();
        sealed[0] ^= 0xFF;
        assert!(cipher.open(&CipherParams::Iv(iv), &sealed).is_err());
    }

    #[test]
    fn wrong_key_fails() {
        let iv = [1u8; IV_SIZE];
        let sealed = GcmCipher::new(&key(16, 1)).unwrap().seal(&iv, b"x").unwrap();
        let other = GcmCipher::new(&key(16, 2)).unwrap();
        assert!(other.open(&CipherParams::Iv(iv), &sealed).is_err());
    }

    #[test]
    fn generated_ivs_have_gcm_length() {
        let cipher = GcmCipher::new(&key(32, 3)).unwrap();
        let a = cipher.generate_iv();
        let b = cipher.generate_iv();
        assert_eq!(a.len(), IV_SIZE);
        assert_ne!(a, b);
    }
}
