//! Software key vault.
//!
//! A process-local [`KeyVault`] for hosts without a platform keystore, for
//! tests, and for the command-line tool. Keys live in memory and can
//! optionally be persisted to a JSON file so they survive process restarts.
//!
//! ## Key wrapping
//!
//! Key pairs are X25519. Wrapping seals the symmetric key to the recipient
//! public key with an ephemeral X25519 key and XSalsa20-Poly1305:
//! `ephemeral public key (32) || nonce (24) || ciphertext || tag (16)`.

use crate::error::{VaultError, VaultResult};
use crate::keys::{
    KeyPairHandle, KeyPairSpec, PrivateKeyHandle, ProtectionLevel, PublicKeyHandle, SymmetricKey,
    KEY_SIZE_128, KEY_SIZE_256, PUBLIC_KEY_SIZE,
};
use crate::vault::KeyVault;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use crypto_box::aead::Aead;
use crypto_box::{PublicKey, SalsaBox, SecretKey};
use parking_lot::RwLock;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use zeroize::Zeroizing;

/// Size of the XSalsa20 nonce in a wrapped key.
pub const WRAP_NONCE_SIZE: usize = 24;
/// Size of the Poly1305 tag in a wrapped key.
pub const WRAP_TAG_SIZE: usize = 16;
/// The only key pair size this vault accepts (X25519).
pub const KEY_PAIR_SIZE_BITS: u32 = 256;

enum VaultEntry {
    Symmetric(SymmetricKey),
    KeyPair { secret: SecretKey, spec: KeyPairSpec },
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum PersistedEntry {
    Symmetric {
        key: String,
    },
    KeyPair {
        secret: String,
        size_bits: u32,
        not_before: u64,
        not_after: u64,
    },
}

/// A software-only key vault.
///
/// # Thread Safety
///
/// The vault is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use localseal_vault::{KeyVault, SoftwareVault};
///
/// let vault = SoftwareVault::in_memory();
/// let key = vault.generate_symmetric_key("content", 128).unwrap();
/// assert!(vault.has_key("content").unwrap());
/// assert_eq!(vault.get_symmetric_key("content").unwrap(), Some(key));
/// ```
pub struct SoftwareVault {
    entries: RwLock<HashMap<String, VaultEntry>>,
    path: Option<PathBuf>,
    locked: AtomicBool,
}

impl SoftwareVault {
    /// Creates an empty vault that lives only in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            path: None,
            locked: AtomicBool::new(false),
        }
    }

    /// Opens or creates a vault persisted at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: &Path) -> VaultResult<Self> {
        let entries = if path.exists() {
            let raw = fs::read(path)?;
            decode_entries(&raw)?
        } else {
            HashMap::new()
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "Opened software vault");

        Ok(Self {
            entries: RwLock::new(entries),
            path: Some(path.to_path_buf()),
            locked: AtomicBool::new(false),
        })
    }

    /// Returns the persistence path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Locks or unlocks the vault. A locked vault fails every operation
    /// with [`VaultError::Locked`].
    pub fn set_locked(&self, locked: bool) {
        self.locked.store(locked, Ordering::SeqCst);
    }

    /// Returns the number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the vault holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn ensure_unlocked(&self) -> VaultResult<()> {
        if self.locked.load(Ordering::SeqCst) {
            return Err(VaultError::Locked);
        }
        Ok(())
    }

    /// Inserts an entry and persists, restoring the previous entry if the
    /// write fails.
    fn store(&self, alias: &str, entry: VaultEntry) -> VaultResult<()> {
        let mut entries = self.entries.write();
        let previous = entries.insert(alias.to_string(), entry);

        if let Err(err) = self.persist(&entries) {
            match previous {
                Some(previous) => entries.insert(alias.to_string(), previous),
                None => entries.remove(alias),
            };
            return Err(err);
        }
        Ok(())
    }

    fn persist(&self, entries: &HashMap<String, VaultEntry>) -> VaultResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let raw = Zeroizing::new(encode_entries(entries)?);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&raw)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl Default for SoftwareVault {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for SoftwareVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftwareVault")
            .field("keys", &self.entries.read().len())
            .field("path", &self.path)
            .field("locked", &self.locked.load(Ordering::SeqCst))
            .finish()
    }
}

impl KeyVault for SoftwareVault {
    fn protection_level(&self) -> ProtectionLevel {
        ProtectionLevel::Software
    }

    fn has_key(&self, alias: &str) -> VaultResult<bool> {
        self.ensure_unlocked()?;
        Ok(self.entries.read().contains_key(alias))
    }

    fn get_symmetric_key(&self, alias: &str) -> VaultResult<Option<SymmetricKey>> {
        self.ensure_unlocked()?;
        match self.entries.read().get(alias) {
            Some(VaultEntry::Symmetric(key)) => Ok(Some(key.clone())),
            _ => Ok(None),
        }
    }

    fn generate_symmetric_key(&self, alias: &str, size_bits: u32) -> VaultResult<SymmetricKey> {
        self.ensure_unlocked()?;
        if alias.is_empty() {
            return Err(VaultError::unsupported_spec("alias must not be empty"));
        }
        let len = match size_bits {
            128 => KEY_SIZE_128,
            256 => KEY_SIZE_256,
            other => {
                return Err(VaultError::unsupported_spec(format!(
                    "symmetric key size {other} bits"
                )))
            }
        };

        let mut bytes = Zeroizing::new(vec![0u8; len]);
        OsRng.fill_bytes(&mut bytes);
        let key = SymmetricKey::from_bytes(&bytes)?;

        self.store(alias, VaultEntry::Symmetric(key.clone()))?;
        tracing::debug!(alias, size_bits, "Generated symmetric key");
        Ok(key)
    }

    fn generate_key_pair(&self, alias: &str, spec: &KeyPairSpec) -> VaultResult<KeyPairHandle> {
        self.ensure_unlocked()?;
        if alias.is_empty() {
            return Err(VaultError::unsupported_spec("alias must not be empty"));
        }
        if spec.size_bits != KEY_PAIR_SIZE_BITS {
            return Err(VaultError::unsupported_spec(format!(
                "key pair size {} bits (only {KEY_PAIR_SIZE_BITS} supported)",
                spec.size_bits
            )));
        }
        if spec.not_after <= spec.not_before {
            return Err(VaultError::unsupported_spec("empty validity window"));
        }

        let secret = SecretKey::generate(&mut OsRng);
        let public = PublicKeyHandle::new(alias, *secret.public_key().as_bytes());

        self.store(
            alias,
            VaultEntry::KeyPair {
                secret,
                spec: *spec,
            },
        )?;
        tracing::debug!(alias, size_bits = spec.size_bits, "Generated key pair");

        Ok(KeyPairHandle {
            public,
            private: PrivateKeyHandle::new(alias),
        })
    }

    fn private_key(&self, alias: &str) -> VaultResult<Option<PrivateKeyHandle>> {
        self.ensure_unlocked()?;
        match self.entries.read().get(alias) {
            Some(VaultEntry::KeyPair { .. }) => Ok(Some(PrivateKeyHandle::new(alias))),
            _ => Ok(None),
        }
    }

    fn wrap(&self, public: &PublicKeyHandle, key: &SymmetricKey) -> VaultResult<Vec<u8>> {
        self.ensure_unlocked()?;
        let recipient = PublicKey::from(*public.as_bytes());
        let ephemeral = SecretKey::generate(&mut OsRng);
        let salsa_box = SalsaBox::new(&recipient, &ephemeral);
        let mut nonce = [0u8; WRAP_NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        let sealed = salsa_box
            .encrypt(crypto_box::Nonce::from_slice(&nonce), key.as_bytes())
            .map_err(|e| VaultError::Wrap(e.to_string()))?;

        let mut wrapped = Vec::with_capacity(PUBLIC_KEY_SIZE + WRAP_NONCE_SIZE + sealed.len());
        wrapped.extend_from_slice(ephemeral.public_key().as_bytes());
        wrapped.extend_from_slice(&nonce);
        wrapped.extend(sealed);
        Ok(wrapped)
    }

    fn unwrap(&self, private: &PrivateKeyHandle, wrapped: &[u8]) -> VaultResult<SymmetricKey> {
        self.ensure_unlocked()?;
        let entries = self.entries.read();
        let Some(VaultEntry::KeyPair { secret, spec }) = entries.get(private.alias()) else {
            return Err(VaultError::key_not_found(private.alias()));
        };
        if !spec.is_valid_at(SystemTime::now()) {
            return Err(VaultError::KeyExpired {
                alias: private.alias().to_string(),
            });
        }

        if wrapped.len() < PUBLIC_KEY_SIZE + WRAP_NONCE_SIZE + WRAP_TAG_SIZE {
            return Err(VaultError::Unwrap("wrapped key too short".to_string()));
        }
        let (ephemeral, rest) = wrapped.split_at(PUBLIC_KEY_SIZE);
        let (nonce, sealed) = rest.split_at(WRAP_NONCE_SIZE);

        let mut ephemeral_bytes = [0u8; PUBLIC_KEY_SIZE];
        ephemeral_bytes.copy_from_slice(ephemeral);
        let salsa_box = SalsaBox::new(&PublicKey::from(ephemeral_bytes), secret);

        let plain = Zeroizing::new(
            salsa_box
                .decrypt(crypto_box::Nonce::from_slice(nonce), sealed)
                .map_err(|_| {
                    VaultError::Unwrap("wrong key pair or tampered wrapped key".to_string())
                })?,
        );
        SymmetricKey::from_bytes(&plain).map_err(|e| VaultError::Unwrap(e.to_string()))
    }

    fn delete_key(&self, alias: &str) -> VaultResult<bool> {
        self.ensure_unlocked()?;
        let mut entries = self.entries.write();
        let Some(previous) = entries.remove(alias) else {
            return Ok(false);
        };
        if let Err(err) = self.persist(&entries) {
            entries.insert(alias.to_string(), previous);
            return Err(err);
        }
        tracing::debug!(alias, "Deleted key");
        Ok(true)
    }
}

fn to_epoch_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

fn from_epoch_secs(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

fn encode_entries(entries: &HashMap<String, VaultEntry>) -> VaultResult<Vec<u8>> {
    let persisted: HashMap<&str, PersistedEntry> = entries
        .iter()
        .map(|(alias, entry)| {
            let persisted = match entry {
                VaultEntry::Symmetric(key) => PersistedEntry::Symmetric {
                    key: STANDARD.encode(key.as_bytes()),
                },
                VaultEntry::KeyPair { secret, spec } => PersistedEntry::KeyPair {
                    secret: STANDARD.encode(secret.to_bytes()),
                    size_bits: spec.size_bits,
                    not_before: to_epoch_secs(spec.not_before),
                    not_after: to_epoch_secs(spec.not_after),
                },
            };
            (alias.as_str(), persisted)
        })
        .collect();

    serde_json::to_vec_pretty(&persisted).map_err(|e| VaultError::Corrupted(e.to_string()))
}

fn decode_entries(raw: &[u8]) -> VaultResult<HashMap<String, VaultEntry>> {
    let persisted: HashMap<String, PersistedEntry> =
        serde_json::from_slice(raw).map_err(|e| VaultError::Corrupted(e.to_string()))?;

    let mut entries = HashMap::with_capacity(persisted.len());
    for (alias, entry) in persisted {
        let entry = match entry {
            PersistedEntry::Symmetric { key } => {
                let bytes = Zeroizing::new(decode_material(&alias, &key)?);
                let key = SymmetricKey::from_bytes(&bytes)
                    .map_err(|e| VaultError::Corrupted(format!("{alias}: {e}")))?;
                VaultEntry::Symmetric(key)
            }
            PersistedEntry::KeyPair {
                secret,
                size_bits,
                not_before,
                not_after,
            } => {
                let bytes = Zeroizing::new(decode_material(&alias, &secret)?);
                let secret: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
                    VaultError::Corrupted(format!("{alias}: secret key must be 32 bytes"))
                })?;
                VaultEntry::KeyPair {
                    secret: SecretKey::from(secret),
                    spec: KeyPairSpec {
                        size_bits,
                        not_before: from_epoch_secs(not_before),
                        not_after: from_epoch_secs(not_after),
                    },
                }
            }
        };
        entries.insert(alias, entry);
    }
    Ok(entries)
}

fn decode_material(alias: &str, encoded: &str) -> VaultResult<Vec<u8>> {
    STANDARD
        .decode(encoded)
        .map_err(|e| VaultError::Corrupted(format!("{alias}: {e}")))
}
