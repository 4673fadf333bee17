//! Instrumented vault and settings doubles.
//!
//! [`CountingVault`] records every call made to the vault it wraps, so
//! tests can assert how many generation or migration sequences actually
//! ran. [`FailingSettings`] rejects writes on demand.

use localseal_vault::{
    InMemorySettings, KeyPairHandle, KeyPairSpec, KeyVault, PrivateKeyHandle, ProtectionLevel,
    PublicKeyHandle, SettingValue, SettingsError, SettingsResult, SettingsStore, SymmetricKey,
    VaultResult,
};
use parking_lot::Mutex;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

/// A vault operation, as recorded by [`CountingVault`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VaultCall {
    /// `has_key`
    HasKey,
    /// `get_symmetric_key`
    GetSymmetricKey,
    /// `generate_symmetric_key`
    GenerateSymmetricKey,
    /// `generate_key_pair`
    GenerateKeyPair,
    /// `private_key`
    PrivateKey,
    /// `wrap`
    Wrap,
    /// `unwrap`
    Unwrap,
    /// `delete_key`
    DeleteKey,
}

impl VaultCall {
    /// Returns true for calls that create key material.
    pub fn is_generation(self) -> bool {
        matches!(self, Self::GenerateSymmetricKey | Self::GenerateKeyPair)
    }
}

/// Wraps a vault and records the calls made to it.
#[derive(Debug)]
pub struct CountingVault<V> {
    inner: V,
    calls: Mutex<Vec<VaultCall>>,
}

impl<V: KeyVault> CountingVault<V> {
    /// Wraps `inner`.
    pub fn new(inner: V) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// The wrapped vault.
    pub fn inner(&self) -> &V {
        &self.inner
    }

    /// Every recorded call, in order.
    pub fn calls(&self) -> Vec<VaultCall> {
        self.calls.lock().clone()
    }

    /// Number of times `call` was made.
    pub fn count(&self, call: VaultCall) -> usize {
        self.calls.lock().iter().filter(|c| **c == call).count()
    }

    /// Number of calls that created key material.
    pub fn generations(&self) -> usize {
        self.calls.lock().iter().filter(|c| c.is_generation()).count()
    }

    /// Forgets all recorded calls.
    pub fn reset(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: VaultCall) {
        self.calls.lock().push(call);
    }
}

impl<V: KeyVault> KeyVault for CountingVault<V> {
    fn protection_level(&self) -> ProtectionLevel {
        self.inner.protection_level()
    }

    fn has_key(&self, alias: &str) -> VaultResult<bool> {
        self.record(VaultCall::HasKey);
        self.inner.has_key(alias)
    }

    fn get_symmetric_key(&self, alias: &str) -> VaultResult<Option<SymmetricKey>> {
        self.record(VaultCall::GetSymmetricKey);
        self.inner.get_symmetric_key(alias)
    }

    fn generate_symmetric_key(&self, alias: &str, size_bits: u32) -> VaultResult<SymmetricKey> {
        self.record(VaultCall::GenerateSymmetricKey);
        self.inner.generate_symmetric_key(alias, size_bits)
    }

    fn generate_key_pair(&self, alias: &str, spec: &KeyPairSpec) -> VaultResult<KeyPairHandle> {
        self.record(VaultCall::GenerateKeyPair);
        self.inner.generate_key_pair(alias, spec)
    }

    fn private_key(&self, alias: &str) -> VaultResult<Option<PrivateKeyHandle>> {
        self.record(VaultCall::PrivateKey);
        self.inner.private_key(alias)
    }

    fn wrap(&self, public: &PublicKeyHandle, key: &SymmetricKey) -> VaultResult<Vec<u8>> {
        self.record(VaultCall::Wrap);
        self.inner.wrap(public, key)
    }

    fn unwrap(&self, private: &PrivateKeyHandle, wrapped: &[u8]) -> VaultResult<SymmetricKey> {
        self.record(VaultCall::Unwrap);
        self.inner.unwrap(private, wrapped)
    }

    fn delete_key(&self, alias: &str) -> VaultResult<bool> {
        self.record(VaultCall::DeleteKey);
        self.inner.delete_key(alias)
    }
}

/// An in-memory settings store whose writes can be made to fail.
#[derive(Debug, Default)]
pub struct FailingSettings {
    inner: InMemorySettings,
    fail_writes: AtomicBool,
}

impl FailingSettings {
    /// Creates a store that accepts writes until told otherwise.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// The backing store.
    pub fn inner(&self) -> &InMemorySettings {
        &self.inner
    }
}

impl SettingsStore for FailingSettings {
    fn get(&self, key: &str) -> SettingsResult<Option<SettingValue>> {
        self.inner.get(key)
    }

    fn put_all(&self, entries: &[(&str, SettingValue)]) -> SettingsResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SettingsError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "settings store is read-only",
            )));
        }
        self.inner.put_all(entries)
    }

    fn remove(&self, key: &str) -> SettingsResult<bool> {
        self.inner.remove(key)
    }
}
