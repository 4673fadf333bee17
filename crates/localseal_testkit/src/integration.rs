//! Cross-crate integration test helpers.
//!
//! [`IntegrationHarness`] plays the application: it keeps encrypted records
//! the way an app's local store would, and can restart or upgrade the host
//! between writes and reads.

use crate::fixtures::TestHost;
use localseal_core::{CoreResult, StreamCipherCodec};
use std::collections::HashMap;

/// A test harness for integration testing.
pub struct IntegrationHarness {
    host: TestHost,
    level: u32,
    codec: StreamCipherCodec,
    /// Plaintext and sealed bytes per record name.
    records: HashMap<String, (Vec<u8>, Vec<u8>)>,
}

impl IntegrationHarness {
    /// Creates a harness over fresh in-memory state at `level`.
    pub fn new(level: u32) -> Self {
        Self::with_host(TestHost::new(), level)
    }

    /// Creates a harness over existing host state.
    pub fn with_host(host: TestHost, level: u32) -> Self {
        let codec = host.codec(level);
        Self {
            host,
            level,
            codec,
            records: HashMap::new(),
        }
    }

    /// The simulated host.
    pub fn host(&self) -> &TestHost {
        &self.host
    }

    /// The current codec.
    pub fn codec(&self) -> &StreamCipherCodec {
        &self.codec
    }

    /// The current platform level.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Encrypts `data` and stores it under `name`.
    pub fn put(&mut self, name: &str, data: &[u8]) {
        let sealed = self
            .codec
            .encrypt_to_vec(data)
            .expect("Failed to encrypt record");
        self.records
            .insert(name.to_string(), (data.to_vec(), sealed));
    }

    /// The stored sealed bytes of `name`.
    pub fn sealed(&self, name: &str) -> Option<&[u8]> {
        self.records.get(name).map(|(_, sealed)| sealed.as_slice())
    }

    /// Decrypts `name` with the current codec.
    pub fn get(&self, name: &str) -> Option<CoreResult<Vec<u8>>> {
        self.sealed(name)
            .map(|sealed| self.codec.decrypt_slice(sealed))
    }

    /// Decrypts `name` and asserts it matches what was stored.
    pub fn get_and_verify(&self, name: &str) -> Vec<u8> {
        let (expected, sealed) = self
            .records
            .get(name)
            .unwrap_or_else(|| panic!("No record named {name}"));
        let actual = self
            .codec
            .decrypt_slice(sealed)
            .expect("Failed to decrypt record");
        assert_eq!(&actual, expected, "Record mismatch for {name}");
        actual
    }

    /// Decrypts every record and checks it.
    pub fn verify_all(&self) {
        for name in self.records.keys() {
            self.get_and_verify(name);
        }
    }

    /// Simulates a process restart: the cached key is gone, state is kept.
    pub fn restart(&mut self) {
        self.codec = self.host.codec(self.level);
    }

    /// Simulates a platform upgrade (or downgrade) followed by a restart.
    pub fn upgrade(&mut self, level: u32) {
        self.level = level;
        self.restart();
    }

    /// Returns the count of tracked records.
    pub fn tracked_count(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doubles::VaultCall;
    use crate::fixtures::{LEGACY_LEVEL, MODERN_LEVEL};
    use localseal_core::{CapabilityTier, KeySource};

    #[test]
    fn test_harness_roundtrip() {
        let mut harness = IntegrationHarness::new(MODERN_LEVEL);
        harness.put("a", b"alpha");
        harness.put("b", b"beta");

        assert_eq!(harness.tracked_count(), 2);
        assert_eq!(harness.get_and_verify("a"), b"alpha");
        harness.verify_all();
    }

    #[test]
    fn test_records_survive_restart() {
        let mut harness = IntegrationHarness::new(LEGACY_LEVEL);
        harness.put("room", b"timeline");
        harness.restart();

        harness.verify_all();
        let key = harness.codec().keys().cached().unwrap();
        assert_eq!(key.source(), KeySource::MigratedLegacy);
    }

    #[test]
    fn test_upgrade_keeps_legacy_key() {
        let mut harness = IntegrationHarness::new(LEGACY_LEVEL);
        harness.put("old", b"written before the upgrade");
        harness.upgrade(MODERN_LEVEL);

        harness.verify_all();
        harness.put("new", b"written after the upgrade");
        harness.verify_all();

        let key = harness.codec().keys().cached().unwrap();
        assert_eq!(key.tier(), CapabilityTier::LegacyWrapped);
        assert_eq!(harness.host().vault().count(VaultCall::GenerateSymmetricKey), 0);
    }

    #[test]
    fn test_missing_record() {
        let harness = IntegrationHarness::new(MODERN_LEVEL);
        assert!(harness.get("nothing").is_none());
    }
}
