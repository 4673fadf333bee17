//! Integration tests for key resolution and stream encryption.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use localseal_core::{CapabilityTier, Config, CoreError, KeySource, StreamCipherCodec};
use localseal_testkit::prelude::*;
use localseal_vault::{
    InMemorySettings, KeyVault, SettingValue, SettingsStore, SoftwareVault, VaultError,
};
use std::io::{self, Cursor, Read, Write};
use std::sync::Arc;

const WRAPPED_KEY: &str = "aes_wrapped_local_protection";
const LEVEL_MARKER: &str = "platform_level_when_key_generated";

#[test]
fn modern_payload_layout() {
    let host = TestHost::new();
    let codec = host.codec(MODERN_LEVEL);

    let sealed = codec.encrypt_to_vec(&[0x01, 0x02, 0x03, 0x04, 0x05]).unwrap();
    assert_eq!(sealed.len(), 34);
    assert_eq!(sealed[0], 0x0C);
    assert_eq!(
        codec.decrypt_slice(&sealed).unwrap(),
        [0x01u8, 0x02, 0x03, 0x04, 0x05]
    );
}

#[test]
fn both_tiers_roundtrip() {
    for level in [LEGACY_LEVEL, MODERN_LEVEL] {
        let host = TestHost::new();
        let codec = host.codec(level);
        let payload = vec![0x5Au8; 10_000];

        let sealed = codec.encrypt_to_vec(&payload).unwrap();
        assert_eq!(sealed.len(), 1 + 12 + payload.len() + 16);
        assert_eq!(codec.decrypt_slice(&sealed).unwrap(), payload);
    }
}

#[test]
fn resolution_is_idempotent() {
    let host = TestHost::new();
    let keys = host.manager(MODERN_LEVEL);

    let first = keys.resolve().unwrap();
    host.vault().reset();
    let second = keys.resolve().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(host.vault().calls().is_empty());
}

#[test]
fn concurrent_first_resolution_runs_once() {
    for level in [LEGACY_LEVEL, MODERN_LEVEL] {
        let host = TestHost::new();
        let keys = stress_concurrent_resolution(host.manager(level), 32);

        assert!(keys.iter().all(|k| Arc::ptr_eq(k, &keys[0])));
        assert_eq!(host.vault().generations(), 1);
    }
}

#[test]
fn concurrent_first_resolution_after_upgrade_migrates_once() {
    let host = TestHost::new();
    let sealed = host.codec(LEGACY_LEVEL).encrypt_to_vec(b"before upgrade").unwrap();
    host.vault().reset();

    let manager = host.manager(MODERN_LEVEL);
    let keys = stress_concurrent_resolution(Arc::clone(&manager), 32);

    assert!(keys.iter().all(|k| Arc::ptr_eq(k, &keys[0])));
    assert_eq!(keys[0].source(), KeySource::MigratedLegacy);
    assert_eq!(host.vault().count(VaultCall::Unwrap), 1);
    assert_eq!(host.vault().generations(), 0);

    let codec = StreamCipherCodec::new(manager, Arc::clone(host.random()));
    assert_eq!(codec.decrypt_slice(&sealed).unwrap(), b"before upgrade");
}

#[test]
fn unsupported_host_writes_no_header() {
    let host = TestHost::new();
    let codec = host.codec(UNSUPPORTED_LEVEL);

    let mut stream = codec.wrap_encrypt(Vec::new()).unwrap();
    assert!(stream.is_passthrough());
    stream.write_all(b"plain bytes").unwrap();
    assert_eq!(stream.finish().unwrap(), b"plain bytes");

    let mut reader = codec.wrap_decrypt(Cursor::new(b"plain bytes".to_vec())).unwrap();
    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    assert_eq!(out, b"plain bytes");

    assert!(host.vault().calls().is_empty());
    assert!(host.settings().snapshot().is_empty());
}

#[test]
fn upgrade_migrates_instead_of_generating() {
    let host = TestHost::new();
    let legacy_codec = host.codec(LEGACY_LEVEL);
    let sealed = legacy_codec.encrypt_to_vec(b"encrypted on the old platform").unwrap();
    let legacy_key = legacy_codec.keys().cached().unwrap();
    host.vault().reset();

    let modern_codec = host.codec(MODERN_LEVEL);
    assert_eq!(
        modern_codec.decrypt_slice(&sealed).unwrap(),
        b"encrypted on the old platform"
    );

    let migrated = modern_codec.keys().cached().unwrap();
    assert_eq!(migrated.source(), KeySource::MigratedLegacy);
    assert_eq!(migrated.tier(), CapabilityTier::LegacyWrapped);
    assert_eq!(migrated.key(), legacy_key.key());
    assert_eq!(host.vault().generations(), 0);
    assert_eq!(host.vault().count(VaultCall::Unwrap), 1);

    // New data written after the upgrade is readable by either host.
    let fresh = modern_codec.encrypt_to_vec(b"after").unwrap();
    assert_eq!(host.codec(LEGACY_LEVEL).decrypt_slice(&fresh).unwrap(), b"after");
}

#[test]
fn bad_length_byte_consumes_one_byte() {
    let host = TestHost::new();
    let codec = host.codec(MODERN_LEVEL);
    let mut source = Cursor::new(vec![0x07u8, 0x01, 0x02, 0x03]);

    let err = codec.wrap_decrypt(&mut source).unwrap_err();
    assert!(err.is_corrupt_header());
    assert_eq!(source.position(), 1);
}

#[test]
fn locked_vault_surfaces_key_vault_error() {
    let host = TestHost::new();
    host.vault().inner().set_locked(true);

    let err = host.codec(MODERN_LEVEL).encrypt_to_vec(b"x").unwrap_err();
    assert!(matches!(err, CoreError::KeyVault(VaultError::Locked)));
}

#[test]
fn rejected_spec_surfaces_key_generation_error() {
    let host = TestHost::with_config(Config::default().key_pair_size_bits(1024));
    let err = host.codec(LEGACY_LEVEL).encrypt_to_vec(b"x").unwrap_err();
    assert!(matches!(err, CoreError::KeyGeneration { .. }));
    assert!(host.settings().snapshot().is_empty());
}

#[test]
fn settings_failure_surfaces_settings_error() {
    let settings = Arc::new(FailingSettings::new());
    settings.set_fail_writes(true);
    let random = Arc::new(localseal_core::RandomSource::new());
    let keys = build_manager(
        Arc::new(SoftwareVault::in_memory()),
        settings,
        MODERN_LEVEL,
        Config::default(),
        Arc::clone(&random),
    );

    let err = keys.resolve().unwrap_err();
    assert!(matches!(err, CoreError::Settings(_)));
    assert!(keys.cached().is_none());
}

#[test]
fn tampered_ciphertext_fails_read() {
    let host = TestHost::new();
    let codec = host.codec(LEGACY_LEVEL);
    let mut sealed = codec.encrypt_to_vec(b"integrity matters").unwrap();
    sealed[20] ^= 0x01;

    let mut reader = codec.wrap_decrypt(sealed.as_slice()).unwrap();
    let err = reader.read_to_end(&mut Vec::new()).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
}

#[test]
fn truncated_header_is_reported() {
    let host = TestHost::new();
    let err = host
        .codec(MODERN_LEVEL)
        .decrypt_slice(&[12, 0xAA, 0xBB])
        .unwrap_err();
    assert!(matches!(err, CoreError::TruncatedHeader));
}

#[test]
fn file_state_survives_restart() {
    let host = FileHost::new();
    let sealed = host.codec(MODERN_LEVEL).encrypt_to_vec(b"on disk").unwrap();

    let reopened = host.codec(MODERN_LEVEL);
    assert_eq!(reopened.decrypt_slice(&sealed).unwrap(), b"on disk");
    assert_eq!(
        reopened.keys().cached().unwrap().source(),
        KeySource::VaultDirect
    );
}

#[test]
fn file_state_upgrade_migrates() {
    let host = FileHost::new();
    let sealed = host.codec(LEGACY_LEVEL).encrypt_to_vec(b"legacy on disk").unwrap();

    let upgraded = host.codec(MODERN_LEVEL);
    assert_eq!(upgraded.decrypt_slice(&sealed).unwrap(), b"legacy on disk");
    assert_eq!(
        upgraded.keys().cached().unwrap().source(),
        KeySource::MigratedLegacy
    );
}

#[test]
fn legacy_generation_persists_blob_and_marker() {
    let host = TestHost::new();
    host.manager(20).resolve().unwrap();

    let snapshot = host.settings().snapshot();
    assert_eq!(snapshot.get(LEVEL_MARKER), Some(&SettingValue::Int(20)));
    assert!(matches!(snapshot.get(WRAPPED_KEY), Some(SettingValue::Str(_))));
    assert!(!host.vault().has_key("aes_local_protection").unwrap());
}

#[test]
fn pre_existing_legacy_state_is_migrated() {
    // State left by an older install: a wrapping pair in the vault and the
    // wrapped blob in settings, created without this crate's manager.
    let vault = Arc::new(SoftwareVault::in_memory());
    let pair = vault
        .generate_key_pair(
            "wrap_local_protection",
            &localseal_vault::KeyPairSpec::valid_for(
                localseal_vault::KEY_PAIR_SIZE_BITS,
                localseal_vault::DEFAULT_KEY_PAIR_VALIDITY,
            ),
        )
        .unwrap();
    let key = localseal_vault::SymmetricKey::from_bytes(&[0x33; 16]).unwrap();
    let wrapped = vault.wrap(&pair.public, &key).unwrap();

    let settings = Arc::new(InMemorySettings::new());
    settings
        .put_all(&[
            (WRAPPED_KEY, SettingValue::Str(STANDARD.encode(&wrapped))),
            (LEVEL_MARKER, SettingValue::Int(21)),
        ])
        .unwrap();

    let random = Arc::new(localseal_core::RandomSource::new());
    let keys = build_manager(vault, settings, 28, Config::default(), Arc::clone(&random));
    let resolved = keys.resolve().unwrap();
    assert_eq!(resolved.key(), &key);
    assert_eq!(resolved.platform_level(), 21);

    let codec = StreamCipherCodec::new(keys, random);
    let sealed = codec.encrypt_to_vec(b"z").unwrap();
    assert_eq!(codec.decrypt_slice(&sealed).unwrap(), b"z");
}
