//! Property-based test generators using proptest.

use crate::fixtures::{LEGACY_LEVEL, MODERN_LEVEL, UNSUPPORTED_LEVEL};
use localseal_core::Config;
use proptest::prelude::*;

/// Strategy for stream payloads, including the empty payload.
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..4096)
}

/// Strategy for any platform level around the default thresholds.
pub fn platform_level_strategy() -> impl Strategy<Value = u32> {
    0u32..40
}

/// Strategy for platform levels with local encryption support.
pub fn supported_level_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![
        (Config::default().baseline_level..Config::default().modern_level),
        (Config::default().modern_level..40),
    ]
}

/// Strategy for one representative level per tier.
pub fn tier_level_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![
        Just(UNSUPPORTED_LEVEL),
        Just(LEGACY_LEVEL),
        Just(MODERN_LEVEL)
    ]
}

/// Strategy for content key sizes in bits.
pub fn key_size_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![Just(128u32), Just(256u32)]
}

/// Strategy for write chunk sizes used to split a payload.
pub fn chunk_sizes_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..512, 1..16)
}

/// Splits `payload` into consecutive chunks of the given sizes, cycling
/// through `sizes` until the payload is exhausted.
pub fn split_payload<'a>(payload: &'a [u8], sizes: &[usize]) -> Vec<&'a [u8]> {
    let mut chunks = Vec::new();
    let mut rest = payload;
    for size in sizes.iter().cycle() {
        if rest.is_empty() {
            break;
        }
        let (chunk, tail) = rest.split_at((*size).max(1).min(rest.len()));
        chunks.push(chunk);
        rest = tail;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestHost;
    use std::io::Write;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn roundtrip_any_payload(payload in payload_strategy(), level in tier_level_strategy()) {
            let host = TestHost::new();
            let codec = host.codec(level);
            let sealed = codec.encrypt_to_vec(&payload).unwrap();
            prop_assert_eq!(codec.decrypt_slice(&sealed).unwrap(), payload);
        }

        #[test]
        fn split_writes_match_single_write(
            payload in payload_strategy(),
            sizes in chunk_sizes_strategy(),
        ) {
            let host = TestHost::new();
            let codec = host.codec(LEGACY_LEVEL);

            let mut stream = codec.wrap_encrypt(Vec::new()).unwrap();
            for chunk in split_payload(&payload, &sizes) {
                stream.write_all(chunk).unwrap();
            }
            let sealed = stream.finish().unwrap();

            prop_assert_eq!(sealed.len(), 1 + 12 + payload.len() + 16);
            prop_assert_eq!(codec.decrypt_slice(&sealed).unwrap(), payload);
        }

        #[test]
        fn header_always_first(level in supported_level_strategy(), bits in key_size_strategy()) {
            let host = TestHost::with_config(Config::default().key_size_bits(bits));
            let sealed = host.codec(level).encrypt_to_vec(b"x").unwrap();
            prop_assert_eq!(sealed[0], 12);
            prop_assert_eq!(sealed.len(), 1 + 12 + 1 + 16);
        }

        #[test]
        fn split_payload_preserves_bytes(payload in payload_strategy(), sizes in chunk_sizes_strategy()) {
            let joined: Vec<u8> = split_payload(&payload, &sizes).concat();
            prop_assert_eq!(joined, payload);
        }

        #[test]
        fn platform_levels_classify(level in platform_level_strategy()) {
            let host = TestHost::new();
            let tier = host.manager(level).host_tier();
            prop_assert_eq!(tier.is_supported(), level >= Config::default().baseline_level);
        }
    }
}
