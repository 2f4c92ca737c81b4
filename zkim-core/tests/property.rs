//! Property-based laws from §8, exercised with `proptest` the way the
//! retrieved example pack's crypto crates do (arbitrary plaintext sizes,
//! arbitrary chunk sizes within the configured bounds).

use proptest::prelude::*;

use zkim_core::engine::{self, EncryptParams};
use zkim_core::model::{Metadata, BUCKET_SIZES, MIN_CHUNK_SIZE};
use zkim_core::signature;
use zkim_core::wire;

fn encrypt_and_decrypt(plaintext: &[u8], chunk_size: usize) -> Vec<u8> {
    let platform = signature::generate_keypair();
    let user = signature::generate_keypair();
    let content = signature::generate_keypair();

    let params = EncryptParams {
        user_id: b"alice".to_vec(),
        platform_key_id: b"platform-1".to_vec(),
        platform_key_material: b"platform-secret",
        user_key_material: b"alice-secret",
        metadata: Metadata::new("f", "application/octet-stream", 0),
        searchable_text: String::new(),
        created_at: 0,
        chunk_size,
        codec: None,
        compression_level: 0,
        buckets: BUCKET_SIZES,
        platform_signing_key: &platform,
        user_signing_key: &user,
        content_signing_key: &content,
    };

    let out = engine::encrypt_container(plaintext, params).unwrap();
    let bytes = wire::encode(&out.container).unwrap();
    let decoded = wire::decode(&bytes).unwrap();
    engine::decrypt_container(&decoded, b"alice-secret", None).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property 1: decrypt(encrypt(p, ...)) == p for arbitrary plaintext.
    #[test]
    fn roundtrip_arbitrary_plaintext(
        data in prop::collection::vec(any::<u8>(), 0..4096),
        chunk_size in (MIN_CHUNK_SIZE..=65536usize),
    ) {
        let recovered = encrypt_and_decrypt(&data, chunk_size);
        prop_assert_eq!(recovered, data);
    }

    /// Property 4: flipping any single bit in any chunk's encrypted_data
    /// causes decrypt to fail with DecryptionFailed.
    #[test]
    fn tamper_any_bit_in_any_chunk_fails(
        data in prop::collection::vec(any::<u8>(), 1..4096),
        chunk_index in 0usize..8,
        bit in 0u8..8,
    ) {
        let platform = signature::generate_keypair();
        let user = signature::generate_keypair();
        let content = signature::generate_keypair();
        let params = EncryptParams {
            user_id: b"alice".to_vec(),
            platform_key_id: b"platform-1".to_vec(),
            platform_key_material: b"platform-secret",
            user_key_material: b"alice-secret",
            metadata: Metadata::new("f", "application/octet-stream", 0),
            searchable_text: String::new(),
            created_at: 0,
            chunk_size: MIN_CHUNK_SIZE,
            codec: None,
            compression_level: 0,
            buckets: BUCKET_SIZES,
            platform_signing_key: &platform,
            user_signing_key: &user,
            content_signing_key: &content,
        };
        let out = engine::encrypt_container(&data, params).unwrap();
        let mut container = out.container;
        let idx = chunk_index % container.chunks.len().max(1);
        if container.chunks.is_empty() {
            return Ok(());
        }
        let byte_idx = bit as usize % container.chunks[idx].encrypted_data.len().max(1);
        container.chunks[idx].encrypted_data[byte_idx] ^= 1 << (bit % 8);

        let result = engine::decrypt_container(&container, b"alice-secret", None);
        prop_assert!(result.is_err());
        prop_assert_eq!(result.unwrap_err(), zkim_core::error::CryptoError::DecryptionFailed);
    }
}
