//! End-to-end container round-trip and tamper-detection scenarios (§8).

use zkim_core::compression::GzipCodec;
use zkim_core::engine::{self, EncryptParams};
use zkim_core::error::CryptoError;
use zkim_core::model::{Metadata, BUCKET_SIZES, DEFAULT_CHUNK_SIZE};
use zkim_core::signature;
use zkim_core::wire;

struct Keys {
    platform: signature::SigningKeyPair,
    user: signature::SigningKeyPair,
    content: signature::SigningKeyPair,
}

fn keys() -> Keys {
    Keys {
        platform: signature::generate_keypair(),
        user: signature::generate_keypair(),
        content: signature::generate_keypair(),
    }
}

fn params<'a>(keys: &'a Keys, metadata: Metadata, codec: Option<&'a dyn zkim_core::compression::CompressionCodec>) -> EncryptParams<'a> {
    EncryptParams {
        user_id: b"alice".to_vec(),
        platform_key_id: b"platform-1".to_vec(),
        platform_key_material: b"platform-secret",
        user_key_material: b"alice-secret",
        metadata,
        searchable_text: String::new(),
        created_at: 0,
        chunk_size: DEFAULT_CHUNK_SIZE,
        codec,
        compression_level: 6,
        buckets: BUCKET_SIZES,
        platform_signing_key: &keys.platform,
        user_signing_key: &keys.user,
        content_signing_key: &keys.content,
    }
}

/// S1 Round-trip small.
#[test]
fn s1_roundtrip_small_no_compression() {
    let k = keys();
    let plaintext = b"Hello, ZKIM!";
    let metadata = Metadata::new("plan.txt", "text/plain", 0);
    let out = engine::encrypt_container(plaintext, params(&k, metadata, None)).unwrap();

    assert_eq!(out.container.header.chunk_count, 1);
    assert_eq!(out.container.chunks.len(), 1);

    let bytes = wire::encode(&out.container).unwrap();
    assert_eq!(&bytes[0..6], &[0x5A, 0x4B, 0x49, 0x4D, 0x01, 0x00]);

    let decoded = wire::decode(&bytes).unwrap();
    let decrypted = engine::decrypt_container(&decoded, b"alice-secret", None).unwrap();
    assert_eq!(decrypted, plaintext);
}

/// S2 Round-trip 10 MB.
#[test]
fn s2_roundtrip_10mb_with_gzip() {
    let k = keys();
    let plaintext = vec![0x41u8; 10 * 1024 * 1024];
    let metadata = Metadata::new("blob.bin", "application/octet-stream", 0);
    let codec = GzipCodec;
    let out =
        engine::encrypt_container(&plaintext, params(&k, metadata, Some(&codec))).unwrap();

    assert_eq!(out.container.header.chunk_count, 20);

    let compressed_total: u64 = out
        .container
        .chunks
        .iter()
        .map(|c| c.compressed_size as u64)
        .sum();
    assert!(compressed_total < plaintext.len() as u64);

    let bytes = wire::encode(&out.container).unwrap();
    let decoded = wire::decode(&bytes).unwrap();
    let decrypted = engine::decrypt_container(&decoded, b"alice-secret", Some(&codec)).unwrap();
    assert_eq!(decrypted, plaintext);
}

/// S3 Tamper detection.
#[test]
fn s3_tamper_detection_flips_bit() {
    let k = keys();
    let plaintext = b"Hello, ZKIM!";
    let metadata = Metadata::new("plan.txt", "text/plain", 0);
    let out = engine::encrypt_container(plaintext, params(&k, metadata, None)).unwrap();
    let mut container = out.container;
    container.chunks[0].encrypted_data[0] ^= 0x80;

    let result = engine::decrypt_container(&container, b"alice-secret", None);
    assert_eq!(result.unwrap_err(), CryptoError::DecryptionFailed);
}

/// Property 5: wrong-key rejection never returns corrupt plaintext.
#[test]
fn wrong_key_never_returns_plaintext() {
    let k = keys();
    let plaintext = b"sensitive contents";
    let metadata = Metadata::new("f", "text/plain", 0);
    let out = engine::encrypt_container(plaintext, params(&k, metadata, None)).unwrap();

    let result = engine::decrypt_container(&out.container, b"wrong-secret", None);
    assert_eq!(result.unwrap_err(), CryptoError::DecryptionFailed);
}

/// Property 2: encode/decode round-trip is structural and deterministic.
#[test]
fn encode_decode_roundtrip_is_deterministic() {
    let k = keys();
    let plaintext = b"deterministic encoding check";
    let metadata = Metadata::new("f", "text/plain", 0);
    let out = engine::encrypt_container(plaintext, params(&k, metadata, None)).unwrap();

    let bytes_a = wire::encode(&out.container).unwrap();
    let bytes_b = wire::encode(&out.container).unwrap();
    assert_eq!(bytes_a, bytes_b);

    let decoded = wire::decode(&bytes_a).unwrap();
    assert_eq!(decoded, out.container);
}

/// Property 3: nonces are pairwise distinct across repeated encryptions of
/// the same file content (sampled, not exhaustive per §8's 10^4 guidance —
/// kept small here to stay a fast unit test).
#[test]
fn nonces_are_pairwise_distinct_across_runs() {
    let k = keys();
    let plaintext = b"same content every time";
    let mut seen = std::collections::HashSet::new();
    for _ in 0..200 {
        let metadata = Metadata::new("f", "text/plain", 0);
        let out = engine::encrypt_container(plaintext, params(&k, metadata, None)).unwrap();
        assert!(seen.insert(out.container.platform_layer.nonce));
        assert!(seen.insert(out.container.user_layer.nonce));
        for chunk in &out.container.chunks {
            assert!(seen.insert(chunk.nonce));
        }
    }
}

/// Unknown enum values must render the container unreadable, never
/// silently ignored (§3 header invariant).
#[test]
fn unknown_compression_enum_is_rejected() {
    let k = keys();
    let metadata = Metadata::new("f", "text/plain", 0);
    let out = engine::encrypt_container(b"x", params(&k, metadata, None)).unwrap();
    let mut bytes = wire::encode(&out.container).unwrap();

    // Header TLV payload starts at MAGIC(4)+VERSION(2)+FLAGS(2)+TLV
    // type(1)+TLV len(4) = 13. Within the payload, `compression_type` sits
    // after file_id(16) + user_id(2-byte len + "alice"=5) +
    // platform_key_id(2-byte len + "platform-1"=10) + total_size(8) +
    // chunk_count(4) + created_at(8) = offset 55.
    let header_payload_start = 13;
    let compression_type_offset = header_payload_start + 16 + (2 + 5) + (2 + 10) + 8 + 4 + 8;
    assert_eq!(bytes[compression_type_offset], 0u8); // CompressionType::None
    bytes[compression_type_offset] = 0xFF;

    let err = wire::decode(&bytes).unwrap_err();
    assert_eq!(err, zkim_core::error::WireError::InvalidEnum);
}

/// §4.1: trailing bytes after the final signature are `Truncated`... in the
/// sense that extra bytes are never silently discarded — decode rejects
/// anything it cannot account for.
#[test]
fn trailing_garbage_after_signatures_is_rejected() {
    let k = keys();
    let metadata = Metadata::new("f", "text/plain", 0);
    let out = engine::encrypt_container(b"x", params(&k, metadata, None)).unwrap();
    let mut bytes = wire::encode(&out.container).unwrap();
    bytes.push(0x00);

    let err = wire::decode(&bytes).unwrap_err();
    assert_eq!(err, zkim_core::error::WireError::Truncated);
}

#[test]
fn bad_magic_is_rejected() {
    let mut bytes = vec![0u8; 16];
    bytes[0..4].copy_from_slice(b"XXXX");
    let err = wire::decode(&bytes).unwrap_err();
    assert_eq!(err, zkim_core::error::WireError::InvalidMagic);
}

#[test]
fn unsupported_version_is_rejected() {
    let mut bytes = vec![0u8; 16];
    bytes[0..4].copy_from_slice(&zkim_core::model::MAGIC);
    bytes[4..6].copy_from_slice(&2u16.to_le_bytes());
    let err = wire::decode(&bytes).unwrap_err();
    assert_eq!(err, zkim_core::error::WireError::UnsupportedVersion);
}
