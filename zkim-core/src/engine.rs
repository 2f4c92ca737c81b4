//! Encryption Engine (§4.2): the three-layer AEAD schedule and the
//! post-quantum key exchange used to derive the platform and user layers.
//!
//! Requires `std` — the layer-1/layer-2 payloads are serialized as JSON
//! (per the spec's literal wording) via `serde_json`, and the content
//! processor's compression codecs are themselves `std`-only.

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::aead;
use crate::compression::CompressionCodec;
use crate::content;
use crate::error::CryptoError;
use crate::kdf;
use crate::kem::{HybridX25519MlKem768Provider, KemProvider, PublicKey, SecretKey};
use crate::model::{
    Chunk, Container, EncryptionType, HashType, Header, LayerCiphertext, Metadata,
    SignatureType, BUCKET_SIZES, CHUNK_NONCE_BYTES, FILE_ID_BYTES,
};

/// A random, per-file, never-persisted-unencrypted symmetric key used for
/// the content layer. The cache keyed by `file_id` that the concurrency
/// model describes (§5) lives in `zkim-service`; this engine only ever
/// produces or consumes one at a time.
pub type ContentKey = Zeroizing<[u8; 32]>;

// Two structs per layer payload (an owning one for decode, a borrowing one
// for encode): `Metadata` carries `String`/`BTreeSet` fields with no
// zero-copy borrow from the wire bytes, so a single `Deserialize<'a>
// { metadata: &'a Metadata, .. }` shape can't be derived.

#[derive(Serialize)]
struct PlatformLayerPayloadOut<'a> {
    metadata: &'a Metadata,
    #[serde(rename = "searchableText")]
    searchable_text: &'a str,
}

#[derive(Serialize)]
struct UserLayerPayloadOut<'a> {
    #[serde(rename = "fileId")]
    file_id: &'a str,
    #[serde(rename = "contentKey")]
    content_key_base64: &'a str,
    metadata: &'a Metadata,
}

#[derive(Deserialize)]
struct UserLayerPayloadIn {
    #[serde(rename = "fileId")]
    #[allow(dead_code)]
    file_id: String,
    #[serde(rename = "contentKey")]
    content_key_base64: String,
    #[allow(dead_code)]
    metadata: Metadata,
}

fn b64_encode(bytes: &[u8]) -> String {
    const TABLE: &[u8; 64] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::with_capacity((bytes.len() + 2) / 3 * 4);
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0];
        let b1 = *chunk.get(1).unwrap_or(&0);
        let b2 = *chunk.get(2).unwrap_or(&0);
        out.push(TABLE[(b0 >> 2) as usize] as char);
        out.push(TABLE[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize] as char);
        out.push(if chunk.len() > 1 {
            TABLE[(((b1 & 0x0f) << 2) | (b2 >> 6)) as usize] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            TABLE[(b2 & 0x3f) as usize] as char
        } else {
            '='
        });
    }
    out
}

fn b64_decode(s: &str) -> Result<Vec<u8>, CryptoError> {
    fn val(c: u8) -> Option<u8> {
        match c {
            b'A'..=b'Z' => Some(c - b'A'),
            b'a'..=b'z' => Some(c - b'a' + 26),
            b'0'..=b'9' => Some(c - b'0' + 52),
            b'+' => Some(62),
            b'/' => Some(63),
            _ => None,
        }
    }
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() / 4 * 3);
    for chunk in bytes.chunks(4) {
        if chunk.len() < 2 {
            return Err(CryptoError::DecryptionFailed);
        }
        let c0 = val(chunk[0]).ok_or(CryptoError::DecryptionFailed)?;
        let c1 = val(chunk[1]).ok_or(CryptoError::DecryptionFailed)?;
        out.push((c0 << 2) | (c1 >> 4));
        if chunk.len() > 2 && chunk[2] != b'=' {
            let c2 = val(chunk[2]).ok_or(CryptoError::DecryptionFailed)?;
            out.push((c1 << 4) | (c2 >> 2));
            if chunk.len() > 3 && chunk[3] != b'=' {
                let c3 = val(chunk[3]).ok_or(CryptoError::DecryptionFailed)?;
                out.push((c2 << 6) | c3);
            }
        }
    }
    Ok(out)
}

/// Configuration for a single `encrypt_container` call. Everything the
/// operation needs beyond the plaintext and key material.
pub struct EncryptParams<'a> {
    pub user_id: Vec<u8>,
    pub platform_key_id: Vec<u8>,
    pub platform_key_material: &'a [u8],
    pub user_key_material: &'a [u8],
    pub metadata: Metadata,
    pub searchable_text: String,
    pub created_at: u64,
    pub chunk_size: usize,
    pub codec: Option<&'a dyn CompressionCodec>,
    pub compression_level: u32,
    pub buckets: &'a [usize],
    pub platform_signing_key: &'a crate::signature::SigningKeyPair,
    pub user_signing_key: &'a crate::signature::SigningKeyPair,
    pub content_signing_key: &'a crate::signature::SigningKeyPair,
}

/// Everything produced by an `encrypt_container` call that the caller may
/// need beyond the container itself (the fresh KEM key pair has to be
/// persisted by the service layer; the engine never keeps it around).
pub struct EncryptOutput {
    pub container: Container,
    pub kem_public_key: PublicKey,
    pub kem_secret_key: SecretKey,
    /// The fresh per-file content key, surfaced so a caller may populate
    /// the `fileId -> contentKey` cache described in the concurrency
    /// model (§5) without re-deriving it from the user layer.
    pub content_key: ContentKey,
}

fn derive_file_id(content_hash: &[u8; 32], user_id: &[u8]) -> [u8; FILE_ID_BYTES] {
    use sha3::{Digest, Sha3_256};
    let mut hasher = Sha3_256::new();
    hasher.update(content_hash);
    hasher.update(user_id);
    let digest = hasher.finalize();
    let mut out = [0u8; FILE_ID_BYTES];
    out.copy_from_slice(&digest[..FILE_ID_BYTES]);
    out
}

fn content_hash_of(plaintext: &[u8]) -> [u8; 32] {
    use sha3::{Digest, Sha3_256};
    let digest = Sha3_256::digest(plaintext);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Encrypt `plaintext` into a full container (§4.2 "Encrypt").
pub fn encrypt_container(
    plaintext: &[u8],
    params: EncryptParams,
) -> Result<EncryptOutput, CryptoError> {
    content::validate_chunk_size(params.chunk_size)?;

    let file_id = derive_file_id(&content_hash_of(plaintext), &params.user_id);

    // (1) random content key
    let mut content_key_raw = [0u8; 32];
    getrandom::getrandom(&mut content_key_raw).map_err(|_| CryptoError::EncryptionFailed)?;
    let content_key: ContentKey = Zeroizing::new(content_key_raw);

    // (2) fresh KEM key pair, encapsulate a shared secret against it, wrap
    // the KEM secret key under a key derived from the caller's user key
    // material (decapsulation needs the unwrapped secret key, so this
    // wrap key cannot depend on the shared secret it's gating access to).
    let (kem_public_key, kem_secret_key) = HybridX25519MlKem768Provider::keygen();
    let (shared_secret, kem_ciphertext) =
        HybridX25519MlKem768Provider::encapsulate(&kem_public_key)
            .map_err(|_| CryptoError::EncryptionFailed)?;
    let ct_hash = kdf::ct_hash(&kem_ciphertext);

    let wrap_key = kdf::derive_wrap_key(params.user_key_material, &ct_hash, &file_id)
        .map_err(|_| CryptoError::EncryptionFailed)?;
    let wrap_nonce = aead::nonce().map_err(|_| CryptoError::EncryptionFailed)?;
    let wrapped_kem_secret = aead::aead_seal(
        &wrap_key,
        &wrap_nonce,
        &kem_secret_key.to_bytes(),
        &file_id,
    )
    .map_err(|_| CryptoError::EncryptionFailed)?;
    let mut wrapped_with_nonce = Vec::with_capacity(CHUNK_NONCE_BYTES + wrapped_kem_secret.len());
    wrapped_with_nonce.extend_from_slice(&wrap_nonce);
    wrapped_with_nonce.extend_from_slice(&wrapped_kem_secret);

    // (3) derive effective platform/user keys
    let platform_key_eff =
        kdf::derive_platform_key(&shared_secret, params.platform_key_material, &ct_hash)
            .map_err(|_| CryptoError::EncryptionFailed)?;
    let user_key_eff = kdf::derive_user_key(&shared_secret, params.user_key_material, &ct_hash)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    // (4) three distinct random nonces for the platform/user layers; each
    // content chunk draws its own nonce independently in `content::` below.
    let platform_nonce = aead::nonce().map_err(|_| CryptoError::EncryptionFailed)?;
    let user_nonce = aead::nonce().map_err(|_| CryptoError::EncryptionFailed)?;

    // (5) layer 1 (platform): {metadata, searchableText}
    let platform_payload = PlatformLayerPayloadOut {
        metadata: &params.metadata,
        searchable_text: &params.searchable_text,
    };
    let platform_json =
        serde_json::to_vec(&platform_payload).map_err(|_| CryptoError::EncryptionFailed)?;
    let platform_ciphertext = aead::aead_seal(&platform_key_eff, &platform_nonce, &platform_json, &file_id)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    // (6) layer 2 (user): {fileId, contentKey_base64, metadata}
    let file_id_b64 = b64_encode(&file_id);
    let content_key_b64 = b64_encode(&*content_key);
    let user_payload = UserLayerPayloadOut {
        file_id: &file_id_b64,
        content_key_base64: &content_key_b64,
        metadata: &params.metadata,
    };
    let user_json = serde_json::to_vec(&user_payload).map_err(|_| CryptoError::EncryptionFailed)?;
    let user_ciphertext = aead::aead_seal(&user_key_eff, &user_nonce, &user_json, &file_id)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    // (7) layer 3 (content): chunk, compress, pad, encrypt each chunk
    // under the content key with its own fresh nonce.
    let (prepared, compression_used) = content::prepare_chunks(
        plaintext,
        params.chunk_size,
        params.codec,
        params.compression_level,
        if params.buckets.is_empty() {
            BUCKET_SIZES
        } else {
            params.buckets
        },
    );

    let mut chunks = Vec::with_capacity(prepared.len());
    for pc in &prepared {
        let nonce = aead::nonce().map_err(|_| CryptoError::EncryptionFailed)?;
        let encrypted_data = aead::aead_seal(&content_key, &nonce, &pc.padded_payload, &file_id)
            .map_err(|_| CryptoError::EncryptionFailed)?;
        chunks.push(Chunk {
            chunk_index: pc.chunk_index,
            chunk_size: pc.chunk_size,
            compressed_size: pc.compressed_size,
            encrypted_size: encrypted_data.len() as u32,
            nonce,
            encrypted_data,
            integrity_hash: pc.integrity_hash,
        });
    }

    let header = Header {
        file_id,
        user_id: params.user_id,
        platform_key_id: params.platform_key_id,
        total_size: plaintext.len() as u64,
        chunk_count: chunks.len() as u32,
        created_at: params.created_at,
        compression_type: compression_used,
        encryption_type: EncryptionType::XChaCha20Poly1305,
        hash_type: HashType::Sha3_256,
        signature_type: SignatureType::MlDsa65,
    };

    let mut container = Container {
        header,
        metadata: params.metadata,
        kem_ciphertext,
        wrapped_kem_secret: wrapped_with_nonce,
        platform_layer: LayerCiphertext {
            nonce: platform_nonce,
            ciphertext: platform_ciphertext,
        },
        user_layer: LayerCiphertext {
            nonce: user_nonce,
            ciphertext: user_ciphertext,
        },
        chunks,
        platform_signature: [0u8; crate::model::SIGNATURE_BYTES],
        user_signature: [0u8; crate::model::SIGNATURE_BYTES],
        content_signature: [0u8; crate::model::SIGNATURE_BYTES],
    };

    let signable = signable_bytes(&container);
    container.platform_signature =
        crate::signature::sign(&signable, &params.platform_signing_key.secret)?;
    container.user_signature =
        crate::signature::sign(&signable, &params.user_signing_key.secret)?;
    container.content_signature =
        crate::signature::sign(&signable, &params.content_signing_key.secret)?;

    Ok(EncryptOutput {
        container,
        kem_public_key,
        kem_secret_key,
        content_key,
    })
}

/// The bytes the three signatures are computed over: the header, metadata,
/// KEM and chunk frames, but none of the three signature slots themselves.
pub fn signable_bytes(container: &Container) -> Vec<u8> {
    crate::wire::encode_unsigned(container)
}

/// Verify all three container signatures before any decryption is
/// attempted. A container with even one bad signature must be rejected
/// outright rather than partially decrypted.
pub fn verify_signatures(
    container: &Container,
    platform_public: &pqcrypto_mldsa::mldsa65::PublicKey,
    user_public: &pqcrypto_mldsa::mldsa65::PublicKey,
    content_public: &pqcrypto_mldsa::mldsa65::PublicKey,
) -> Result<(), CryptoError> {
    let signable = signable_bytes(container);
    crate::signature::verify(&signable, &container.platform_signature, platform_public)?;
    crate::signature::verify(&signable, &container.user_signature, user_public)?;
    crate::signature::verify(&signable, &container.content_signature, content_public)?;
    Ok(())
}

/// Decrypt a container back to plaintext (§4.2 "Decrypt").
///
/// `user_key_material` is the caller's user key material (not the
/// post-decapsulation effective key — unwrapping happens first). Callers
/// are expected to have already run [`verify_signatures`]; this function
/// does not re-check them.
pub fn decrypt_container(
    container: &Container,
    user_key_material: &[u8],
    codec: Option<&dyn CompressionCodec>,
) -> Result<Vec<u8>, CryptoError> {
    if container.wrapped_kem_secret.len() < CHUNK_NONCE_BYTES {
        return Err(CryptoError::DecryptionFailed);
    }
    let (wrap_nonce_bytes, wrapped) = container.wrapped_kem_secret.split_at(CHUNK_NONCE_BYTES);
    let mut wrap_nonce = [0u8; CHUNK_NONCE_BYTES];
    wrap_nonce.copy_from_slice(wrap_nonce_bytes);

    // The wrap key needs ct_hash, but ct_hash only depends on the public
    // KEM ciphertext (already on the wire) — no shared secret required.
    let ct_hash = kdf::ct_hash(&container.kem_ciphertext);
    let wrap_key = kdf::derive_wrap_key(user_key_material, &ct_hash, &container.header.file_id)
        .map_err(|_| CryptoError::DecryptionFailed)?;

    let kem_secret_bytes = aead::aead_open(&wrap_key, &wrap_nonce, wrapped, &container.header.file_id)
        .map_err(CryptoError::from)?;
    let kem_secret_key =
        SecretKey::from_bytes(&kem_secret_bytes).map_err(|_| CryptoError::DecryptionFailed)?;

    let shared_secret =
        HybridX25519MlKem768Provider::decapsulate(&kem_secret_key, &container.kem_ciphertext)
            .map_err(CryptoError::from)?;

    let user_key_eff = kdf::derive_user_key(&shared_secret, user_key_material, &ct_hash)
        .map_err(|_| CryptoError::DecryptionFailed)?;

    let user_json = aead::aead_open(
        &user_key_eff,
        &container.user_layer.nonce,
        &container.user_layer.ciphertext,
        &container.header.file_id,
    )
    .map_err(CryptoError::from)?;
    let user_payload: UserLayerPayloadIn =
        serde_json::from_slice(&user_json).map_err(|_| CryptoError::DecryptionFailed)?;
    let content_key_raw = b64_decode(&user_payload.content_key_base64)?;
    if content_key_raw.len() != 32 {
        return Err(CryptoError::DecryptionFailed);
    }
    let mut content_key_bytes = [0u8; 32];
    content_key_bytes.copy_from_slice(&content_key_raw);
    let content_key: ContentKey = Zeroizing::new(content_key_bytes);

    let mut ordered: Vec<&Chunk> = container.chunks.iter().collect();
    ordered.sort_by_key(|c| c.chunk_index);

    let mut plains = Vec::with_capacity(ordered.len());
    for chunk in ordered {
        let padded = aead::aead_open(
            &content_key,
            &chunk.nonce,
            &chunk.encrypted_data,
            &container.header.file_id,
        )
        .map_err(CryptoError::from)?;
        let plain = content::finish_chunk(
            &padded,
            chunk.compressed_size,
            chunk.chunk_size,
            &chunk.integrity_hash,
            container.header.compression_type,
            codec,
        )?;
        plains.push(plain);
    }

    let out = content::join_chunks(plains);
    if out.len() as u64 != container.header.total_size {
        return Err(CryptoError::IntegrityFailed);
    }
    Ok(out)
}
