//! Container data model (§3): header, chunks, metadata, key hierarchy and
//! the ownership rules tying them together.

extern crate alloc;
use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;

#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};

use crate::error::WireError;

pub const MAGIC: [u8; 4] = *b"ZKIM";
pub const CONTAINER_VERSION: u16 = 1;

/// File id size: content-hash-derived, opaque.
pub const FILE_ID_BYTES: usize = 16;
/// Trapdoor id size.
pub const TRAPDOOR_ID_BYTES: usize = 16;
/// Integrity hash size (256-bit).
pub const INTEGRITY_HASH_BYTES: usize = 32;
/// Per-chunk AEAD nonce size (matches `aead::NONCE_BYTES`).
pub const CHUNK_NONCE_BYTES: usize = 24;
/// Post-quantum signature size (ML-DSA-65 fixed signature length).
pub const SIGNATURE_BYTES: usize = 3309;

/// Bucket sizes chunk padding and result-padding round up to.
pub const BUCKET_SIZES: &[usize] = &[
    64, 256, 1024, 4096, 16384, 65536, 262144, 524288, 1048576,
];

pub const DEFAULT_CHUNK_SIZE: usize = 512 * 1024;
pub const MIN_CHUNK_SIZE: usize = 1024;
pub const MAX_CHUNK_SIZE: usize = 1024 * 1024;

/// Round `len` up to the smallest configured bucket size `>= len`; if `len`
/// meets or exceeds every configured bucket, it is returned unchanged.
pub fn round_to_bucket(len: usize, buckets: &[usize]) -> usize {
    for &b in buckets {
        if len <= b {
            return b;
        }
    }
    len
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum CompressionType {
    None = 0,
    Brotli = 1,
    Gzip = 2,
}

impl CompressionType {
    pub fn from_u8(v: u8) -> Result<Self, WireError> {
        match v {
            0 => Ok(Self::None),
            1 => Ok(Self::Brotli),
            2 => Ok(Self::Gzip),
            _ => Err(WireError::InvalidEnum),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum EncryptionType {
    /// XChaCha20-Poly1305 AEAD, 24-byte nonce, 16-byte tag.
    XChaCha20Poly1305 = 1,
}

impl EncryptionType {
    pub fn from_u8(v: u8) -> Result<Self, WireError> {
        match v {
            1 => Ok(Self::XChaCha20Poly1305),
            _ => Err(WireError::InvalidEnum),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum HashType {
    /// 256-bit cryptographic hash (SHA3-256).
    Sha3_256 = 1,
}

impl HashType {
    pub fn from_u8(v: u8) -> Result<Self, WireError> {
        match v {
            1 => Ok(Self::Sha3_256),
            _ => Err(WireError::InvalidEnum),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum SignatureType {
    /// Post-quantum ML-DSA-65 signature (FIPS 204), 3309-byte signatures.
    MlDsa65 = 1,
}

impl SignatureType {
    pub fn from_u8(v: u8) -> Result<Self, WireError> {
        match v {
            1 => Ok(Self::MlDsa65),
            _ => Err(WireError::InvalidEnum),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Header block (§3 "Header").
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct Header {
    pub file_id: [u8; FILE_ID_BYTES],
    pub user_id: Vec<u8>,
    pub platform_key_id: Vec<u8>,
    pub total_size: u64,
    pub chunk_count: u32,
    pub created_at: u64,
    pub compression_type: CompressionType,
    pub encryption_type: EncryptionType,
    pub hash_type: HashType,
    pub signature_type: SignatureType,
}

/// A single encrypted chunk (§3 "Chunk").
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct Chunk {
    pub chunk_index: u32,
    pub chunk_size: u32,
    pub compressed_size: u32,
    pub encrypted_size: u32,
    pub nonce: [u8; CHUNK_NONCE_BYTES],
    /// Ciphertext with the 16-byte AEAD tag appended.
    pub encrypted_data: Vec<u8>,
    pub integrity_hash: [u8; INTEGRITY_HASH_BYTES],
}

impl Chunk {
    pub fn encrypted_size_matches(&self) -> bool {
        self.encrypted_size as usize == self.encrypted_data.len()
    }
}

/// Access control sets for a container (§3 "Metadata").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct AccessControl {
    pub read_access: BTreeSet<String>,
    pub write_access: BTreeSet<String>,
    pub delete_access: BTreeSet<String>,
}

/// Derived at query time from a file's access-control sets (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AccessLevel {
    None,
    Metadata,
    Full,
}

impl AccessControl {
    pub fn access_level_for(maybe_ac: Option<&AccessControl>, user_id: &str) -> AccessLevel {
        match maybe_ac {
            None => AccessLevel::None,
            Some(ac) => {
                if ac.read_access.contains(user_id) {
                    AccessLevel::Full
                } else {
                    AccessLevel::Metadata
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct RetentionPolicy {
    pub expires_at: Option<u64>,
    pub max_access_count: Option<u64>,
    pub auto_delete: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct CustomFields {
    /// Only string values participate in search-token generation; other
    /// JSON-ish shapes are carried opaquely as their textual rendering and
    /// simply excluded from tokenization upstream.
    pub strings: alloc::collections::BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct Metadata {
    pub file_name: String,
    pub mime_type: String,
    pub created_at: u64,
    pub tags: BTreeSet<String>,
    pub custom_fields: CustomFields,
    pub access_control: Option<AccessControl>,
    pub retention_policy: Option<RetentionPolicy>,
}

impl Metadata {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, created_at: u64) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            created_at,
            tags: BTreeSet::new(),
            custom_fields: CustomFields::default(),
            access_control: None,
            retention_policy: None,
        }
    }
}

/// One AEAD layer's nonce + ciphertext (tag appended), as produced by the
/// platform or user encryption layer (§4.2 steps 5-6). Carried in the wire
/// format's KEM-ciphertext block alongside the KEM artifacts, since both
/// are needed before the content key can be recovered on decrypt.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct LayerCiphertext {
    pub nonce: [u8; CHUNK_NONCE_BYTES],
    pub ciphertext: Vec<u8>,
}

/// Full container as described by §3 "File container".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub header: Header,
    pub metadata: Metadata,
    /// KEM ciphertext for the per-file post-quantum shared secret.
    pub kem_ciphertext: Vec<u8>,
    /// Wrapped KEM secret key, sealed under the user-derived key.
    pub wrapped_kem_secret: Vec<u8>,
    /// Layer 1: `{metadata, searchableText}` sealed under the effective
    /// platform key.
    pub platform_layer: LayerCiphertext,
    /// Layer 2: `{fileId, contentKey, metadata}` sealed under the
    /// effective user key. The only path by which the content key is
    /// recovered on decrypt.
    pub user_layer: LayerCiphertext,
    pub chunks: Vec<Chunk>,
    pub platform_signature: [u8; SIGNATURE_BYTES],
    pub user_signature: [u8; SIGNATURE_BYTES],
    pub content_signature: [u8; SIGNATURE_BYTES],
}

impl Container {
    /// §3 invariants: chunk-size sum equals header total, indices unique
    /// and cover [0, chunkCount).
    pub fn validate_chunk_invariants(&self) -> Result<(), WireError> {
        if self.chunks.len() != self.header.chunk_count as usize {
            return Err(WireError::InvalidInput);
        }
        let mut seen = alloc::collections::BTreeSet::new();
        let mut total: u64 = 0;
        for chunk in &self.chunks {
            if chunk.chunk_index >= self.header.chunk_count {
                return Err(WireError::InvalidInput);
            }
            if !seen.insert(chunk.chunk_index) {
                return Err(WireError::InvalidInput);
            }
            if !chunk.encrypted_size_matches() {
                return Err(WireError::InvalidInput);
            }
            total += chunk.chunk_size as u64;
        }
        if total != self.header.total_size {
            return Err(WireError::InvalidInput);
        }
        Ok(())
    }
}
