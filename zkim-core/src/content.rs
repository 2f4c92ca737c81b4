//! Content Processor (§4.3): chunking, compression, padding-to-bucket and
//! per-chunk integrity hashing.
//!
//! Chunking happens on the *original* plaintext first (`chunkCount =
//! ceil(size / chunkSize)`), and each chunk is compressed independently.
//! This is the reading that matches the literal testable scenario S2 (10
//! MiB at a 512 KiB chunk size yields exactly 20 chunks regardless of how
//! well the content compresses) rather than a whole-file compress-then-split
//! reading, which would make chunk count a function of the compression
//! ratio; see DESIGN.md for the full resolution of that ambiguity.

extern crate alloc;
use alloc::vec::Vec;

use sha3::{Digest, Sha3_256};
use subtle::ConstantTimeEq;

use crate::compression::CompressionCodec;
use crate::error::CryptoError;
use crate::model::{round_to_bucket, CompressionType, BUCKET_SIZES, INTEGRITY_HASH_BYTES, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};

/// A single plaintext chunk prepared for encryption: compressed and padded
/// to a bucket size, with its pre-compression integrity hash attached.
#[derive(Debug, Clone)]
pub struct PreparedChunk {
    pub chunk_index: u32,
    /// Length of the original plaintext slice this chunk covers.
    pub chunk_size: u32,
    /// Length after compression, before padding.
    pub compressed_size: u32,
    /// Compressed bytes padded to the nearest bucket — this is the buffer
    /// the Encryption Engine encrypts.
    pub padded_payload: Vec<u8>,
    pub integrity_hash: [u8; INTEGRITY_HASH_BYTES],
}

fn sha3_256(data: &[u8]) -> [u8; INTEGRITY_HASH_BYTES] {
    let h = Sha3_256::digest(data);
    let mut out = [0u8; INTEGRITY_HASH_BYTES];
    out.copy_from_slice(&h);
    out
}

/// Validate a configured chunk size against the hard bounds [1 KiB, 1 MiB].
pub fn validate_chunk_size(chunk_size: usize) -> Result<(), CryptoError> {
    if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&chunk_size) {
        return Err(CryptoError::InvalidKeyLength);
    }
    Ok(())
}

/// Split `plaintext` into `ceil(len / chunk_size)` chunks, compress each
/// (falling back to `none` for that chunk if the codec errors — a
/// compression failure must never fail the write), and pad each to the
/// nearest configured bucket size.
///
/// Returns the prepared chunks and the `CompressionType` actually used
/// (the codec's tag, or `None` if compression was disabled or every chunk
/// fell back).
pub fn prepare_chunks(
    plaintext: &[u8],
    chunk_size: usize,
    codec: Option<&dyn CompressionCodec>,
    compression_level: u32,
    buckets: &[usize],
) -> (Vec<PreparedChunk>, CompressionType) {
    if plaintext.is_empty() {
        return (Vec::new(), CompressionType::None);
    }

    let chunk_count = plaintext.len().div_ceil(chunk_size);
    let mut chunks = Vec::with_capacity(chunk_count);
    let mut any_compressed = false;
    let mut all_attempted_failed = true;

    for (i, slice) in plaintext.chunks(chunk_size).enumerate() {
        let integrity_hash = sha3_256(slice);

        let compressed = match codec {
            Some(c) => match c.compress(slice, compression_level) {
                Ok(bytes) => {
                    any_compressed = true;
                    all_attempted_failed = false;
                    bytes
                }
                Err(_) => slice.to_vec(),
            },
            None => slice.to_vec(),
        };

        let compressed_size = compressed.len() as u32;
        let bucket_len = round_to_bucket(compressed.len(), buckets);
        let mut padded_payload = compressed;
        padded_payload.resize(bucket_len, 0);

        chunks.push(PreparedChunk {
            chunk_index: i as u32,
            chunk_size: slice.len() as u32,
            compressed_size,
            padded_payload,
            integrity_hash,
        });
    }

    let used = match codec {
        Some(c) if any_compressed && !all_attempted_failed => c.algorithm(),
        _ => CompressionType::None,
    };

    (chunks, used)
}

/// Reverse of [`prepare_chunks`] for a single decrypted-and-depadded chunk:
/// truncate trailing padding, decompress, and verify the integrity hash.
pub fn finish_chunk(
    unpadded_or_padded: &[u8],
    compressed_size: u32,
    chunk_size: u32,
    expected_hash: &[u8; INTEGRITY_HASH_BYTES],
    compression: CompressionType,
    codec: Option<&dyn CompressionCodec>,
) -> Result<Vec<u8>, CryptoError> {
    let compressed = &unpadded_or_padded[..compressed_size as usize];

    let plaintext = match compression {
        CompressionType::None => compressed.to_vec(),
        _ => {
            let codec = codec.ok_or(CryptoError::UnsupportedCompression)?;
            codec
                .decompress(compressed, chunk_size as usize)
                .map_err(|_| CryptoError::DecompressionFailed)?
        }
    };

    if plaintext.len() != chunk_size as usize {
        return Err(CryptoError::IntegrityFailed);
    }

    let actual_hash = sha3_256(&plaintext);
    if actual_hash.ct_eq(expected_hash).unwrap_u8() == 0 {
        return Err(CryptoError::IntegrityFailed);
    }

    Ok(plaintext)
}

/// Join ordered chunk plaintexts into the original byte stream.
pub fn join_chunks(chunks: Vec<Vec<u8>>) -> Vec<u8> {
    chunks.into_iter().flatten().collect()
}

pub const DEFAULT_BUCKETS: &[usize] = BUCKET_SIZES;
