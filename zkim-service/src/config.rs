//! Aggregate service configuration: one plain `Default`-constructed
//! struct encoding every tunable as a Rust literal rather than a parsed
//! config file. `Config` here is the top-level aggregate; the
//! trapdoor/search half of it is `zkim_search::Config`, embedded rather
//! than duplicated.

use std::time::Duration;

use zkim_core::model::{CompressionType, BUCKET_SIZES, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};

#[derive(Debug, Clone)]
pub struct Config {
    // --- Content Processor / Compression Codec ---
    pub enable_compression: bool,
    pub compression_algorithm: CompressionType,
    /// Clamped to 0..=9 at the point of use (gzip scale; brotli clamps to 11
    /// internally in `zkim_core::compression::BrotliCodec`).
    pub compression_level: u32,
    pub chunk_size: usize,
    pub max_file_size: u64,

    // --- Searchable encryption ---
    pub enable_searchable_encryption: bool,

    // --- Integrity / signatures ---
    pub enable_integrity_validation: bool,

    // --- Key management ---
    pub enable_key_rotation: bool,
    pub enable_perfect_forward_secrecy: bool,
    pub enable_compromise_detection: bool,

    // --- Trapdoor lifecycle + search index (§4.4, §4.5) ---
    pub search: zkim_search::Config,

    // --- Service lifecycle timeouts (§5) ---
    pub initialization_timeout: Duration,
    pub cleanup_timeout: Duration,

    // --- Storage retry policy (§6 "Storage Backend") ---
    pub storage_get_retries: u32,
    pub storage_retry_backoff: [Duration; 3],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_compression: true,
            compression_algorithm: CompressionType::Gzip,
            compression_level: 6,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_file_size: 1024 * 1024 * 1024,

            enable_searchable_encryption: true,

            enable_integrity_validation: true,

            enable_key_rotation: true,
            enable_perfect_forward_secrecy: true,
            enable_compromise_detection: true,

            search: zkim_search::Config::default(),

            initialization_timeout: Duration::from_secs(30),
            cleanup_timeout: Duration::from_secs(10),

            storage_get_retries: 3,
            storage_retry_backoff: [
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(3),
            ],
        }
    }
}

impl Config {
    /// Clamp a caller-supplied compression level into the valid range for
    /// `compression_algorithm`, per §6 "compressionLevel (0-9, clamped)".
    pub fn clamped_compression_level(&self) -> u32 {
        match self.compression_algorithm {
            CompressionType::Brotli => self.compression_level.min(11),
            _ => self.compression_level.min(9),
        }
    }

    pub fn validate_chunk_size(&self) -> bool {
        (MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&self.chunk_size)
    }

    pub fn bucket_sizes(&self) -> &[usize] {
        if self.search.bucket_sizes.is_empty() {
            BUCKET_SIZES
        } else {
            &self.search.bucket_sizes
        }
    }
}
