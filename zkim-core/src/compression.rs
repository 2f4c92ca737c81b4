//! Compression Codec (§1, §6 consumed collaborator; §4.3 consumer).
//!
//! The core only depends on the abstract `CompressionCodec` trait; the
//! concrete codecs here (`gzip` via `flate2`, `brotli` via `brotli`) are
//! provided implementations a caller may swap out, matching the spec's
//! framing of compression as an external collaborator interface.

extern crate alloc;
use alloc::vec::Vec;

use crate::model::CompressionType;

/// A reversible byte transform with a named algorithm tag.
pub trait CompressionCodec: Send + Sync {
    fn algorithm(&self) -> CompressionType;
    fn compress(&self, data: &[u8], level: u32) -> Result<Vec<u8>, CompressionError>;
    fn decompress(&self, data: &[u8], expected_size: usize) -> Result<Vec<u8>, CompressionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionError;

impl core::fmt::Display for CompressionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "compression error")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CompressionError {}

/// Passthrough codec used when compression is disabled or has failed.
pub struct NoneCodec;

impl CompressionCodec for NoneCodec {
    fn algorithm(&self) -> CompressionType {
        CompressionType::None
    }

    fn compress(&self, data: &[u8], _level: u32) -> Result<Vec<u8>, CompressionError> {
        Ok(data.to_vec())
    }

    fn decompress(&self, data: &[u8], _expected_size: usize) -> Result<Vec<u8>, CompressionError> {
        Ok(data.to_vec())
    }
}

#[cfg(feature = "std")]
pub struct GzipCodec;

#[cfg(feature = "std")]
impl CompressionCodec for GzipCodec {
    fn algorithm(&self) -> CompressionType {
        CompressionType::Gzip
    }

    fn compress(&self, data: &[u8], level: u32) -> Result<Vec<u8>, CompressionError> {
        use std::io::Write;
        let level = level.min(9);
        let mut enc =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::new(level));
        enc.write_all(data).map_err(|_| CompressionError)?;
        enc.finish().map_err(|_| CompressionError)
    }

    fn decompress(&self, data: &[u8], expected_size: usize) -> Result<Vec<u8>, CompressionError> {
        use std::io::Read;
        let mut dec = flate2::read::GzDecoder::new(data);
        let mut out = Vec::with_capacity(expected_size);
        dec.read_to_end(&mut out).map_err(|_| CompressionError)?;
        Ok(out)
    }
}

#[cfg(feature = "std")]
pub struct BrotliCodec;

#[cfg(feature = "std")]
impl CompressionCodec for BrotliCodec {
    fn algorithm(&self) -> CompressionType {
        CompressionType::Brotli
    }

    fn compress(&self, data: &[u8], level: u32) -> Result<Vec<u8>, CompressionError> {
        let quality = level.min(11);
        let params = brotli::enc::BrotliEncoderParams {
            quality: quality as i32,
            ..Default::default()
        };
        let mut out = Vec::new();
        let mut input = data;
        brotli::BrotliCompress(&mut input, &mut out, &params).map_err(|_| CompressionError)?;
        Ok(out)
    }

    fn decompress(&self, data: &[u8], expected_size: usize) -> Result<Vec<u8>, CompressionError> {
        let mut out = Vec::with_capacity(expected_size);
        let mut input = data;
        brotli::BrotliDecompress(&mut input, &mut out).map_err(|_| CompressionError)?;
        Ok(out)
    }
}

/// Resolve the codec implementation for a named algorithm tag.
#[cfg(feature = "std")]
pub fn codec_for(kind: CompressionType) -> alloc::boxed::Box<dyn CompressionCodec> {
    match kind {
        CompressionType::None => alloc::boxed::Box::new(NoneCodec),
        CompressionType::Gzip => alloc::boxed::Box::new(GzipCodec),
        CompressionType::Brotli => alloc::boxed::Box::new(BrotliCodec),
    }
}
