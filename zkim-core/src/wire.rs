//! Wire Codec (§4.1): bit-exact container serialize/parse.
//!
//! Byte layout:
//!   MAGIC(4) | VERSION(u16-LE) | FLAGS(u16-LE)
//!   | HEADER_TLV | METADATA_TLV | KEM_CIPHERTEXT_TLV | CHUNK_TLV*
//!   | PLATFORM_SIG(3309) | USER_SIG(3309) | CONTENT_SIG(3309)
//!
//! Each TLV is `type(u8) | length(u32-LE) | payload(length bytes)`. TLVs
//! must appear in the stated order, exactly once each (chunks: zero or
//! more, in `chunkIndex` order). The encoder is deterministic: identical
//! containers always produce identical bytes.

extern crate alloc;
use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::WireError;
use crate::model::{
    AccessControl, Chunk, CompressionType, Container, CustomFields, EncryptionType, HashType,
    Header, LayerCiphertext, Metadata, RetentionPolicy, SignatureType, CHUNK_NONCE_BYTES,
    FILE_ID_BYTES, INTEGRITY_HASH_BYTES, MAGIC, SIGNATURE_BYTES,
};

pub const CONTAINER_VERSION: u16 = 1;
pub const FLAGS_V1: u16 = 0x0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum TlvType {
    Header = 0x01,
    Metadata = 0x02,
    KemCiphertext = 0x03,
    Chunk = 0x04,
}

// ---------------------------------------------------------------------------
// Low-level byte-buffer helpers
// ---------------------------------------------------------------------------

pub(crate) struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub(crate) fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub(crate) fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub(crate) fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn bytes(&mut self, v: &[u8]) {
        self.buf.extend_from_slice(v);
    }

    pub(crate) fn lp_bytes(&mut self, v: &[u8]) {
        self.u16(v.len() as u16);
        self.bytes(v);
    }

    pub(crate) fn lp_str(&mut self, v: &str) {
        self.lp_bytes(v.as_bytes());
    }
}

pub(crate) struct Reader<'a> {
    pub(crate) buf: &'a [u8],
    pub(crate) pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if self.remaining() < n {
            return Err(WireError::Truncated);
        }
        let s = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, WireError> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16, WireError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub(crate) fn u32(&mut self) -> Result<u32, WireError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn u64(&mut self) -> Result<u64, WireError> {
        let b = self.take(8)?;
        let mut a = [0u8; 8];
        a.copy_from_slice(b);
        Ok(u64::from_le_bytes(a))
    }

    pub(crate) fn lp_bytes(&mut self) -> Result<Vec<u8>, WireError> {
        let len = self.u16()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    pub(crate) fn lp_str(&mut self) -> Result<String, WireError> {
        let bytes = self.lp_bytes()?;
        String::from_utf8(bytes).map_err(|_| WireError::InvalidInput)
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

pub(crate) fn encode_header(h: &Header) -> Vec<u8> {
    let mut w = Writer::new();
    w.bytes(&h.file_id);
    w.lp_bytes(&h.user_id);
    w.lp_bytes(&h.platform_key_id);
    w.u64(h.total_size);
    w.u32(h.chunk_count);
    w.u64(h.created_at);
    w.u8(h.compression_type.as_u8());
    w.u8(h.encryption_type.as_u8());
    w.u8(h.hash_type.as_u8());
    w.u8(h.signature_type.as_u8());
    w.buf
}

pub(crate) fn decode_header(buf: &[u8]) -> Result<Header, WireError> {
    let mut r = Reader::new(buf);
    let file_id_bytes = r.take(FILE_ID_BYTES)?;
    let mut file_id = [0u8; FILE_ID_BYTES];
    file_id.copy_from_slice(file_id_bytes);
    let user_id = r.lp_bytes()?;
    let platform_key_id = r.lp_bytes()?;
    let total_size = r.u64()?;
    let chunk_count = r.u32()?;
    let created_at = r.u64()?;
    let compression_type = CompressionType::from_u8(r.u8()?)?;
    let encryption_type = EncryptionType::from_u8(r.u8()?)?;
    let hash_type = HashType::from_u8(r.u8()?)?;
    let signature_type = SignatureType::from_u8(r.u8()?)?;
    if r.remaining() != 0 {
        return Err(WireError::InvalidInput);
    }
    Ok(Header {
        file_id,
        user_id,
        platform_key_id,
        total_size,
        chunk_count,
        created_at,
        compression_type,
        encryption_type,
        hash_type,
        signature_type,
    })
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

pub(crate) fn encode_metadata(m: &Metadata) -> Vec<u8> {
    let mut w = Writer::new();
    w.lp_str(&m.file_name);
    w.lp_str(&m.mime_type);
    w.u64(m.created_at);

    w.u16(m.tags.len() as u16);
    for tag in &m.tags {
        w.lp_str(tag);
    }

    w.u16(m.custom_fields.strings.len() as u16);
    for (k, v) in &m.custom_fields.strings {
        w.lp_str(k);
        w.lp_str(v);
    }

    match &m.access_control {
        None => w.u8(0),
        Some(ac) => {
            w.u8(1);
            w.u16(ac.read_access.len() as u16);
            for u in &ac.read_access {
                w.lp_str(u);
            }
            w.u16(ac.write_access.len() as u16);
            for u in &ac.write_access {
                w.lp_str(u);
            }
            w.u16(ac.delete_access.len() as u16);
            for u in &ac.delete_access {
                w.lp_str(u);
            }
        }
    }

    match &m.retention_policy {
        None => w.u8(0),
        Some(rp) => {
            w.u8(1);
            match rp.expires_at {
                None => w.u8(0),
                Some(t) => {
                    w.u8(1);
                    w.u64(t);
                }
            }
            match rp.max_access_count {
                None => w.u8(0),
                Some(c) => {
                    w.u8(1);
                    w.u64(c);
                }
            }
            w.u8(if rp.auto_delete { 1 } else { 0 });
        }
    }

    w.buf
}

pub(crate) fn decode_metadata(buf: &[u8]) -> Result<Metadata, WireError> {
    let mut r = Reader::new(buf);
    let file_name = r.lp_str()?;
    let mime_type = r.lp_str()?;
    let created_at = r.u64()?;

    let tag_count = r.u16()?;
    let mut tags = BTreeSet::new();
    for _ in 0..tag_count {
        tags.insert(r.lp_str()?);
    }

    let field_count = r.u16()?;
    let mut custom_fields = CustomFields::default();
    for _ in 0..field_count {
        let k = r.lp_str()?;
        let v = r.lp_str()?;
        custom_fields.strings.insert(k, v);
    }

    let access_control = match r.u8()? {
        0 => None,
        1 => {
            let mut ac = AccessControl::default();
            let rc = r.u16()?;
            for _ in 0..rc {
                ac.read_access.insert(r.lp_str()?);
            }
            let wc = r.u16()?;
            for _ in 0..wc {
                ac.write_access.insert(r.lp_str()?);
            }
            let dc = r.u16()?;
            for _ in 0..dc {
                ac.delete_access.insert(r.lp_str()?);
            }
            Some(ac)
        }
        _ => return Err(WireError::InvalidInput),
    };

    let retention_policy = match r.u8()? {
        0 => None,
        1 => {
            let expires_at = match r.u8()? {
                0 => None,
                1 => Some(r.u64()?),
                _ => return Err(WireError::InvalidInput),
            };
            let max_access_count = match r.u8()? {
                0 => None,
                1 => Some(r.u64()?),
                _ => return Err(WireError::InvalidInput),
            };
            let auto_delete = r.u8()? != 0;
            Some(RetentionPolicy {
                expires_at,
                max_access_count,
                auto_delete,
            })
        }
        _ => return Err(WireError::InvalidInput),
    };

    if r.remaining() != 0 {
        return Err(WireError::InvalidInput);
    }

    Ok(Metadata {
        file_name,
        mime_type,
        created_at,
        tags,
        custom_fields,
        access_control,
        retention_policy,
    })
}

// ---------------------------------------------------------------------------
// KEM ciphertext block
// ---------------------------------------------------------------------------

fn encode_layer(w: &mut Writer, layer: &LayerCiphertext) {
    w.bytes(&layer.nonce);
    w.u32(layer.ciphertext.len() as u32);
    w.bytes(&layer.ciphertext);
}

fn decode_layer(r: &mut Reader) -> Result<LayerCiphertext, WireError> {
    let nonce_bytes = r.take(CHUNK_NONCE_BYTES)?;
    let mut nonce = [0u8; CHUNK_NONCE_BYTES];
    nonce.copy_from_slice(nonce_bytes);
    let len = r.u32()? as usize;
    let ciphertext = r.take(len)?.to_vec();
    Ok(LayerCiphertext { nonce, ciphertext })
}

fn encode_kem_block(
    kem_ciphertext: &[u8],
    wrapped_kem_secret: &[u8],
    platform_layer: &LayerCiphertext,
    user_layer: &LayerCiphertext,
) -> Vec<u8> {
    let mut w = Writer::new();
    w.u32(kem_ciphertext.len() as u32);
    w.bytes(kem_ciphertext);
    w.u32(wrapped_kem_secret.len() as u32);
    w.bytes(wrapped_kem_secret);
    encode_layer(&mut w, platform_layer);
    encode_layer(&mut w, user_layer);
    w.buf
}

#[allow(clippy::type_complexity)]
pub(crate) fn decode_kem_block(
    buf: &[u8],
) -> Result<(Vec<u8>, Vec<u8>, LayerCiphertext, LayerCiphertext), WireError> {
    let mut r = Reader::new(buf);
    let ct_len = r.u32()? as usize;
    let kem_ciphertext = r.take(ct_len)?.to_vec();
    let wrap_len = r.u32()? as usize;
    let wrapped_kem_secret = r.take(wrap_len)?.to_vec();
    let platform_layer = decode_layer(&mut r)?;
    let user_layer = decode_layer(&mut r)?;
    if r.remaining() != 0 {
        return Err(WireError::InvalidInput);
    }
    Ok((kem_ciphertext, wrapped_kem_secret, platform_layer, user_layer))
}

// ---------------------------------------------------------------------------
// Chunk
// ---------------------------------------------------------------------------

fn encode_chunk(c: &Chunk) -> Vec<u8> {
    let mut w = Writer::new();
    w.u32(c.chunk_index);
    w.u32(c.chunk_size);
    w.u32(c.compressed_size);
    w.u32(c.encrypted_size);
    w.bytes(&c.nonce);
    w.bytes(&c.integrity_hash);
    w.u32(c.encrypted_data.len() as u32);
    w.bytes(&c.encrypted_data);
    w.buf
}

pub(crate) fn decode_chunk(buf: &[u8]) -> Result<Chunk, WireError> {
    let mut r = Reader::new(buf);
    let chunk_index = r.u32()?;
    let chunk_size = r.u32()?;
    let compressed_size = r.u32()?;
    let encrypted_size = r.u32()?;
    let nonce_bytes = r.take(CHUNK_NONCE_BYTES)?;
    let mut nonce = [0u8; CHUNK_NONCE_BYTES];
    nonce.copy_from_slice(nonce_bytes);
    let hash_bytes = r.take(INTEGRITY_HASH_BYTES)?;
    let mut integrity_hash = [0u8; INTEGRITY_HASH_BYTES];
    integrity_hash.copy_from_slice(hash_bytes);
    let data_len = r.u32()? as usize;
    let encrypted_data = r.take(data_len)?.to_vec();
    if r.remaining() != 0 {
        return Err(WireError::InvalidInput);
    }
    Ok(Chunk {
        chunk_index,
        chunk_size,
        compressed_size,
        encrypted_size,
        nonce,
        encrypted_data,
        integrity_hash,
    })
}

// ---------------------------------------------------------------------------
// TLV frame helpers
// ---------------------------------------------------------------------------

fn write_tlv(w: &mut Writer, ty: TlvType, payload: &[u8]) {
    w.u8(ty as u8);
    w.u32(payload.len() as u32);
    w.bytes(payload);
}

pub(crate) struct TlvFrame<'a> {
    pub(crate) ty: u8,
    pub(crate) payload: &'a [u8],
}

pub(crate) fn read_tlv<'a>(r: &mut Reader<'a>) -> Result<TlvFrame<'a>, WireError> {
    let ty = r.u8()?;
    let len = r.u32()? as usize;
    let payload = r.take(len)?;
    Ok(TlvFrame { ty, payload })
}

// ---------------------------------------------------------------------------
// Public container encode/decode
// ---------------------------------------------------------------------------

/// Everything that precedes the three trailing signature blocks: magic,
/// version, flags and the header/metadata/KEM/chunk TLVs. Shared by
/// [`encode`] and [`encode_unsigned`] so the bytes actually signed over can
/// never drift from the bytes the signature blocks are appended to.
fn encode_body(container: &Container) -> Vec<u8> {
    let mut w = Writer::new();
    w.bytes(&MAGIC);
    w.u16(CONTAINER_VERSION);
    w.u16(FLAGS_V1);

    write_tlv(&mut w, TlvType::Header, &encode_header(&container.header));
    write_tlv(&mut w, TlvType::Metadata, &encode_metadata(&container.metadata));
    write_tlv(
        &mut w,
        TlvType::KemCiphertext,
        &encode_kem_block(
            &container.kem_ciphertext,
            &container.wrapped_kem_secret,
            &container.platform_layer,
            &container.user_layer,
        ),
    );

    let mut chunks_sorted = container.chunks.clone();
    chunks_sorted.sort_by_key(|c| c.chunk_index);
    for chunk in &chunks_sorted {
        write_tlv(&mut w, TlvType::Chunk, &encode_chunk(chunk));
    }

    w.buf
}

/// Encode a container to its deterministic byte layout. Fails with
/// `InvalidInput` only when the container's own invariants (§3) don't hold.
pub fn encode(container: &Container) -> Result<Vec<u8>, WireError> {
    container.validate_chunk_invariants()?;

    let mut buf = encode_body(container);
    buf.extend_from_slice(&container.platform_signature);
    buf.extend_from_slice(&container.user_signature);
    buf.extend_from_slice(&container.content_signature);

    Ok(buf)
}

/// The exact byte string the platform/user/content signatures are computed
/// over: the container body with every signature slot zeroed, so signing
/// and verification never depend on what (if anything) is already in those
/// slots.
pub fn encode_unsigned(container: &Container) -> Vec<u8> {
    encode_body(container)
}

/// Decode a container from its byte layout.
pub fn decode(data: &[u8]) -> Result<Container, WireError> {
    if data.len() < 8 {
        return Err(WireError::Truncated);
    }
    if data[0..4] != MAGIC {
        return Err(WireError::InvalidMagic);
    }

    let mut r = Reader::new(data);
    let _magic = r.take(4)?;
    let version = r.u16()?;
    if version != CONTAINER_VERSION {
        return Err(WireError::UnsupportedVersion);
    }
    let _flags = r.u16()?;

    let header_frame = read_tlv(&mut r)?;
    if header_frame.ty != TlvType::Header as u8 {
        return Err(WireError::InvalidInput);
    }
    let header = decode_header(header_frame.payload)?;

    let metadata_frame = read_tlv(&mut r)?;
    if metadata_frame.ty != TlvType::Metadata as u8 {
        return Err(WireError::InvalidInput);
    }
    let metadata = decode_metadata(metadata_frame.payload)?;

    let kem_frame = read_tlv(&mut r)?;
    if kem_frame.ty != TlvType::KemCiphertext as u8 {
        return Err(WireError::InvalidInput);
    }
    let (kem_ciphertext, wrapped_kem_secret, platform_layer, user_layer) =
        decode_kem_block(kem_frame.payload)?;

    let mut chunks = Vec::with_capacity(header.chunk_count as usize);
    let mut seen_indices = BTreeSet::new();
    for _ in 0..header.chunk_count {
        let frame = read_tlv(&mut r)?;
        if frame.ty != TlvType::Chunk as u8 {
            return Err(WireError::InvalidInput);
        }
        let chunk = decode_chunk(frame.payload)?;
        if !seen_indices.insert(chunk.chunk_index) {
            return Err(WireError::DuplicateFrame);
        }
        chunks.push(chunk);
    }

    // Reject an extra chunk frame beyond the declared count (multiplicity
    // violation) by peeking: if the next byte parses as a chunk TLV type
    // while we've already consumed `chunk_count` chunks, that's a
    // duplicate-frame situation rather than the start of the signatures.
    if r.remaining() >= 1 && data[r.pos] == TlvType::Chunk as u8 && r.remaining() > SIGNATURE_BYTES * 3 {
        return Err(WireError::DuplicateFrame);
    }

    if r.remaining() != SIGNATURE_BYTES * 3 {
        return Err(WireError::Truncated);
    }

    let mut platform_signature = [0u8; SIGNATURE_BYTES];
    platform_signature.copy_from_slice(r.take(SIGNATURE_BYTES)?);
    let mut user_signature = [0u8; SIGNATURE_BYTES];
    user_signature.copy_from_slice(r.take(SIGNATURE_BYTES)?);
    let mut content_signature = [0u8; SIGNATURE_BYTES];
    content_signature.copy_from_slice(r.take(SIGNATURE_BYTES)?);

    if r.remaining() != 0 {
        return Err(WireError::Truncated);
    }

    let container = Container {
        header,
        metadata,
        kem_ciphertext,
        wrapped_kem_secret,
        platform_layer,
        user_layer,
        chunks,
        platform_signature,
        user_signature,
        content_signature,
    };
    container.validate_chunk_invariants()?;
    Ok(container)
}
