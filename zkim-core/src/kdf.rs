//! Key derivation for the three-layer schedule.
//!
//! `info = PROTOCOL_ID || "|" || purpose || "|" || ct_hash || context`
//! `key  = HKDF-SHA256(shared_secret, salt=None, info=info, len=32)`
//!
//! Each of the platform/user/content layers gets a distinct `purpose` tag
//! so that deriving one layer's key can never collide with another's even
//! when the shared secret and context happen to coincide.

extern crate alloc;
use alloc::vec::Vec;

use hkdf::Hkdf;
use sha2::Sha256;
use sha3::{Digest, Sha3_256};

use crate::error::EncodingError;

pub const PROTOCOL_ID: &[u8] = b"zkim-v1";

pub const PURPOSE_PLATFORM: &[u8] = b"platform";
pub const PURPOSE_USER: &[u8] = b"user";
pub const PURPOSE_CONTENT: &[u8] = b"content";
pub const PURPOSE_KEM_WRAP: &[u8] = b"kem-wrap";

/// SHA3-256 over an opaque byte string (used to bind a derived key to the
/// KEM ciphertext that produced the shared secret it's derived from).
pub fn ct_hash(bytes: &[u8]) -> [u8; 32] {
    let h = Sha3_256::digest(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&h);
    out
}

/// Derive a 32-byte key for `purpose` from `shared_secret`, binding in
/// `ct_hash` (KEM ciphertext hash) and caller-supplied `context` bytes.
pub fn derive_key(
    shared_secret: &[u8],
    purpose: &[u8],
    ct_hash: &[u8; 32],
    context: &[u8],
) -> Result<[u8; 32], EncodingError> {
    let mut info =
        Vec::with_capacity(PROTOCOL_ID.len() + 2 + purpose.len() + 32 + context.len());
    info.extend_from_slice(PROTOCOL_ID);
    info.push(b'|');
    info.extend_from_slice(purpose);
    info.push(b'|');
    info.extend_from_slice(ct_hash);
    info.extend_from_slice(context);

    let hk = Hkdf::<Sha256>::new(None, shared_secret);
    let mut out = [0u8; 32];
    hk.expand(&info, &mut out).map_err(|_| EncodingError)?;
    Ok(out)
}

/// Derive the effective platform key: `KDF(shared_secret || caller_platform_key)`,
/// expressed here as HKDF over the shared secret with the caller key folded
/// into the context so a caller who doesn't hold the shared secret cannot
/// reproduce the derivation.
pub fn derive_platform_key(
    shared_secret: &[u8],
    caller_platform_key: &[u8],
    ct_hash: &[u8; 32],
) -> Result<[u8; 32], EncodingError> {
    derive_key(shared_secret, PURPOSE_PLATFORM, ct_hash, caller_platform_key)
}

/// Derive the effective user key, analogous to [`derive_platform_key`].
pub fn derive_user_key(
    shared_secret: &[u8],
    caller_user_key: &[u8],
    ct_hash: &[u8; 32],
) -> Result<[u8; 32], EncodingError> {
    derive_key(shared_secret, PURPOSE_USER, ct_hash, caller_user_key)
}

/// Derive the key used to wrap the per-file KEM secret key directly from
/// the caller's user key material (*not* the post-decapsulation effective
/// user key — unwrapping has to happen before the shared secret is known,
/// since decapsulation needs the unwrapped secret key first).
pub fn derive_wrap_key(
    caller_user_key: &[u8],
    ct_hash: &[u8; 32],
    file_id: &[u8],
) -> Result<[u8; 32], EncodingError> {
    derive_key(caller_user_key, PURPOSE_KEM_WRAP, ct_hash, file_id)
}
