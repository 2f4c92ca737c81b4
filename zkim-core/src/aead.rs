//! AEAD primitive: XChaCha20-Poly1305 (24-byte nonce, 16-byte tag).
//!
//! Every encryption layer (platform, user, content) goes through this
//! module. Nonces are always drawn fresh from the OS RNG — never derived
//! from `fileId` or any other container field (mandatory per the
//! nonce-provenance design note).

extern crate alloc;
use alloc::vec::Vec;

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use getrandom::getrandom;

use crate::error::{DecryptionError, EncodingError};

pub const NONCE_BYTES: usize = 24;
pub const KEY_BYTES: usize = 32;
pub const TAG_BYTES: usize = 16;

/// Generate a random 24-byte nonce. Used during encryption only.
pub fn nonce() -> Result<[u8; NONCE_BYTES], EncodingError> {
    let mut n = [0u8; NONCE_BYTES];
    getrandom(&mut n).map_err(|_| EncodingError)?;
    Ok(n)
}

/// AEAD seal (encrypt path). Returns `EncodingError` on failure.
pub fn aead_seal(
    key: &[u8; KEY_BYTES],
    nonce: &[u8; NONCE_BYTES],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, EncodingError> {
    let cipher = XChaCha20Poly1305::new_from_slice(key).map_err(|_| EncodingError)?;
    let n = XNonce::from_slice(nonce);
    let payload = Payload { msg: plaintext, aad };
    cipher.encrypt(n, payload).map_err(|_| EncodingError)
}

/// AEAD open (decrypt path). Returns `DecryptionError` on failure, never
/// distinguishing wrong-key from tampered-ciphertext from wrong-nonce.
pub fn aead_open(
    key: &[u8; KEY_BYTES],
    nonce: &[u8; NONCE_BYTES],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, DecryptionError> {
    let cipher = XChaCha20Poly1305::new_from_slice(key).map_err(|_| DecryptionError)?;
    let n = XNonce::from_slice(nonce);
    let payload = Payload { msg: ciphertext, aad };
    cipher.decrypt(n, payload).map_err(|_| DecryptionError)
}
