//! Post-quantum signatures: ML-DSA-65 (FIPS 204), matching the header's
//! `signatureType = 1` and the wire layout's fixed 3309-byte signature
//! slots (platform, user, content).

extern crate alloc;
use alloc::vec::Vec;

use pqcrypto_mldsa::mldsa65::{
    detached_sign, keypair, verify_detached_signature, DetachedSignature, PublicKey, SecretKey,
};
use pqcrypto_traits::sign::{
    DetachedSignature as _, PublicKey as _, SecretKey as _,
};

use crate::error::CryptoError;
use crate::model::SIGNATURE_BYTES;

pub struct SigningKeyPair {
    pub public: PublicKey,
    pub secret: SecretKey,
}

pub fn generate_keypair() -> SigningKeyPair {
    let (public, secret) = keypair();
    SigningKeyPair { public, secret }
}

/// Sign `message` and return the fixed-size 3309-byte ML-DSA-65 signature.
pub fn sign(message: &[u8], secret: &SecretKey) -> Result<[u8; SIGNATURE_BYTES], CryptoError> {
    let sig = detached_sign(message, secret);
    let bytes = sig.as_bytes();
    if bytes.len() != SIGNATURE_BYTES {
        return Err(CryptoError::SignatureFailed);
    }
    let mut out = [0u8; SIGNATURE_BYTES];
    out.copy_from_slice(bytes);
    Ok(out)
}

/// Verify a signature produced by [`sign`]. Failure is reported uniformly
/// as `SignatureFailed` — never distinguishing a malformed signature from
/// a genuine forgery.
pub fn verify(
    message: &[u8],
    signature: &[u8; SIGNATURE_BYTES],
    public: &PublicKey,
) -> Result<(), CryptoError> {
    let sig = DetachedSignature::from_bytes(signature).map_err(|_| CryptoError::SignatureFailed)?;
    verify_detached_signature(&sig, message, public).map_err(|_| CryptoError::SignatureFailed)
}

pub fn public_key_bytes(pk: &PublicKey) -> Vec<u8> {
    pk.as_bytes().to_vec()
}

pub fn secret_key_bytes(sk: &SecretKey) -> Vec<u8> {
    sk.as_bytes().to_vec()
}

pub fn public_key_from_bytes(bytes: &[u8]) -> Result<PublicKey, CryptoError> {
    PublicKey::from_bytes(bytes).map_err(|_| CryptoError::InvalidEphemeralKey)
}

pub fn secret_key_from_bytes(bytes: &[u8]) -> Result<SecretKey, CryptoError> {
    SecretKey::from_bytes(bytes).map_err(|_| CryptoError::InvalidEphemeralKey)
}
