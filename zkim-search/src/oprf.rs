//! OPRF (§4.4): an elliptic-curve-group trapdoor function over Ristretto255,
//! the prime-order group already used for the hybrid KEM's classical half
//! (`curve25519-dalek`, the same `dalek-cryptography` family as
//! `x25519-dalek` in `zkim-core::kem`).
//!
//! `trapdoor(key, token) = H(token)^key`, computed as a scalar
//! multiplication of a hash-to-group point by the server-held scalar key.
//! The plaintext token is hashed and discarded; only the resulting group
//! element (encoded as 32 bytes) is ever stored or compared.

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha512};

pub const TRAPDOOR_BYTES: usize = 32;

/// The server-side OPRF key. One instance is shared by a `SearchIndex` and
/// every `Trapdoor` it manages, since `search` must evaluate query tokens
/// under the exact key `indexFile` used.
#[derive(Clone)]
pub struct OprfKey(Scalar);

impl OprfKey {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 64];
        OsRng.fill_bytes(&mut bytes);
        Self(Scalar::from_bytes_mod_order_wide(&bytes))
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self(Scalar::from_bytes_mod_order(*bytes))
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }
}

fn hash_to_group(token: &str) -> RistrettoPoint {
    let expanded = Sha512::digest(token.as_bytes());
    let mut wide = [0u8; 64];
    wide.copy_from_slice(&expanded);
    RistrettoPoint::from_uniform_bytes(&wide)
}

/// Evaluate the OPRF on `token` under `key`, returning the 32-byte
/// compressed group element. Equality of these outputs, never the token
/// itself, is what the Search Index compares.
pub fn trapdoor(key: &OprfKey, token: &str) -> [u8; TRAPDOOR_BYTES] {
    let point = hash_to_group(token) * key.0;
    point.compress().to_bytes()
}

/// Hex rendering of a trapdoor output, for audit/debug logging where the
/// raw bytes would otherwise need manual formatting.
pub fn trapdoor_hex(trapdoor: &[u8; TRAPDOOR_BYTES]) -> String {
    hex::encode(trapdoor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_same_token_matches() {
        let key = OprfKey::generate();
        assert_eq!(trapdoor(&key, "report"), trapdoor(&key, "report"));
    }

    #[test]
    fn different_tokens_differ() {
        let key = OprfKey::generate();
        assert_ne!(trapdoor(&key, "report"), trapdoor(&key, "invoice"));
    }

    #[test]
    fn different_keys_differ() {
        let k1 = OprfKey::generate();
        let k2 = OprfKey::generate();
        assert_ne!(trapdoor(&k1, "report"), trapdoor(&k2, "report"));
    }

    #[test]
    fn key_round_trips_through_bytes() {
        let key = OprfKey::generate();
        let restored = OprfKey::from_bytes(&key.to_bytes());
        assert_eq!(trapdoor(&key, "report"), trapdoor(&restored, "report"));
    }
}
