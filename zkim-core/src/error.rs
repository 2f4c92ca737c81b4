//! Error taxonomy for the ZKIM core: wire framing, cryptography, content
//! processing and corruption recovery.
//!
//! Every type here is a plain enum/unit-struct with a hand-written
//! `Display` + `Error` impl and an `error_code()` accessor returning the
//! stable string named in the error taxonomy — no `thiserror`/`anyhow`.

use core::fmt;

extern crate alloc;
use alloc::string::String;

/// Low-level AEAD failure. Deliberately featureless: callers must not be
/// able to distinguish wrong-key, tampered-ciphertext or wrong-nonce from
/// the error alone (timing/oracle discipline).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptionError;

impl fmt::Display for DecryptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decryption failed")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecryptionError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingError;

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "encoding error")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncodingError {}

impl From<EncodingError> for DecryptionError {
    fn from(_: EncodingError) -> Self {
        DecryptionError
    }
}

/// Wire Codec failures (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    InvalidMagic,
    UnsupportedVersion,
    Truncated,
    InvalidEnum,
    DuplicateFrame,
    InvalidInput,
}

impl WireError {
    pub fn error_code(self) -> &'static str {
        match self {
            WireError::InvalidMagic => "InvalidMagic",
            WireError::UnsupportedVersion => "UnsupportedVersion",
            WireError::Truncated => "Truncated",
            WireError::InvalidEnum => "InvalidEnum",
            WireError::DuplicateFrame => "DuplicateFrame",
            WireError::InvalidInput => "InvalidInput",
        }
    }
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error_code())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for WireError {}

/// Crypto-layer failures (§4.2, §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    InvalidKeyLength,
    InvalidNonceLength,
    InvalidEphemeralKey,
    InvalidCompressionLevel,
    EncryptionFailed,
    DecryptionFailed,
    DecompressionFailed,
    IntegrityFailed,
    SignatureFailed,
    UnsupportedAlgorithm,
    UnsupportedCompression,
    KeyRotationDisabled,
}

impl CryptoError {
    pub fn error_code(self) -> &'static str {
        match self {
            CryptoError::InvalidKeyLength => "InvalidKeyLength",
            CryptoError::InvalidNonceLength => "InvalidNonceLength",
            CryptoError::InvalidEphemeralKey => "InvalidEphemeralKey",
            CryptoError::InvalidCompressionLevel => "InvalidCompressionLevel",
            CryptoError::EncryptionFailed => "EncryptionFailed",
            CryptoError::DecryptionFailed => "DecryptionFailed",
            CryptoError::DecompressionFailed => "DecompressionFailed",
            CryptoError::IntegrityFailed => "IntegrityFailed",
            CryptoError::SignatureFailed => "SignatureFailed",
            CryptoError::UnsupportedAlgorithm => "UnsupportedAlgorithm",
            CryptoError::UnsupportedCompression => "UnsupportedCompression",
            CryptoError::KeyRotationDisabled => "KeyRotationDisabled",
        }
    }
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error_code())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CryptoError {}

impl From<DecryptionError> for CryptoError {
    fn from(_: DecryptionError) -> Self {
        CryptoError::DecryptionFailed
    }
}

impl From<EncodingError> for CryptoError {
    fn from(_: EncodingError) -> Self {
        CryptoError::EncryptionFailed
    }
}

/// Recovery Engine outcomes (§4.6). Never propagated as a thrown error —
/// folded into `RecoveryResult`, but kept as a typed reason so callers can
/// match on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryError {
    ReconstructionDisabled,
    MaxAttemptsExceeded,
    Unrecoverable,
}

impl RecoveryError {
    pub fn error_code(self) -> &'static str {
        match self {
            RecoveryError::ReconstructionDisabled => "ReconstructionDisabled",
            RecoveryError::MaxAttemptsExceeded => "MaxAttemptsExceeded",
            RecoveryError::Unrecoverable => "Unrecoverable",
        }
    }
}

impl fmt::Display for RecoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error_code())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RecoveryError {}

/// Aggregate error used by the uniform result envelope (§7) for any
/// operation that can surface more than one underlying failure family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZkimError {
    Wire(WireError),
    Crypto(CryptoError),
    Recovery(RecoveryError),
    Invalid(String),
}

impl ZkimError {
    pub fn error_code(&self) -> &str {
        match self {
            ZkimError::Wire(e) => e.error_code(),
            ZkimError::Crypto(e) => e.error_code(),
            ZkimError::Recovery(e) => e.error_code(),
            ZkimError::Invalid(_) => "InvalidInput",
        }
    }
}

impl fmt::Display for ZkimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZkimError::Wire(e) => write!(f, "{e}"),
            ZkimError::Crypto(e) => write!(f, "{e}"),
            ZkimError::Recovery(e) => write!(f, "{e}"),
            ZkimError::Invalid(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ZkimError {}

impl From<WireError> for ZkimError {
    fn from(e: WireError) -> Self {
        ZkimError::Wire(e)
    }
}

impl From<CryptoError> for ZkimError {
    fn from(e: CryptoError) -> Self {
        ZkimError::Crypto(e)
    }
}

impl From<RecoveryError> for ZkimError {
    fn from(e: RecoveryError) -> Self {
        ZkimError::Recovery(e)
    }
}

impl From<DecryptionError> for ZkimError {
    fn from(_: DecryptionError) -> Self {
        ZkimError::Crypto(CryptoError::DecryptionFailed)
    }
}

impl From<EncodingError> for ZkimError {
    fn from(_: EncodingError) -> Self {
        ZkimError::Crypto(CryptoError::EncryptionFailed)
    }
}
