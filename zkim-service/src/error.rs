//! Error taxonomy for the service facade (§7): the `Storage`/`Service`
//! families, plus the uniform result envelope used by the public
//! operations that "can plausibly succeed despite failure" (search,
//! recovery, `getFile`/`downloadFile`) per §7's unification policy.
//!
//! Conventions mirror `zkim-core::error` and `zkim-search::error`: plain
//! enums/structs with hand-written `Display` + `std::error::Error`, no
//! `thiserror`/`anyhow`.

use std::fmt;

use zkim_core::error::{CryptoError, RecoveryError, WireError};
use zkim_search::error::LifecycleError;

/// Storage-family failures (§7 "Storage").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    FileNotFound,
    StorageUnavailable(String),
    Timeout,
}

impl StorageError {
    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::FileNotFound => "FileNotFound",
            StorageError::StorageUnavailable(_) => "StorageUnavailable",
            StorageError::Timeout => "Timeout",
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::FileNotFound => write!(f, "file not found"),
            StorageError::StorageUnavailable(msg) => write!(f, "storage unavailable: {msg}"),
            StorageError::Timeout => write!(f, "storage operation timed out"),
        }
    }
}

impl std::error::Error for StorageError {}

/// Service-lifecycle failures (§7 "Service").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceLifecycleError {
    NotInitialized,
    AlreadyInitialized,
    CleanupFailed(String),
    Timeout,
    KeyRotationDisabled,
    CompromiseDetectionDisabled,
}

impl ServiceLifecycleError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceLifecycleError::NotInitialized => "NotInitialized",
            ServiceLifecycleError::AlreadyInitialized => "AlreadyInitialized",
            ServiceLifecycleError::CleanupFailed(_) => "CleanupFailed",
            ServiceLifecycleError::Timeout => "Timeout",
            ServiceLifecycleError::KeyRotationDisabled => "KeyRotationDisabled",
            ServiceLifecycleError::CompromiseDetectionDisabled => "CompromiseDetectionDisabled",
        }
    }
}

impl fmt::Display for ServiceLifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error_code())
    }
}

impl std::error::Error for ServiceLifecycleError {}

/// Aggregate error for operations that return a typed `Result` rather than
/// an envelope (`createFile`, `decryptFile`, `updateMetadata`, trapdoor
/// lifecycle operations). Mirrors `zkim_core::error::ZkimError`'s
/// `From<Inner>`-composing shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    Wire(WireError),
    Crypto(CryptoError),
    Recovery(RecoveryError),
    Lifecycle(LifecycleError),
    Storage(StorageError),
    Service(ServiceLifecycleError),
    Invalid(String),
}

impl ServiceError {
    pub fn error_code(&self) -> &str {
        match self {
            ServiceError::Wire(e) => e.error_code(),
            ServiceError::Crypto(e) => e.error_code(),
            ServiceError::Recovery(e) => e.error_code(),
            ServiceError::Lifecycle(e) => e.error_code(),
            ServiceError::Storage(e) => e.error_code(),
            ServiceError::Service(e) => e.error_code(),
            ServiceError::Invalid(_) => "InvalidInput",
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Wire(e) => write!(f, "{e}"),
            ServiceError::Crypto(e) => write!(f, "{e}"),
            ServiceError::Recovery(e) => write!(f, "{e}"),
            ServiceError::Lifecycle(e) => write!(f, "{e}"),
            ServiceError::Storage(e) => write!(f, "{e}"),
            ServiceError::Service(e) => write!(f, "{e}"),
            ServiceError::Invalid(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<WireError> for ServiceError {
    fn from(e: WireError) -> Self {
        ServiceError::Wire(e)
    }
}
impl From<CryptoError> for ServiceError {
    fn from(e: CryptoError) -> Self {
        ServiceError::Crypto(e)
    }
}
impl From<RecoveryError> for ServiceError {
    fn from(e: RecoveryError) -> Self {
        ServiceError::Recovery(e)
    }
}
impl From<LifecycleError> for ServiceError {
    fn from(e: LifecycleError) -> Self {
        ServiceError::Lifecycle(e)
    }
}
impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        ServiceError::Storage(e)
    }
}
impl From<ServiceLifecycleError> for ServiceError {
    fn from(e: ServiceLifecycleError) -> Self {
        ServiceError::Service(e)
    }
}

/// Uniform result envelope (§7): `{success, data?, error?, errorCode?}`,
/// for operations where failure is itself useful information to the
/// caller (search, recovery, `getFile`/`downloadFile`) rather than a hard
/// stop. `error` is advisory free text; `error_code` is the stable
/// taxonomy string.
#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub error_code: Option<&'static str>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None, error_code: None }
    }

    pub fn err(err: &ServiceError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.to_string()),
            error_code: Some(err.error_code()),
        }
    }
}
