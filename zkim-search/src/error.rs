//! Error taxonomy for trapdoor lifecycle and search index operations (§7
//! "Lifecycle" family), matching `zkim-core::error`'s hand-written,
//! `thiserror`-free convention.

use std::fmt;

/// Lifecycle-family failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    TrapdoorNotFound,
    TrapdoorRevoked,
    MaxTrapdoorsExceeded,
    RateLimitExceeded,
    SearchableEncryptionDisabled,
}

impl LifecycleError {
    pub fn error_code(&self) -> &'static str {
        match self {
            LifecycleError::TrapdoorNotFound => "TrapdoorNotFound",
            LifecycleError::TrapdoorRevoked => "TrapdoorRevoked",
            LifecycleError::MaxTrapdoorsExceeded => "MaxTrapdoorsExceeded",
            LifecycleError::RateLimitExceeded => "RateLimitExceeded",
            LifecycleError::SearchableEncryptionDisabled => "SearchableEncryptionDisabled",
        }
    }
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error_code())
    }
}

impl std::error::Error for LifecycleError {}

/// Specific operation error wrappers, mirroring `zkim-core`'s
/// `From<Inner>`-wrapping convention (`GenerateError`/`RotateError` style).
#[derive(Debug)]
pub struct CreateError(pub LifecycleError);
impl fmt::Display for CreateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::error::Error for CreateError {}
impl From<LifecycleError> for CreateError {
    fn from(e: LifecycleError) -> Self {
        Self(e)
    }
}

#[derive(Debug)]
pub struct RotateError(pub LifecycleError);
impl fmt::Display for RotateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::error::Error for RotateError {}
impl From<LifecycleError> for RotateError {
    fn from(e: LifecycleError) -> Self {
        Self(e)
    }
}

#[derive(Debug)]
pub struct SearchError(pub LifecycleError);
impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::error::Error for SearchError {}
impl From<LifecycleError> for SearchError {
    fn from(e: LifecycleError) -> Self {
        Self(e)
    }
}
