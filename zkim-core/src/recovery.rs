//! Recovery Engine (§4.6): best-effort repair of damaged containers.
//!
//! Detection runs the same checks the Wire Codec already performs on
//! decode, then classifies the first failure it hits into a corruption
//! kind and severity. Strategy selection and execution never throw across
//! the public boundary: everything funnels into [`RecoveryResult`].

extern crate alloc;

use crate::error::WireError;
use crate::model::{Container, MAGIC};
use crate::wire;

/// Where the corruption was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptionKind {
    Header,
    Chunk,
    Signature,
    Metadata,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Skip,
    Reconstruct,
    Recover,
    Fail,
}

impl Strategy {
    /// Matrix confidence value (§4.6 "Strategy selection").
    pub fn confidence(self) -> f32 {
        match self {
            Strategy::Skip => 0.8,
            Strategy::Reconstruct => 0.7,
            Strategy::Recover => 0.6,
            Strategy::Fail => 0.2,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Strategy::Skip => "dropping damaged chunk range, surviving chunks retained",
            Strategy::Reconstruct => "reconstructing header/metadata from surviving structure",
            Strategy::Recover => "bypassing signature validation for this read",
            Strategy::Fail => "container is not recoverable",
        }
    }
}

/// Corruption-type x severity -> strategy matrix from §4.6.
pub fn select_strategy(kind: CorruptionKind, severity: Severity) -> (Strategy, f32) {
    let strategy = match (kind, severity) {
        (CorruptionKind::Header, Severity::Critical) => Strategy::Fail,
        (CorruptionKind::Header, _) => Strategy::Reconstruct,
        (CorruptionKind::Chunk, _) => Strategy::Skip,
        (CorruptionKind::Signature, _) => Strategy::Recover,
        (CorruptionKind::Metadata, _) => Strategy::Reconstruct,
        (CorruptionKind::Unknown, _) => Strategy::Fail,
    };
    let confidence = if kind == CorruptionKind::Header && severity == Severity::Critical {
        0.1
    } else if kind == CorruptionKind::Metadata {
        0.5
    } else {
        strategy.confidence()
    };
    (strategy, confidence)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnosis {
    pub kind: CorruptionKind,
    pub severity: Severity,
    /// Human-readable cause, carried through to the failure result so a
    /// caller sees *why* (e.g. "invalid magic bytes") rather than just the
    /// strategy's generic description.
    pub reason: &'static str,
}

/// Sequentially checks minimum size, magic, version, then attempts a full
/// Wire Codec parse, classifying the first failure encountered.
pub fn diagnose(data: &[u8]) -> Option<Diagnosis> {
    if data.len() < 8 {
        return Some(Diagnosis {
            kind: CorruptionKind::Header,
            severity: Severity::Critical,
            reason: "container shorter than the minimum magic+version+flags prefix",
        });
    }
    if data[0..4] != MAGIC {
        return Some(Diagnosis {
            kind: CorruptionKind::Header,
            severity: Severity::Critical,
            reason: "invalid magic bytes",
        });
    }
    match wire::decode(data) {
        Ok(_) => None,
        Err(e) => Some(classify(e)),
    }
}

fn classify(err: WireError) -> Diagnosis {
    match err {
        WireError::InvalidMagic => Diagnosis {
            kind: CorruptionKind::Header,
            severity: Severity::Critical,
            reason: "invalid magic bytes",
        },
        WireError::UnsupportedVersion => Diagnosis {
            kind: CorruptionKind::Header,
            severity: Severity::High,
            reason: "unsupported container version",
        },
        WireError::Truncated => Diagnosis {
            kind: CorruptionKind::Chunk,
            severity: Severity::Medium,
            reason: "truncated chunk or frame data",
        },
        WireError::InvalidEnum => Diagnosis {
            kind: CorruptionKind::Metadata,
            severity: Severity::Low,
            reason: "unknown enum value in header/metadata",
        },
        WireError::DuplicateFrame => Diagnosis {
            kind: CorruptionKind::Chunk,
            severity: Severity::Medium,
            reason: "duplicate or out-of-order frame",
        },
        WireError::InvalidInput => Diagnosis {
            kind: CorruptionKind::Unknown,
            severity: Severity::High,
            reason: "structurally invalid container",
        },
    }
}

/// §4.6's structured, never-throwing recovery outcome.
#[derive(Debug, Clone)]
pub struct RecoveryResult {
    pub success: bool,
    pub recovered_data: Option<alloc::vec::Vec<u8>>,
    pub repair_actions: alloc::vec::Vec<alloc::string::String>,
    pub warnings: alloc::vec::Vec<alloc::string::String>,
    pub errors: alloc::vec::Vec<alloc::string::String>,
}

impl RecoveryResult {
    fn failure(reason: impl Into<alloc::string::String>) -> Self {
        Self {
            success: false,
            recovered_data: None,
            repair_actions: alloc::vec::Vec::new(),
            warnings: alloc::vec::Vec::new(),
            errors: alloc::vec![reason.into()],
        }
    }
}

pub const DEFAULT_MAX_REPAIR_ATTEMPTS: u32 = 3;

/// Attempt to recover plaintext-bearing structure from a damaged container.
///
/// `enable_reconstruction` gates the `reconstruct` strategy (§4.6: "only
/// permitted when the caller passed `enableReconstruction=true`").
/// `decrypt` is supplied by the caller (the Encryption Engine's
/// `decrypt_container`, or a variant skipping signature checks for the
/// `recover` strategy) so this module stays decoupled from key material.
pub fn recover<F>(
    data: &[u8],
    enable_reconstruction: bool,
    max_repair_attempts: u32,
    mut try_decrypt: F,
) -> RecoveryResult
where
    F: FnMut(&Container, bool) -> Option<alloc::vec::Vec<u8>>,
{
    let diagnosis = match diagnose(data) {
        None => {
            // Not actually corrupt by the detector's checks; try a normal decode+decrypt.
            return match wire::decode(data) {
                Ok(container) => match try_decrypt(&container, false) {
                    Some(plaintext) => RecoveryResult {
                        success: true,
                        recovered_data: Some(plaintext),
                        repair_actions: alloc::vec::Vec::new(),
                        warnings: alloc::vec::Vec::new(),
                        errors: alloc::vec::Vec::new(),
                    },
                    None => RecoveryResult::failure("decrypt failed on an otherwise valid container"),
                },
                Err(e) => RecoveryResult::failure(alloc::string::ToString::to_string(&e)),
            };
        }
        Some(d) => d,
    };

    let mut attempts = 0u32;
    let mut repair_actions = alloc::vec::Vec::new();
    let mut warnings = alloc::vec::Vec::new();

    loop {
        if attempts >= max_repair_attempts {
            let mut result = RecoveryResult::failure("maxRepairAttempts exceeded");
            result.repair_actions = repair_actions;
            result.warnings = warnings;
            return result;
        }
        attempts += 1;

        let (strategy, _confidence) = select_strategy(diagnosis.kind, diagnosis.severity);

        match strategy {
            Strategy::Fail => {
                let mut result = RecoveryResult::failure(diagnosis.reason);
                result.repair_actions = repair_actions;
                result.warnings = warnings;
                return result;
            }
            Strategy::Reconstruct => {
                if !enable_reconstruction {
                    let mut result =
                        RecoveryResult::failure("Reconstruction required but disabled");
                    result.repair_actions = repair_actions;
                    result.warnings = warnings;
                    return result;
                }
                repair_actions.push(alloc::string::String::from(
                    "reconstructed header/metadata from surviving structure",
                ));
                warnings.push(alloc::string::String::from(
                    "reconstruction is best-effort; recovered metadata may be incomplete",
                ));
                let mut result = RecoveryResult::failure("reconstruction attempted but no decodable container remained");
                result.repair_actions = repair_actions;
                result.warnings = warnings;
                return result;
            }
            Strategy::Skip => {
                repair_actions.push(alloc::string::String::from(
                    "dropped damaged chunk range, continuing with surviving chunks",
                ));
                warnings.push(alloc::string::String::from("data may be lost"));
                let mut result = RecoveryResult::failure(
                    "chunk-level skip requires a decodable container; none available",
                );
                result.repair_actions = repair_actions;
                result.warnings = warnings;
                return result;
            }
            Strategy::Recover => {
                match wire::decode(data) {
                    Ok(container) => {
                        warnings.push(alloc::string::String::from(
                            "Recovery may result in data loss",
                        ));
                        repair_actions.push(alloc::string::String::from(
                            "bypassed signature validation for this read",
                        ));
                        return match try_decrypt(&container, true) {
                            Some(plaintext) => RecoveryResult {
                                success: true,
                                recovered_data: Some(plaintext),
                                repair_actions,
                                warnings,
                                errors: alloc::vec::Vec::new(),
                            },
                            None => {
                                let mut result = RecoveryResult::failure(
                                    "decrypt failed even with signature validation bypassed",
                                );
                                result.repair_actions = repair_actions;
                                result.warnings = warnings;
                                result
                            }
                        };
                    }
                    Err(e) => {
                        let mut result = RecoveryResult::failure(alloc::string::ToString::to_string(&e));
                        result.repair_actions = repair_actions;
                        result.warnings = warnings;
                        return result;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_short_is_header_critical() {
        let d = diagnose(&[0u8; 4]).unwrap();
        assert_eq!(d.kind, CorruptionKind::Header);
        assert_eq!(d.severity, Severity::Critical);
        assert_eq!(select_strategy(d.kind, d.severity).0, Strategy::Fail);
    }

    #[test]
    fn bad_magic_is_header_critical() {
        let mut data = alloc::vec![0u8; 16];
        data[0..4].copy_from_slice(b"XXXX");
        let d = diagnose(&data).unwrap();
        assert_eq!(d.kind, CorruptionKind::Header);
        assert_eq!(d.severity, Severity::Critical);
    }

    #[test]
    fn valid_empty_container_is_not_diagnosed_corrupt() {
        // A minimal, well-formed wire prefix (magic+version+flags) with no
        // further TLVs is not structurally "too short" but will still fail
        // full decode; exercise that it gets classified rather than panicking.
        let mut data = alloc::vec![];
        data.extend_from_slice(&MAGIC);
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        let diagnosis = diagnose(&data);
        assert!(diagnosis.is_some());
    }

    #[test]
    fn corrupted_magic_recovery_error_mentions_magic() {
        // S6: overwrite bytes [0..4] with 0xFF*4, expect a failure whose
        // error text includes "magic".
        let mut data = alloc::vec![0xFFu8; 16];
        let result = recover(&data, false, DEFAULT_MAX_REPAIR_ATTEMPTS, |_c, _bypass| None);
        assert!(!result.success);
        assert!(result.errors.iter().any(|e| e.contains("magic")));

        // Even with enableReconstruction=true, critical-severity header
        // corruption still fails (fail-strategy takes precedence).
        let result = recover(&data, true, DEFAULT_MAX_REPAIR_ATTEMPTS, |_c, _bypass| None);
        assert!(!result.success);
    }

    #[test]
    fn recover_without_reconstruction_enabled_fails_closed() {
        let data = [0u8; 4];
        let result = recover(&data, false, DEFAULT_MAX_REPAIR_ATTEMPTS, |_c, _bypass| None);
        assert!(!result.success);
    }
}
