//! Key compromise detection: the rate of reported decryption failures is
//! the only externally observable symptom of a leaked or guessed key at
//! this layer, so that's the signal tracked here.
//!
//! Tracked per `userId` — a compromise of one user's key should not raise
//! alarms for every other tenant.

use std::collections::HashMap;
use std::sync::RwLock;

/// A three-point scale over a single user's recent decrypt-failure rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CompromiseLevel {
    None,
    Suspicious,
    Likely,
}

impl CompromiseLevel {
    pub fn label(self) -> &'static str {
        match self {
            CompromiseLevel::None => "none",
            CompromiseLevel::Suspicious => "suspicious",
            CompromiseLevel::Likely => "likely",
        }
    }
}

const SUSPICIOUS_THRESHOLD: u32 = 3;
const LIKELY_THRESHOLD: u32 = 8;

#[derive(Debug, Clone, Copy, Default)]
struct UserFailureCounter {
    consecutive_failures: u32,
    total_failures: u32,
    total_successes: u32,
}

/// Per-user decrypt outcome tally backing `checkKeyCompromise`.
#[derive(Default)]
pub struct CompromiseDetector {
    counters: RwLock<HashMap<String, UserFailureCounter>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompromiseReport {
    pub level_ordinal: u8,
    pub consecutive_failures: u32,
    pub total_failures: u32,
}

impl CompromiseDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, user_id: &str) {
        let mut counters = self.counters.write().unwrap();
        let entry = counters.entry(user_id.to_string()).or_default();
        entry.consecutive_failures = 0;
        entry.total_successes += 1;
    }

    pub fn record_failure(&self, user_id: &str) {
        let mut counters = self.counters.write().unwrap();
        let entry = counters.entry(user_id.to_string()).or_default();
        entry.consecutive_failures += 1;
        entry.total_failures += 1;
    }

    pub fn level_for(&self, user_id: &str) -> CompromiseLevel {
        let counters = self.counters.read().unwrap();
        let consecutive = counters.get(user_id).map(|c| c.consecutive_failures).unwrap_or(0);
        if consecutive >= LIKELY_THRESHOLD {
            CompromiseLevel::Likely
        } else if consecutive >= SUSPICIOUS_THRESHOLD {
            CompromiseLevel::Suspicious
        } else {
            CompromiseLevel::None
        }
    }

    pub fn report_for(&self, user_id: &str) -> CompromiseReport {
        let counters = self.counters.read().unwrap();
        let entry = counters.get(user_id).copied().unwrap_or_default();
        CompromiseReport {
            level_ordinal: self.level_for(user_id) as u8,
            consecutive_failures: entry.consecutive_failures,
            total_failures: entry.total_failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_user_reports_none() {
        let detector = CompromiseDetector::new();
        detector.record_success("alice");
        assert_eq!(detector.level_for("alice"), CompromiseLevel::None);
    }

    #[test]
    fn repeated_failures_escalate() {
        let detector = CompromiseDetector::new();
        for _ in 0..SUSPICIOUS_THRESHOLD {
            detector.record_failure("bob");
        }
        assert_eq!(detector.level_for("bob"), CompromiseLevel::Suspicious);
        for _ in SUSPICIOUS_THRESHOLD..LIKELY_THRESHOLD {
            detector.record_failure("bob");
        }
        assert_eq!(detector.level_for("bob"), CompromiseLevel::Likely);
    }

    #[test]
    fn success_resets_consecutive_count() {
        let detector = CompromiseDetector::new();
        for _ in 0..SUSPICIOUS_THRESHOLD {
            detector.record_failure("carol");
        }
        detector.record_success("carol");
        assert_eq!(detector.level_for("carol"), CompromiseLevel::None);
    }

    #[test]
    fn users_are_isolated() {
        let detector = CompromiseDetector::new();
        for _ in 0..LIKELY_THRESHOLD {
            detector.record_failure("dave");
        }
        assert_eq!(detector.level_for("erin"), CompromiseLevel::None);
    }
}
