//! Trapdoor lifecycle: `created -> (rotated | revoked | expired)`, all
//! terminal states absorbing. Anomaly detection watches a per-user usage
//! pattern rather than a single system-wide score, so one noisy user's
//! access pattern never raises alarms for every other tenant.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::audit::{AuditEvent, AuditLog, TrapdoorAuditAction};
use crate::clock::Clock;
use crate::config::Config;
use crate::error::{CreateError, LifecycleError, RotateError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrapdoorState {
    Created,
    Rotated,
    Revoked,
    Expired,
}

impl TrapdoorState {
    /// All terminal states are absorbing: once rotated, revoked, or
    /// expired, a trapdoor never transitions again.
    pub fn is_terminal(self) -> bool {
        !matches!(self, TrapdoorState::Created)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trapdoor {
    pub trapdoor_id: String,
    pub user_id: String,
    /// Held only server-side of the privacy boundary; never serialized
    /// out to external callers by the service facade.
    pub query: String,
    pub epoch: i64,
    pub expires_at: DateTime<Utc>,
    pub usage_count: u64,
    pub max_usage: u64,
    pub state: TrapdoorState,
}

impl Trapdoor {
    pub fn is_revoked(&self) -> bool {
        matches!(self.state, TrapdoorState::Revoked)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UsageOutcome {
    pub should_rotate: bool,
    pub should_revoke: bool,
    pub anomaly_detected: bool,
}

/// Per-user usage pattern for anomaly detection (§4.5). Cold-start
/// tolerant: no anomaly is reported until at least `COLD_START_UPDATES`
/// observations have accumulated.
#[derive(Debug, Clone)]
struct UsagePattern {
    total_usage: u64,
    last_used: DateTime<Utc>,
    usage_frequency: f64,
    updates_seen: u32,
    baseline_frequency: f64,
}

const COLD_START_UPDATES: u32 = 5;
const ANOMALY_DEVIATION_RATIO: f64 = 4.0;
const BASELINE_DECAY: f64 = 0.9;

impl UsagePattern {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            total_usage: 0,
            last_used: now,
            usage_frequency: 0.0,
            updates_seen: 0,
            baseline_frequency: 0.0,
        }
    }

    /// Returns true if this observation deviates sharply from the rolling
    /// baseline. The baseline itself updates via exponential decay so it
    /// tracks legitimate behavioral drift rather than flagging it forever.
    fn observe(&mut self, now: DateTime<Utc>) -> bool {
        let elapsed_secs = (now - self.last_used).num_milliseconds().max(1) as f64 / 1000.0;
        self.usage_frequency = 1.0 / elapsed_secs;
        self.total_usage += 1;
        self.last_used = now;
        self.updates_seen += 1;

        let anomaly = self.updates_seen > COLD_START_UPDATES
            && self.baseline_frequency > 0.0
            && self.usage_frequency > self.baseline_frequency * ANOMALY_DEVIATION_RATIO;

        self.baseline_frequency =
            self.baseline_frequency * BASELINE_DECAY + self.usage_frequency * (1.0 - BASELINE_DECAY);

        anomaly
    }
}

pub struct TrapdoorManager {
    clock: Arc<dyn Clock>,
    config: Config,
    trapdoors: RwLock<HashMap<String, Trapdoor>>,
    usage_patterns: RwLock<HashMap<String, UsagePattern>>,
    audit: AuditLog,
}

fn random_id() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    base64_encode(&bytes)
}

fn base64_encode(bytes: &[u8]) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::with_capacity((bytes.len() + 2) / 3 * 4);
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = *chunk.get(1).unwrap_or(&0) as u32;
        let b2 = *chunk.get(2).unwrap_or(&0) as u32;
        let n = (b0 << 16) | (b1 << 8) | b2;
        out.push(ALPHABET[((n >> 18) & 0x3f) as usize] as char);
        out.push(ALPHABET[((n >> 12) & 0x3f) as usize] as char);
        out.push(if chunk.len() > 1 { ALPHABET[((n >> 6) & 0x3f) as usize] as char } else { '=' });
        out.push(if chunk.len() > 2 { ALPHABET[(n & 0x3f) as usize] as char } else { '=' });
    }
    out
}

impl TrapdoorManager {
    pub fn new(clock: Arc<dyn Clock>, config: Config) -> Self {
        Self {
            clock,
            config,
            trapdoors: RwLock::new(HashMap::new()),
            usage_patterns: RwLock::new(HashMap::new()),
            audit: AuditLog::default(),
        }
    }

    fn epoch_for(&self, at: DateTime<Utc>) -> i64 {
        let interval_secs = self.config.rotation_interval.as_secs().max(1) as i64;
        at.timestamp() / interval_secs
    }

    fn record(&self, trapdoor_id: &str, user_id: &str, action: TrapdoorAuditAction) {
        if !self.config.enable_audit_logging {
            return;
        }
        self.audit.record(AuditEvent {
            trapdoor_id: trapdoor_id.to_string(),
            user_id: user_id.to_string(),
            action,
            at: self.clock.now(),
        });
    }

    /// `create(userId, query, maxUsage?)`.
    pub fn create(
        &self,
        user_id: &str,
        query: &str,
        max_usage: Option<u64>,
    ) -> Result<Trapdoor, CreateError> {
        let active_count = {
            let trapdoors = self.trapdoors.read().unwrap();
            trapdoors.values().filter(|t| !t.state.is_terminal()).count()
        };
        if active_count >= self.config.max_active_trapdoors {
            return Err(LifecycleError::MaxTrapdoorsExceeded.into());
        }

        let now = self.clock.now();
        let trapdoor = Trapdoor {
            trapdoor_id: random_id(),
            user_id: user_id.to_string(),
            query: query.to_string(),
            epoch: self.epoch_for(now),
            expires_at: now
                + chrono::Duration::from_std(self.config.rotation_interval).unwrap_or_else(|_| chrono::Duration::zero())
                + chrono::Duration::from_std(self.config.grace_period).unwrap_or_else(|_| chrono::Duration::zero()),
            usage_count: 0,
            max_usage: max_usage.unwrap_or(self.config.rotation_threshold),
            state: TrapdoorState::Created,
        };

        self.record(&trapdoor.trapdoor_id, user_id, TrapdoorAuditAction::Created);
        self.trapdoors.write().unwrap().insert(trapdoor.trapdoor_id.clone(), trapdoor.clone());
        Ok(trapdoor)
    }

    /// `rotate(id)`: creates a fresh trapdoor carrying over `userId`,
    /// `query`, `maxUsage`, then marks the old one revoked. If creation
    /// fails, the old trapdoor is left untouched.
    pub fn rotate(&self, id: &str) -> Result<Trapdoor, RotateError> {
        let (user_id, query, max_usage) = {
            let trapdoors = self.trapdoors.read().unwrap();
            let existing = trapdoors.get(id).ok_or(LifecycleError::TrapdoorNotFound)?;
            if existing.is_revoked() {
                return Err(LifecycleError::TrapdoorRevoked.into());
            }
            (existing.user_id.clone(), existing.query.clone(), existing.max_usage)
        };

        let fresh = self.create(&user_id, &query, Some(max_usage)).map_err(|e| RotateError(e.0))?;

        let mut trapdoors = self.trapdoors.write().unwrap();
        if let Some(old) = trapdoors.get_mut(id) {
            old.state = TrapdoorState::Revoked;
        }
        drop(trapdoors);
        self.record(id, &user_id, TrapdoorAuditAction::Rotated);
        Ok(fresh)
    }

    /// `revoke(id, reason?)`: idempotent. Revoking an already-revoked
    /// trapdoor is a no-op that still succeeds.
    pub fn revoke(&self, id: &str, _reason: Option<&str>) -> Result<(), LifecycleError> {
        let mut trapdoors = self.trapdoors.write().unwrap();
        let trapdoor = trapdoors.get_mut(id).ok_or(LifecycleError::TrapdoorNotFound)?;
        if trapdoor.is_revoked() {
            tracing::warn!(trapdoor_id = %id, "revoke called on an already-revoked trapdoor");
            return Ok(());
        }
        trapdoor.state = TrapdoorState::Revoked;
        let user_id = trapdoor.user_id.clone();
        drop(trapdoors);
        self.record(id, &user_id, TrapdoorAuditAction::Revoked);
        Ok(())
    }

    fn mark_expired(&self, id: &str) {
        let mut trapdoors = self.trapdoors.write().unwrap();
        if let Some(trapdoor) = trapdoors.get_mut(id) {
            if !trapdoor.state.is_terminal() {
                trapdoor.state = TrapdoorState::Expired;
                let user_id = trapdoor.user_id.clone();
                drop(trapdoors);
                self.record(id, &user_id, TrapdoorAuditAction::Expired);
                return;
            }
        }
    }

    /// `updateUsage(id)`: increments `usageCount`, updates the per-user
    /// usage pattern, optionally runs anomaly detection, and reports the
    /// rotate/revoke/anomaly flags. Operations on a revoked trapdoor
    /// return all-false without incrementing.
    pub fn update_usage(&self, id: &str) -> Result<UsageOutcome, LifecycleError> {
        let now = self.clock.now();

        {
            let trapdoors = self.trapdoors.read().unwrap();
            let trapdoor = trapdoors.get(id).ok_or(LifecycleError::TrapdoorNotFound)?;
            if now >= trapdoor.expires_at {
                drop(trapdoors);
                self.mark_expired(id);
                return Ok(UsageOutcome::default());
            }
            if trapdoor.is_revoked() || trapdoor.state.is_terminal() {
                return Ok(UsageOutcome::default());
            }
        }

        let (usage_count, max_usage, user_id) = {
            let mut trapdoors = self.trapdoors.write().unwrap();
            let trapdoor = trapdoors.get_mut(id).ok_or(LifecycleError::TrapdoorNotFound)?;
            trapdoor.usage_count += 1;
            (trapdoor.usage_count, trapdoor.max_usage, trapdoor.user_id.clone())
        };

        let anomaly_detected = if self.config.enable_anomaly_detection {
            let mut patterns = self.usage_patterns.write().unwrap();
            let pattern = patterns.entry(user_id.clone()).or_insert_with(|| UsagePattern::new(now));
            pattern.observe(now)
        } else {
            false
        };

        let should_rotate = usage_count >= max_usage;
        let should_revoke = usage_count >= self.config.revocation_threshold;

        if should_revoke && self.config.enable_revocation {
            let _ = self.revoke(id, Some("revocation threshold reached"));
        } else if should_rotate && self.config.enable_rotation {
            let _ = self.rotate(id);
        }

        Ok(UsageOutcome { should_rotate, should_revoke, anomaly_detected })
    }

    pub fn get(&self, id: &str) -> Option<Trapdoor> {
        self.trapdoors.read().unwrap().get(id).cloned()
    }

    pub fn for_user(&self, user_id: &str) -> Vec<Trapdoor> {
        self.trapdoors
            .read()
            .unwrap()
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn audit_events_for(&self, id: &str) -> Vec<AuditEvent> {
        self.audit.events_for_trapdoor(id)
    }

    /// Scheduled sweep (§4.5), run every `rotationInterval`: revokes
    /// expired trapdoors with reason "Expired" and rotates non-revoked
    /// trapdoors at or above `maxUsage`.
    pub fn sweep(&self) {
        let now = self.clock.now();
        let candidates: Vec<(String, bool, bool)> = {
            let trapdoors = self.trapdoors.read().unwrap();
            trapdoors
                .values()
                .filter(|t| !t.state.is_terminal())
                .map(|t| (t.trapdoor_id.clone(), now >= t.expires_at, t.usage_count >= t.max_usage))
                .collect()
        };

        for (id, expired, over_usage) in candidates {
            if expired {
                self.mark_expired(&id);
            } else if over_usage {
                let _ = self.rotate(&id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn manager(config: Config) -> TrapdoorManager {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        TrapdoorManager::new(clock, config)
    }

    #[test]
    fn create_assigns_fresh_id_and_epoch() {
        let m = manager(Config::default());
        let t = m.create("alice", "report", None).unwrap();
        assert!(!t.trapdoor_id.is_empty());
        assert_eq!(t.state, TrapdoorState::Created);
    }

    #[test]
    fn create_fails_when_active_quota_exceeded() {
        let mut config = Config::default();
        config.max_active_trapdoors = 1;
        let m = manager(config);
        m.create("alice", "report", None).unwrap();
        let err = m.create("alice", "invoice", None).unwrap_err();
        assert_eq!(err.0, LifecycleError::MaxTrapdoorsExceeded);
    }

    #[test]
    fn revoke_is_idempotent() {
        let m = manager(Config::default());
        let t = m.create("alice", "report", None).unwrap();
        m.revoke(&t.trapdoor_id, None).unwrap();
        m.revoke(&t.trapdoor_id, None).unwrap();
        assert!(m.get(&t.trapdoor_id).unwrap().is_revoked());
    }

    #[test]
    fn rotate_revokes_old_and_returns_new() {
        let m = manager(Config::default());
        let t = m.create("alice", "report", None).unwrap();
        let fresh = m.rotate(&t.trapdoor_id).unwrap();
        assert!(m.get(&t.trapdoor_id).unwrap().is_revoked());
        assert_ne!(fresh.trapdoor_id, t.trapdoor_id);
        assert_eq!(fresh.user_id, "alice");
        assert_eq!(fresh.query, "report");
    }

    #[test]
    fn update_usage_reports_should_rotate_at_threshold() {
        let mut config = Config::default();
        config.enable_rotation = false;
        let m = manager(config);
        let t = m.create("alice", "report", Some(2)).unwrap();
        let first = m.update_usage(&t.trapdoor_id).unwrap();
        assert!(!first.should_rotate);
        let second = m.update_usage(&t.trapdoor_id).unwrap();
        assert!(second.should_rotate);
    }

    #[test]
    fn update_usage_on_revoked_trapdoor_is_inert() {
        let m = manager(Config::default());
        let t = m.create("alice", "report", None).unwrap();
        m.revoke(&t.trapdoor_id, None).unwrap();
        let outcome = m.update_usage(&t.trapdoor_id).unwrap();
        assert_eq!(outcome, UsageOutcome::default());
        assert_eq!(m.get(&t.trapdoor_id).unwrap().usage_count, 0);
    }

    #[test]
    fn sweep_expires_past_expiry_and_rotates_over_usage() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let mut config = Config::default();
        config.enable_rotation = false;
        let m = TrapdoorManager::new(clock.clone(), config);

        let t = m.create("alice", "report", None).unwrap();
        clock.advance(chrono::Duration::hours(2));
        m.sweep();
        assert_eq!(m.get(&t.trapdoor_id).unwrap().state, TrapdoorState::Expired);
    }

    /// S4 Trapdoor rotation: `rotationThreshold = 2`, `enableRotation =
    /// true`, no explicit `maxUsage` (inherits the threshold). First
    /// `updateUsage` reports `shouldRotate=false`; the second reports
    /// `shouldRotate=true` and the side effect actually rotates: the
    /// original trapdoor is revoked and a fresh one exists for the same
    /// `{userId, query}`.
    #[test]
    fn s4_rotation_threshold_triggers_auto_rotate() {
        let mut config = Config::default();
        config.rotation_threshold = 2;
        config.enable_rotation = true;
        let m = manager(config);

        let t = m.create("alice", "report", None).unwrap();
        let first = m.update_usage(&t.trapdoor_id).unwrap();
        assert!(!first.should_rotate);

        let second = m.update_usage(&t.trapdoor_id).unwrap();
        assert!(second.should_rotate);

        assert!(m.get(&t.trapdoor_id).unwrap().is_revoked());
        let fresh: Vec<Trapdoor> = m
            .for_user("alice")
            .into_iter()
            .filter(|td| td.trapdoor_id != t.trapdoor_id && td.query == "report")
            .collect();
        assert_eq!(fresh.len(), 1);
        assert!(!fresh[0].is_revoked());
    }

    #[test]
    fn anomaly_detection_tolerates_cold_start() {
        let mut config = Config::default();
        config.enable_anomaly_detection = true;
        let m = manager(config);
        let t = m.create("alice", "report", Some(1000)).unwrap();
        for _ in 0..COLD_START_UPDATES {
            let outcome = m.update_usage(&t.trapdoor_id).unwrap();
            assert!(!outcome.anomaly_detected);
        }
    }
}
