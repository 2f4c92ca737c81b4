//! Trapdoor audit log: a fixed-size FIFO ring rather than an unbounded
//! append log, since trapdoor churn is continuous and unbounded
//! retention isn't required here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::RwLock;

pub const MAX_AUDIT_EVENTS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrapdoorAuditAction {
    Created,
    Rotated,
    Revoked,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub trapdoor_id: String,
    pub user_id: String,
    pub action: TrapdoorAuditAction,
    pub at: DateTime<Utc>,
}

/// A bounded in-memory sink. Once full, the oldest event is dropped to
/// make room for the newest.
pub struct AuditLog {
    events: RwLock<VecDeque<AuditEvent>>,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self { events: RwLock::new(VecDeque::with_capacity(MAX_AUDIT_EVENTS)) }
    }
}

impl AuditLog {
    pub fn record(&self, event: AuditEvent) {
        let mut events = self.events.write().unwrap();
        if events.len() >= MAX_AUDIT_EVENTS {
            events.pop_front();
        }
        events.push_back(event);
    }

    pub fn events_for_trapdoor(&self, trapdoor_id: &str) -> Vec<AuditEvent> {
        self.events
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.trapdoor_id == trapdoor_id)
            .cloned()
            .collect()
    }

    pub fn recent(&self, limit: usize) -> Vec<AuditEvent> {
        let events = self.events.read().unwrap();
        events.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, action: TrapdoorAuditAction) -> AuditEvent {
        AuditEvent {
            trapdoor_id: id.to_string(),
            user_id: "alice".to_string(),
            action,
            at: Utc::now(),
        }
    }

    #[test]
    fn caps_at_max_events() {
        let log = AuditLog::default();
        for i in 0..(MAX_AUDIT_EVENTS + 10) {
            log.record(event(&format!("t{i}"), TrapdoorAuditAction::Created));
        }
        assert_eq!(log.len(), MAX_AUDIT_EVENTS);
    }

    #[test]
    fn drops_oldest_first() {
        let log = AuditLog::default();
        for i in 0..(MAX_AUDIT_EVENTS + 1) {
            log.record(event(&format!("t{i}"), TrapdoorAuditAction::Created));
        }
        assert!(log.events_for_trapdoor("t0").is_empty());
        assert!(!log.events_for_trapdoor("t1").is_empty());
    }
}
