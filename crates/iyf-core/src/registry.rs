//! Time-bounded record of events that already produced a reminder.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::types::EventId;

/// How long an event stays "shown" after its first reminder.
pub const SHOWN_TTL: Duration = Duration::hours(2);

/// Set of event IDs that have fired, each with an expiry instant.
///
/// An ID present here must not trigger a new reminder. Entries are removed by
/// an explicit [`expire_due`](Self::expire_due) sweep rather than per-entry
/// timers.
#[derive(Debug, Default)]
pub struct ShownRegistry {
    entries: HashMap<EventId, DateTime<Utc>>,
}

impl ShownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `id` as shown until `now + ttl`.
    ///
    /// Returns `false` if the ID was already present (the existing expiry is
    /// left untouched).
    pub fn mark_shown(&mut self, id: EventId, ttl: Duration, now: DateTime<Utc>) -> bool {
        if self.entries.contains_key(&id) {
            return false;
        }
        self.entries.insert(id, now + ttl);
        true
    }

    pub fn is_shown(&self, id: &EventId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn expires_at(&self, id: &EventId) -> Option<DateTime<Utc>> {
        self.entries.get(id).copied()
    }

    /// Forgets `id` before its expiry. Returns `false` if it was not present.
    pub fn remove(&mut self, id: &EventId) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Removes every entry whose expiry is at or before `now`.
    ///
    /// Returns the removed IDs, sorted.
    pub fn expire_due(&mut self, now: DateTime<Utc>) -> Vec<EventId> {
        let mut expired: Vec<EventId> = self
            .entries
            .iter()
            .filter(|(_, expiry)| **expiry <= now)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            self.entries.remove(id);
        }
        expired.sort();
        expired
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn id(s: &str) -> EventId {
        EventId::new(s).unwrap()
    }

    #[test]
    fn mark_then_query() {
        let mut registry = ShownRegistry::new();
        let now = at("2025-01-29T10:00:00Z");

        assert!(registry.mark_shown(id("E1"), SHOWN_TTL, now));
        assert!(registry.is_shown(&id("E1")));
        assert!(!registry.is_shown(&id("E2")));
        assert_eq!(registry.expires_at(&id("E1")), Some(at("2025-01-29T12:00:00Z")));
    }

    #[test]
    fn remark_keeps_original_expiry() {
        let mut registry = ShownRegistry::new();
        registry.mark_shown(id("E1"), SHOWN_TTL, at("2025-01-29T10:00:00Z"));

        assert!(!registry.mark_shown(id("E1"), SHOWN_TTL, at("2025-01-29T11:00:00Z")));
        assert_eq!(registry.expires_at(&id("E1")), Some(at("2025-01-29T12:00:00Z")));
    }

    #[test]
    fn expire_due_removes_only_expired() {
        let mut registry = ShownRegistry::new();
        registry.mark_shown(id("E1"), SHOWN_TTL, at("2025-01-29T10:00:00Z"));
        registry.mark_shown(id("E2"), SHOWN_TTL, at("2025-01-29T10:30:00Z"));

        assert!(registry.expire_due(at("2025-01-29T11:59:59Z")).is_empty());
        assert_eq!(registry.expire_due(at("2025-01-29T12:00:00Z")), vec![id("E1")]);
        assert!(!registry.is_shown(&id("E1")));
        assert!(registry.is_shown(&id("E2")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_allows_marking_again() {
        let mut registry = ShownRegistry::new();
        registry.mark_shown(id("E1"), SHOWN_TTL, at("2025-01-29T10:00:00Z"));

        assert!(registry.remove(&id("E1")));
        assert!(!registry.remove(&id("E1")));
        assert!(registry.is_empty());

        assert!(registry.mark_shown(id("E1"), SHOWN_TTL, at("2025-01-29T11:00:00Z")));
        assert_eq!(registry.expires_at(&id("E1")), Some(at("2025-01-29T13:00:00Z")));
    }
}
