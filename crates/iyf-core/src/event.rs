//! Calendar events as seen by the monitor, and the payload shown for them.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::EventId;

/// Title shown when the calendar entry has none.
pub const DEFAULT_TITLE: &str = "Meeting";

/// A calendar entry returned by a [`CalendarProvider`](crate::CalendarProvider).
///
/// Owned by the provider; the engine only reads it. Events without an `id`
/// cannot be deduplicated and are never reminded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EventId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Why an event was filtered out before eligibility checks.
///
/// Never surfaced as an error; only logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedEvent {
    MissingId,
    InvalidTimeRange,
}

impl fmt::Display for MalformedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingId => f.write_str("missing id"),
            Self::InvalidTimeRange => f.write_str("end is not after start"),
        }
    }
}

impl CalendarEvent {
    /// Checks the structural invariants the engine relies on.
    pub fn check(&self) -> Result<&EventId, MalformedEvent> {
        if self.end <= self.start {
            return Err(MalformedEvent::InvalidTimeRange);
        }
        self.id.as_ref().ok_or(MalformedEvent::MissingId)
    }

    /// Title for display, falling back to [`DEFAULT_TITLE`].
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE)
    }

    /// Location for display; blank strings count as absent.
    pub fn display_location(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }

    /// Whether this event should produce a reminder at `now`.
    ///
    /// The event must not be all-day, must not have ended, and must start
    /// no later than `lead_time` from now.
    pub fn is_due(&self, now: DateTime<Utc>, lead_time: Duration) -> bool {
        !self.is_all_day && self.start <= now + lead_time && self.end > now
    }
}

/// Where `now` sits relative to the meeting start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingTiming {
    /// The meeting starts this long from now.
    StartsIn(Duration),
    /// Starting within the current minute.
    StartingNow,
    /// The meeting started this long ago.
    StartedAgo(Duration),
}

impl MeetingTiming {
    /// Classifies `start` relative to `now`, treating anything within a
    /// minute on either side as "now".
    pub fn between(start: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let offset = start - now;
        if offset >= Duration::minutes(1) {
            Self::StartsIn(offset)
        } else if offset <= -Duration::minutes(1) {
            Self::StartedAgo(-offset)
        } else {
            Self::StartingNow
        }
    }

    /// Headline text for the reminder.
    pub fn headline(&self) -> String {
        match self {
            Self::StartingNow => "Meeting is starting NOW!".to_string(),
            Self::StartsIn(d) => format!("Starts in {} min", d.num_minutes()),
            Self::StartedAgo(d) => format!("Started {} min ago", d.num_minutes()),
        }
    }
}

/// Everything a presentation surface needs to render one reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderPayload {
    pub event_id: EventId,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: Option<String>,
    pub timing: MeetingTiming,
}

impl ReminderPayload {
    pub fn new(event_id: EventId, event: &CalendarEvent, now: DateTime<Utc>) -> Self {
        Self {
            event_id,
            title: event.display_title().to_string(),
            start: event.start,
            end: event.end,
            location: event.display_location().map(str::to_string),
            timing: MeetingTiming::between(event.start, now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn meeting(start: &str, end: &str) -> CalendarEvent {
        CalendarEvent {
            id: Some(EventId::new("E1").unwrap()),
            title: Some("Standup".to_string()),
            start: at(start),
            end: at(end),
            is_all_day: false,
            location: None,
        }
    }

    #[test]
    fn due_inside_lead_window() {
        let event = meeting("2025-01-29T10:00:00Z", "2025-01-29T10:30:00Z");
        let lead = Duration::minutes(1);

        assert!(event.is_due(at("2025-01-29T09:59:30Z"), lead));
        assert!(event.is_due(at("2025-01-29T10:05:00Z"), lead));
        assert!(!event.is_due(at("2025-01-29T09:58:59Z"), lead));
    }

    #[test]
    fn not_due_once_ended() {
        let event = meeting("2025-01-29T10:00:00Z", "2025-01-29T10:30:00Z");
        assert!(!event.is_due(at("2025-01-29T10:30:00Z"), Duration::minutes(1)));
    }

    #[test]
    fn zero_lead_time_requires_started() {
        let event = meeting("2025-01-29T10:00:00Z", "2025-01-29T10:30:00Z");
        assert!(!event.is_due(at("2025-01-29T09:59:59Z"), Duration::zero()));
        assert!(event.is_due(at("2025-01-29T10:00:00Z"), Duration::zero()));
    }

    #[test]
    fn all_day_never_due() {
        let mut event = meeting("2025-01-29T00:00:00Z", "2025-01-30T00:00:00Z");
        event.is_all_day = true;
        assert!(!event.is_due(at("2025-01-29T10:00:00Z"), Duration::minutes(5)));
    }

    #[test]
    fn check_reports_malformed() {
        let mut event = meeting("2025-01-29T10:00:00Z", "2025-01-29T10:30:00Z");
        event.id = None;
        assert_eq!(event.check(), Err(MalformedEvent::MissingId));

        let inverted = meeting("2025-01-29T10:30:00Z", "2025-01-29T10:00:00Z");
        assert_eq!(inverted.check(), Err(MalformedEvent::InvalidTimeRange));
    }

    #[test]
    fn display_falls_back_for_blank_fields() {
        let mut event = meeting("2025-01-29T10:00:00Z", "2025-01-29T10:30:00Z");
        event.title = Some("  ".to_string());
        event.location = Some(String::new());
        assert_eq!(event.display_title(), DEFAULT_TITLE);
        assert_eq!(event.display_location(), None);
    }

    #[test]
    fn timing_headlines() {
        let start = at("2025-01-29T10:00:00Z");
        assert_eq!(
            MeetingTiming::between(start, at("2025-01-29T09:59:30Z")).headline(),
            "Meeting is starting NOW!"
        );
        assert_eq!(
            MeetingTiming::between(start, at("2025-01-29T09:57:00Z")).headline(),
            "Starts in 3 min"
        );
        assert_eq!(
            MeetingTiming::between(start, at("2025-01-29T10:12:00Z")).headline(),
            "Started 12 min ago"
        );
    }
}
