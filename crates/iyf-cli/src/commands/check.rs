//! Check command: which meetings would trigger a reminder at a given instant.
//!
//! Reads the calendar once and applies the engine's eligibility rules. The
//! shown-event registry is not consulted, so a meeting that was already
//! reminded still appears here.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use iyf_calendar::FileCalendar;
use iyf_core::{CalendarEvent, MalformedEvent, MeetingTiming};

use crate::Config;
use crate::surface::format_time_range;

/// Parses `--at` as RFC 3339, defaulting to now.
pub fn parse_instant(at: Option<&str>) -> Result<DateTime<Utc>> {
    let Some(s) = at else {
        return Ok(Utc::now());
    };
    let dt = DateTime::parse_from_rfc3339(s).with_context(|| {
        format!("Invalid datetime: {s}. Use ISO 8601 (e.g., 2026-01-15T10:30:00Z)")
    })?;
    Ok(dt.with_timezone(&Utc))
}

enum Verdict {
    Due,
    AllDay,
    NotYet,
    Malformed(MalformedEvent),
}

fn classify(event: &CalendarEvent, now: DateTime<Utc>, lead: chrono::Duration) -> Verdict {
    if let Err(reason) = event.check() {
        return Verdict::Malformed(reason);
    }
    if event.is_all_day {
        return Verdict::AllDay;
    }
    if event.is_due(now, lead) {
        Verdict::Due
    } else {
        Verdict::NotYet
    }
}

pub fn run<W: Write>(writer: &mut W, config: &Config, at: Option<&str>) -> Result<()> {
    let monitor = config.monitor().context("invalid configuration")?;
    let now = parse_instant(at)?;
    let (before, after) = monitor.query_window();

    let calendar = FileCalendar::new(&config.calendar_path);
    let events = super::runtime()
        .context("failed to start runtime")?
        .block_on(calendar.load(now - before, now + after))
        .context("failed to read calendar")?;

    writeln!(writer, "Calendar: {}", config.calendar_path.display())?;
    writeln!(writer, "Checked at: {}", now.to_rfc3339())?;
    writeln!(writer, "Lead time: {} min", monitor.lead_time_minutes)?;

    let lead = monitor.lead_time();
    let mut due = Vec::new();
    let mut skipped = Vec::new();
    for event in &events {
        match classify(event, now, lead) {
            Verdict::Due => due.push(event),
            Verdict::AllDay => skipped.push((event, "all-day".to_string())),
            Verdict::NotYet => skipped.push((event, "outside lead window".to_string())),
            Verdict::Malformed(reason) => skipped.push((event, reason.to_string())),
        }
    }

    if due.is_empty() {
        writeln!(writer, "No meetings due.")?;
    } else {
        writeln!(writer, "Due:")?;
        for event in due {
            let id = event.id.as_ref().map_or("-", |id| id.as_str());
            writeln!(
                writer,
                "- {id}: {} ({} UTC) {}",
                event.display_title(),
                format_time_range(event.start, event.end, &Utc),
                MeetingTiming::between(event.start, now).headline()
            )?;
        }
    }

    if !skipped.is_empty() {
        writeln!(writer, "Skipped:")?;
        for (event, reason) in skipped {
            writeln!(writer, "- {}: {reason}", event.display_title())?;
        }
    }

    Ok(())
}
