//! File-backed calendar provider.
//!
//! Reads a JSON array of calendar records exported by the host calendar and
//! serves them through [`CalendarProvider`]. The file is re-read on every
//! query, so edits show up on the next poll.
//!
//! # Record Format
//!
//! ```json
//! [
//!   {
//!     "id": "E1",
//!     "title": "Standup",
//!     "start": "2025-01-29T10:00:00Z",
//!     "end": "2025-01-29T10:15:00Z",
//!     "all_day": false,
//!     "location": "Room 4"
//!   }
//! ]
//! ```
//!
//! Only `start` and `end` are required. Records whose `end` is not after
//! `start` are dropped here and never reach the engine.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use iyf_core::{CalendarEvent, CalendarProvider, EventId, ProviderError};

/// Calendar file errors.
#[derive(Debug, Error)]
pub enum CalendarFileError {
    /// The process may not read the calendar file.
    #[error("permission denied reading {path}")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Any other I/O failure.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The file is not a valid record list.
    #[error("invalid calendar file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<CalendarFileError> for ProviderError {
    fn from(err: CalendarFileError) -> Self {
        match err {
            CalendarFileError::PermissionDenied { .. } => Self::AccessDenied(err.to_string()),
            CalendarFileError::Io { .. } | CalendarFileError::Parse { .. } => {
                Self::Query(err.to_string())
            }
        }
    }
}

/// One calendar record as stored in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl CalendarRecord {
    /// Converts to the engine's event type, dropping invalid time ranges.
    ///
    /// A blank `id` becomes `None`; the engine skips such events.
    pub fn into_event(self) -> Option<CalendarEvent> {
        if self.end <= self.start {
            tracing::debug!(
                id = self.id.as_deref(),
                start = %self.start,
                end = %self.end,
                "dropping calendar record with invalid time range"
            );
            return None;
        }
        Some(CalendarEvent {
            id: self.id.and_then(|id| EventId::new(id).ok()),
            title: self.title,
            start: self.start,
            end: self.end,
            is_all_day: self.all_day,
            location: self.location,
        })
    }

    fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start <= end && self.end > start
    }
}

/// Parses calendar file contents and returns the events overlapping
/// `[start, end]`.
pub fn parse_events(
    content: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<CalendarEvent>, serde_json::Error> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let records: Vec<CalendarRecord> = serde_json::from_str(content)?;
    Ok(records
        .into_iter()
        .filter(|r| r.overlaps(start, end))
        .filter_map(CalendarRecord::into_event)
        .collect())
}

/// Calendar provider reading a JSON file on each query.
#[derive(Debug, Clone)]
pub struct FileCalendar {
    path: PathBuf,
}

impl FileCalendar {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file and returns events overlapping `[start, end]`.
    ///
    /// A missing file is an empty calendar.
    pub async fn load(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, CalendarFileError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = ?self.path, "calendar file not found, treating as empty");
                return Ok(Vec::new());
            }
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Err(CalendarFileError::PermissionDenied {
                    path: self.path.clone(),
                    source: e,
                });
            }
            Err(e) => {
                return Err(CalendarFileError::Io {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        parse_events(&content, start, end).map_err(|source| CalendarFileError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

impl CalendarProvider for FileCalendar {
    async fn query_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, ProviderError> {
        Ok(self.load(start, end).await?)
    }
}
