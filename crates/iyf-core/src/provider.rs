//! Calendar provider contract.

use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::event::CalendarEvent;

/// Calendar provider failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Calendar permission was not granted.
    #[error("calendar access denied: {0}")]
    AccessDenied(String),
    /// A transient failure; the next poll retries.
    #[error("calendar query failed: {0}")]
    Query(String),
}

/// Source of calendar events.
///
/// Called at most once per poll tick. Implementations apply any access
/// precondition themselves and report it as [`ProviderError::AccessDenied`].
pub trait CalendarProvider {
    /// Returns events overlapping `[start, end]`.
    fn query_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<CalendarEvent>, ProviderError>> + Send;
}
