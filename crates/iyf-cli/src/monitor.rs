//! Async driver for the reminder engine.
//!
//! Sleeps until the engine's next deadline, runs calendar queries on the
//! runtime and feeds settings changes and keyboard actions in. The engine
//! itself never blocks, so a slow calendar only delays the next poll. A query
//! that outlives the poll interval is abandoned and counts as failed.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio::time::Instant;

use iyf_core::{
    CalendarEvent, CalendarProvider, MonitorConfig, Notice, PresentationSurface, ProviderError,
    QueryId, ReminderEngine, ReminderSession, UserAction,
};

/// Source of the current instant.
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    /// The system wall clock.
    System,
    /// `origin` plus the tokio time elapsed since `at`. Follows paused time.
    Anchored { origin: DateTime<Utc>, at: Instant },
}

impl Clock {
    /// A clock reading `origin` now and advancing with tokio time.
    pub fn anchored(origin: DateTime<Utc>) -> Self {
        Self::Anchored {
            origin,
            at: Instant::now(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Self::System => Utc::now(),
            Self::Anchored { origin, at } => {
                let elapsed = chrono::Duration::from_std(at.elapsed())
                    .unwrap_or_else(|_| chrono::Duration::zero());
                *origin + elapsed
            }
        }
    }

    fn until(&self, deadline: DateTime<Utc>) -> std::time::Duration {
        (deadline - self.now()).to_std().unwrap_or_default()
    }
}

async fn sleep_until(clock: &Clock, deadline: Option<DateTime<Utc>>) {
    match deadline {
        Some(deadline) => tokio::time::sleep(clock.until(deadline)).await,
        None => std::future::pending().await,
    }
}

/// Longest a calendar query may run before the next tick retries it.
fn query_timeout(config: &MonitorConfig) -> std::time::Duration {
    std::time::Duration::from_secs(u64::from(config.poll_interval_seconds))
}

type QueryOutcome = (QueryId, Result<Vec<CalendarEvent>, ProviderError>);

/// Runs `engine` until `shutdown` resolves, then stops it and hands it back.
///
/// Keyboard actions apply to the most recently shown reminder.
pub async fn run<S, P, F>(
    mut engine: ReminderEngine<S>,
    provider: Arc<P>,
    mut settings: watch::Receiver<MonitorConfig>,
    mut actions: mpsc::Receiver<UserAction>,
    shutdown: F,
    clock: Clock,
) -> ReminderEngine<S>
where
    S: PresentationSurface,
    P: CalendarProvider + Send + Sync + 'static,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut queries: JoinSet<QueryOutcome> = JoinSet::new();
    let mut in_flight: Option<QueryId> = None;
    let mut settings_open = true;
    let mut actions_open = true;

    settings.mark_unchanged();
    engine.start(clock.now());

    loop {
        let deadline = engine.next_deadline();
        tokio::select! {
            () = &mut shutdown => break,
            () = sleep_until(&clock, deadline) => {
                if let Some(request) = engine.advance(clock.now()) {
                    tracing::debug!(
                        id = ?request.id,
                        start = %request.window_start,
                        end = %request.window_end,
                        "querying calendar"
                    );
                    in_flight = Some(request.id);
                    let provider = Arc::clone(&provider);
                    let limit = query_timeout(&settings.borrow());
                    queries.spawn(async move {
                        let id = request.id;
                        let result = tokio::time::timeout(limit, request.execute(&*provider))
                            .await
                            .unwrap_or_else(|_| {
                                Err(ProviderError::Query("calendar query timed out".to_string()))
                            });
                        (id, result)
                    });
                }
            }
            Some(joined) = queries.join_next() => {
                let outcome = match joined {
                    Ok(outcome) => Some(outcome),
                    Err(e) => in_flight.map(|id| {
                        (id, Err(ProviderError::Query(format!("calendar query task failed: {e}"))))
                    }),
                };
                in_flight = None;
                if let Some((id, result)) = outcome {
                    engine.complete_query(id, result, clock.now());
                }
            }
            changed = settings.changed(), if settings_open => {
                if changed.is_ok() {
                    let config = *settings.borrow_and_update();
                    engine.apply_config(config, clock.now());
                } else {
                    tracing::debug!("settings store closed");
                    settings_open = false;
                }
            }
            action = actions.recv(), if actions_open => match action {
                Some(action) => route_action(&mut engine, action, clock.now()),
                None => actions_open = false,
            },
        }

        for notice in engine.drain_notices() {
            report(&notice);
        }
    }

    queries.abort_all();
    engine.stop();
    engine
}

fn route_action<S: PresentationSurface>(
    engine: &mut ReminderEngine<S>,
    action: UserAction,
    now: DateTime<Utc>,
) {
    let focused = engine.sessions().last().map(ReminderSession::surface);
    match focused {
        Some(handle) => {
            engine.handle_action(handle, action, now);
        }
        None => tracing::debug!(?action, "no reminder on screen"),
    }
}

fn report(notice: &Notice) {
    match notice {
        Notice::AccessDenied { message } => {
            eprintln!("Calendar access denied: {message}");
            eprintln!("Reminders resume once the calendar can be read again.");
        }
        Notice::PresentationFailed { event_id, message } => {
            eprintln!("Could not show reminder for {event_id}: {message}");
        }
    }
}
