//! Reminder engine: polling, deduplication and session lifecycle.
//!
//! The engine is sans-IO. It owns a [`TimerQueue`] and exposes
//! [`next_deadline`](ReminderEngine::next_deadline) and
//! [`advance`](ReminderEngine::advance); a driver sleeps until the deadline
//! and calls `advance` with the current instant. Calendar queries are handed
//! out as [`QueryRequest`]s and their results fed back through
//! [`complete_query`](ReminderEngine::complete_query), so a slow calendar
//! never holds up countdown or snooze timers.
//!
//! # Tick ordering
//!
//! At most one query is in flight. Poll timers that fire while a query is
//! outstanding are skipped, so tick N+1 never observes the registry before
//! tick N has finished mutating it.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;

use chrono::{DateTime, Duration, Utc};

use crate::config::MonitorConfig;
use crate::event::{CalendarEvent, ReminderPayload};
use crate::presentation::{PresentationSurface, SurfaceHandle, UserAction};
use crate::provider::{CalendarProvider, ProviderError};
use crate::registry::{SHOWN_TTL, ShownRegistry};
use crate::scheduler::{Scheduler, TimerHandle, TimerQueue};
use crate::session::{CountdownStep, DismissReason, ReminderSession};
use crate::types::{EventId, SessionId};

/// Delay before the first check after [`ReminderEngine::start`], giving a
/// freshly granted calendar permission time to propagate.
pub const INITIAL_CHECK_DELAY: Duration = Duration::seconds(2);

/// Resolution of the on-screen countdown.
const COUNTDOWN_STEP: Duration = Duration::seconds(1);

#[derive(Debug, Clone)]
enum EngineTimer {
    InitialCheck,
    Poll,
    Present {
        event_id: EventId,
        event: CalendarEvent,
    },
    Countdown(SessionId),
    SnoozeRearm {
        event_id: EventId,
        event: CalendarEvent,
    },
}

/// Identifies one outstanding calendar query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryId(u64);

/// A calendar query the driver must run and report back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryRequest {
    pub id: QueryId,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

impl QueryRequest {
    /// Runs this query against `provider`.
    pub fn execute<P: CalendarProvider>(
        self,
        provider: &P,
    ) -> impl Future<Output = Result<Vec<CalendarEvent>, ProviderError>> + Send + '_ {
        provider.query_events(self.window_start, self.window_end)
    }
}

/// Something the host should tell the user about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Calendar permission is missing. Reported once until a query succeeds.
    AccessDenied { message: String },
    /// A reminder could not be shown. Its registry entry still expires normally.
    PresentationFailed { event_id: EventId, message: String },
}

/// Point-in-time view of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    pub running: bool,
    pub shown_events: usize,
    pub active_sessions: usize,
    pub pending_snoozes: usize,
    pub query_in_flight: bool,
    pub next_deadline: Option<DateTime<Utc>>,
}

/// Decides which events get a reminder and runs each reminder's lifecycle.
#[derive(Debug)]
pub struct ReminderEngine<S> {
    config: MonitorConfig,
    surface: S,
    registry: ShownRegistry,
    timers: TimerQueue<EngineTimer>,
    /// Active sessions only; finished ones are torn down immediately.
    sessions: BTreeMap<SessionId, ReminderSession>,
    pending_presents: HashSet<EventId>,
    pending_snoozes: HashMap<EventId, TimerHandle>,
    poll_timer: Option<TimerHandle>,
    in_flight: Option<QueryId>,
    next_query: u64,
    next_session: u64,
    running: bool,
    access_denied_reported: bool,
    notices: Vec<Notice>,
}

impl<S: PresentationSurface> ReminderEngine<S> {
    pub fn new(config: MonitorConfig, surface: S) -> Self {
        Self {
            config,
            surface,
            registry: ShownRegistry::new(),
            timers: TimerQueue::new(),
            sessions: BTreeMap::new(),
            pending_presents: HashSet::new(),
            pending_snoozes: HashMap::new(),
            poll_timer: None,
            in_flight: None,
            next_query: 0,
            next_session: 0,
            running: false,
            access_denied_reported: false,
            notices: Vec::new(),
        }
    }

    pub const fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub const fn surface(&self) -> &S {
        &self.surface
    }

    pub const fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Starts polling at the configured cadence, with a first check
    /// [`INITIAL_CHECK_DELAY`] from now.
    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.running {
            return;
        }
        self.running = true;
        self.timers
            .schedule_once(now, INITIAL_CHECK_DELAY, EngineTimer::InitialCheck);
        self.arm_poll(now);
        tracing::info!(
            poll_interval_seconds = self.config.poll_interval_seconds,
            lead_time_minutes = self.config.lead_time_minutes,
            "monitor started"
        );
    }

    fn arm_poll(&mut self, now: DateTime<Utc>) {
        if let Some(old) = self.poll_timer.take() {
            self.timers.cancel(old);
        }
        self.poll_timer = Some(self.timers.schedule_repeating(
            now,
            self.config.poll_interval(),
            EngineTimer::Poll,
        ));
    }

    /// Cancels every timer and closes any reminder on screen.
    ///
    /// Nothing is reminded after this returns; results of a query still in
    /// flight are discarded. Reminders queued but not yet shown are dropped
    /// from the registry so a later [`start`](Self::start) can show them.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.timers.cancel_all();
        self.poll_timer = None;
        self.in_flight = None;
        for event_id in self.pending_presents.drain() {
            self.registry.remove(&event_id);
        }
        self.pending_snoozes.clear();
        for session in std::mem::take(&mut self.sessions).into_values() {
            self.surface.close(session.surface());
        }
        tracing::info!("monitor stopped");
    }

    /// Applies a settings change.
    ///
    /// A new poll interval restarts the poll timer from `now`; the old timer
    /// never fires again. Other fields take effect on their next use.
    pub fn apply_config(&mut self, config: MonitorConfig, now: DateTime<Utc>) {
        let restart = config.poll_interval_seconds != self.config.poll_interval_seconds;
        self.config = config;
        if self.running && restart {
            self.arm_poll(now);
            tracing::info!(
                poll_interval_seconds = config.poll_interval_seconds,
                "poll interval changed, restarted polling"
            );
        } else {
            tracing::debug!(?config, "settings updated");
        }
    }

    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.timers.next_deadline()
    }

    /// Fires every timer due at `now`.
    ///
    /// Returns the calendar query to run if a poll tick started.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Option<QueryRequest> {
        let mut request = None;
        while let Some(fired) = self.timers.pop_due(now) {
            match fired.payload {
                EngineTimer::InitialCheck | EngineTimer::Poll => {
                    request = request.or_else(|| self.tick(now));
                }
                EngineTimer::Present { event_id, event } => {
                    self.pending_presents.remove(&event_id);
                    self.open_session(event_id, event, now);
                }
                EngineTimer::Countdown(session_id) => self.countdown_second(session_id),
                EngineTimer::SnoozeRearm { event_id, event } => {
                    self.pending_snoozes.remove(&event_id);
                    tracing::info!(event_id = %event_id, "snooze elapsed");
                    self.open_session(event_id, event, now);
                }
            }
        }
        request
    }

    /// Starts a poll tick now.
    ///
    /// Returns `None` when stopped or when the previous tick's query has not
    /// completed yet.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<QueryRequest> {
        if !self.running {
            return None;
        }
        if self.in_flight.is_some() {
            tracing::debug!("previous calendar query still running, skipping tick");
            return None;
        }
        let (before, after) = self.config.query_window();
        self.next_query += 1;
        let id = QueryId(self.next_query);
        self.in_flight = Some(id);
        Some(QueryRequest {
            id,
            window_start: now - before,
            window_end: now + after,
        })
    }

    /// Finishes a poll tick with the calendar's answer.
    ///
    /// Returns the number of reminders queued. Newly due events are recorded
    /// in the registry immediately and shown on the next
    /// [`advance`](Self::advance).
    pub fn complete_query(
        &mut self,
        id: QueryId,
        result: Result<Vec<CalendarEvent>, ProviderError>,
        now: DateTime<Utc>,
    ) -> usize {
        if self.in_flight != Some(id) {
            tracing::debug!(?id, "discarding result of stale calendar query");
            return 0;
        }
        self.in_flight = None;

        let events = match result {
            Ok(events) => events,
            Err(ProviderError::AccessDenied(message)) => {
                if !self.access_denied_reported {
                    tracing::warn!(%message, "calendar access denied");
                    self.access_denied_reported = true;
                    self.notices.push(Notice::AccessDenied { message });
                }
                return 0;
            }
            Err(err @ ProviderError::Query(_)) => {
                tracing::warn!(error = %err, "calendar query failed, will retry next tick");
                return 0;
            }
        };
        self.access_denied_reported = false;

        self.sweep(now);

        let lead_time = self.config.lead_time();
        let mut queued = 0;
        for event in events {
            let event_id = match event.check() {
                Ok(id) => id.clone(),
                Err(reason) => {
                    tracing::debug!(%reason, title = event.display_title(), "skipping malformed event");
                    continue;
                }
            };
            if !event.is_due(now, lead_time) || self.registry.is_shown(&event_id) {
                continue;
            }
            self.registry.mark_shown(event_id.clone(), SHOWN_TTL, now);
            tracing::debug!(
                event_id = %event_id,
                expires_at = ?self.registry.expires_at(&event_id),
                "reminder queued"
            );
            self.pending_presents.insert(event_id.clone());
            self.timers.schedule_once(
                now,
                Duration::zero(),
                EngineTimer::Present { event_id, event },
            );
            queued += 1;
        }
        if queued > 0 {
            tracing::debug!(queued, "reminders queued");
        }
        queued
    }

    /// Expires registry entries, keeping any whose reminder is still live.
    fn sweep(&mut self, now: DateTime<Utc>) {
        if self.registry.is_empty() {
            return;
        }
        for event_id in self.registry.expire_due(now) {
            if self.is_live(&event_id) {
                tracing::debug!(event_id = %event_id, "reminder still live, keeping registry entry");
                self.registry.mark_shown(event_id, SHOWN_TTL, now);
            } else {
                tracing::debug!(event_id = %event_id, "registry entry expired");
            }
        }
    }

    /// Whether a reminder for `event_id` is on screen, queued or snoozed.
    fn is_live(&self, event_id: &EventId) -> bool {
        self.pending_presents.contains(event_id)
            || self.pending_snoozes.contains_key(event_id)
            || self.active_session_for(event_id).is_some()
    }

    fn active_session_for(&self, event_id: &EventId) -> Option<SessionId> {
        self.sessions
            .values()
            .find(|s| s.event_id() == event_id)
            .map(ReminderSession::id)
    }

    fn open_session(
        &mut self,
        event_id: EventId,
        event: CalendarEvent,
        now: DateTime<Utc>,
    ) -> Option<SessionId> {
        if !self.running {
            return None;
        }
        if let Some(existing) = self.active_session_for(&event_id) {
            tracing::debug!(event_id = %event_id, %existing, "reminder already on screen");
            return None;
        }

        let payload = ReminderPayload::new(event_id.clone(), &event, now);
        let handle = match self.surface.show(&payload, self.config.auto_dismiss_seconds) {
            Ok(handle) => handle,
            Err(err) => {
                tracing::warn!(event_id = %event_id, error = %err, "failed to show reminder");
                self.notices.push(Notice::PresentationFailed {
                    event_id,
                    message: err.to_string(),
                });
                return None;
            }
        };

        self.next_session += 1;
        let session_id = SessionId::new(self.next_session);
        let mut session = ReminderSession::new(
            session_id,
            event_id,
            event,
            self.config.auto_dismiss_seconds,
            handle,
        );
        session.set_countdown_timer(self.timers.schedule_repeating(
            now,
            COUNTDOWN_STEP,
            EngineTimer::Countdown(session_id),
        ));
        tracing::info!(
            event_id = %session.event_id(),
            session = %session_id,
            title = %payload.title,
            "reminder shown"
        );
        self.sessions.insert(session_id, session);
        Some(session_id)
    }

    fn countdown_second(&mut self, session_id: SessionId) {
        let Some(session) = self.sessions.get_mut(&session_id) else {
            return;
        };
        match session.tick_second() {
            CountdownStep::Remaining(remaining) => {
                self.surface.update_countdown(session.surface(), remaining);
            }
            CountdownStep::Expired => self.finish_session(session_id, DismissReason::Countdown),
            CountdownStep::Inactive => {}
        }
    }

    /// Routes a user action from the presentation surface.
    ///
    /// Actions for handles that are no longer active are ignored and return
    /// `false`.
    pub fn handle_action(
        &mut self,
        handle: SurfaceHandle,
        action: UserAction,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(session) = self
            .sessions
            .values_mut()
            .find(|s| s.surface() == handle)
        else {
            tracing::debug!(?handle, ?action, "ignoring action for inactive reminder");
            return false;
        };
        let session_id = session.id();

        match action {
            UserAction::Dismiss => {
                session.dismiss();
                self.finish_session(session_id, DismissReason::User);
            }
            UserAction::Snooze => {
                session.snooze();
                let Some(session) = self.teardown(session_id) else {
                    return false;
                };
                let delay = self.config.snooze();
                let event_id = session.event_id().clone();
                let timer = self.timers.schedule_once(
                    now,
                    delay,
                    EngineTimer::SnoozeRearm {
                        event_id: event_id.clone(),
                        event: session.event().clone(),
                    },
                );
                tracing::info!(
                    event_id = %event_id,
                    session = %session_id,
                    snooze_minutes = self.config.snooze_minutes,
                    "reminder snoozed"
                );
                self.pending_snoozes.insert(event_id, timer);
            }
        }
        true
    }

    fn finish_session(&mut self, session_id: SessionId, reason: DismissReason) {
        if let Some(session) = self.teardown(session_id) {
            tracing::info!(
                event_id = %session.event_id(),
                session = %session_id,
                ?reason,
                "reminder dismissed"
            );
        }
    }

    /// Removes a finished session, stopping its countdown and closing its
    /// surface instance.
    fn teardown(&mut self, session_id: SessionId) -> Option<ReminderSession> {
        let mut session = self.sessions.remove(&session_id)?;
        if let Some(timer) = session.take_countdown_timer() {
            self.timers.cancel(timer);
        }
        self.surface.close(session.surface());
        Some(session)
    }

    /// Reminder sessions on screen, oldest first.
    pub fn sessions(&self) -> impl Iterator<Item = &ReminderSession> {
        self.sessions.values()
    }

    /// Takes the notices accumulated since the last call.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            running: self.running,
            shown_events: self.registry.len(),
            active_sessions: self.sessions.len(),
            pending_snoozes: self.pending_snoozes.len(),
            query_in_flight: self.in_flight.is_some(),
            next_deadline: self.next_deadline(),
        }
    }
}
