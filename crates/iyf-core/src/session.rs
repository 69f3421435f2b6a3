//! Lifetime of one on-screen reminder.
//!
//! ```text
//! Active --dismiss / countdown reaches 0--> Dismissed
//! Active --snooze-----------------------> Snoozed (successor scheduled by the engine)
//! ```
//!
//! Both outcomes are terminal for the instance. A snoozed reminder returns as
//! a brand-new session with its own [`SessionId`] and a full countdown.

use crate::event::CalendarEvent;
use crate::presentation::SurfaceHandle;
use crate::scheduler::TimerHandle;
use crate::types::{EventId, SessionId};

/// Session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Snoozed,
    Dismissed,
}

/// Why a session was dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    /// "I'm going".
    User,
    /// The countdown ran out.
    Countdown,
}

/// Result of one countdown second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    /// Still active with this many seconds left.
    Remaining(u32),
    /// Reached zero; the session is now dismissed.
    Expired,
    /// The session was not active; nothing changed.
    Inactive,
}

/// One reminder instance and its countdown.
#[derive(Debug, Clone)]
pub struct ReminderSession {
    id: SessionId,
    event_id: EventId,
    event: CalendarEvent,
    remaining_seconds: u32,
    status: SessionStatus,
    surface: SurfaceHandle,
    countdown: Option<TimerHandle>,
}

impl ReminderSession {
    /// Creates an active session with a full countdown.
    pub fn new(
        id: SessionId,
        event_id: EventId,
        event: CalendarEvent,
        auto_dismiss_seconds: u32,
        surface: SurfaceHandle,
    ) -> Self {
        Self {
            id,
            event_id,
            event,
            remaining_seconds: auto_dismiss_seconds,
            status: SessionStatus::Active,
            surface,
            countdown: None,
        }
    }

    pub const fn id(&self) -> SessionId {
        self.id
    }

    pub const fn event_id(&self) -> &EventId {
        &self.event_id
    }

    pub const fn event(&self) -> &CalendarEvent {
        &self.event
    }

    pub const fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    pub const fn surface(&self) -> SurfaceHandle {
        self.surface
    }

    pub(crate) fn set_countdown_timer(&mut self, handle: TimerHandle) {
        self.countdown = Some(handle);
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Advances the countdown by one second.
    ///
    /// With `auto_dismiss_seconds = 10` the tenth call returns
    /// [`CountdownStep::Expired`].
    pub fn tick_second(&mut self) -> CountdownStep {
        if !self.is_active() {
            return CountdownStep::Inactive;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.status = SessionStatus::Dismissed;
            CountdownStep::Expired
        } else {
            CountdownStep::Remaining(self.remaining_seconds)
        }
    }

    /// Dismisses an active session. Returns `false` if it was not active.
    pub fn dismiss(&mut self) -> bool {
        self.finish(SessionStatus::Dismissed)
    }

    /// Snoozes an active session. Returns `false` if it was not active.
    pub fn snooze(&mut self) -> bool {
        self.finish(SessionStatus::Snoozed)
    }

    /// Detaches the countdown timer so the owner can cancel it.
    pub(crate) fn take_countdown_timer(&mut self) -> Option<TimerHandle> {
        self.countdown.take()
    }

    fn finish(&mut self, status: SessionStatus) -> bool {
        if !self.is_active() {
            return false;
        }
        self.status = status;
        true
    }
}
