//! Presentation surface contract.

use thiserror::Error;

use crate::event::ReminderPayload;

/// Identifies one shown reminder instance on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceHandle(pub u64);

/// The surface could not show a reminder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("could not present reminder: {0}")]
pub struct PresentationError(pub String);

/// What the user did with a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    /// "I'm going".
    Dismiss,
    Snooze,
}

/// Renders full-screen reminders.
///
/// Each shown instance reports exactly one [`UserAction`] back to the engine
/// through the host, tagged with the handle returned by [`show`](Self::show).
/// Calls must not block: rendering work belongs on the surface's own thread.
pub trait PresentationSurface {
    fn show(
        &mut self,
        payload: &ReminderPayload,
        auto_dismiss_seconds: u32,
    ) -> Result<SurfaceHandle, PresentationError>;

    /// Refreshes the countdown on a shown instance.
    fn update_countdown(&mut self, handle: SurfaceHandle, remaining_seconds: u32);

    /// Tears the instance down.
    fn close(&mut self, handle: SurfaceHandle);
}
