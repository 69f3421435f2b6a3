//! Terminal presentation surface.
//!
//! Clears the screen and prints a banner for each reminder. Keyboard input is
//! read separately (see [`parse_action`]) and routed by the monitor.

use std::io::Write;

use chrono::{DateTime, Local, TimeZone, Utc};
use tokio::sync::watch;

use iyf_core::{
    MonitorConfig, PresentationError, PresentationSurface, ReminderPayload, SurfaceHandle,
    UserAction,
};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Formats `start - end` as wall-clock times in `tz`.
pub fn format_time_range<Tz: TimeZone>(start: DateTime<Utc>, end: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{} - {}",
        start.with_timezone(tz).format("%H:%M"),
        end.with_timezone(tz).format("%H:%M")
    )
}

/// Renders the reminder banner.
pub fn render_banner<Tz: TimeZone>(
    payload: &ReminderPayload,
    auto_dismiss_seconds: u32,
    snooze_minutes: u32,
    tz: &Tz,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let rule = "=".repeat(60);
    let mut out = String::new();
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format!("  {}\n", payload.title));
    out.push_str(&format!(
        "  {}\n",
        format_time_range(payload.start, payload.end, tz)
    ));
    if let Some(location) = &payload.location {
        out.push_str(&format!("  @ {location}\n"));
    }
    out.push('\n');
    out.push_str(&format!("  {}\n", payload.timing.headline()));
    out.push('\n');
    out.push_str(&format!(
        "  [s] Snooze {snooze_minutes} min    [g] I'm Going\n"
    ));
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&countdown_line(auto_dismiss_seconds));
    out
}

fn countdown_line(remaining_seconds: u32) -> String {
    format!("Dismissing in {remaining_seconds} seconds...")
}

/// Maps a line of keyboard input to an action.
pub fn parse_action(line: &str) -> Option<UserAction> {
    match line.trim().to_ascii_lowercase().as_str() {
        "g" | "go" | "going" | "d" | "dismiss" => Some(UserAction::Dismiss),
        "s" | "snooze" => Some(UserAction::Snooze),
        _ => None,
    }
}

#[derive(Debug)]
struct OpenReminder {
    handle: SurfaceHandle,
    payload: ReminderPayload,
    remaining_seconds: u32,
}

/// Presentation surface writing to a terminal.
///
/// Only the newest open reminder is on screen. Closing it brings back the one
/// beneath. The snooze length on the banner follows the live settings.
#[derive(Debug)]
pub struct TerminalSurface<W> {
    out: W,
    next_handle: u64,
    open: Vec<OpenReminder>,
    settings: watch::Receiver<MonitorConfig>,
}

impl<W: Write> TerminalSurface<W> {
    pub const fn new(out: W, settings: watch::Receiver<MonitorConfig>) -> Self {
        Self {
            out,
            next_handle: 0,
            open: Vec::new(),
            settings,
        }
    }

    /// The most recently shown reminder still on screen.
    pub fn focused(&self) -> Option<SurfaceHandle> {
        self.open.last().map(|r| r.handle)
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, text: &str) -> std::io::Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }

    /// Redraws whatever is now on top: the focused banner, or the idle line.
    fn redraw(&mut self) -> std::io::Result<()> {
        let screen = match self.open.last() {
            Some(top) => {
                let snooze_minutes = self.settings.borrow().snooze_minutes;
                render_banner(&top.payload, top.remaining_seconds, snooze_minutes, &Local)
            }
            None => "Watching calendar...\n".to_string(),
        };
        self.write(&format!("{CLEAR_SCREEN}{screen}"))
    }
}

impl<W: Write> PresentationSurface for TerminalSurface<W> {
    fn show(
        &mut self,
        payload: &ReminderPayload,
        auto_dismiss_seconds: u32,
    ) -> Result<SurfaceHandle, PresentationError> {
        let snooze_minutes = self.settings.borrow().snooze_minutes;
        let banner = render_banner(payload, auto_dismiss_seconds, snooze_minutes, &Local);
        self.write(&format!("\x07{CLEAR_SCREEN}{banner}"))
            .map_err(|e| PresentationError(e.to_string()))?;

        self.next_handle += 1;
        let handle = SurfaceHandle(self.next_handle);
        self.open.push(OpenReminder {
            handle,
            payload: payload.clone(),
            remaining_seconds: auto_dismiss_seconds,
        });
        Ok(handle)
    }

    fn update_countdown(&mut self, handle: SurfaceHandle, remaining_seconds: u32) {
        if let Some(reminder) = self.open.iter_mut().find(|r| r.handle == handle) {
            reminder.remaining_seconds = remaining_seconds;
        }
        if self.focused() != Some(handle) {
            return;
        }
        let line = format!("\r{}\x1b[K", countdown_line(remaining_seconds));
        if let Err(e) = self.write(&line) {
            tracing::debug!(error = %e, "failed to update countdown");
        }
    }

    fn close(&mut self, handle: SurfaceHandle) {
        let was_focused = self.focused() == Some(handle);
        self.open.retain(|r| r.handle != handle);
        if !was_focused {
            return;
        }
        if let Err(e) = self.redraw() {
            tracing::debug!(error = %e, "failed to redraw after closing reminder");
        }
    }
}
