//! Meeting monitoring and reminder lifecycle engine.
//!
//! This crate contains:
//! - The reminder engine: polling cadence, deduplication of events that were
//!   already reminded, and the lifecycle of each on-screen reminder
//! - The contracts for its collaborators: calendar provider, presentation
//!   surface and settings store
//!
//! It performs no I/O of its own. Every time-dependent operation takes the
//! current instant, and timers are driven through [`ReminderEngine::advance`].

pub mod config;
mod engine;
pub mod event;
pub mod presentation;
pub mod provider;
pub mod registry;
pub mod scheduler;
pub mod session;
pub mod types;

pub use config::{ConfigError, MonitorConfig, SettingsStore};
pub use engine::{
    EngineStatus, INITIAL_CHECK_DELAY, Notice, QueryId, QueryRequest, ReminderEngine,
};
pub use event::{CalendarEvent, MalformedEvent, MeetingTiming, ReminderPayload};
pub use presentation::{PresentationError, PresentationSurface, SurfaceHandle, UserAction};
pub use provider::{CalendarProvider, ProviderError};
pub use registry::{SHOWN_TTL, ShownRegistry};
pub use session::{ReminderSession, SessionStatus};
pub use types::{EventId, SessionId, ValidationError};
