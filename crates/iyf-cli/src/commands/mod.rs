//! CLI subcommand implementations.

pub mod check;
pub mod config;
pub mod run;

/// Single-threaded runtime for commands that touch the calendar.
pub(crate) fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}
