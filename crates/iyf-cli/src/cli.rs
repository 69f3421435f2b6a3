//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Full-screen meeting reminders.
///
/// Watches your calendar and puts each meeting in your face when it is about
/// to start, until you either go or snooze it.
#[derive(Debug, Parser)]
#[command(name = "iyf", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Watch the calendar and show reminders until interrupted.
    Run,

    /// Show which meetings would trigger a reminder right now.
    Check {
        /// Evaluate at this instant instead of now (ISO 8601).
        #[arg(long)]
        at: Option<String>,
    },

    /// Print the effective configuration.
    Config,
}
