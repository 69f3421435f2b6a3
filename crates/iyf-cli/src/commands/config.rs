//! Config command: print the effective configuration.

use std::io::Write;

use anyhow::{Context, Result};

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    writeln!(writer, "Calendar: {}", config.calendar_path.display())?;
    writeln!(writer, "Poll interval: {} s", config.poll_interval_seconds)?;
    writeln!(writer, "Lead time: {} min", config.lead_time_minutes)?;
    writeln!(writer, "Auto-dismiss: {} s", config.auto_dismiss_seconds)?;
    writeln!(writer, "Snooze: {} min", config.snooze_minutes)?;

    config.monitor().context("invalid configuration")?;
    Ok(())
}
