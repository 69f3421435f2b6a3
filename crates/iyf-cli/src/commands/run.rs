//! Run command: watch the calendar until interrupted.
//!
//! Keyboard input is line based: `g` (or `going`) dismisses the reminder on
//! screen and `s` (or `snooze`) snoozes it. On Unix, `SIGHUP` reloads the
//! monitor settings from the config sources.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use iyf_calendar::FileCalendar;
use iyf_core::{ReminderEngine, SettingsStore, UserAction};

use crate::Config;
use crate::monitor::{self, Clock};
use crate::surface::{TerminalSurface, parse_action};

pub fn run(config: &Config, config_path: Option<&Path>) -> Result<()> {
    let monitor = config.monitor().context("invalid configuration")?;
    let store = Arc::new(SettingsStore::new(monitor)?);

    let runtime = super::runtime().context("failed to start runtime")?;
    runtime.block_on(watch(config, store, config_path.map(Path::to_path_buf)));
    // Stdin reads block a runtime thread; don't wait for them.
    runtime.shutdown_background();
    Ok(())
}

async fn watch(config: &Config, store: Arc<SettingsStore>, config_path: Option<PathBuf>) {
    let calendar = Arc::new(FileCalendar::new(&config.calendar_path));
    let surface = TerminalSurface::new(std::io::stdout(), store.subscribe());
    let engine = ReminderEngine::new(store.current(), surface);

    let (actions_tx, actions_rx) = mpsc::channel(8);
    tokio::spawn(read_actions(actions_tx));

    #[cfg(unix)]
    tokio::spawn(reload_on_hangup(
        Arc::clone(&store),
        config_path,
        config.calendar_path.clone(),
    ));
    #[cfg(not(unix))]
    drop(config_path);

    println!(
        "Watching {} (press Ctrl-C to quit)",
        config.calendar_path.display()
    );
    monitor::run(
        engine,
        calendar,
        store.subscribe(),
        actions_rx,
        shutdown_signal(),
        Clock::System,
    )
    .await;
}

async fn read_actions(tx: mpsc::Sender<UserAction>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let Some(action) = parse_action(&line) else {
                    if !line.trim().is_empty() {
                        tracing::debug!(input = %line.trim(), "unrecognized input");
                    }
                    continue;
                };
                if tx.send(action).await.is_err() {
                    break;
                }
            }
            Ok(None) => {
                tracing::debug!("stdin closed, keyboard actions disabled");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stdin");
                break;
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn reload_on_hangup(
    store: Arc<SettingsStore>,
    config_path: Option<PathBuf>,
    calendar_path: PathBuf,
) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(e) => {
            tracing::warn!(error = %e, "failed to listen for SIGHUP");
            return;
        }
    };

    while hangup.recv().await.is_some() {
        let config = match Config::load_from(config_path.as_deref()) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "failed to reload configuration");
                continue;
            }
        };
        if config.calendar_path != calendar_path {
            tracing::warn!(
                path = %config.calendar_path.display(),
                "calendar path changes take effect on restart"
            );
        }
        match config.monitor().map(|monitor| store.update(monitor)) {
            Ok(Ok(true)) => tracing::info!("configuration reloaded"),
            Ok(Ok(false)) => tracing::debug!("configuration unchanged"),
            Ok(Err(e)) | Err(e) => tracing::warn!(error = %e, "rejected reloaded configuration"),
        }
    }
}
