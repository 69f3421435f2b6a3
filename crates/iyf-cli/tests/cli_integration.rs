//! Integration tests running the `iyf` binary.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn iyf_binary() -> String {
    env!("CARGO_BIN_EXE_iyf").to_string()
}

/// Runs `iyf` with `HOME` pointed at `home` and no inherited settings.
fn iyf(home: &Path, args: &[&str]) -> Output {
    Command::new(iyf_binary())
        .env("HOME", home)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("XDG_DATA_HOME")
        .env_remove("IYF_CALENDAR_PATH")
        .env_remove("IYF_POLL_INTERVAL_SECONDS")
        .env_remove("IYF_LEAD_TIME_MINUTES")
        .env_remove("IYF_AUTO_DISMISS_SECONDS")
        .env_remove("IYF_SNOOZE_MINUTES")
        .args(args)
        .output()
        .expect("failed to run iyf")
}

fn write_config(dir: &Path, calendar: &Path, extra: &str) -> std::path::PathBuf {
    let path = dir.join("iyf.toml");
    std::fs::write(
        &path,
        format!("calendar_path = {:?}\n{extra}", calendar.display().to_string()),
    )
    .unwrap();
    path
}

#[test]
fn test_check_reports_due_meeting() {
    let temp = TempDir::new().unwrap();
    let calendar = temp.path().join("calendar.json");
    std::fs::write(
        &calendar,
        r#"[
            {"id": "E1", "title": "Standup", "start": "2025-01-29T10:00:00Z", "end": "2025-01-29T10:15:00Z"},
            {"id": "E2", "title": "Retro", "start": "2025-01-29T16:00:00Z", "end": "2025-01-29T17:00:00Z"}
        ]"#,
    )
    .unwrap();
    let config = write_config(temp.path(), &calendar, "");

    let output = iyf(
        temp.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "check",
            "--at",
            "2025-01-29T09:59:30Z",
        ],
    );
    assert!(
        output.status.success(),
        "iyf check should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("- E1: Standup (10:00 - 10:15 UTC)"));
    assert!(!stdout.contains("Retro"), "meetings outside the window are not listed");
}

#[test]
fn test_check_rejects_invalid_instant() {
    let temp = TempDir::new().unwrap();
    let calendar = temp.path().join("calendar.json");
    let config = write_config(temp.path(), &calendar, "");

    let output = iyf(
        temp.path(),
        &["--config", config.to_str().unwrap(), "check", "--at", "soon"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid datetime"));
}

#[test]
fn test_config_merges_file_and_env() {
    let temp = TempDir::new().unwrap();
    let calendar = temp.path().join("work.json");
    let config = write_config(temp.path(), &calendar, "poll_interval_seconds = 60\n");

    let output = Command::new(iyf_binary())
        .env("HOME", temp.path())
        .env_remove("XDG_CONFIG_HOME")
        .env("IYF_SNOOZE_MINUTES", "2")
        .args(["--config", config.to_str().unwrap(), "config"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!("Calendar: {}", calendar.display())));
    assert!(stdout.contains("Poll interval: 60 s"));
    assert!(stdout.contains("Snooze: 2 min"));
}

#[test]
fn test_out_of_range_setting_fails() {
    let temp = TempDir::new().unwrap();
    let calendar = temp.path().join("calendar.json");
    let config = write_config(temp.path(), &calendar, "lead_time_minutes = 10\n");

    let output = iyf(temp.path(), &["--config", config.to_str().unwrap(), "check"]);
    assert!(!output.status.success());
    assert!(
        String::from_utf8_lossy(&output.stderr)
            .contains("lead_time_minutes must be between 0 and 5, got 10")
    );
}

#[test]
fn test_no_subcommand_prints_help() {
    let temp = TempDir::new().unwrap();
    let output = iyf(temp.path(), &[]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Usage:"));
}
