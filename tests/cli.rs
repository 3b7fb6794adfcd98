//! Runs the built binary against a scratch data directory.

use std::path::Path;
use std::process::Output;

use assert_cmd::Command;

fn habit_reminder(data_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_habit-reminder"))
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_failed_command_is_logged_as_error() {
    let dir = tempfile::tempdir().unwrap();

    let output = habit_reminder(dir.path(), &["toggle", "42"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("Command failed").count(), 1);

    let output = habit_reminder(dir.path(), &["logs", "--lines", "50"]);
    assert!(output.status.success());
    let logs = String::from_utf8_lossy(&output.stdout);
    let failure = logs
        .lines()
        .find(|line| line.contains("Command failed"))
        .unwrap();
    assert!(failure.contains("ERROR"));
}

#[test]
fn test_passcode_survives_between_runs() {
    let dir = tempfile::tempdir().unwrap();

    let output = habit_reminder(dir.path(), &["new"]);
    assert!(output.status.success());
    let shown = String::from_utf8_lossy(&output.stdout);
    let passcode = shown.trim().rsplit(' ').next().unwrap().to_string();

    let output = habit_reminder(dir.path(), &["passcode"]);
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), passcode);
}
