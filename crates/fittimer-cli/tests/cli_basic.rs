//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::TempDir;

fn fittimer(data_dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_fittimer"));
    cmd.env("FITTIMER_DATA_DIR", data_dir)
        .env_remove("FITTIMER_LOG")
        .stdin(Stdio::null());
    cmd
}

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = fittimer(data_dir)
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

#[test]
fn test_config_get_set_reset() {
    let dir = TempDir::new().unwrap();

    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "hiit.work_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "30");

    let (code, stdout, _) = run_cli(dir.path(), &["config", "set", "hiit.rounds", "4"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "hiit.rounds = 4");
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "hiit.rounds"]);
    assert_eq!(stdout.trim(), "4");

    let (code, _, stderr) = run_cli(dir.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("config.toml"));
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "hiit.rounds"]);
    assert_eq!(stdout.trim(), "8");
}

#[test]
fn test_config_rejects_unknown_key() {
    let dir = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["config", "get", "hiit.tempo"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "hiit.work_secs", "0"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_list_json() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "list", "--json"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["recording"]["plank_min_secs"], 5);
    assert_eq!(parsed["feedback"]["enabled"], true);
}

#[test]
fn test_config_list_matches_file_layout() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "list"]);
    assert_eq!(code, 0);
    let parsed: toml::Table = toml::from_str(&stdout).unwrap();
    assert_eq!(parsed["hiit"]["work_secs"].as_integer(), Some(30));
    assert_eq!(parsed["recording"]["hiit_min_secs"].as_integer(), Some(10));

    let (code, stdout, _) = run_cli(dir.path(), &["config", "path"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), dir.path().join("config.toml").display().to_string());
}

#[test]
fn test_preset_lifecycle() {
    let dir = TempDir::new().unwrap();

    let (code, stdout, _) = run_cli(
        dir.path(),
        &["preset", "add", "tabata", "--work", "20", "--rest", "10", "--rounds", "8"],
    );
    assert_eq!(code, 0);
    let preset: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(preset["config"]["work_secs"], 20);

    let (code, stdout, _) = run_cli(dir.path(), &["preset", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("tabata"));

    let (code, _, _) = run_cli(dir.path(), &["preset", "delete", "tabata"]);
    assert_eq!(code, 0);
    let (code, _, _) = run_cli(dir.path(), &["preset", "delete", "tabata"]);
    assert_eq!(code, 1);
}

#[test]
fn test_preset_add_validates_lengths() {
    let dir = TempDir::new().unwrap();
    let (code, _, _) = run_cli(
        dir.path(),
        &["preset", "add", "broken", "--work", "0", "--rest", "10", "--rounds", "8"],
    );
    assert_ne!(code, 0);

    let (code, _, _) = run_cli(
        dir.path(),
        &["preset", "add", "long", "--work", "20", "--rest", "10", "--rounds", "60"],
    );
    assert_ne!(code, 0);
}

#[test]
fn test_empty_history_and_stats() {
    let dir = TempDir::new().unwrap();

    let (code, stdout, _) = run_cli(dir.path(), &["history", "list", "--json"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "[]");

    let (code, stdout, _) = run_cli(dir.path(), &["stats"]);
    assert_eq!(code, 0);
    let stats: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(stats["total_sessions"], 0);
    assert_eq!(stats["streak_days"], 0);
    assert_eq!(stats["today_secs"], 0);
    assert_eq!(stats["daily"].as_array().unwrap().len(), 7);

    let (code, _, _) = run_cli(dir.path(), &["history", "delete", "42"]);
    assert_eq!(code, 1);
}

#[test]
fn test_invalid_hiit_flags_fail_before_running() {
    let dir = TempDir::new().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["hiit", "--work", "0"]);
    assert_ne!(code, 0);

    let (code, _, stderr) = run_cli(dir.path(), &["hiit", "--rounds", "4000000000"]);
    assert_ne!(code, 0);
    assert!(!stderr.contains("keys:"));

    let (code, _, _) = run_cli(dir.path(), &["hiit", "--rounds", "51"]);
    assert_ne!(code, 0);

    let (code, _, _) = run_cli(dir.path(), &["hiit", "--preset", "missing"]);
    assert_eq!(code, 1);
}

#[test]
fn test_plank_with_closed_stdin_records_nothing() {
    let dir = TempDir::new().unwrap();
    let (code, stdout, stderr) = run_cli(dir.path(), &["plank"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("nothing to record"));
    assert!(!stdout.contains("session_saved"));
}

#[test]
fn test_hiit_runs_to_completion_and_is_saved() {
    let dir = TempDir::new().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["config", "set", "recording.hiit_min_secs", "1"]);
    assert_eq!(code, 0);

    let mut child = fittimer(dir.path())
        .args(["hiit", "--work", "1", "--rest", "0", "--rounds", "2"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn CLI");

    // Holding stdin open keeps the run going until it completes by itself.
    let _stdin = child.stdin.take();
    let mut stdout = String::new();
    child
        .stdout
        .take()
        .unwrap()
        .read_to_string(&mut stdout)
        .unwrap();
    assert!(child.wait().unwrap().success());
    assert!(stdout.contains("session_saved"), "stdout: {stdout}");

    let (_, stdout, _) = run_cli(dir.path(), &["history", "list", "--json", "--exercise", "hiit"]);
    let sessions: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(sessions.as_array().unwrap().len(), 1);
    // One tick spent in the zero-length rest between the two rounds.
    assert_eq!(sessions[0]["duration_secs"], 3);
    assert_eq!(sessions[0]["hiit_config"]["rounds"], 2);
}
