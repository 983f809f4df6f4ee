//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_pomotask"))
        .args(args)
        .env("POMOTASK_DATA_DIR", data_dir)
        .env_remove("POMOTASK_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn run_json(data_dir: &Path, args: &[&str]) -> serde_json::Value {
    let (code, stdout, stderr) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_status_on_fresh_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let status = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(status["type"], "StateSnapshot");
    assert_eq!(status["state"], "idle");
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_start_pause_resume_stop() {
    let dir = tempfile::tempdir().unwrap();
    let started = run_json(
        dir.path(),
        &["timer", "start", "--mode", "custom", "--minutes", "10", "--tag", "Math"],
    );
    assert_eq!(started["type"], "TimerStarted");
    assert_eq!(started["mode"], "custom");
    assert_eq!(started["duration_secs"], 600);
    assert_eq!(started["tag"], "Math");

    assert_eq!(run_json(dir.path(), &["timer", "pause"])["type"], "TimerPaused");
    assert_eq!(run_json(dir.path(), &["timer", "resume"])["type"], "TimerResumed");

    let stopped = run_json(dir.path(), &["timer", "stop"]);
    assert_eq!(stopped["type"], "TimerStopped");
    assert_eq!(run_json(dir.path(), &["timer", "status"])["state"], "idle");
}

#[test]
fn test_invalid_transition_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["timer", "pause"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"), "{stderr}");
}

#[test]
fn test_start_uses_default_tag() {
    let dir = tempfile::tempdir().unwrap();
    let started = run_json(dir.path(), &["timer", "start"]);
    assert_eq!(started["tag"], "Reading");
    assert_eq!(started["duration_secs"], 1500);
    run_json(dir.path(), &["timer", "cancel"]);
}

#[test]
fn test_auto_mode_starts_work_then_refuses_manual_mode() {
    let dir = tempfile::tempdir().unwrap();
    let status = run_json(dir.path(), &["timer", "auto", "on"]);
    assert_eq!(status["auto_mode"], true);
    assert_eq!(status["next_phase"], "work");

    let (code, _, _) = run_cli(dir.path(), &["timer", "start", "--minutes", "5"]);
    assert_ne!(code, 0);

    let started = run_json(dir.path(), &["timer", "start", "--tag", "Work"]);
    assert_eq!(started["mode"], "work");
    assert_eq!(started["cycle_index"], 0);
    run_json(dir.path(), &["timer", "cancel"]);
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "timer.work_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "25");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "timer.work_minutes", "50"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "timer.work_minutes"]);
    assert_eq!(stdout.trim(), "50");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "timer.work_minutes", "0"]);
    assert_ne!(code, 0);
    let (code, _, _) = run_cli(dir.path(), &["config", "get", "timer.nope"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_tags_lists_default_first() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["config", "set", "tags.default", "Health"]);
    assert_eq!(code, 0);
    let (code, stdout, _) = run_cli(dir.path(), &["config", "tags"]);
    assert_eq!(code, 0);
    let tags: Vec<&str> = stdout.lines().collect();
    assert_eq!(tags, vec!["Health", "Reading", "Work", "Other"]);
}

#[test]
fn test_goals_and_progress() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["goals", "set", "Math", "300", "--period", "week"]);
    assert_eq!(code, 0);
    let (code, _, _) = run_cli(dir.path(), &["goals", "set", "Math", "0"]);
    assert_ne!(code, 0);

    let goals = run_json(dir.path(), &["goals", "list", "--json"]);
    assert_eq!(goals[0]["tag"], "Math");
    assert_eq!(goals[0]["target_minutes_per_period"], 300);

    let report = run_json(dir.path(), &["goals", "progress", "--json"]);
    assert_eq!(report["goals"]["Math"]["fraction"], 0.0);

    let (code, _, _) = run_cli(dir.path(), &["goals", "remove", "Math"]);
    assert_eq!(code, 0);
    assert_eq!(run_json(dir.path(), &["goals", "list", "--json"]), serde_json::json!([]));
}

#[test]
fn test_goal_with_long_tag_can_be_removed() {
    let dir = tempfile::tempdir().unwrap();
    let long_tag = "Mathematics and statistics revision block";
    let (code, _, _) = run_cli(dir.path(), &["goals", "set", long_tag, "120"]);
    assert_eq!(code, 0);
    let goals = run_json(dir.path(), &["goals", "list", "--json"]);
    assert_eq!(goals[0]["tag"].as_str().unwrap().chars().count(), 30);

    let (code, _, stderr) = run_cli(dir.path(), &["goals", "remove", long_tag]);
    assert_eq!(code, 0, "{stderr}");
    assert_eq!(run_json(dir.path(), &["goals", "list", "--json"]), serde_json::json!([]));
}

#[test]
fn test_milestones() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(
        dir.path(),
        &["milestones", "add", "Exam", "2024-06-20", "--kind", "countdown"],
    );
    assert_eq!(code, 0);
    let list = run_json(dir.path(), &["milestones", "list", "--date", "2024-06-15", "--json"]);
    assert_eq!(list[0]["name"], "Exam");
    assert_eq!(list[0]["days_delta"], 5);

    let (code, _, _) = run_cli(dir.path(), &["milestones", "add", "  ", "2024-06-20"]);
    assert_ne!(code, 0);
    let (code, _, _) = run_cli(dir.path(), &["milestones", "remove", "Nope"]);
    assert_ne!(code, 0);
}

#[test]
fn test_stats_on_empty_history() {
    let dir = tempfile::tempdir().unwrap();
    let view = run_json(dir.path(), &["stats", "week", "--date", "2024-01-03", "--json"]);
    assert_eq!(view["current"]["start"], "2024-01-01");
    let buckets = view["buckets"].as_array().unwrap();
    assert_eq!(buckets.len(), 1);
    assert!(buckets[0]["tag"].is_null());
    assert_eq!(buckets[0]["total_minutes"], 0.0);

    let (code, stdout, _) = run_cli(dir.path(), &["stats", "month", "--date", "2024-02-10"]);
    assert_eq!(code, 0);
    assert!(stdout.starts_with("2024-02"), "{stdout}");
}

#[test]
fn test_sessions_list_after_stop() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["timer", "start", "--seconds", "3600", "--tag", "Health"]);
    std::thread::sleep(std::time::Duration::from_millis(1100));
    run_json(dir.path(), &["timer", "stop"]);

    let sessions = run_json(dir.path(), &["sessions", "list", "--json"]);
    let sessions = sessions.as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["tag"], "Health");
    assert_eq!(sessions[0]["ended_by"], "stopped");
}
