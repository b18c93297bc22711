//! End-to-end CLI runs against a throwaway state directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn changegate(dir: &Path, operator: &str) -> Command {
    let mut cmd = Command::cargo_bin("changegate").unwrap();
    cmd.current_dir(dir)
        .env_remove("CHANGEGATE_OPERATOR")
        .env_remove("CHANGEGATE_STATE_DIR")
        .env("NO_COLOR", "1")
        .arg("--state-dir")
        .arg(dir.join("state"))
        .arg("--operator")
        .arg(operator);
    cmd
}

/// Config wiring a few kinds to local shell commands run from `dir`.
fn write_config(dir: &Path) {
    std::fs::write(
        dir.join(".changegate.yaml"),
        r#"registry: cli-test
executors:
  activate_ranking: "true"
  activate_irt: "echo calibration endpoint refused >&2; exit 3"
  run_warehouse_export: "true"
  run_graph_sync: "cp state/queue.json queue-during-sync.json && cat state/logs/*.jsonl > log-during-sync.jsonl"
"#,
    )
    .unwrap();
}

fn staged_ids(dir: &Path) -> Vec<String> {
    let content = std::fs::read_to_string(dir.join("state").join("queue.json")).unwrap();
    let queue: serde_json::Value = serde_json::from_str(&content).unwrap();
    queue["actions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_stage_list_apply_dry_run() {
    let tmp = TempDir::new().unwrap();

    changegate(tmp.path(), "alice")
        .args(["stage", "activate_irt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Staged"));
    changegate(tmp.path(), "alice")
        .args(["stage", "enable_search_engine", "--payload", r#"{"engine":"bm25"}"#])
        .assert()
        .success();

    changegate(tmp.path(), "alice")
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 staged change(s)"))
        .stdout(predicate::str::contains("activate_irt"));

    changegate(tmp.path(), "alice")
        .args([
            "apply",
            "--dry-run",
            "--reason",
            "rolling out calibrated scoring",
            "--confirm",
            "apply changes",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing executed"));

    // Nothing ran, so nothing leaves the queue or reaches the log as applied
    assert_eq!(staged_ids(tmp.path()).len(), 2);

    changegate(tmp.path(), "alice")
        .args(["log", "--summary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 applied"));
}

#[test]
fn test_each_step_is_recorded_as_it_lands() {
    let tmp = TempDir::new().unwrap();
    write_config(tmp.path());
    for action in ["run_warehouse_export", "run_graph_sync"] {
        changegate(tmp.path(), "alice")
            .args(["stage", action])
            .assert()
            .success();
    }
    let ids = staged_ids(tmp.path());

    changegate(tmp.path(), "alice")
        .args([
            "apply",
            "--reason",
            "nightly export and graph repair",
            "--confirm",
            "APPLY CHANGES",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 succeeded"));
    assert!(staged_ids(tmp.path()).is_empty());

    // What the second step saw on disk while it was running
    let queue_mid_run = std::fs::read_to_string(tmp.path().join("queue-during-sync.json")).unwrap();
    assert!(!queue_mid_run.contains(&ids[0]));
    assert!(queue_mid_run.contains(&ids[1]));

    let log_mid_run = std::fs::read_to_string(tmp.path().join("log-during-sync.jsonl")).unwrap();
    assert!(log_mid_run.contains("batch_step"));
    assert!(log_mid_run.contains(&ids[0]));
}

#[test]
fn test_partial_batch_exits_nonzero() {
    let tmp = TempDir::new().unwrap();
    write_config(tmp.path());
    for action in ["activate_irt", "run_warehouse_export"] {
        changegate(tmp.path(), "alice")
            .args(["stage", action])
            .assert()
            .success();
    }

    changegate(tmp.path(), "alice")
        .args([
            "apply",
            "--reason",
            "calibration signed off by research",
            "--confirm",
            "APPLY CHANGES",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("1 failed"))
        .stderr(predicate::str::contains("not applied"));

    assert_eq!(staged_ids(tmp.path()).len(), 2);

    changegate(tmp.path(), "alice")
        .args(["log", "--summary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 applied | 1 failed | 1 skipped"));

    // Operators cannot opt out of skip-on-failure
    changegate(tmp.path(), "alice")
        .args(["apply", "--keep-going"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--keep-going"));
}

#[test]
fn test_wrong_phrase_fails_and_keeps_queue() {
    let tmp = TempDir::new().unwrap();
    changegate(tmp.path(), "alice")
        .args(["stage", "run_graph_sync"])
        .assert()
        .success();

    changegate(tmp.path(), "alice")
        .args([
            "apply",
            "--dry-run",
            "--reason",
            "nightly consistency repair",
            "--confirm",
            "APPLY",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("confirmation phrase does not match"));

    assert_eq!(staged_ids(tmp.path()).len(), 1);
}

#[test]
fn test_stage_unknown_action_fails() {
    let tmp = TempDir::new().unwrap();
    changegate(tmp.path(), "alice")
        .args(["stage", "drop_database"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown action type"));
}

#[test]
fn test_remove_by_prefix() {
    let tmp = TempDir::new().unwrap();
    for action in ["run_graph_sync", "run_warehouse_export"] {
        changegate(tmp.path(), "alice")
            .args(["stage", action])
            .assert()
            .success();
    }
    let ids = staged_ids(tmp.path());

    changegate(tmp.path(), "alice")
        .args(["remove", &ids[0][..8]])
        .assert()
        .success();
    assert_eq!(staged_ids(tmp.path()), vec![ids[1].clone()]);

    changegate(tmp.path(), "alice")
        .arg("clear")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 1"));
    assert!(staged_ids(tmp.path()).is_empty());
}

#[test]
fn test_two_person_approval() {
    let tmp = TempDir::new().unwrap();
    write_config(tmp.path());
    changegate(tmp.path(), "alice")
        .args([
            "request",
            "activate_ranking",
            "--reason",
            "shadow metrics beat baseline for a week",
            "--confirm",
            "ACTIVATE RANKING",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Approval requested"));

    let content = std::fs::read_to_string(tmp.path().join("state").join("approvals.json")).unwrap();
    let requests: serde_json::Value = serde_json::from_str(&content).unwrap();
    let id = requests[0]["request_id"].as_str().unwrap().to_string();

    changegate(tmp.path(), "alice")
        .args(["approve", &id, "--confirm", "ACTIVATE RANKING"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot approve their own request"));

    changegate(tmp.path(), "bob")
        .args(["approve", &id, "--confirm", "ACTIVATE RANKING"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Approved and applied"));

    changegate(tmp.path(), "bob")
        .arg("pending")
        .assert()
        .success()
        .stdout(predicate::str::contains("No pending approval requests"));
}

#[test]
fn test_init_then_check() {
    let tmp = TempDir::new().unwrap();
    changegate(tmp.path(), "alice")
        .arg("init")
        .assert()
        .success();
    assert!(tmp.path().join(".changegate.yaml").exists());

    changegate(tmp.path(), "alice")
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn test_status_from_snapshot() {
    let tmp = TempDir::new().unwrap();
    let snapshot = tmp.path().join("status.json");
    std::fs::write(
        &snapshot,
        r#"{"runtime_config": {"safe_mode": {"freeze_updates": true}}}"#,
    )
    .unwrap();

    changegate(tmp.path(), "alice")
        .arg("status")
        .arg("--snapshot")
        .arg(&snapshot)
        .assert()
        .success()
        .stdout(predicate::str::contains("UNSAFE"));
}
