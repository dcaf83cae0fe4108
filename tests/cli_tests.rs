use assert_cmd::Command;
use predicates::prelude::*;
use shakaquest::{
    clock::fixed_now,
    session::SessionReport,
    store::{ProgressStore, SqliteProgressStore},
};
use std::path::Path;

fn shakaquest() -> Command {
    Command::cargo_bin("shakaquest").unwrap()
}

fn seed_progress(data_dir: &Path, scores: &[u32]) {
    let mut store = SqliteProgressStore::open(data_dir.join("progress.db")).unwrap();
    for (i, &score) in scores.iter().enumerate() {
        let report = SessionReport {
            score,
            total: 10,
            duration_seconds: 30 + i as u64,
            completed_at: fixed_now() + chrono::Duration::minutes(i as i64),
            questions: Vec::new(),
        };
        store
            .commit_session(&report, report.completed_at.date_naive())
            .unwrap();
    }
}

#[test]
fn help_lists_flags() {
    shakaquest()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--questions"))
        .stdout(predicate::str::contains("--export-history"));
}

#[test]
fn stats_on_fresh_data_dir() {
    let dir = tempfile::tempdir().unwrap();

    shakaquest()
        .arg("--data-dir")
        .arg(dir.path())
        .arg("--stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Level 1 (0 XP, 100 to next level)"))
        .stdout(predicate::str::contains("Last result none"));

    assert!(dir.path().join("progress.db").exists());
}

#[test]
fn stats_after_sessions() {
    let dir = tempfile::tempdir().unwrap();
    seed_progress(dir.path(), &[7, 9]);

    shakaquest()
        .arg("--data-dir")
        .arg(dir.path())
        .arg("--stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Level 2 (160 XP, 40 to next level)"))
        .stdout(predicate::str::contains("Quizzes 2"))
        .stdout(predicate::str::contains("Accuracy 80% (16/20)"))
        .stdout(predicate::str::contains("Last result 9/10 (90%) in 31s"));
}

#[test]
fn export_history_writes_csv_oldest_first() {
    let dir = tempfile::tempdir().unwrap();
    seed_progress(dir.path(), &[3, 8]);
    let out = dir.path().join("history.csv");

    shakaquest()
        .arg("--data-dir")
        .arg(dir.path())
        .arg("--export-history")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("exported 2 sessions"));

    let csv = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "completed_at,score,total,duration_seconds,accuracy");
    assert!(lines[1].ends_with(",3,10,30,30"));
    assert!(lines[2].ends_with(",8,10,31,80"));
}

#[test]
fn save_config_then_reuse() {
    let dir = tempfile::tempdir().unwrap();

    shakaquest()
        .arg("--data-dir")
        .arg(dir.path())
        .args(["-n", "12", "-c", "japan-ja", "--save-config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("saved defaults"));

    let saved = std::fs::read_to_string(dir.path().join("config.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(value["question_count"], 12);
    assert_eq!(value["catalog"], "japan-ja");
}

#[test]
fn rejects_zero_questions() {
    shakaquest()
        .args(["-n", "0", "--stats"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("0"));
}

#[test]
fn quiz_requires_a_tty() {
    let dir = tempfile::tempdir().unwrap();

    shakaquest()
        .arg("--data-dir")
        .arg(dir.path())
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("stdin must be a tty"));
}
