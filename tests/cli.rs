use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const MARCH: &str = "Date,ID,SubjectCode,Amount,Remarks,SetID\n\
    2024-03-01,,101,-44881,Carry over,99\n\
    2024-03-01,,100,-20000,Carry over,99\n\
    2024-03-01,,102,20000,Carry over,99\n\
    2024-03-02,,500,-850,Shogo,01\n\
    2024-03-02,,530,850,Shogo,01\n\
    2024-03-02,,101,-1850,PayPay,02\n\
    2024-03-02,,500,1850,PayPay,02\n";

const UNBALANCED: &str = "Date,SubjectCode,Amount,Remarks,SetID\n\
    20240305,500,1200,Lunch,01\n\
    20240305,101,-1000,Lunch,01\n";

fn ledger(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ledger").unwrap();
    cmd.env("LEDGER_DATA_DIR", data_dir)
        .env_remove("LEDGER_DATABASE")
        .env("LOG_LEVEL", "error");
    cmd
}

fn write_csv(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_init_creates_layout() {
    let data = TempDir::new().unwrap();

    ledger(data.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialization complete!"));

    assert!(data.path().join("config.json").exists());
    assert!(data.path().join("codes.json").exists());
    assert!(data.path().join("override_rules.csv").exists());
    assert!(data.path().join("ledger.db").exists());
    assert!(data.path().join("data").join("uploads").is_dir());
}

#[test]
fn test_process_confirm_and_trial() {
    let data = TempDir::new().unwrap();
    let input = TempDir::new().unwrap();
    let file = write_csv(&input, "march.csv", MARCH);

    ledger(data.path()).arg("init").assert().success();

    ledger(data.path())
        .arg("process")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Staged 7 rows from march.csv"))
        .stdout(predicate::str::contains("All sets balanced"))
        .stdout(predicate::str::contains("20240302_002"));

    ledger(data.path())
        .arg("c")
        .assert()
        .success()
        .stdout(predicate::str::contains("Inserted: 7"))
        .stdout(predicate::str::contains("Archived: march.csv"));

    assert!(data.path().join("data/confirmed/march.csv").exists());

    ledger(data.path())
        .args(["trial", "2024-03"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Trial Balance 2024-03"))
        .stdout(predicate::str::contains("22700.00"))
        .stdout(predicate::str::contains("67581.00"));

    ledger(data.path())
        .args(["export", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"entry_count\": 7"));

    ledger(data.path())
        .arg("audit")
        .assert()
        .success()
        .stdout(predicate::str::contains("STAGE"))
        .stdout(predicate::str::contains("CONFIRM"));
}

#[test]
fn test_unbalanced_set_is_not_confirmed() {
    let data = TempDir::new().unwrap();
    let input = TempDir::new().unwrap();
    let file = write_csv(&input, "bad.csv", UNBALANCED);

    ledger(data.path())
        .arg("p")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 unbalanced set(s) found"));

    ledger(data.path())
        .arg("confirm")
        .assert()
        .failure()
        .stdout(predicate::str::contains("20240305_001"))
        .stderr(predicate::str::contains("nothing was confirmed"));

    ledger(data.path())
        .args(["check", "summary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("temp_journal"));
}

#[test]
fn test_process_missing_file_fails() {
    let data = TempDir::new().unwrap();

    ledger(data.path())
        .args(["process", "does-not-exist.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_close_without_entries_reports_nothing_to_close() {
    let data = TempDir::new().unwrap();

    ledger(data.path())
        .args(["close", "2024-02"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to close for 2024-02"));
}
