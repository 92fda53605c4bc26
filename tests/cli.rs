use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use predicates::str::contains;
use std::fs;
use tempfile::TempDir;

fn inbox() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp directory");
    fs::write(dir.path().join("a.JPG"), "jpg").unwrap();
    fs::write(dir.path().join("b.mp3"), "mp3").unwrap();
    fs::create_dir(dir.path().join("Photos")).unwrap();
    fs::write(dir.path().join("Photos/d.png"), "png").unwrap();
    dir
}

#[test]
fn dry_run_prints_report_and_changes_nothing() {
    let dir = inbox();
    cargo_bin_cmd!("dirsort")
        .arg(dir.path())
        .arg("--dry-run")
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(contains("SUMMARY"))
        .stdout(contains("No files were modified"));

    assert!(dir.path().join("a.JPG").is_file());
    assert!(dir.path().join("Photos/d.png").is_file());
    assert!(!dir.path().join("images").exists());
}

#[test]
fn json_report_has_counts() {
    let dir = inbox();
    let output = cargo_bin_cmd!("dirsort")
        .arg(dir.path())
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value =
        serde_json::from_slice(&output).expect("report should be JSON");
    assert_eq!(report["total"], 3);
    assert_eq!(report["counts"]["images"], 2);
    assert_eq!(report["counts"]["audio"], 1);
    assert_eq!(report["counts"]["video"], 0);
}

#[test]
fn yes_flag_organizes_without_prompt() {
    let dir = inbox();
    cargo_bin_cmd!("dirsort")
        .args(["-y"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(contains("DONE"));

    assert!(dir.path().join("images/a.JPG").is_file());
    assert!(dir.path().join("images/d.png").is_file());
    assert!(dir.path().join("audio/b.mp3").is_file());
    assert!(!dir.path().join("Photos").exists());
}

#[test]
fn missing_directory_fails() {
    cargo_bin_cmd!("dirsort")
        .arg("/non/existent/dirsort/root")
        .arg("--dry-run")
        .assert()
        .failure()
        .stderr(contains("Error").and(contains("/non/existent/dirsort/root")));
}

#[test]
fn help_mentions_flags() {
    cargo_bin_cmd!("dirsort")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("--dry-run"))
        .stdout(contains("--json"))
        .stdout(contains("--yes"));
}
