//! Command-line behaviour that needs no network.

use assert_cmd::Command;
use predicates::prelude::*;

fn invp(config_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("invp").unwrap();
    cmd.env_remove("INVP_API_KEY")
        .env_remove("INVP_BASE_URL")
        .env_remove("INVP_POLLING_INTERVAL")
        .env_remove("INVP_POLLING_WAIT")
        .env("HOME", config_dir)
        .env("XDG_CONFIG_HOME", config_dir);
    cmd
}

#[test]
fn parse_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    invp(dir.path())
        .args(["parse", "does-not-exist.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn parse_unsupported_format_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("invoice.docx");
    std::fs::write(&input, b"x").unwrap();

    invp(dir.path())
        .arg("parse")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}

#[test]
fn parse_without_api_key_fails_before_network() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("invoice.pdf");
    std::fs::write(&input, b"%PDF-1.7").unwrap();

    invp(dir.path())
        .env("INVP_BASE_URL", "http://127.0.0.1:1")
        .arg("parse")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key is required"));
}

#[test]
fn config_init_and_get() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("invp.json");

    invp(dir.path())
        .args(["config", "init", "--api-key", "secret", "--output"])
        .arg(&config)
        .assert()
        .success();

    invp(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "api_job_status_polling_wait"])
        .assert()
        .success()
        .stdout(predicate::str::contains("180"));

    invp(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("***").and(predicate::str::contains("secret").not()));
}

#[test]
fn config_init_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("invp.json");
    std::fs::write(&config, "{}").unwrap();

    invp(dir.path())
        .args(["config", "init", "--output"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}
