// CLI surface tests for the spy-cat-agency binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("spy-cat-agency").unwrap();

    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_config_prints_effective_toml() {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("spy-cat-agency").unwrap();

    cmd.current_dir(dir.path())
        .env("SPY_CAT_SERVER__PORT", "7123")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[server]"))
        .stdout(predicate::str::contains("port = 7123"))
        .stdout(predicate::str::contains("https://api.thecatapi.com/v1/breeds"));
}

#[test]
fn test_config_reads_toml_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("spy-cat.toml"),
        "[breeds]\ncache_ttl_hours = 2\n",
    )
    .unwrap();
    let mut cmd = Command::cargo_bin("spy-cat-agency").unwrap();

    cmd.current_dir(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("cache_ttl_hours = 2"));
}

#[test]
fn test_migrate_creates_database() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("cli.db");
    let mut cmd = Command::cargo_bin("spy-cat-agency").unwrap();

    cmd.current_dir(dir.path())
        .env("SPY_CAT_DATABASE__URL", format!("sqlite://{}", db.display()))
        .arg("migrate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Migrations applied"));
    assert!(db.exists());
}

#[test]
fn test_unknown_subcommand_fails() {
    let mut cmd = Command::cargo_bin("spy-cat-agency").unwrap();
    cmd.arg("launch").assert().failure();
}
