//! CLI integration tests for keystash
//!
//! End-to-end runs of the binary against a scratch store.

use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A scratch directory with an empty config file, so the user's global
/// config never leaks into a test
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), "").unwrap();
        Self { dir }
    }

    fn store(&self) -> PathBuf {
        self.dir.path().join("data").join("store.json")
    }

    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("keystash"));
        cmd.env_remove("KEYSTASH_STORE")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.dir.path().join("config.toml"))
            .arg("--store")
            .arg(self.store());
        cmd
    }
}

// =============================================================================
// Basic Operations
// =============================================================================

#[test]
fn test_set_then_get() {
    let fx = Fixture::new();

    fx.cmd()
        .args(["set", "foo", "\"bar\""])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stored foo"));

    fx.cmd()
        .args(["get", "foo"])
        .assert()
        .success()
        .stdout("bar\n");
}

#[test]
fn test_set_string_flag_stores_verbatim() {
    let fx = Fixture::new();

    fx.cmd()
        .args(["set", "greeting", "hello world", "--string"])
        .assert()
        .success();

    fx.cmd()
        .args(["--format", "json", "get", "greeting"])
        .assert()
        .success()
        .stdout("\"hello world\"\n");
}

#[test]
fn test_set_rejects_invalid_json() {
    let fx = Fixture::new();

    fx.cmd()
        .args(["set", "foo", "not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid JSON value"));

    assert!(!fx.store().exists());
}

#[test]
fn test_missing_key_and_default() {
    let fx = Fixture::new();

    fx.cmd().args(["has", "missing"]).assert().success().stdout("false\n");

    fx.cmd()
        .args(["get", "missing", "--default", "\"def\""])
        .assert()
        .success()
        .stdout("def\n");

    fx.cmd().args(["get", "missing"]).assert().success().stdout("null\n");
}

#[test]
fn test_remove_twice() {
    let fx = Fixture::new();

    fx.cmd().args(["set", "foo", "\"bar\""]).assert().success();

    fx.cmd()
        .args(["--format", "json", "remove", "foo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"removed\":true"));

    fx.cmd()
        .args(["--format", "json", "rm", "foo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"removed\":false"));

    fx.cmd().args(["has", "foo"]).assert().success().stdout("false\n");
}

#[test]
fn test_clear() {
    let fx = Fixture::new();

    fx.cmd().args(["set", "a", "1"]).assert().success();
    fx.cmd().args(["set", "b", "2"]).assert().success();

    fx.cmd().arg("clear").assert().success();

    fx.cmd().args(["has", "a"]).assert().success().stdout("false\n");
    fx.cmd().args(["has", "b"]).assert().success().stdout("false\n");

    // The document survives as an empty object
    assert_eq!(fs::read_to_string(fx.store()).unwrap(), "{}");
}

#[test]
fn test_float_round_trip() {
    let fx = Fixture::new();

    fx.cmd().args(["set", "f", "3.14"]).assert().success();
    fx.cmd().args(["get", "f"]).assert().success().stdout("3.14\n");
}

#[test]
fn test_out_of_range_float_is_rejected() {
    let fx = Fixture::new();

    // Beyond the largest finite float
    fx.cmd()
        .args(["set", "f", "1.0e400"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported value"))
        .stderr(predicate::str::contains("--string").not());

    fx.cmd().args(["has", "f"]).assert().success().stdout("false\n");
}

#[test]
fn test_keys_lists_normalized_keys() {
    let fx = Fixture::new();

    fx.cmd().args(["set", "b", "true"]).assert().success();
    fx.cmd().args(["set", "1", "[1,2]"]).assert().success();

    fx.cmd()
        .args(["--format", "json", "keys"])
        .assert()
        .success()
        .stdout("[\"1\",\"b\"]\n");
}

// =============================================================================
// Provisioning and Configuration
// =============================================================================

#[test]
fn test_creates_missing_directories() {
    let fx = Fixture::new();
    assert!(!fx.store().parent().unwrap().exists());

    fx.cmd().args(["set", "k", "1"]).assert().success();

    assert!(fx.store().is_file());
}

#[test]
fn test_no_create_dirs_fails_on_missing_directory() {
    let fx = Fixture::new();

    fx.cmd()
        .args(["--no-create-dirs", "set", "k", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));

    assert!(!fx.store().exists());
}

#[test]
fn test_config_file_supplies_store_path() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("from-config.json");
    let config = dir.path().join("config.toml");
    fs::write(
        &config,
        format!(
            "[store]\npath = {:?}\npretty = true\n",
            store.display().to_string()
        ),
    )
    .unwrap();

    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("keystash"))
        .env_remove("KEYSTASH_STORE")
        .arg("--config")
        .arg(&config)
        .args(["set", "k", "{\"a\":1}"])
        .assert()
        .success();

    let text = fs::read_to_string(&store).unwrap();
    assert!(text.contains('\n'));
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json, serde_json::json!({"k": {"a": 1}}));
}

#[test]
fn test_path_command() {
    let fx = Fixture::new();

    fx.cmd()
        .arg("path")
        .assert()
        .success()
        .stdout(predicate::str::contains("store.json"));
}

#[test]
fn test_corrupt_document_is_reported() {
    let fx = Fixture::new();
    fs::create_dir_all(fx.store().parent().unwrap()).unwrap();
    fs::write(fx.store(), "{oops").unwrap();

    fx.cmd()
        .args(["get", "k"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupt"));

    // Untouched
    assert_eq!(fs::read_to_string(fx.store()).unwrap(), "{oops");
}
