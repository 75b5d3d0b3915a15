//! CLI interface tests

use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn termarchive() -> Command {
    Command::new(env!("CARGO_BIN_EXE_termarchive"))
}

#[test]
fn test_help_command() {
    let output = termarchive()
        .arg("--help")
        .output()
        .expect("Failed to run help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("upload"), "Should list upload command");
    assert!(stdout.contains("search"), "Should list search command");
    assert!(stdout.contains("resource"), "Should list resource command");
    assert!(stdout.contains("item"), "Should list item command");
    assert!(stdout.contains("config"), "Should list config command");
    assert!(stdout.contains("--db"), "Should have global db option");
}

#[test]
fn test_version_command() {
    let output = termarchive()
        .arg("--version")
        .output()
        .expect("Failed to run version");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("termarchive"), "Should show program name");
}

#[test]
fn test_upload_help() {
    let output = termarchive()
        .args(["upload", "--help"])
        .output()
        .expect("Failed to run upload help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--into"), "Should have into option");
    assert!(stdout.contains("--title"), "Should have title option");
    assert!(stdout.contains("--kind"), "Should have kind option");
}

#[test]
fn test_search_help() {
    let output = termarchive()
        .args(["search", "--help"])
        .output()
        .expect("Failed to run search help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--scope"), "Should have scope option");
    assert!(stdout.contains("--no-notes"), "Should have no-notes option");
    assert!(stdout.contains("--format"), "Should have format option");
}

#[test]
fn test_search_requires_query() {
    let output = termarchive()
        .arg("search")
        .output()
        .expect("Failed to run search");

    assert!(!output.status.success(), "Search without a query should fail");
}

#[test]
fn test_config_set_and_get() {
    let temp = TempDir::new().unwrap();
    let config_dir = temp.path().join("config");

    let output = termarchive()
        .env("TERMARCHIVE_CONFIG_DIR", &config_dir)
        .env("NO_COLOR", "1")
        .args(["config", "set", "search.include_notes", "false"])
        .output()
        .expect("Failed to run config set");
    assert!(
        output.status.success(),
        "Config set should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let saved = fs::read_to_string(config_dir.join("config.toml")).unwrap();
    assert!(saved.contains("include_notes = false"));

    let output = termarchive()
        .env("TERMARCHIVE_CONFIG_DIR", &config_dir)
        .args(["config", "get", "search.include_notes"])
        .output()
        .expect("Failed to run config get");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("search.include_notes = false"));
}

#[test]
fn test_config_rejects_unknown_key() {
    let temp = TempDir::new().unwrap();

    let output = termarchive()
        .env("TERMARCHIVE_CONFIG_DIR", temp.path())
        .args(["config", "set", "search.colour", "red"])
        .output()
        .expect("Failed to run config set");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown config key"));
}
