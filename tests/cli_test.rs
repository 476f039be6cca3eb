//! Integration tests for the armory binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![cfg(unix)]
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn catalog(dir: &Path) -> String {
    let d = dir.display();
    format!(
        r#"
settings:
  require_root: false
steps:
  - id: alpha
    description: Alpha marker
    check: {{ file_exists: {d}/alpha }}
    action: {{ shell: {{ run: "touch {d}/alpha" }} }}
  - id: broken
    description: Always fails
    check: {{ file_exists: {d}/broken }}
    action: {{ shell: {{ run: "exit 3" }} }}
groups:
  - name: basics
    steps: [alpha]
"#
    )
}

fn setup_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("armory.yml"), catalog(temp.path())).unwrap();
    temp
}

fn armory(dir: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin("armory"));
    cmd.current_dir(dir)
        .env_remove("ARMORY_CONFIG")
        .env_remove("ARMORY_NON_INTERACTIVE")
        .env_remove("ARMORY_PROMPT_STEPS")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    armory(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("status"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    armory(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn run_provisions_then_skips() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project();

    armory(temp.path())
        .args(["run", "alpha", "--non-interactive"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 succeeded"));
    assert!(temp.path().join("alpha").exists());

    armory(temp.path())
        .args(["run", "alpha", "--non-interactive"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already satisfied"));
    Ok(())
}

#[test]
fn failed_step_exits_one_and_others_still_run() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project();

    armory(temp.path())
        .args(["run", "broken,alpha", "--non-interactive"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("(exit 3)"));
    assert!(temp.path().join("alpha").exists());
    Ok(())
}

#[test]
fn run_group_by_name() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project();

    armory(temp.path())
        .args(["run", "--group", "basics", "--non-interactive"])
        .assert()
        .success();
    assert!(temp.path().join("alpha").exists());
    Ok(())
}

#[test]
fn unknown_group_is_a_setup_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project();

    armory(temp.path())
        .args(["run", "--group", "nope", "--non-interactive"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nope"));
    Ok(())
}

#[test]
fn non_interactive_without_selection_explains_override() -> Result<(), Box<dyn std::error::Error>>
{
    let temp = setup_project();

    armory(temp.path())
        .args(["run", "--non-interactive"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("ARMORY_PROMPT_STEPS"));
    Ok(())
}

#[test]
fn prompt_override_selects_steps() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project();

    armory(temp.path())
        .args(["run", "--non-interactive"])
        .env("ARMORY_PROMPT_STEPS", "alpha")
        .assert()
        .success();
    assert!(temp.path().join("alpha").exists());
    Ok(())
}

#[test]
fn missing_explicit_config_exits_two() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;

    armory(temp.path())
        .args(["--config", "missing.yml", "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing.yml"));
    Ok(())
}

#[test]
fn run_json_reports_state_and_results() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project();

    let output = armory(temp.path())
        .args(["run", "alpha,broken", "--json"])
        .output()?;

    assert_eq!(output.status.code(), Some(1));
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(doc["state"], "completed");
    assert_eq!(doc["any_failed"], true);
    assert_eq!(doc["results"][0]["step_id"], "alpha");
    assert_eq!(doc["results"][1]["step_id"], "broken");
    Ok(())
}

#[test]
fn list_shows_steps_in_catalog_order() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project();

    armory(temp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::is_match("(?s)alpha.*broken.*basics")?);
    Ok(())
}

#[test]
fn list_json_includes_groups() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project();

    let output = armory(temp.path()).args(["list", "--json"]).output()?;

    assert!(output.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(doc["steps"][0]["id"], "alpha");
    assert_eq!(doc["steps"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[test]
fn status_does_not_change_anything() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project();

    armory(temp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("missing"))
        .stdout(predicate::str::contains("0 of 2"));
    assert!(!temp.path().join("alpha").exists());
    Ok(())
}

#[test]
fn completions_generate_for_bash() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;

    armory(temp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("armory"));
    Ok(())
}
