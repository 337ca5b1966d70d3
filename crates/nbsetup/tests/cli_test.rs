//! Integration tests for the `nbsetup` binary.
//!
//! Argument parsing, help output, completions, the stage table, input
//! validation and configuration errors. None of them need a NetBox.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `nbsetup` binary with env isolation.
///
/// Clears all `NBSETUP_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn nbsetup_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("nbsetup");
    cmd.env("HOME", "/tmp/nbsetup-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/nbsetup-cli-test-nonexistent")
        .env_remove("NBSETUP_PROFILE")
        .env_remove("NBSETUP_URL")
        .env_remove("NBSETUP_TOKEN")
        .env_remove("NBSETUP_INSECURE")
        .env_remove("NBSETUP_TIMEOUT")
        .env_remove("NBSETUP_DEFAULT_PROFILE")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

const ORGANISATION: &str = r"
tenant:
  - name: Acme
    site:
      - name: DC1
        location:
          - name: Hall A
            rack:
              - {name: R01, role: Cabinet}
rack_role:
  - name: Cabinet
";

fn input_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, text) in files {
        std::fs::write(dir.path().join(name), text).unwrap();
    }
    dir
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = nbsetup_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    nbsetup_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("NetBox")
            .and(predicate::str::contains("run"))
            .and(predicate::str::contains("validate"))
            .and(predicate::str::contains("stages")),
    );
}

#[test]
fn test_run_help_lists_stage_flags() {
    nbsetup_cmd().args(["run", "--help"]).assert().success().stdout(
        predicate::str::contains("--organisation")
            .and(predicate::str::contains("-V, --virtualisation"))
            .and(predicate::str::contains("-C, --contacts"))
            .and(predicate::str::contains("--strict")),
    );
}

#[test]
fn test_version_flag() {
    nbsetup_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nbsetup"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    nbsetup_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    nbsetup_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Stages ──────────────────────────────────────────────────────────

#[test]
fn test_stages_table() {
    nbsetup_cmd().arg("stages").assert().success().stdout(
        predicate::str::contains("organisation")
            .and(predicate::str::contains("virtualisation"))
            .and(predicate::str::contains("contact_assign"))
            .and(predicate::str::contains("Rack Role")),
    );
}

// ── Validate ────────────────────────────────────────────────────────

#[test]
fn test_validate_accepts_consistent_input() {
    let dir = input_dir(&[("organisation.yml", ORGANISATION)]);
    nbsetup_cmd()
        .args(["--color", "never", "validate"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}

#[test]
fn test_validate_reports_findings_with_usage_exit() {
    let dir = input_dir(&[
        ("organisation.yml", ORGANISATION),
        ("roles.yaml", "rack_role:\n  - name: Cabinet\n  - name: Cabinet\n"),
    ]);
    let output = nbsetup_cmd()
        .args(["--color", "never", "validate"])
        .arg(dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ORGANISATION"), "{stdout}");
    assert!(stdout.contains("duplicate rack roles 'Cabinet'"), "{stdout}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("problem(s)"), "{stderr}");
}

#[test]
fn test_validate_missing_directory() {
    let output = nbsetup_cmd()
        .args(["validate", "/tmp/nbsetup-cli-test-nonexistent/input"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Invalid input"));
}

// ── Run without configuration ───────────────────────────────────────

#[test]
fn test_run_without_config_asks_for_one() {
    let dir = input_dir(&[("organisation.yml", ORGANISATION)]);
    nbsetup_cmd()
        .args(["run", "-o"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No NetBox configured"));
}

#[test]
fn test_run_with_unknown_profile() {
    let dir = input_dir(&[("organisation.yml", ORGANISATION)]);
    nbsetup_cmd()
        .args(["-p", "staging", "run", "-o"])
        .arg(dir.path())
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Profile 'staging' not found"));
}

#[test]
fn test_run_without_token() {
    let dir = input_dir(&[("organisation.yml", ORGANISATION)]);
    nbsetup_cmd()
        .args(["--url", "https://netbox.invalid", "run", "-o"])
        .arg(dir.path())
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No API token"));
}

#[test]
fn test_run_checks_sections_before_connecting() {
    let dir = input_dir(&[("organisation.yml", ORGANISATION)]);
    nbsetup_cmd()
        .args(["run", "-d"])
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("device_role"));
}

#[test]
fn test_config_show_no_config() {
    nbsetup_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[defaults]"));
}
