//! Integration tests for the `remotegen` CLI binary.
//!
//! These tests cover argument parsing, help output, shell completions and
//! full generation runs against a local mapping file in a temp directory.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `remotegen` binary with env isolation.
///
/// Points config directories at a nonexistent path and clears the
/// `REMOTEGEN_*` variables so tests never touch the user's configuration.
fn remotegen_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("remotegen");
    cmd.env("HOME", "/tmp/remotegen-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/remotegen-cli-test-nonexistent")
        .env_remove("REMOTEGEN_API_TOKEN")
        .env_remove("REMOTEGEN_FORMAT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// A workspace with a mapping file for one IR remote and an empty output root.
fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_json(
        &dir.path().join("devices.json"),
        &serde_json::json!({ "devices": { "den_ir": "den_ir.json" } }),
    );
    write_json(
        &dir.path().join("den_ir.json"),
        &serde_json::json!({
            "device_id": "den_ir",
            "device_name": "Den IR Remote",
            "device_class": "ir_remote",
            "commands": {
                "power_on": { "action": "power_on", "location": "den", "group": "power" },
                "volume_up": { "action": "volume_up", "location": "den", "group": "volume" },
                "mute": { "action": "mute", "location": "den", "group": "volume" }
            }
        }),
    );
    dir
}

fn write_json(path: &Path, value: &serde_json::Value) {
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

/// `remotegen` run inside `dir` against its mapping file and output root.
fn in_workspace(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = remotegen_cmd();
    cmd.current_dir(dir.path())
        .args(["--mapping", "devices.json", "--output-dir", "out"]);
    cmd
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = remotegen_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    remotegen_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("remote-control")
            .and(predicate::str::contains("generate"))
            .and(predicate::str::contains("manifest"))
            .and(predicate::str::contains("devices")),
    );
}

#[test]
fn test_version_flag() {
    remotegen_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("remotegen"));
}

#[test]
fn test_generate_requires_a_selector() {
    let output = remotegen_cmd().arg("generate").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_device_list_conflicts_with_all() {
    let output = remotegen_cmd()
        .args(["generate", "den_ir", "--all"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    remotegen_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    remotegen_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_prints_a_toml_path() {
    remotegen_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("remotegen.toml");

    remotegen_cmd()
        .args(["config", "init", "--path"])
        .arg(&target)
        .assert()
        .success();
    let written = std::fs::read_to_string(&target).unwrap();
    assert!(written.contains("[source]"));

    let output = remotegen_cmd()
        .args(["config", "init", "--path"])
        .arg(&target)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--force"));
}

#[test]
fn test_missing_explicit_config_is_not_found() {
    let output = remotegen_cmd()
        .args(["--config", "/tmp/remotegen-cli-test-nonexistent/none.toml", "check"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}

// ── Generation ──────────────────────────────────────────────────────

#[test]
fn test_generate_writes_page_hook_and_manifest() {
    let dir = workspace();

    let output = in_workspace(&dir)
        .args(["-o", "json", "generate", "den_ir"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["successful"], 1);
    assert_eq!(summary["failed"], 0);

    let out = dir.path().join("out");
    let page = std::fs::read_to_string(out.join("pages/den_ir.tsx")).unwrap();
    assert!(page.contains("volume_up"));
    assert!(out.join("hooks/useDenIrState.ts").is_file());
    let manifest = std::fs::read_to_string(out.join("router/deviceManifest.ts")).unwrap();
    assert!(manifest.contains("/devices/den_ir"));
}

#[test]
fn test_generate_all_with_docs() {
    let dir = workspace();

    in_workspace(&dir)
        .args(["-q", "generate", "--all", "--docs"])
        .assert()
        .success();

    let doc = std::fs::read_to_string(dir.path().join("out/docs/den_ir.md")).unwrap();
    assert!(doc.starts_with("# Den IR Remote"));
}

#[test]
fn test_generate_unknown_device_fails() {
    let dir = workspace();

    let output = in_workspace(&dir)
        .args(["generate", "ghost"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("No device was generated"));
    assert!(!dir.path().join("out/pages/ghost.tsx").exists());
}

#[test]
fn test_no_manifest_leaves_router_untouched() {
    let dir = workspace();

    in_workspace(&dir)
        .args(["-q", "generate", "den_ir", "--no-manifest"])
        .assert()
        .success();

    assert!(dir.path().join("out/pages/den_ir.tsx").is_file());
    assert!(!dir.path().join("out/router/deviceManifest.ts").exists());
}

// ── Manifest ────────────────────────────────────────────────────────

#[test]
fn test_manifest_show_before_generation_is_not_found() {
    let dir = workspace();

    let output = in_workspace(&dir)
        .args(["manifest", "show"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("manifest rebuild"));
}

#[test]
fn test_manifest_rebuild_recovers_deleted_manifest() {
    let dir = workspace();
    in_workspace(&dir)
        .args(["-q", "generate", "den_ir"])
        .assert()
        .success();
    std::fs::remove_file(dir.path().join("out/router/deviceManifest.ts")).unwrap();

    in_workspace(&dir)
        .args(["-o", "plain", "manifest", "rebuild"])
        .assert()
        .success()
        .stdout(predicate::str::contains("den_ir"));

    in_workspace(&dir)
        .args(["-o", "plain", "manifest", "show"])
        .assert()
        .success()
        .stdout(predicate::str::diff("den_ir\n"));
}

// ── Devices ─────────────────────────────────────────────────────────

#[test]
fn test_devices_list_plain() {
    let dir = workspace();

    in_workspace(&dir)
        .args(["-o", "plain", "devices", "list"])
        .assert()
        .success()
        .stdout(predicate::str::diff("den_ir\n"));
}

#[test]
fn test_devices_show_writes_nothing() {
    let dir = workspace();

    in_workspace(&dir)
        .args(["devices", "show", "den_ir"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## Zones"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_devices_show_unknown_is_not_found() {
    let dir = workspace();

    let output = in_workspace(&dir)
        .args(["devices", "show", "ghost"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("devices list"));
}

// ── Check ───────────────────────────────────────────────────────────

#[test]
fn test_check_reports_local_source() {
    let dir = workspace();

    in_workspace(&dir)
        .args(["--color", "never", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is reachable (1 devices)"));
}

#[test]
fn test_check_missing_mapping_fails() {
    let dir = tempfile::tempdir().unwrap();

    let output = remotegen_cmd()
        .current_dir(dir.path())
        .args(["--mapping", "missing.json", "check"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}
