//! Integration tests for the exapp CLI surface
//!
//! Argument parsing, help and version output.

#![allow(clippy::expect_used)]

use predicates::prelude::*;
use serde_json::Value;

use crate::sandbox::Sandbox;

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    Sandbox::new()
        .exapp()
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "Deploy and register externally hosted application containers",
        ));
}

#[test]
fn test_no_color_accepts_any_non_empty_value() {
    for value in ["1", "true", "yes"] {
        Sandbox::new()
            .exapp()
            .env("NO_COLOR", value)
            .arg("version")
            .assert()
            .success()
            .stdout(predicate::str::contains("exapp"));
    }
}

#[test]
fn test_empty_no_color_is_ignored() {
    Sandbox::new()
        .exapp()
        .env("NO_COLOR", "")
        .arg("version")
        .assert()
        .success();
}

#[test]
fn test_cli_help_lists_commands() {
    let output = Sandbox::new().exapp().arg("--help").assert().success();
    let help = String::from_utf8_lossy(&output.get_output().stdout).into_owned();
    for command in [
        "daemon",
        "deploy",
        "register",
        "unregister",
        "enable",
        "disable",
        "apps",
        "heartbeat",
        "config",
    ] {
        assert!(help.contains(command), "help is missing {command}");
    }
}

#[test]
fn test_cli_version_flag_shows_version() {
    Sandbox::new()
        .exapp()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("exapp"));
}

#[test]
fn test_version_command_shows_version() {
    Sandbox::new()
        .exapp()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("exapp v0.1.0"));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let out = Sandbox::new().json_ok(&["version"]);
    assert_eq!(out, serde_json::json!({ "version": "0.1.0" }));
}

#[test]
fn test_quiet_version_prints_nothing() {
    Sandbox::new()
        .exapp()
        .args(["version", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

// --- Argument validation ---

#[test]
fn test_deploy_requires_image() {
    Sandbox::new()
        .exapp()
        .args(["deploy", "widget"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--image"));
}

#[test]
fn test_daemon_register_rejects_unknown_kind() {
    Sandbox::new()
        .exapp()
        .args(["daemon", "register", "local", "--kind", "kubernetes-install"])
        .assert()
        .code(2);
}

#[test]
fn test_daemon_register_requires_key_with_cert() {
    Sandbox::new()
        .exapp()
        .args([
            "daemon",
            "register",
            "remote",
            "--protocol",
            "https",
            "--host",
            "docker.internal",
            "--ssl-cert",
            "/etc/exapp/client.pem",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--ssl-key"));
}

#[test]
fn test_register_help_documents_scope_flags() {
    Sandbox::new()
        .exapp()
        .args(["register", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--force-scopes"))
        .stdout(predicate::str::contains("--info-json"))
        .stdout(predicate::str::contains("--enable"));
}

#[test]
fn test_apps_empty_registry() {
    let sandbox = Sandbox::new();
    sandbox
        .exapp()
        .arg("apps")
        .assert()
        .success()
        .stdout(predicate::str::contains("No ExApps registered"));

    let out: Value = sandbox.json_ok(&["apps"]);
    assert_eq!(out["apps"], serde_json::json!([]));
}
