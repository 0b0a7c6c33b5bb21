//! Integration tests for `exapp config`.
//!
//! Every test points `EXAPP_CONFIG` at a temp path so `~/.exapp/config.yaml`
//! is never read or written.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use predicates::prelude::*;

use crate::sandbox::Sandbox;

#[test]
fn test_config_help_shows_show_and_set_subcommands() {
    Sandbox::new()
        .exapp()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("set"));
}

#[test]
fn test_config_show_without_file_uses_defaults() {
    Sandbox::new()
        .exapp()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("docker.cleanup"))
        .stdout(predicate::str::contains("keep"))
        .stdout(predicate::str::contains("v1.41"));
}

#[test]
fn test_config_show_json_reports_path_and_values() {
    let sandbox = Sandbox::new();
    let out = sandbox.json_ok(&["config", "show"]);
    assert_eq!(out["path"], sandbox.config.display().to_string());
    assert_eq!(out["config"]["docker"]["cleanup"], "keep");
    assert_eq!(out["config"]["docker"]["api_version"], "v1.41");
}

#[test]
fn test_config_set_persists_value() {
    let sandbox = Sandbox::new();
    sandbox
        .exapp()
        .args(["config", "set", "docker.cleanup", "remove-unstarted"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set docker.cleanup = remove-unstarted"));

    assert!(sandbox.config.exists());
    let out = sandbox.json_ok(&["config", "show"]);
    assert_eq!(out["config"]["docker"]["cleanup"], "remove-unstarted");
}

#[test]
fn test_config_set_json_acknowledges() {
    let sandbox = Sandbox::new();
    let out = sandbox.json_ok(&["config", "set", "callback.timeout_secs", "15"]);
    assert_eq!(out["saved"], true);
    let out = sandbox.json_ok(&["config", "show"]);
    assert_eq!(out["config"]["callback"]["timeout_secs"], 15);
}

#[test]
fn test_config_set_unknown_key_fails() {
    Sandbox::new()
        .exapp()
        .args(["config", "set", "docker.colour", "blue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown setting"));
}

#[test]
fn test_config_set_invalid_value_fails_with_json_error() {
    let sandbox = Sandbox::new();
    let err = sandbox.json_err(&["config", "set", "docker.cleanup", "sometimes"]);
    assert_eq!(err["code"], "CONFIG");
    assert!(err["message"].as_str().unwrap().contains("remove-unstarted"));
    assert!(!sandbox.config.exists());
}
