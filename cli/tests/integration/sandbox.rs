//! An isolated config and registry for driving the `exapp` binary.

#![allow(clippy::expect_used, clippy::unwrap_used, dead_code)]

use std::path::PathBuf;

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Temp directory holding `config.yaml` and `registry.json`. Commands built
/// from it never touch `~/.exapp`.
pub struct Sandbox {
    _dir: TempDir,
    pub config: PathBuf,
    pub registry: PathBuf,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        Self {
            config: dir.path().join("config.yaml"),
            registry: dir.path().join("registry.json"),
            _dir: dir,
        }
    }

    pub fn exapp(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("exapp"));
        cmd.env("NO_COLOR", "1")
            .env("EXAPP_CONFIG", &self.config)
            .env("EXAPP_REGISTRY", &self.registry)
            .env_remove("EXAPP_LOG")
            .env_remove("EXAPP_YES");
        cmd
    }

    /// Run `args --json`, expect success and parse stdout.
    pub fn json_ok(&self, args: &[&str]) -> Value {
        let output = self
            .exapp()
            .args(args)
            .arg("--json")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).expect("stdout is one JSON document")
    }

    /// Run `args --json`, expect failure and parse the error object.
    pub fn json_err(&self, args: &[&str]) -> Value {
        let output = self
            .exapp()
            .args(args)
            .arg("--json")
            .assert()
            .failure()
            .get_output()
            .stdout
            .clone();
        let value: Value = serde_json::from_slice(&output).expect("stdout is one JSON document");
        assert_eq!(value["error"], true);
        value
    }
}
