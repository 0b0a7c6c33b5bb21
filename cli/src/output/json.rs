//! JSON output helpers.
//!
//! `--json` prints exactly one document to stdout per command. Failures use
//! the error object produced by [`format_error`].

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use exapp_common::{DaemonConfig, RegisteredApp};
use serde::Serialize;
use serde_json::{Value, json};

use crate::application::services::deploy::DeployOutcome;
use crate::application::services::registration::UnregisterOutcome;
use crate::domain::config::ExappConfig;
use crate::domain::error::{
    ConfigError, DockerApiError, NegotiationError, PersistenceError, TransportConfigError,
    ValidationError,
};
use crate::domain::registration::{RegistrationError, RegistrationReport};

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Machine-readable code for the error object, from the typed error at the
/// root of the chain.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    if let Some(e) = err.downcast_ref::<RegistrationError>() {
        return match e {
            RegistrationError::AlreadyRegistered(_) => "ALREADY_REGISTERED",
            RegistrationError::Failed { .. } => "REGISTRATION_FAILED",
            RegistrationError::Inconsistent { .. } => "REGISTRATION_INCONSISTENT",
        };
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        "CONFIG"
    } else if err.downcast_ref::<TransportConfigError>().is_some() {
        "TRANSPORT_CONFIG"
    } else if err.downcast_ref::<DockerApiError>().is_some() {
        "DOCKER_API"
    } else if err.downcast_ref::<ValidationError>().is_some() {
        "VALIDATION"
    } else if err.downcast_ref::<NegotiationError>().is_some() {
        "NEGOTIATION"
    } else if err.downcast_ref::<PersistenceError>().is_some() {
        "PERSISTENCE"
    } else {
        "ERROR"
    }
}

/// JSON view of a daemon. TLS passwords never leave the registry.
fn daemon_value(daemon: &DaemonConfig) -> Value {
    let mut daemon = daemon.clone();
    daemon.deploy_config.ssl_key_password = None;
    daemon.deploy_config.ssl_cert_password = None;
    serde_json::to_value(daemon).unwrap_or(Value::Null)
}

/// JSON view of a registration. The shared secret is never printed.
fn app_value(app: &RegisteredApp) -> Value {
    let mut value = serde_json::to_value(app).unwrap_or(Value::Null);
    if let Some(obj) = value.as_object_mut() {
        obj.remove("secret");
    }
    value
}

fn stage_value<T: Serialize>(stage: Option<&Result<T, DockerApiError>>) -> Value {
    match stage {
        None => json!({ "status": "skipped" }),
        Some(Ok(value)) => json!({ "status": "ok", "result": value }),
        Some(Err(e)) => json!({
            "status": "failed",
            "http_status": e.status,
            "message": e.message,
        }),
    }
}

/// Renders domain types as JSON documents on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    fn print(value: &Value) -> Result<()> {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("JSON serialization failed")?
        );
        Ok(())
    }

    /// # Errors
    ///
    /// This function will return an error if serialization fails.
    pub fn render_version(version: &str) -> Result<()> {
        Self::print(&json!({ "version": version }))
    }

    /// # Errors
    ///
    /// This function will return an error if serialization fails.
    pub fn render_daemon(daemon: &DaemonConfig) -> Result<()> {
        Self::print(&daemon_value(daemon))
    }

    /// # Errors
    ///
    /// This function will return an error if serialization fails.
    pub fn render_daemon_removed(name: &str) -> Result<()> {
        Self::print(&json!({ "daemon": name, "removed": true }))
    }

    /// # Errors
    ///
    /// This function will return an error if serialization fails.
    pub fn render_daemons(daemons: &[DaemonConfig], default: Option<&str>) -> Result<()> {
        let list: Vec<Value> = daemons.iter().map(daemon_value).collect();
        Self::print(&json!({ "default_daemon": default, "daemons": list }))
    }

    /// # Errors
    ///
    /// This function will return an error if serialization fails.
    pub fn render_apps(apps: &[RegisteredApp]) -> Result<()> {
        let list: Vec<Value> = apps.iter().map(app_value).collect();
        Self::print(&json!({ "apps": list }))
    }

    /// # Errors
    ///
    /// This function will return an error if serialization fails.
    pub fn render_deploy(outcome: &DeployOutcome) -> Result<()> {
        let report = &outcome.report;
        Self::print(&json!({
            "container": outcome.container.name,
            "success": report.is_success(),
            "stages": {
                "pull": stage_value(report.pull.as_ref()),
                "create": stage_value(report.create.as_ref()),
                "start": stage_value(report.start.as_ref()),
            },
            "removed_unstarted": report.removed_unstarted,
        }))
    }

    /// # Errors
    ///
    /// This function will return an error if serialization fails.
    pub fn render_registration(report: &RegistrationReport) -> Result<()> {
        Self::print(&serde_json::to_value(report).context("JSON serialization failed")?)
    }

    /// # Errors
    ///
    /// This function will return an error if serialization fails.
    pub fn render_unregistered(appid: &str, outcome: &UnregisterOutcome) -> Result<()> {
        Self::print(&json!({
            "appid": appid,
            "unregistered": true,
            "disabled": outcome.disabled,
            "container_removed": outcome.container_removed,
        }))
    }

    /// # Errors
    ///
    /// This function will return an error if serialization fails.
    pub fn render_enabled(appid: &str, enabled: bool) -> Result<()> {
        Self::print(&json!({ "appid": appid, "enabled": enabled }))
    }

    /// # Errors
    ///
    /// This function will return an error if serialization fails.
    pub fn render_heartbeat(appid: &str, at: DateTime<Utc>) -> Result<()> {
        Self::print(&json!({ "appid": appid, "status": "ok", "last_check_time": at }))
    }

    /// # Errors
    ///
    /// This function will return an error if serialization fails.
    pub fn render_config(config: &ExappConfig, path: &std::path::Path) -> Result<()> {
        Self::print(&json!({ "path": path.display().to_string(), "config": config }))
    }

    /// # Errors
    ///
    /// This function will return an error if serialization fails.
    pub fn render_config_set(key: &str, value: &str) -> Result<()> {
        Self::print(&json!({ "key": key, "value": value, "saved": true }))
    }
}
