//! Domain types and validators for exapp configuration.
//!
//! Pure functions only, no filesystem access.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::deploy::CleanupPolicy;
use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "docker.api_version",
    "docker.timeout_secs",
    "docker.pull_timeout_secs",
    "docker.cleanup",
    "callback.timeout_secs",
    "platform.url",
    "platform.installed",
    "tls.ca_bundle",
    "default_daemon",
];
pub const VALID_CLEANUP_POLICIES: &[&str] = &["keep", "remove-unstarted"];
const VALID_BOOLS: &[&str] = &["true", "false"];

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.exapp/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExappConfig {
    pub docker: DockerConfig,
    pub callback: CallbackConfig,
    pub platform: PlatformConfig,
    pub tls: TlsConfig,
    /// Daemon used when a command is not given `--daemon`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_daemon: Option<String>,
}

/// Docker Engine API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Versioned route prefix, e.g. `v1.41`.
    pub api_version: String,
    pub timeout_secs: u64,
    /// Image pulls stream for a long time on slow registries.
    pub pull_timeout_secs: u64,
    /// What to do with a container that was created but failed to start.
    pub cleanup: CleanupPolicy,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            api_version: "v1.41".to_string(),
            timeout_secs: 60,
            pull_timeout_secs: 1800,
            cleanup: CleanupPolicy::Keep,
        }
    }
}

/// Settings for callbacks into ExApps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackConfig {
    pub timeout_secs: u64,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// The platform ExApps are registered with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Base URL handed to deployed ExApps.
    pub url: String,
    /// `false` until first-time setup has completed. Before that the bundled
    /// CA set is used instead of the system trust store.
    pub installed: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost".to_string(),
            installed: true,
        }
    }
}

/// Extra TLS verification material.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TlsConfig {
    /// PEM bundle added to the trust store for HTTPS daemons.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_bundle: Option<PathBuf>,
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let invalid = |valid: &str| -> anyhow::Error {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            valid: valid.to_string(),
        }
        .into()
    };
    match key {
        "docker.cleanup" if !VALID_CLEANUP_POLICIES.contains(&value) => {
            Err(invalid(&VALID_CLEANUP_POLICIES.join(", ")))
        }
        "platform.installed" if !VALID_BOOLS.contains(&value) => {
            Err(invalid(&VALID_BOOLS.join(", ")))
        }
        "docker.timeout_secs" | "docker.pull_timeout_secs" | "callback.timeout_secs"
            if value.parse::<u64>().map_or(true, |v| v == 0) =>
        {
            Err(invalid("a positive number of seconds"))
        }
        "docker.api_version" if !is_api_version(value) => Err(invalid("v<major>.<minor>, e.g. v1.41")),
        "platform.url" if !(value.starts_with("http://") || value.starts_with("https://")) => {
            Err(invalid("an http:// or https:// URL"))
        }
        _ => Ok(()),
    }
}

/// Apply a validated `key = value` to `config`.
///
/// # Errors
///
/// Returns an error if the key or value is invalid.
pub fn apply_config_value(config: &mut ExappConfig, key: &str, value: &str) -> Result<()> {
    validate_config_key(key)?;
    validate_config_value(key, value)?;
    match key {
        "docker.api_version" => config.docker.api_version = value.to_string(),
        "docker.timeout_secs" => config.docker.timeout_secs = value.parse()?,
        "docker.pull_timeout_secs" => config.docker.pull_timeout_secs = value.parse()?,
        "docker.cleanup" => config.docker.cleanup = value.parse()?,
        "callback.timeout_secs" => config.callback.timeout_secs = value.parse()?,
        "platform.url" => config.platform.url = value.trim_end_matches('/').to_string(),
        "platform.installed" => config.platform.installed = value == "true",
        "tls.ca_bundle" => {
            config.tls.ca_bundle = (!value.is_empty()).then(|| PathBuf::from(value));
        }
        "default_daemon" => {
            config.default_daemon = (!value.is_empty()).then(|| value.to_string());
        }
        _ => anyhow::bail!("Unknown setting: {key}"),
    }
    Ok(())
}

fn is_api_version(value: &str) -> bool {
    value
        .strip_prefix('v')
        .and_then(|v| v.split_once('.'))
        .is_some_and(|(major, minor)| {
            !major.is_empty()
                && !minor.is_empty()
                && major.chars().all(|c| c.is_ascii_digit())
                && minor.chars().all(|c| c.is_ascii_digit())
        })
}

// ── Unit tests ───────────────────────────────────────────────────────────────
