//! ExApp identity extraction and validation.
//!
//! Pure functions only. The container inspection payload is fetched by the
//! application layer and handed in here.

use std::collections::BTreeMap;

use exapp_common::{DaemonConfig, ExAppInfo, ExAppProtocol, env};
use serde::Deserialize;

use crate::domain::daemon::{is_host_shared, shared_network_host};
use crate::domain::error::ValidationError;

// ── Inspection payload ───────────────────────────────────────────────────────

/// The parts of `GET /containers/{id}/json` the resolver reads.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerDetails {
    pub id: String,
    /// Docker reports names with a leading `/`.
    pub name: String,
    pub config: ContainerConfig,
    pub host_config: ContainerHostConfig,
    pub state: ContainerState,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerConfig {
    pub hostname: String,
    pub image: String,
    /// `null` in the payload for images without an environment.
    #[serde(deserialize_with = "null_as_empty")]
    pub env: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerHostConfig {
    pub network_mode: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerState {
    pub status: String,
    pub running: bool,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ContainerDetails {
    /// Container name without Docker's leading slash.
    #[must_use]
    pub fn container_name(&self) -> &str {
        self.name.trim_start_matches('/')
    }
}

// ── Environment filtering ────────────────────────────────────────────────────

/// Keep only recognized contract variables from a `KEY=VALUE` list.
///
/// Later duplicates win, matching how the container runtime applies them.
#[must_use]
pub fn recognized_env(entries: &[String]) -> BTreeMap<&'static str, String> {
    let mut out = BTreeMap::new();
    for entry in entries {
        let Some((key, value)) = entry.split_once('=') else {
            continue;
        };
        if let Some(known) = env::RECOGNIZED.iter().find(|k| **k == key) {
            out.insert(*known, value.to_string());
        }
    }
    out
}

fn parse_flag(value: Option<&String>) -> bool {
    value.is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Fail with [`ValidationError::AppIdMismatch`] unless `declared` is `requested`.
///
/// # Errors
///
/// Returns an error when the ids differ.
pub fn ensure_app_id(requested: &str, declared: &str) -> Result<(), ValidationError> {
    if requested == declared {
        Ok(())
    } else {
        Err(ValidationError::AppIdMismatch {
            requested: requested.to_string(),
            declared: declared.to_string(),
        })
    }
}

/// Resolve ExApp identity from a running container.
///
/// The host is the daemon's override host (default `localhost`) when the
/// deployment network is host-shared, and the container name otherwise.
///
/// # Errors
///
/// Returns an error if a required variable is missing or malformed, or if
/// the declared appid differs from `appid`.
pub fn info_from_container(
    appid: &str,
    daemon: &DaemonConfig,
    details: &ContainerDetails,
) -> Result<ExAppInfo, ValidationError> {
    let vars = recognized_env(&details.config.env);
    let require = |key: &'static str| -> Result<&String, ValidationError> {
        vars.get(key)
            .filter(|v| !v.is_empty())
            .ok_or(ValidationError::MissingEnv(key))
    };

    for &key in env::REQUIRED {
        require(key)?;
    }

    let declared = require(env::APP_ID)?;
    ensure_app_id(appid, declared)?;

    let port_raw = require(env::APP_PORT)?;
    let port = port_raw
        .parse::<u16>()
        .map_err(|_| ValidationError::InvalidValue {
            key: env::APP_PORT,
            value: port_raw.clone(),
        })?;
    let protocol_raw = require(env::APP_PROTOCOL)?;
    let protocol = protocol_raw
        .parse::<ExAppProtocol>()
        .map_err(|_| ValidationError::InvalidValue {
            key: env::APP_PROTOCOL,
            value: protocol_raw.clone(),
        })?;

    let host = if is_host_shared(&daemon.deploy_config.net) {
        shared_network_host(daemon)
    } else {
        let name = details.container_name();
        if name.is_empty() {
            appid.to_string()
        } else {
            name.to_string()
        }
    };

    Ok(ExAppInfo {
        appid: declared.clone(),
        name: require(env::APP_DISPLAY_NAME)?.clone(),
        version: require(env::APP_VERSION)?.clone(),
        secret: require(env::APP_SECRET)?.clone(),
        host,
        port,
        protocol,
        system_app: parse_flag(vars.get(env::IS_SYSTEM_APP)),
    })
}

// ── Manual info document ─────────────────────────────────────────────────────

/// Operator-supplied metadata for `manual-install` daemons.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManualInfoDocument {
    appid: String,
    name: String,
    version: String,
    secret: String,
    port: u16,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    protocol: Option<ExAppProtocol>,
    #[serde(default)]
    system_app: bool,
}

/// Resolve ExApp identity from a JSON document.
///
/// # Errors
///
/// Returns an error if the document is malformed, has empty identity
/// fields, or declares a different appid.
pub fn info_from_document(
    appid: &str,
    daemon: &DaemonConfig,
    document: &str,
) -> Result<ExAppInfo, ValidationError> {
    let doc: ManualInfoDocument = serde_json::from_str(document)
        .map_err(|e| ValidationError::InvalidDocument(e.to_string()))?;
    ensure_app_id(appid, &doc.appid)?;
    for (field, value) in [("name", &doc.name), ("version", &doc.version), ("secret", &doc.secret)] {
        if value.trim().is_empty() {
            return Err(ValidationError::InvalidDocument(format!("'{field}' must not be empty")));
        }
    }
    if doc.port == 0 {
        return Err(ValidationError::InvalidDocument("'port' must not be 0".to_string()));
    }
    Ok(ExAppInfo {
        appid: doc.appid,
        name: doc.name,
        version: doc.version,
        secret: doc.secret,
        host: doc.host.filter(|h| !h.is_empty()).unwrap_or_else(|| daemon.host.clone()),
        port: doc.port,
        protocol: doc.protocol.unwrap_or_default(),
        system_app: doc.system_app,
    })
}

// ── Unit tests ───────────────────────────────────────────────────────────────
