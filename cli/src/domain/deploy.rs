//! Deployment value types and Docker request construction.
//!
//! Pure functions only. The request bodies built here are sent by
//! `crate::infra::docker`.

use std::fmt;
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use exapp_common::{ContainerParams, DaemonConfig, ExAppProtocol, ImageParams, env};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::domain::daemon::is_host_shared;
use crate::domain::error::{ConfigError, DockerApiError, ValidationError};

/// Orchestrator API version announced to ExApps as `AA_VERSION`.
pub const AA_VERSION: &str = env!("CARGO_PKG_VERSION");

// ── Cleanup policy ───────────────────────────────────────────────────────────

/// What happens to a container that was created but failed to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CleanupPolicy {
    /// Leave it for the daemon owner to collect.
    #[default]
    Keep,
    RemoveUnstarted,
}

impl fmt::Display for CleanupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Keep => "keep",
            Self::RemoveUnstarted => "remove-unstarted",
        })
    }
}

impl FromStr for CleanupPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep" => Ok(Self::Keep),
            "remove-unstarted" => Ok(Self::RemoveUnstarted),
            other => Err(ConfigError::InvalidValue {
                key: "docker.cleanup".to_string(),
                value: other.to_string(),
                valid: "keep, remove-unstarted".to_string(),
            }),
        }
    }
}

// ── Deploy report ────────────────────────────────────────────────────────────

/// Per-stage results of a pull → create → start run.
///
/// `None` means the stage was never attempted because an earlier one failed.
#[derive(Debug, Default)]
pub struct DeployReport {
    pub pull: Option<Result<(), DockerApiError>>,
    /// Container id on success.
    pub create: Option<Result<String, DockerApiError>>,
    pub start: Option<Result<(), DockerApiError>>,
    /// Set when the cleanup policy removed a created-but-unstarted container.
    pub removed_unstarted: bool,
}

impl DeployReport {
    /// `true` once the container is running.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.start, Some(Ok(())))
    }

    #[must_use]
    pub fn container_id(&self) -> Option<&str> {
        match &self.create {
            Some(Ok(id)) => Some(id),
            _ => None,
        }
    }

    /// The error of the stage that stopped the run, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&DockerApiError> {
        [
            self.pull.as_ref().and_then(|r| r.as_ref().err()),
            self.create.as_ref().and_then(|r| r.as_ref().err()),
            self.start.as_ref().and_then(|r| r.as_ref().err()),
        ]
        .into_iter()
        .flatten()
        .next()
    }
}

// ── Docker request construction ──────────────────────────────────────────────

/// `X-Registry-Auth` for an anonymous pull from `image_src`.
#[must_use]
pub fn registry_auth_header(image_src: &str) -> String {
    let mut auth = Map::new();
    auth.insert(format!("https://{image_src}"), json!({}));
    STANDARD.encode(Value::Object(auth).to_string())
}

/// JSON body of `POST /containers/create`.
///
/// A `NetworkingConfig` block aliasing the hostname is attached for
/// networks that are not host-shared, and omitted entirely otherwise.
#[must_use]
pub fn create_container_body(image: &ImageParams, container: &ContainerParams) -> Value {
    let shared = is_host_shared(&container.net);

    let mut host_config = Map::new();
    host_config.insert("NetworkMode".into(), json!(container.net));

    let mut body = Map::new();
    body.insert("Image".into(), json!(image.reference()));
    body.insert("Hostname".into(), json!(container.hostname));
    body.insert("Env".into(), json!(container.env));

    if let Some(port) = container.exposed_port.filter(|_| !shared) {
        let key = format!("{port}/tcp");
        let mut exposed = Map::new();
        exposed.insert(key.clone(), json!({}));
        body.insert("ExposedPorts".into(), Value::Object(exposed));

        let mut bindings = Map::new();
        bindings.insert(key, json!([{ "HostPort": port.to_string() }]));
        host_config.insert("PortBindings".into(), Value::Object(bindings));
    }
    body.insert("HostConfig".into(), Value::Object(host_config));

    if !shared {
        let mut endpoints = Map::new();
        endpoints.insert(
            container.net.clone(),
            json!({ "Aliases": [container.hostname] }),
        );
        body.insert(
            "NetworkingConfig".into(),
            json!({ "EndpointsConfig": Value::Object(endpoints) }),
        );
    }

    Value::Object(body)
}

// ── ExApp container parameters ───────────────────────────────────────────────

/// Everything needed to describe an ExApp container to the daemon.
#[derive(Debug, Clone)]
pub struct ExAppDeploySpec<'a> {
    pub appid: &'a str,
    pub display_name: &'a str,
    pub version: &'a str,
    pub port: u16,
    pub protocol: ExAppProtocol,
    pub secret: &'a str,
    pub platform_url: &'a str,
    pub system_app: bool,
    /// Additional `KEY=VALUE` entries appended after the contract variables.
    pub extra_env: &'a [String],
}

/// Build container parameters for an ExApp on `daemon`.
///
/// The container is named after the appid and uses it as hostname so it is
/// addressable by that name on a private network.
///
/// # Errors
///
/// Returns an error if an extra env entry is malformed or tries to override
/// a contract variable.
pub fn exapp_container_params(
    spec: &ExAppDeploySpec<'_>,
    daemon: &DaemonConfig,
) -> Result<ContainerParams, ValidationError> {
    let mut entries = vec![
        env::entry(env::AA_VERSION, AA_VERSION),
        env::entry(env::APP_SECRET, spec.secret),
        env::entry(env::APP_ID, spec.appid),
        env::entry(env::APP_DISPLAY_NAME, spec.display_name),
        env::entry(env::APP_VERSION, spec.version),
        env::entry(env::APP_PROTOCOL, spec.protocol.as_str()),
        env::entry(env::APP_HOST, "0.0.0.0"),
        env::entry(env::APP_PORT, &spec.port.to_string()),
        env::entry(env::PLATFORM_URL, spec.platform_url),
    ];
    if spec.system_app {
        entries.push(env::entry(env::IS_SYSTEM_APP, "1"));
    }
    for extra in spec.extra_env {
        let key = extra.split_once('=').map(|(k, _)| k).unwrap_or_default();
        if key.is_empty() || env::RECOGNIZED.contains(&key) {
            return Err(ValidationError::InvalidValue {
                key: "env",
                value: extra.clone(),
            });
        }
        entries.push(extra.clone());
    }

    let net = daemon.deploy_config.net.clone();
    let exposed_port = daemon.deploy_config.expose.then_some(spec.port);
    Ok(ContainerParams {
        hostname: spec.appid.to_string(),
        name: spec.appid.to_string(),
        net,
        env: entries,
        exposed_port,
    })
}

// ── Unit tests ───────────────────────────────────────────────────────────────
