use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::contract::deploy_kind;

// ── Daemon configuration ─────────────────────────────────────────────────────

/// A deployment target: where and how ExApps are provisioned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DaemonConfig {
    /// Unique name used to reference the daemon from registrations.
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    /// Deploy-action kind this daemon accepts, e.g. `docker-install`.
    pub accepts_deploy_id: String,
    /// `unix-socket`, `http` or `https`. Kept as text so an unknown value
    /// surfaces as a transport error at resolve time instead of a load error.
    pub protocol: String,
    /// Socket path for `unix-socket`, hostname otherwise.
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default)]
    pub deploy_config: DeployConfig,
}

impl DaemonConfig {
    #[must_use]
    pub fn is_docker(&self) -> bool {
        self.accepts_deploy_id == deploy_kind::DOCKER_INSTALL
    }
}

/// Transport and network options attached to a daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployConfig {
    /// Docker network mode for created containers.
    #[serde(default = "default_net")]
    pub net: String,
    /// Publish the ExApp port on the daemon host.
    #[serde(default)]
    pub expose: bool,
    /// Address ExApps on a host-shared network are reached at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Base URL of the platform, handed to ExApps as `PLATFORM_URL`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_cert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_cert_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_key_password: Option<String>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            net: default_net(),
            expose: false,
            host: None,
            platform_url: None,
            ssl_cert: None,
            ssl_cert_password: None,
            ssl_key: None,
            ssl_key_password: None,
        }
    }
}

fn default_net() -> String {
    "host".to_string()
}

// ── Image and container parameters ───────────────────────────────────────────

/// Registry, repository and tag of an ExApp image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageParams {
    pub image_src: String,
    pub image_name: String,
    pub image_tag: String,
}

/// Failure to split an image reference into registry, name and tag.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageRefError {
    #[error("image reference is empty")]
    Empty,
    #[error("image reference '{0}' has an empty repository or tag")]
    Incomplete(String),
}

impl ImageParams {
    /// The pullable reference `src/name:tag`.
    #[must_use]
    pub fn reference(&self) -> String {
        format!("{}/{}:{}", self.image_src, self.image_name, self.image_tag)
    }
}

impl fmt::Display for ImageParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reference())
    }
}

impl FromStr for ImageParams {
    type Err = ImageRefError;

    /// Parses `registry/repo/name:tag`. A first path component that looks
    /// like a hostname is the registry; otherwise `docker.io` is assumed.
    /// A missing tag means `latest`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ImageRefError::Empty);
        }
        let last_slash = s.rfind('/').map_or(0, |i| i + 1);
        let (path, tag) = match s[last_slash..].rfind(':') {
            Some(i) => (&s[..last_slash + i], &s[last_slash + i + 1..]),
            None => (s, "latest"),
        };
        let (src, name) = match path.split_once('/') {
            Some((first, rest))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (first, rest)
            }
            _ => ("docker.io", path),
        };
        if name.is_empty() || tag.is_empty() {
            return Err(ImageRefError::Incomplete(s.to_string()));
        }
        Ok(Self {
            image_src: src.to_string(),
            image_name: name.to_string(),
            image_tag: tag.to_string(),
        })
    }
}

/// Parameters for the container-create request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContainerParams {
    pub hostname: String,
    pub name: String,
    /// Docker network mode.
    pub net: String,
    /// Ordered `KEY=VALUE` entries.
    pub env: Vec<String>,
    /// Port to publish on the daemon host, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposed_port: Option<u16>,
}

// ── ExApp identity ───────────────────────────────────────────────────────────

/// Scheme an ExApp serves its callbacks on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ExAppProtocol {
    #[default]
    Http,
    Https,
}

impl ExAppProtocol {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for ExAppProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExAppProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(format!("unsupported ExApp protocol '{other}'")),
        }
    }
}

/// Resolved identity of a running ExApp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExAppInfo {
    pub appid: String,
    pub name: String,
    pub version: String,
    pub secret: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub protocol: ExAppProtocol,
    #[serde(default)]
    pub system_app: bool,
}

impl ExAppInfo {
    /// Base URL the ExApp answers callbacks on.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, url_host(&self.host), self.port)
    }
}

/// `host` as it must appear in a URL authority: IPv6 literals get brackets.
#[must_use]
pub fn url_host(host: &str) -> std::borrow::Cow<'_, str> {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]").into()
    } else {
        host.into()
    }
}

// ── Scopes ───────────────────────────────────────────────────────────────────

/// Opaque capability-group identifier requested by an ExApp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ScopeGroup(pub String);

impl ScopeGroup {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scope groups an ExApp asks for, split by necessity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ScopeRequest {
    #[serde(default)]
    pub required: Vec<ScopeGroup>,
    #[serde(default)]
    pub optional: Vec<ScopeGroup>,
}

impl ScopeRequest {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.optional.is_empty()
    }
}

// ── Registration record ──────────────────────────────────────────────────────

/// Persisted registration of an ExApp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisteredApp {
    pub appid: String,
    pub name: String,
    pub version: String,
    pub secret: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub protocol: ExAppProtocol,
    pub daemon_config_name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub system_app: bool,
    #[serde(default)]
    pub scope_groups: Vec<ScopeGroup>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check_time: Option<DateTime<Utc>>,
}

impl RegisteredApp {
    /// Build a provisional, disabled record from resolved metadata.
    /// The system-app flag is applied as a separate step.
    #[must_use]
    pub fn provisional(info: &ExAppInfo, daemon_config_name: &str, now: DateTime<Utc>) -> Self {
        Self {
            appid: info.appid.clone(),
            name: info.name.clone(),
            version: info.version.clone(),
            secret: info.secret.clone(),
            host: info.host.clone(),
            port: info.port,
            protocol: info.protocol,
            daemon_config_name: daemon_config_name.to_string(),
            enabled: false,
            system_app: false,
            scope_groups: Vec::new(),
            created_at: now,
            last_check_time: None,
        }
    }

    /// Identity view used for callbacks.
    #[must_use]
    pub fn info(&self) -> ExAppInfo {
        ExAppInfo {
            appid: self.appid.clone(),
            name: self.name.clone(),
            version: self.version.clone(),
            secret: self.secret.clone(),
            host: self.host.clone(),
            port: self.port,
            protocol: self.protocol,
            system_app: self.system_app,
        }
    }
}
