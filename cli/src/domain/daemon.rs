//! Daemon protocol parsing and identifier validation.
//!
//! Pure functions only, no I/O.

use std::str::FromStr;
use std::sync::LazyLock;

use exapp_common::{DaemonConfig, url_host};
use regex::Regex;

use crate::domain::error::{ConfigError, TransportConfigError};

/// Placeholder origin for Unix-socket daemons. Only used to build request
/// paths; the socket path decides where the connection goes.
pub const UNIX_SOCKET_BASE_URL: &str = "http://localhost";

/// ExApp ids end up in container names, hostnames and URLs.
pub static APP_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Constant pattern.
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-z0-9][a-z0-9_-]{0,63}$").expect("valid regex")
});

pub static DAEMON_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]{0,63}$").expect("valid regex")
});

/// How the orchestrator talks to a daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonProtocol {
    UnixSocket,
    Http,
    Https,
}

impl FromStr for DaemonProtocol {
    type Err = TransportConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unix-socket" => Ok(Self::UnixSocket),
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(TransportConfigError::UnknownProtocol(other.to_string())),
        }
    }
}

/// Base URL for a TCP daemon: `protocol://host[:port]`.
#[must_use]
pub fn tcp_base_url(protocol: DaemonProtocol, host: &str, port: Option<u16>) -> String {
    let scheme = if protocol == DaemonProtocol::Https {
        "https"
    } else {
        "http"
    };
    let host = url_host(host.trim_end_matches('/'));
    match port {
        Some(port) => format!("{scheme}://{host}:{port}"),
        None => format!("{scheme}://{host}"),
    }
}

/// `true` for network modes where the container shares another network
/// namespace and cannot carry its own aliases.
#[must_use]
pub fn is_host_shared(net: &str) -> bool {
    net == "host" || net.starts_with("container:")
}

/// Host an ExApp on `daemon` is reachable at when its network is
/// host-shared.
#[must_use]
pub fn shared_network_host(daemon: &DaemonConfig) -> String {
    daemon
        .deploy_config
        .host
        .clone()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Validates an ExApp id.
///
/// # Errors
///
/// Returns an error if the id does not match [`APP_ID_RE`].
pub fn validate_app_id(appid: &str) -> Result<(), ConfigError> {
    if APP_ID_RE.is_match(appid) {
        Ok(())
    } else {
        Err(ConfigError::InvalidName {
            what: "ExApp id",
            value: appid.to_string(),
            pattern: "^[a-z0-9][a-z0-9_-]{0,63}$",
        })
    }
}

/// Validates a daemon config name.
///
/// # Errors
///
/// Returns an error if the name does not match [`DAEMON_NAME_RE`].
pub fn validate_daemon_name(name: &str) -> Result<(), ConfigError> {
    if DAEMON_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidName {
            what: "daemon name",
            value: name.to_string(),
            pattern: "^[A-Za-z0-9][A-Za-z0-9_.-]{0,63}$",
        })
    }
}
