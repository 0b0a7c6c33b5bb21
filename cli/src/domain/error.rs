//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::fmt;

use thiserror::Error;

// ── Config errors ─────────────────────────────────────────────────────────────

/// Unsupported deploy kinds, missing parameters and config validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No deploy action is registered for '{kind}'.")]
    UnsupportedDeployKind { kind: String },

    #[error("Daemon '{daemon}' accepts '{actual}', but this operation requires '{expected}'.")]
    DeployKindMismatch {
        daemon: String,
        expected: String,
        actual: String,
    },

    #[error("Deploy action '{0}' does not provision containers.")]
    DeployUnsupported(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Daemon '{0}' not found. Register one with: exapp daemon register")]
    DaemonNotFound(String),

    #[error("No daemon given and no default_daemon configured.")]
    NoDefaultDaemon,

    #[error("Invalid {what} '{value}': must match {pattern}")]
    InvalidName {
        what: &'static str,
        value: String,
        pattern: &'static str,
    },

    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nValid values: {valid}")]
    InvalidValue {
        key: String,
        value: String,
        valid: String,
    },
}

// ── Transport errors ──────────────────────────────────────────────────────────

/// A daemon whose protocol or TLS material cannot be turned into a client.
#[derive(Debug, Error)]
pub enum TransportConfigError {
    #[error("Unknown daemon protocol '{0}' (expected unix-socket, http or https).")]
    UnknownProtocol(String),

    #[error("Cannot read TLS material {path}: {reason}")]
    UnreadableTlsMaterial { path: String, reason: String },

    #[error("Invalid TLS material {path}: {reason}")]
    InvalidTlsMaterial { path: String, reason: String },

    #[error("Client certificate and key must be configured together.")]
    IncompleteClientIdentity,

    #[error("Password-protected client certificates or keys are not supported; provide unencrypted PEM files.")]
    EncryptedKeyUnsupported,

    #[error("Unix sockets are not supported on this platform.")]
    UnixSocketUnsupported,

    #[error("Cannot build HTTP client: {0}")]
    Client(String),
}

// ── Docker API errors ─────────────────────────────────────────────────────────

/// Docker Engine API call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockerStage {
    Pull,
    Create,
    Start,
    Inspect,
    Remove,
}

impl fmt::Display for DockerStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pull => "pull",
            Self::Create => "create",
            Self::Start => "start",
            Self::Inspect => "inspect",
            Self::Remove => "remove",
        })
    }
}

/// Transport or protocol failure of a single Docker Engine API call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Docker {stage} failed{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
pub struct DockerApiError {
    pub stage: DockerStage,
    /// HTTP status, absent for transport-level faults.
    pub status: Option<u16>,
    pub message: String,
}

impl DockerApiError {
    #[must_use]
    pub fn transport(stage: DockerStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            status: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn status(stage: DockerStage, status: u16, message: impl Into<String>) -> Self {
        Self {
            stage,
            status: Some(status),
            message: message.into(),
        }
    }
}

// ── Validation errors ─────────────────────────────────────────────────────────

/// Resolved metadata that does not describe the requested ExApp.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("ExApp id mismatch: requested '{requested}' but the deployment declares '{declared}'.")]
    AppIdMismatch { requested: String, declared: String },

    #[error("ExApp environment is missing required variable {0}.")]
    MissingEnv(&'static str),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid ExApp info document: {0}")]
    InvalidDocument(String),
}

// ── Negotiation errors ────────────────────────────────────────────────────────

/// Failure of an authenticated callback to an ExApp.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("Cannot reach ExApp '{appid}' at {path}: {message}")]
    Transport {
        appid: String,
        path: String,
        message: String,
    },

    #[error("ExApp '{appid}' answered {path} with HTTP {status}.")]
    Status {
        appid: String,
        path: String,
        status: u16,
    },

    #[error("ExApp '{appid}' sent an unreadable {path} response: {message}")]
    Decode {
        appid: String,
        path: String,
        message: String,
    },
}

// ── Persistence errors ────────────────────────────────────────────────────────

/// Failure surfaced by the record store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("ExApp '{0}' is already registered.")]
    AlreadyRegistered(String),

    #[error("Daemon '{0}' already exists.")]
    DaemonExists(String),

    #[error("'{0}' is not registered.")]
    NotFound(String),

    #[error("Daemon '{daemon}' is still used by: {apps}")]
    DaemonInUse { daemon: String, apps: String },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
