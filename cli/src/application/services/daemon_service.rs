//! Application service: daemon configuration use-cases.

use anyhow::Result;
use exapp_common::DaemonConfig;

use crate::application::ports::DaemonConfigStore;
use crate::application::services::deploy_actions::DeployActionRegistry;
use crate::domain::config::ExappConfig;
use crate::domain::daemon::{DaemonProtocol, validate_daemon_name};
use crate::domain::error::{ConfigError, TransportConfigError};

/// Validate and store a new daemon.
///
/// The daemon's deploy kind must be one `actions` can run.
///
/// # Errors
///
/// Returns an error for an invalid name, unknown protocol or deploy kind,
/// key passwords, a half-configured client identity, or a name that is
/// already taken.
pub async fn register_daemon(
    store: &impl DaemonConfigStore,
    actions: &DeployActionRegistry<'_>,
    daemon: &DaemonConfig,
) -> Result<()> {
    validate_daemon_name(&daemon.name)?;
    daemon.protocol.parse::<DaemonProtocol>()?;
    actions.get(&daemon.accepts_deploy_id)?;
    let tls = &daemon.deploy_config;
    if tls.ssl_key_password.is_some() || tls.ssl_cert_password.is_some() {
        return Err(TransportConfigError::EncryptedKeyUnsupported.into());
    }
    if tls.ssl_cert.is_some() != tls.ssl_key.is_some() {
        return Err(TransportConfigError::IncompleteClientIdentity.into());
    }
    store.add_daemon(daemon).await?;
    tracing::info!(daemon = %daemon.name, kind = %daemon.accepts_deploy_id, "daemon registered");
    Ok(())
}

/// All daemons, sorted by name.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub async fn list_daemons(store: &impl DaemonConfigStore) -> Result<Vec<DaemonConfig>> {
    let mut daemons = store.list_daemons().await?;
    daemons.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(daemons)
}

/// Remove a daemon that no ExApp references.
///
/// # Errors
///
/// Returns an error if the daemon is unknown or still in use.
pub async fn unregister_daemon(store: &impl DaemonConfigStore, name: &str) -> Result<()> {
    store.remove_daemon(name).await?;
    tracing::info!(daemon = name, "daemon unregistered");
    Ok(())
}

/// The daemon named `name`, or the configured default.
///
/// # Errors
///
/// Returns an error if no name is given and no default is configured, or
/// the daemon does not exist.
pub async fn resolve_daemon(
    store: &impl DaemonConfigStore,
    name: Option<&str>,
    config: &ExappConfig,
) -> Result<DaemonConfig> {
    let name = name
        .or(config.default_daemon.as_deref())
        .ok_or(ConfigError::NoDefaultDaemon)?;
    Ok(store
        .get_daemon(name)
        .await?
        .ok_or_else(|| ConfigError::DaemonNotFound(name.to_string()))?)
}
