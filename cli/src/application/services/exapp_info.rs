//! Application service: ExApp identity resolution.

use anyhow::Result;
use exapp_common::{DaemonConfig, ExAppInfo};

use crate::application::ports::ContainerEngine;
use crate::domain::exapp::{info_from_container, info_from_document};

/// Resolve identity from the container named `appid` on `daemon`.
///
/// # Errors
///
/// Returns a [`crate::domain::error::DockerApiError`] if the container cannot
/// be inspected, or a [`crate::domain::error::ValidationError`] if its
/// environment does not describe `appid`.
pub async fn resolve_from_container(
    engine: &impl ContainerEngine,
    appid: &str,
    daemon: &DaemonConfig,
) -> Result<ExAppInfo> {
    let details = engine.inspect_container(appid).await?;
    tracing::debug!(appid, container = %details.id, "inspected ExApp container");
    Ok(info_from_container(appid, daemon, &details)?)
}

/// Resolve identity from an operator-supplied JSON document.
///
/// # Errors
///
/// Returns a [`crate::domain::error::ValidationError`] for malformed
/// documents or a different appid.
pub fn resolve_from_document(appid: &str, daemon: &DaemonConfig, document: &str) -> Result<ExAppInfo> {
    Ok(info_from_document(appid, daemon, document)?)
}
