//! Application service: pull → create → start coordination.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use exapp_common::{ContainerParams, DaemonConfig, ImageParams, deploy_kind};

use crate::application::ports::{ContainerEngine, ProgressReporter};
use crate::domain::deploy::{CleanupPolicy, DeployReport};
use crate::domain::error::ConfigError;

/// Fail unless `daemon` accepts `expected`.
///
/// # Errors
///
/// Returns [`ConfigError::DeployKindMismatch`] on a different kind.
pub fn ensure_deploy_kind(daemon: &DaemonConfig, expected: &str) -> Result<(), ConfigError> {
    if daemon.accepts_deploy_id == expected {
        Ok(())
    } else {
        Err(ConfigError::DeployKindMismatch {
            daemon: daemon.name.clone(),
            expected: expected.to_string(),
            actual: daemon.accepts_deploy_id.clone(),
        })
    }
}

/// Pull `image`, create a container from it and start it.
///
/// Stages run strictly in order and a failure stops the run; the report
/// keeps every result obtained so far. A container that was created but
/// did not start is left in place under [`CleanupPolicy::Keep`].
///
/// # Errors
///
/// Returns an error before any network call if `daemon` is not a
/// `docker-install` daemon. Docker failures are reported, not returned.
pub async fn deploy_container(
    engine: &impl ContainerEngine,
    daemon: &DaemonConfig,
    image: &ImageParams,
    container: &ContainerParams,
    cleanup: CleanupPolicy,
    reporter: &(impl ProgressReporter + ?Sized),
) -> Result<DeployReport, ConfigError> {
    ensure_deploy_kind(daemon, deploy_kind::DOCKER_INSTALL)?;
    let mut report = DeployReport::default();

    reporter.step(&format!("pulling {image}..."));
    let pulled = engine.pull_image(image).await;
    let pull_ok = pulled.is_ok();
    report.pull = Some(pulled);
    if !pull_ok {
        tracing::warn!(daemon = %daemon.name, image = %image, "image pull failed");
        return Ok(report);
    }

    reporter.step(&format!("creating container {}...", container.name));
    let created = engine.create_container(image, container).await;
    let id = match &created {
        Ok(id) => id.clone(),
        Err(e) => {
            tracing::warn!(daemon = %daemon.name, container = %container.name, error = %e, "container create failed");
            report.create = Some(created);
            return Ok(report);
        }
    };
    report.create = Some(created);

    reporter.step(&format!("starting container {}...", container.name));
    let started = engine.start_container(&id).await;
    if let Err(e) = &started {
        tracing::warn!(daemon = %daemon.name, container = %id, error = %e, "container start failed");
        if cleanup == CleanupPolicy::RemoveUnstarted {
            match engine.remove_container(&id, true).await {
                Ok(()) => {
                    report.removed_unstarted = true;
                    reporter.warn(&format!("removed unstarted container {}", container.name));
                }
                Err(remove_err) => {
                    reporter.warn(&format!(
                        "could not remove unstarted container {}: {remove_err}",
                        container.name
                    ));
                }
            }
        }
    }
    report.start = Some(started);

    if report.is_success() {
        reporter.success(&format!("container {} running", container.name));
    }
    Ok(report)
}
