//! Application service: ExApp deploy use-case.

use anyhow::Result;
use exapp_common::{ContainerParams, DaemonConfig, ExAppProtocol, ImageParams};

use crate::application::ports::ProgressReporter;
use crate::application::services::deploy_actions::DeployActionRegistry;
use crate::domain::daemon::validate_app_id;
use crate::domain::deploy::{DeployReport, ExAppDeploySpec, exapp_container_params};

pub struct DeployOptions<'a, R: ProgressReporter> {
    pub reporter: &'a R,
    pub daemon: &'a DaemonConfig,
    pub image: &'a ImageParams,
    pub display_name: &'a str,
    pub version: &'a str,
    pub port: u16,
    pub protocol: ExAppProtocol,
    /// Shared secret; generated when absent.
    pub secret: Option<&'a str>,
    /// Platform URL handed to the ExApp when the daemon has none configured.
    pub platform_url: &'a str,
    pub system_app: bool,
    pub extra_env: &'a [String],
}

/// Result of a deploy run.
#[derive(Debug)]
pub struct DeployOutcome {
    pub container: ContainerParams,
    pub report: DeployReport,
}

/// A fresh shared secret: 64 hex characters.
#[must_use]
pub fn generate_secret() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

/// Provision the container for `appid` on `opts.daemon`.
///
/// Stage failures are returned inside the report; the caller decides how to
/// present them.
///
/// # Errors
///
/// Returns an error if the appid or extra environment is invalid, the
/// daemon's deploy kind is unknown or cannot provision containers, or the
/// daemon transport cannot be configured.
pub async fn deploy_exapp(
    appid: &str,
    actions: &DeployActionRegistry<'_>,
    opts: DeployOptions<'_, impl ProgressReporter>,
) -> Result<DeployOutcome> {
    validate_app_id(appid)?;
    let daemon = opts.daemon;
    let action = actions.get(&daemon.accepts_deploy_id)?;

    let generated;
    let secret = match opts.secret {
        Some(secret) => secret,
        None => {
            generated = generate_secret();
            generated.as_str()
        }
    };
    let platform_url = daemon
        .deploy_config
        .platform_url
        .as_deref()
        .unwrap_or(opts.platform_url);
    let spec = ExAppDeploySpec {
        appid,
        display_name: opts.display_name,
        version: opts.version,
        port: opts.port,
        protocol: opts.protocol,
        secret,
        platform_url,
        system_app: opts.system_app,
        extra_env: opts.extra_env,
    };
    let container = exapp_container_params(&spec, daemon)?;

    tracing::info!(appid, daemon = %daemon.name, image = %opts.image, "deploying ExApp");
    let report = action
        .deploy(daemon, opts.image, &container, opts.reporter)
        .await?;
    Ok(DeployOutcome { container, report })
}
