//! `exapp deploy`: pull, create and start an ExApp container.

use anyhow::{Context, Result};
use clap::Args;
use exapp_common::{ExAppProtocol, ImageParams};
use std::process::ExitCode;

use crate::app::AppContext;
use crate::application::services::daemon_service;
use crate::application::services::deploy::{DeployOptions, deploy_exapp};
use crate::application::services::deploy_actions::DeployActionRegistry;
use crate::infra::docker::DockerConnector;

#[derive(Args)]
pub struct DeployArgs {
    /// ExApp id; also the container name and hostname
    pub appid: String,

    /// Image reference, e.g. ghcr.io/acme/widget:1.0.0
    #[arg(long)]
    pub image: String,

    /// Target daemon (defaults to `default_daemon`)
    #[arg(long)]
    pub daemon: Option<String>,

    /// Display name (defaults to the appid)
    #[arg(long)]
    pub name: Option<String>,

    /// ExApp version (defaults to the image tag)
    #[arg(long)]
    pub app_version: Option<String>,

    #[arg(long, default_value_t = 23000)]
    pub port: u16,

    #[arg(long, value_enum, default_value_t = ExAppProtocol::Http)]
    pub protocol: ExAppProtocol,

    /// Shared secret (generated when omitted)
    #[arg(long, env = "EXAPP_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    #[arg(long)]
    pub system_app: bool,

    /// Extra environment entry, KEY=VALUE (repeatable)
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,
}

/// Run `exapp deploy`.
///
/// Exits non-zero when a stage failed; the per-stage report is rendered
/// either way.
///
/// # Errors
///
/// Returns an error if the arguments are invalid, the daemon is unknown or
/// cannot provision containers, or its transport cannot be configured.
pub async fn run(app: &AppContext, args: DeployArgs) -> Result<ExitCode> {
    let config = app.load_config()?;
    let daemon =
        daemon_service::resolve_daemon(&app.registry, args.daemon.as_deref(), &config).await?;
    let image: ImageParams = args
        .image
        .parse()
        .with_context(|| format!("invalid image reference '{}'", args.image))?;
    let actions =
        DeployActionRegistry::standard(DockerConnector::from_config(&config), config.docker.cleanup);

    let reporter = app.reporter();
    let outcome = deploy_exapp(
        &args.appid,
        &actions,
        DeployOptions {
            reporter: &reporter,
            daemon: &daemon,
            image: &image,
            display_name: args.name.as_deref().unwrap_or(&args.appid),
            version: args.app_version.as_deref().unwrap_or(&image.image_tag),
            port: args.port,
            protocol: args.protocol,
            secret: args.secret.as_deref(),
            platform_url: &config.platform.url,
            system_app: args.system_app,
            extra_env: &args.env,
        },
    )
    .await?;
    drop(reporter);

    app.renderer().render_deploy(&outcome)?;
    Ok(if outcome.report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
