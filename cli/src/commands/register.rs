//! `exapp register`: register a deployed ExApp and negotiate its scopes.

use anyhow::{Context, Result};
use clap::Args;
use std::process::ExitCode;

use crate::app::AppContext;
use crate::application::services::daemon_service;
use crate::application::services::deploy_actions::DeployActionRegistry;
use crate::application::services::registration::{RegisterOptions, register_exapp};
use crate::commands::exapp_client;
use crate::infra::docker::DockerConnector;

#[derive(Args)]
pub struct RegisterArgs {
    pub appid: String,

    /// Daemon the ExApp runs on (defaults to `default_daemon`)
    #[arg(long)]
    pub daemon: Option<String>,

    /// Grant every requested scope without asking
    #[arg(long)]
    pub force_scopes: bool,

    /// Enable the ExApp after its scopes are granted
    #[arg(long)]
    pub enable: bool,

    /// ExApp metadata for manual-install daemons: a JSON file path or inline JSON
    #[arg(long, value_name = "FILE|JSON")]
    pub info_json: Option<String>,
}

/// Inline JSON is used as-is; anything else is read as a file path.
fn read_info_document(arg: &str) -> Result<String> {
    if arg.trim_start().starts_with('{') {
        return Ok(arg.to_string());
    }
    std::fs::read_to_string(arg).with_context(|| format!("cannot read info document {arg}"))
}

/// Run `exapp register`.
///
/// # Errors
///
/// Returns an error if the daemon is unknown or the registration fails. A
/// failure after the record was written has already been rolled back, or
/// names the record left behind.
pub async fn run(app: &AppContext, args: RegisterArgs) -> Result<ExitCode> {
    let config = app.load_config()?;
    let daemon =
        daemon_service::resolve_daemon(&app.registry, args.daemon.as_deref(), &config).await?;
    let document = args.info_json.as_deref().map(read_info_document).transpose()?;
    let actions =
        DeployActionRegistry::standard(DockerConnector::from_config(&config), config.docker.cleanup);
    let client = exapp_client(&config)?;
    let confirmer = app.confirmer();

    let reporter = app.reporter();
    let report = register_exapp(
        &args.appid,
        &app.registry,
        &actions,
        &client,
        &confirmer,
        RegisterOptions {
            reporter: &reporter,
            daemon: &daemon,
            force_scopes: args.force_scopes,
            enable: args.enable,
            info_document: document.as_deref(),
        },
    )
    .await?;
    drop(reporter);

    app.renderer().render_registration(&report)?;
    Ok(ExitCode::SUCCESS)
}
