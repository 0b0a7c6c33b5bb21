//! `exapp unregister`: disable an ExApp and delete its registration.

use anyhow::Result;
use clap::Args;
use std::process::ExitCode;

use crate::app::AppContext;
use crate::application::services::registration::{UnregisterOptions, unregister_exapp};
use crate::commands::exapp_client;
use crate::infra::docker::DockerConnector;

#[derive(Args)]
pub struct UnregisterArgs {
    pub appid: String,

    /// Also remove the container on docker-install daemons
    #[arg(long)]
    pub rm_container: bool,
}

/// Run `exapp unregister`.
///
/// # Errors
///
/// Returns an error if the app is not registered, its container cannot be
/// removed, or the record cannot be deleted.
pub async fn run(app: &AppContext, args: UnregisterArgs) -> Result<ExitCode> {
    let config = app.load_config()?;
    let client = exapp_client(&config)?;
    let connector = DockerConnector::from_config(&config);

    let reporter = app.reporter();
    let outcome = unregister_exapp(
        &args.appid,
        &app.registry,
        &client,
        &connector,
        UnregisterOptions {
            reporter: &reporter,
            remove_container: args.rm_container,
        },
    )
    .await?;
    drop(reporter);

    app.renderer().render_unregistered(&args.appid, &outcome)?;
    Ok(ExitCode::SUCCESS)
}
