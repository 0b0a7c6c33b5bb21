//! `exapp heartbeat`: check that a registered ExApp answers.

use anyhow::Result;
use std::process::ExitCode;

use crate::app::AppContext;
use crate::application::services::registration::heartbeat;
use crate::commands::exapp_client;

/// # Errors
///
/// Returns an error if the app is not registered or does not answer.
pub async fn run(app: &AppContext, appid: &str) -> Result<ExitCode> {
    let config = app.load_config()?;
    let client = exapp_client(&config)?;
    let at = heartbeat(appid, &app.registry, &client).await?;
    app.renderer().render_heartbeat(appid, at)?;
    Ok(ExitCode::SUCCESS)
}
