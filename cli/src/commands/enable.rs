//! `exapp enable` / `exapp disable`.

use anyhow::Result;
use std::process::ExitCode;

use crate::app::AppContext;
use crate::application::services::registration::set_app_enabled;
use crate::commands::exapp_client;

/// Switch a registered ExApp on or off.
///
/// # Errors
///
/// Returns an error if the app is not registered or refuses the change.
pub async fn run(app: &AppContext, appid: &str, enabled: bool) -> Result<ExitCode> {
    let config = app.load_config()?;
    let client = exapp_client(&config)?;
    set_app_enabled(appid, &app.registry, &client, enabled).await?;
    app.renderer().render_enabled(appid, enabled)?;
    Ok(ExitCode::SUCCESS)
}
