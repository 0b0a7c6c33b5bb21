//! `exapp apps`: list registered ExApps.

use anyhow::Result;
use std::process::ExitCode;

use crate::app::AppContext;
use crate::application::services::registration::list_apps;

/// # Errors
///
/// Returns an error if the registry cannot be read.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let apps = list_apps(&app.registry).await?;
    app.renderer().render_apps(&apps)?;
    Ok(ExitCode::SUCCESS)
}
