//! Output formatting module

pub mod human;
pub mod json;
pub mod progress;
pub mod reporter;
pub mod styles;

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use console::Term;
use exapp_common::{DaemonConfig, RegisteredApp};
use owo_colors::OwoColorize as _;

use crate::application::services::deploy::DeployOutcome;
use crate::application::services::registration::UnregisterOutcome;
use crate::domain::config::ExappConfig;
use crate::domain::registration::RegistrationReport;

pub use human::HumanRenderer;
pub use json::JsonRenderer;
pub use reporter::TerminalReporter;
pub use styles::Styles;

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && is_tty && std::env::var("NO_COLOR").is_err();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }

        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    /// Check if progress indicators should be shown.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet
    }

    /// Print a success message prefixed with `✓`. Suppressed when `quiet`.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "✓".style(self.styles.success));
        }
    }

    /// Print a warning message prefixed with `⚠`. Suppressed when `quiet`.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "⚠".style(self.styles.warning));
        }
    }

    /// Print an error message prefixed with `✗` to stderr. Never suppressed.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.error));
    }

    /// Print an info message prefixed with `ℹ`. Suppressed when `quiet`.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "ℹ".style(self.styles.info));
        }
    }

    /// Print a section header. Suppressed when `quiet`.
    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Print a key-value pair with the key dimmed. Suppressed when `quiet`.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", key.style(self.styles.dim));
        }
    }
}

/// Mode-specific renderer handed to command handlers.
pub enum Renderer<'a> {
    Human(HumanRenderer<'a>),
    Json(JsonRenderer),
}

/// Every method fails only on JSON serialization errors.
impl Renderer<'_> {
    pub fn render_version(&self, version: &str) -> Result<()> {
        match self {
            Self::Human(r) => r.render_version(version),
            Self::Json(_) => JsonRenderer::render_version(version)?,
        }
        Ok(())
    }

    pub fn render_daemon_registered(&self, daemon: &DaemonConfig) -> Result<()> {
        match self {
            Self::Human(r) => r.render_daemon_registered(daemon),
            Self::Json(_) => JsonRenderer::render_daemon(daemon)?,
        }
        Ok(())
    }

    pub fn render_daemon_removed(&self, name: &str) -> Result<()> {
        match self {
            Self::Human(r) => r.render_daemon_removed(name),
            Self::Json(_) => JsonRenderer::render_daemon_removed(name)?,
        }
        Ok(())
    }

    pub fn render_daemons(&self, daemons: &[DaemonConfig], default: Option<&str>) -> Result<()> {
        match self {
            Self::Human(r) => r.render_daemons(daemons, default),
            Self::Json(_) => JsonRenderer::render_daemons(daemons, default)?,
        }
        Ok(())
    }

    pub fn render_apps(&self, apps: &[RegisteredApp]) -> Result<()> {
        match self {
            Self::Human(r) => r.render_apps(apps),
            Self::Json(_) => JsonRenderer::render_apps(apps)?,
        }
        Ok(())
    }

    pub fn render_deploy(&self, outcome: &DeployOutcome) -> Result<()> {
        match self {
            Self::Human(r) => r.render_deploy(outcome),
            Self::Json(_) => JsonRenderer::render_deploy(outcome)?,
        }
        Ok(())
    }

    pub fn render_registration(&self, report: &RegistrationReport) -> Result<()> {
        match self {
            Self::Human(r) => r.render_registration(report),
            Self::Json(_) => JsonRenderer::render_registration(report)?,
        }
        Ok(())
    }

    pub fn render_unregistered(&self, appid: &str, outcome: &UnregisterOutcome) -> Result<()> {
        match self {
            Self::Human(r) => r.render_unregistered(appid, outcome),
            Self::Json(_) => JsonRenderer::render_unregistered(appid, outcome)?,
        }
        Ok(())
    }

    pub fn render_enabled(&self, appid: &str, enabled: bool) -> Result<()> {
        match self {
            Self::Human(r) => r.render_enabled(appid, enabled),
            Self::Json(_) => JsonRenderer::render_enabled(appid, enabled)?,
        }
        Ok(())
    }

    pub fn render_heartbeat(&self, appid: &str, at: DateTime<Utc>) -> Result<()> {
        match self {
            Self::Human(r) => r.render_heartbeat(appid, at),
            Self::Json(_) => JsonRenderer::render_heartbeat(appid, at)?,
        }
        Ok(())
    }

    pub fn render_config(&self, config: &ExappConfig, path: &Path) -> Result<()> {
        match self {
            Self::Human(r) => r.render_config(config, path),
            Self::Json(_) => JsonRenderer::render_config(config, path)?,
        }
        Ok(())
    }

    pub fn render_config_set(&self, key: &str, value: &str) -> Result<()> {
        match self {
            Self::Human(r) => r.render_config_set(key, value),
            Self::Json(_) => JsonRenderer::render_config_set(key, value)?,
        }
        Ok(())
    }
}
