//! Application context: unified state passed to every command handler.
//!
//! Infrastructure that depends on the loaded configuration (the Docker
//! connector and the ExApp client) is built by the commands that need it.

use anyhow::Result;

use crate::application::services::config_service;
use crate::domain::config::ExappConfig;
use crate::infra::config::YamlConfigStore;
use crate::infra::confirm::TerminalConfirmer;
use crate::infra::store::JsonRegistry;
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer, TerminalReporter};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Skip interactive prompts (also set by `CI` / `EXAPP_YES` env vars).
    pub yes: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    pub output: OutputFlags,
    pub behaviour: BehaviourFlags,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Daemons and ExApp registrations.
    pub registry: JsonRegistry,
    pub config_store: YamlConfigStore,
    /// When `true`, never prompt.
    ///
    /// Set when `--yes` / `-y` is passed, or when the `CI` or `EXAPP_YES`
    /// environment variables are present.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry location cannot be determined.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        let ci_env = std::env::var("CI").is_ok() || std::env::var("EXAPP_YES").is_ok();
        let non_interactive = flags.behaviour.yes || ci_env;

        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };

        Ok(Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            mode,
            registry: JsonRegistry::new()?,
            config_store: YamlConfigStore,
            non_interactive,
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Progress reporter for application services. Silent in JSON mode so
    /// stdout carries only the result document.
    #[must_use]
    pub fn reporter(&self) -> TerminalReporter<'_> {
        if self.is_json() {
            TerminalReporter::silent(&self.output)
        } else {
            TerminalReporter::new(&self.output)
        }
    }

    #[must_use]
    pub fn confirmer(&self) -> TerminalConfirmer {
        TerminalConfirmer::new(self.non_interactive || self.is_json())
    }

    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load_config(&self) -> Result<ExappConfig> {
        config_service::load_config(&self.config_store)
    }
}
