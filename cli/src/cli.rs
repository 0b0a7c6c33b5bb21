//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::commands;

/// Deploy and register externally hosted application containers
#[derive(Parser)]
#[command(
    name = "exapp",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output (also set by a non-empty `NO_COLOR`)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Never prompt; unconfirmed scopes are declined
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage deployment daemons
    #[command(subcommand)]
    Daemon(commands::daemon::DaemonCommand),

    /// Pull, create and start an ExApp container
    Deploy(commands::deploy::DeployArgs),

    /// Register a deployed ExApp and grant its scopes
    Register(commands::register::RegisterArgs),

    /// Disable an ExApp and delete its registration
    Unregister(commands::unregister::UnregisterArgs),

    /// Enable a registered ExApp
    Enable {
        appid: String,
    },

    /// Disable a registered ExApp
    Disable {
        appid: String,
    },

    /// List registered ExApps
    Apps,

    /// Check that a registered ExApp answers
    Heartbeat {
        appid: String,
    },

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

/// `NO_COLOR` disables color when present with any non-empty value.
fn no_color_env() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty())
}

impl Cli {
    /// `true` when the JSON error object should be printed on failure.
    #[must_use]
    pub fn wants_json(&self) -> bool {
        self.json
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            yes,
            command,
        } = self;
        let app = AppContext::new(&AppFlags {
            output: OutputFlags {
                no_color: no_color || no_color_env(),
                quiet,
                json,
            },
            behaviour: BehaviourFlags { yes },
        })?;

        match command {
            Command::Daemon(cmd) => commands::daemon::run(&app, cmd).await,
            Command::Deploy(args) => commands::deploy::run(&app, args).await,
            Command::Register(args) => commands::register::run(&app, args).await,
            Command::Unregister(args) => commands::unregister::run(&app, args).await,
            Command::Enable { appid } => commands::enable::run(&app, &appid, true).await,
            Command::Disable { appid } => commands::enable::run(&app, &appid, false).await,
            Command::Apps => commands::apps::run(&app).await,
            Command::Heartbeat { appid } => commands::heartbeat::run(&app, &appid).await,
            Command::Config(cmd) => commands::config::run(&app, cmd),
            Command::Version => commands::version::run(&app),
        }
    }
}
