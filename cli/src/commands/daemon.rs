//! `exapp daemon`: manage deployment targets.

use anyhow::Result;
use clap::{Args, Subcommand};
use exapp_common::{DaemonConfig, DeployConfig, deploy_kind};
use std::process::ExitCode;

use crate::app::AppContext;
use crate::application::services::deploy_actions::DeployActionRegistry;
use crate::application::services::{config_service, daemon_service};
use crate::infra::docker::DockerConnector;

/// Daemon subcommands.
#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Register a daemon
    Register(RegisterDaemonArgs),
    /// List registered daemons
    List,
    /// Remove a daemon no ExApp uses
    Unregister {
        /// Daemon name
        name: String,
    },
}

#[derive(Args)]
pub struct RegisterDaemonArgs {
    /// Unique daemon name
    pub name: String,

    /// Human-readable name
    #[arg(long)]
    pub display_name: Option<String>,

    /// Deploy action this daemon accepts
    #[arg(long, default_value = deploy_kind::DOCKER_INSTALL,
          value_parser = [deploy_kind::DOCKER_INSTALL, deploy_kind::MANUAL_INSTALL])]
    pub kind: String,

    /// How to reach the daemon: unix-socket, http or https
    #[arg(long, default_value = "unix-socket")]
    pub protocol: String,

    /// Socket path for unix-socket, hostname otherwise
    #[arg(long, default_value = "/var/run/docker.sock")]
    pub host: String,

    #[arg(long)]
    pub port: Option<u16>,

    /// Docker network for ExApp containers
    #[arg(long, default_value = "host")]
    pub net: String,

    /// Publish the ExApp port on the daemon host
    #[arg(long)]
    pub expose: bool,

    /// Address ExApps on a host-shared network are reached at
    #[arg(long)]
    pub exapp_host: Option<String>,

    /// Platform URL handed to ExApps deployed here
    #[arg(long)]
    pub platform_url: Option<String>,

    /// PEM client certificate for https daemons
    #[arg(long, requires = "ssl_key")]
    pub ssl_cert: Option<String>,

    /// PEM private key for https daemons
    #[arg(long, requires = "ssl_cert")]
    pub ssl_key: Option<String>,

    /// Key password (rejected; keys must be unencrypted PEM)
    #[arg(long)]
    pub ssl_key_password: Option<String>,

    /// Certificate password (rejected; certificates must be unencrypted PEM)
    #[arg(long)]
    pub ssl_cert_password: Option<String>,

    /// Make this the default daemon
    #[arg(long)]
    pub set_default: bool,
}

impl RegisterDaemonArgs {
    fn into_config(self) -> DaemonConfig {
        DaemonConfig {
            display_name: self.display_name.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            accepts_deploy_id: self.kind,
            protocol: self.protocol,
            host: self.host,
            port: self.port,
            deploy_config: DeployConfig {
                net: self.net,
                expose: self.expose,
                host: self.exapp_host,
                platform_url: self.platform_url,
                ssl_cert: self.ssl_cert,
                ssl_cert_password: self.ssl_cert_password,
                ssl_key: self.ssl_key,
                ssl_key_password: self.ssl_key_password,
            },
        }
    }
}

/// Run the daemon command.
///
/// # Errors
///
/// Returns an error if the daemon is invalid, unknown, still in use, or the
/// registry cannot be updated.
pub async fn run(app: &AppContext, cmd: DaemonCommand) -> Result<ExitCode> {
    match cmd {
        DaemonCommand::Register(args) => register(app, args).await,
        DaemonCommand::List => {
            let config = app.load_config()?;
            let daemons = daemon_service::list_daemons(&app.registry).await?;
            app.renderer()
                .render_daemons(&daemons, config.default_daemon.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        DaemonCommand::Unregister { name } => {
            daemon_service::unregister_daemon(&app.registry, &name).await?;
            let mut config = app.load_config()?;
            if config.default_daemon.as_deref() == Some(name.as_str()) {
                config.default_daemon = None;
                config_service::save_config(&app.config_store, &config)?;
            }
            app.renderer().render_daemon_removed(&name)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn register(app: &AppContext, args: RegisterDaemonArgs) -> Result<ExitCode> {
    let set_default = args.set_default;
    let daemon = args.into_config();
    let config = app.load_config()?;
    let actions =
        DeployActionRegistry::standard(DockerConnector::from_config(&config), config.docker.cleanup);
    daemon_service::register_daemon(&app.registry, &actions, &daemon).await?;
    if set_default {
        config_service::set_config_value(&app.config_store, "default_daemon", &daemon.name)?;
    }
    app.renderer().render_daemon_registered(&daemon)?;
    Ok(ExitCode::SUCCESS)
}
