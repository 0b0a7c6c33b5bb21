//! Human-readable terminal renderer.

use chrono::{DateTime, Utc};
use exapp_common::{DaemonConfig, RegisteredApp};
use owo_colors::OwoColorize as _;

use crate::application::services::deploy::DeployOutcome;
use crate::application::services::registration::UnregisterOutcome;
use crate::domain::config::ExappConfig;
use crate::domain::error::DockerApiError;
use crate::domain::registration::RegistrationReport;
use crate::domain::scopes::map_to_display_names;
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        self.ctx.info(&format!("exapp v{version}"));
    }

    pub fn render_daemon_registered(&self, daemon: &DaemonConfig) {
        self.ctx.success(&format!(
            "daemon {} registered ({}, {})",
            daemon.name.style(self.ctx.styles.ident),
            daemon.accepts_deploy_id,
            daemon.protocol
        ));
    }

    pub fn render_daemon_removed(&self, name: &str) {
        self.ctx
            .success(&format!("daemon {} unregistered", name.style(self.ctx.styles.ident)));
    }

    /// Render registered daemons as a table.
    pub fn render_daemons(&self, daemons: &[DaemonConfig], default: Option<&str>) {
        if daemons.is_empty() {
            if !self.ctx.quiet {
                println!("No daemons registered. Add one: exapp daemon register <name> ...");
            }
            return;
        }
        println!(
            "  {:<20} {:<16} {:<12} {:<32} {}",
            "NAME".style(self.ctx.styles.dim),
            "KIND".style(self.ctx.styles.dim),
            "PROTOCOL".style(self.ctx.styles.dim),
            "HOST".style(self.ctx.styles.dim),
            "NETWORK".style(self.ctx.styles.dim),
        );
        for d in daemons {
            let host = match d.port {
                Some(port) => format!("{}:{port}", d.host),
                None => d.host.clone(),
            };
            let marker = if default == Some(d.name.as_str()) { "  [default]" } else { "" };
            println!(
                "  {:<20} {:<16} {:<12} {:<32} {}{marker}",
                d.name, d.accepts_deploy_id, d.protocol, host, d.deploy_config.net
            );
        }
    }

    /// Render registered ExApps as a table.
    pub fn render_apps(&self, apps: &[RegisteredApp]) {
        if apps.is_empty() {
            if !self.ctx.quiet {
                println!("No ExApps registered. Register one: exapp register <appid>");
            }
            return;
        }
        println!(
            "  {:<24} {:<10} {:<8} {:<18} {:<28} {}",
            "APPID".style(self.ctx.styles.dim),
            "VERSION".style(self.ctx.styles.dim),
            "ENABLED".style(self.ctx.styles.dim),
            "DAEMON".style(self.ctx.styles.dim),
            "ADDRESS".style(self.ctx.styles.dim),
            "SCOPES".style(self.ctx.styles.dim),
        );
        for app in apps {
            let enabled = if app.enabled { "yes" } else { "no" };
            let address = format!("{}://{}:{}", app.protocol, app.host, app.port);
            println!(
                "  {:<24} {:<10} {:<8} {:<18} {:<28} {}",
                app.appid,
                app.version,
                enabled,
                app.daemon_config_name,
                address,
                map_to_display_names(&app.scope_groups).join(", ")
            );
        }
    }

    /// Render per-stage deploy results.
    pub fn render_deploy(&self, outcome: &DeployOutcome) {
        let report = &outcome.report;
        println!();
        self.ctx.header(&format!("Deploy {}", outcome.container.name));
        self.stage_line("pull", report.pull.as_ref().map(|r| r.as_ref().map(|()| None)));
        self.stage_line(
            "create",
            report
                .create
                .as_ref()
                .map(|r| r.as_ref().map(|id| Some(short_id(id)))),
        );
        self.stage_line("start", report.start.as_ref().map(|r| r.as_ref().map(|()| None)));
        if report.removed_unstarted {
            self.ctx.warn("unstarted container was removed");
        } else if report.container_id().is_some() && !report.is_success() {
            self.ctx.info(&format!(
                "container {} was created but not started; it has been kept",
                outcome.container.name
            ));
        }
    }

    fn stage_line(&self, stage: &str, result: Option<Result<Option<&str>, &DockerApiError>>) {
        match result {
            None => self.ctx.kv(&format!("{stage:<8}"), "skipped"),
            Some(Ok(None)) => self.ctx.success(stage),
            Some(Ok(Some(detail))) => self.ctx.success(&format!("{stage} ({detail})")),
            Some(Err(e)) => self.ctx.error(&format!("{stage}: {e}")),
        }
    }

    /// Render the outcome of a registration run.
    pub fn render_registration(&self, report: &RegistrationReport) {
        if self.ctx.quiet {
            return;
        }
        println!();
        self.ctx.kv("ExApp:", &report.appid);
        self.ctx.kv("State:", &report.final_state.to_string());
        if !report.granted.is_empty() {
            self.ctx
                .kv("Scopes:", &map_to_display_names(&report.granted).join(", "));
        }
        if !report.skipped_optional.is_empty() {
            self.ctx.kv(
                "Skipped:",
                &map_to_display_names(&report.skipped_optional).join(", "),
            );
        }
        for failure in &report.failed_grants {
            self.ctx
                .warn(&format!("scope {} not granted: {}", failure.group, failure.reason));
        }
        if !report.enabled {
            self.ctx
                .info(&format!("Enable it later with: exapp enable {}", report.appid));
        }
    }

    pub fn render_unregistered(&self, appid: &str, outcome: &UnregisterOutcome) {
        if outcome.container_removed {
            self.ctx.info(&format!("container {appid} removed"));
        }
    }

    pub fn render_enabled(&self, appid: &str, enabled: bool) {
        let verb = if enabled { "enabled" } else { "disabled" };
        self.ctx
            .success(&format!("{} {verb}", appid.style(self.ctx.styles.ident)));
    }

    pub fn render_heartbeat(&self, appid: &str, at: DateTime<Utc>) {
        self.ctx.success(&format!(
            "{} is alive ({})",
            appid.style(self.ctx.styles.ident),
            at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }

    /// Render the current exapp configuration.
    pub fn render_config(&self, config: &ExappConfig, path: &std::path::Path) {
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        let unset = || "(not set)".to_string();
        let rows = [
            ("docker.api_version", config.docker.api_version.clone()),
            ("docker.timeout_secs", config.docker.timeout_secs.to_string()),
            ("docker.pull_timeout_secs", config.docker.pull_timeout_secs.to_string()),
            ("docker.cleanup", config.docker.cleanup.to_string()),
            ("callback.timeout_secs", config.callback.timeout_secs.to_string()),
            ("platform.url", config.platform.url.clone()),
            ("platform.installed", config.platform.installed.to_string()),
            (
                "tls.ca_bundle",
                config
                    .tls
                    .ca_bundle
                    .as_ref()
                    .map_or_else(unset, |p| p.display().to_string()),
            ),
            ("default_daemon", config.default_daemon.clone().unwrap_or_else(unset)),
        ];
        for (key, value) in rows {
            println!("  {:<26} {value}", format!("{key}:"));
        }
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        for var in ["EXAPP_CONFIG", "EXAPP_REGISTRY", "EXAPP_LOG", "NO_COLOR"] {
            println!(
                "    {:<18} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| unset())
            );
        }
        println!();
    }

    pub fn render_config_set(&self, key: &str, value: &str) {
        self.ctx.success(&format!("Set {key} = {value}"));
    }
}

/// First 12 characters of a container id, as `docker ps` shows them.
#[must_use]
pub fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}
