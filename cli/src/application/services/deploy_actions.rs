//! Deploy actions keyed by the kind string a daemon accepts.
//!
//! Each action knows how to provision an ExApp on its kind of daemon and how
//! to resolve the identity of an ExApp deployed there. Supporting a new kind
//! means implementing [`DeployAction`] and registering it.

use anyhow::Result;
use async_trait::async_trait;
use exapp_common::{ContainerParams, DaemonConfig, ExAppInfo, ImageParams, deploy_kind};

use crate::application::ports::{EngineConnector, ProgressReporter};
use crate::application::services::deployment::{deploy_container, ensure_deploy_kind};
use crate::application::services::exapp_info::{resolve_from_container, resolve_from_document};
use crate::domain::deploy::{CleanupPolicy, DeployReport};
use crate::domain::error::ConfigError;

/// Provisioning and identity resolution for one deploy kind.
#[async_trait(?Send)]
pub trait DeployAction {
    /// Kind string matched against `DaemonConfig::accepts_deploy_id`.
    fn kind(&self) -> &'static str;

    /// Provision the ExApp container.
    ///
    /// # Errors
    ///
    /// Returns an error if this kind cannot provision containers or the
    /// daemon cannot be reached.
    async fn deploy(
        &self,
        daemon: &DaemonConfig,
        image: &ImageParams,
        container: &ContainerParams,
        reporter: &dyn ProgressReporter,
    ) -> Result<DeployReport>;

    /// Resolve the identity of a deployed ExApp. `document` carries
    /// operator-supplied metadata for kinds that cannot discover it.
    ///
    /// # Errors
    ///
    /// Returns an error if metadata is unavailable or does not describe
    /// `appid`.
    async fn resolve_info(
        &self,
        appid: &str,
        daemon: &DaemonConfig,
        document: Option<&str>,
    ) -> Result<ExAppInfo>;
}

// ── docker-install ────────────────────────────────────────────────────────────

/// ExApps provisioned through the Docker Engine API.
pub struct DockerInstallAction<C> {
    connector: C,
    cleanup: CleanupPolicy,
}

impl<C: EngineConnector> DockerInstallAction<C> {
    pub fn new(connector: C, cleanup: CleanupPolicy) -> Self {
        Self { connector, cleanup }
    }
}

#[async_trait(?Send)]
impl<C: EngineConnector> DeployAction for DockerInstallAction<C> {
    fn kind(&self) -> &'static str {
        deploy_kind::DOCKER_INSTALL
    }

    async fn deploy(
        &self,
        daemon: &DaemonConfig,
        image: &ImageParams,
        container: &ContainerParams,
        reporter: &dyn ProgressReporter,
    ) -> Result<DeployReport> {
        ensure_deploy_kind(daemon, self.kind())?;
        let engine = self.connector.connect(daemon)?;
        Ok(deploy_container(&engine, daemon, image, container, self.cleanup, reporter).await?)
    }

    async fn resolve_info(
        &self,
        appid: &str,
        daemon: &DaemonConfig,
        _document: Option<&str>,
    ) -> Result<ExAppInfo> {
        let engine = self.connector.connect(daemon)?;
        resolve_from_container(&engine, appid, daemon).await
    }
}

// ── manual-install ────────────────────────────────────────────────────────────

/// ExApps started by an operator outside the orchestrator.
pub struct ManualInstallAction;

#[async_trait(?Send)]
impl DeployAction for ManualInstallAction {
    fn kind(&self) -> &'static str {
        deploy_kind::MANUAL_INSTALL
    }

    async fn deploy(
        &self,
        _daemon: &DaemonConfig,
        _image: &ImageParams,
        _container: &ContainerParams,
        _reporter: &dyn ProgressReporter,
    ) -> Result<DeployReport> {
        Err(ConfigError::DeployUnsupported(self.kind().to_string()).into())
    }

    async fn resolve_info(
        &self,
        appid: &str,
        daemon: &DaemonConfig,
        document: Option<&str>,
    ) -> Result<ExAppInfo> {
        let document = document.ok_or(ConfigError::MissingParameter("--info-json"))?;
        resolve_from_document(appid, daemon, document)
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// Static lookup from deploy kind to action.
pub struct DeployActionRegistry<'a> {
    actions: Vec<Box<dyn DeployAction + 'a>>,
}

impl<'a> DeployActionRegistry<'a> {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// The built-in `docker-install` and `manual-install` actions.
    pub fn standard<C: EngineConnector + 'a>(connector: C, cleanup: CleanupPolicy) -> Self {
        Self::empty()
            .with(DockerInstallAction::new(connector, cleanup))
            .with(ManualInstallAction)
    }

    /// Register `action`, replacing any earlier action of the same kind.
    #[must_use]
    pub fn with(mut self, action: impl DeployAction + 'a) -> Self {
        self.actions.retain(|a| a.kind() != action.kind());
        self.actions.push(Box::new(action));
        self
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedDeployKind`] for unknown kinds.
    pub fn get(&self, kind: &str) -> Result<&(dyn DeployAction + 'a), ConfigError> {
        self.actions
            .iter()
            .find(|a| a.kind() == kind)
            .map(|a| &**a)
            .ok_or_else(|| ConfigError::UnsupportedDeployKind {
                kind: kind.to_string(),
            })
    }

    #[must_use]
    pub fn kinds(&self) -> Vec<&'static str> {
        self.actions.iter().map(|a| a.kind()).collect()
    }
}
