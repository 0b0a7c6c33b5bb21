//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and `exapp_common`, never from
//! `crate::infra`, `crate::commands`, or `crate::output`.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use exapp_common::{
    ContainerParams, DaemonConfig, ExAppInfo, ImageParams, RegisteredApp, ScopeGroup,
    ScopeRequest,
};

use crate::domain::config::ExappConfig;
use crate::domain::error::{
    DockerApiError, NegotiationError, PersistenceError, TransportConfigError,
};
use crate::domain::exapp::ContainerDetails;
use crate::domain::scopes::ScopePartition;

// ── Container Engine Ports ────────────────────────────────────────────────────

/// Minimal Docker Engine API surface used to provision ExApps.
///
/// Every call is a single request with no retry; the failing stage is
/// carried in the returned [`DockerApiError`].
#[allow(async_fn_in_trait)]
pub trait ContainerEngine {
    /// Pull `image` from its registry.
    async fn pull_image(&self, image: &ImageParams) -> Result<(), DockerApiError>;
    /// Create a container and return its id.
    async fn create_container(
        &self,
        image: &ImageParams,
        container: &ContainerParams,
    ) -> Result<String, DockerApiError>;
    /// Start a created container.
    async fn start_container(&self, id: &str) -> Result<(), DockerApiError>;
    /// Fetch container details by id or name.
    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails, DockerApiError>;
    /// Remove a container. Removing a container that does not exist succeeds.
    async fn remove_container(&self, id: &str, force: bool) -> Result<(), DockerApiError>;
}

/// Turns a daemon configuration into a connected [`ContainerEngine`].
///
/// Resolution performs no network I/O; transport problems surface here and
/// API problems surface on the first call.
pub trait EngineConnector {
    type Engine: ContainerEngine;

    /// # Errors
    ///
    /// Returns an error if the daemon's protocol or TLS material is unusable.
    fn connect(&self, daemon: &DaemonConfig) -> Result<Self::Engine, TransportConfigError>;
}

// ── ExApp Callback Port ───────────────────────────────────────────────────────

/// Authenticated callbacks into a running ExApp.
#[allow(async_fn_in_trait)]
pub trait ExAppClient {
    /// `GET /scopes`.
    async fn fetch_scopes(&self, app: &ExAppInfo) -> Result<ScopeRequest, NegotiationError>;
    /// `PUT /enabled?enabled=0|1`.
    async fn set_enabled(&self, app: &ExAppInfo, enabled: bool) -> Result<(), NegotiationError>;
    /// `GET /heartbeat`.
    async fn heartbeat(&self, app: &ExAppInfo) -> Result<(), NegotiationError>;
}

// ── Persistence Ports ─────────────────────────────────────────────────────────

/// Durable daemon configuration records.
#[allow(async_fn_in_trait)]
pub trait DaemonConfigStore {
    async fn get_daemon(&self, name: &str) -> Result<Option<DaemonConfig>, PersistenceError>;
    async fn list_daemons(&self) -> Result<Vec<DaemonConfig>, PersistenceError>;
    /// Fails with [`PersistenceError::DaemonExists`] if the name is taken.
    async fn add_daemon(&self, daemon: &DaemonConfig) -> Result<(), PersistenceError>;
    /// Fails with [`PersistenceError::DaemonInUse`] while apps reference it.
    async fn remove_daemon(&self, name: &str) -> Result<(), PersistenceError>;
}

/// Durable ExApp registration records.
///
/// Uniqueness of the appid is enforced by [`RegistrationStore::register_app`]
/// itself, not by callers checking [`RegistrationStore::get_app`] first.
#[allow(async_fn_in_trait)]
pub trait RegistrationStore {
    async fn get_app(&self, appid: &str) -> Result<Option<RegisteredApp>, PersistenceError>;
    async fn list_apps(&self) -> Result<Vec<RegisteredApp>, PersistenceError>;
    async fn register_app(&self, app: &RegisteredApp) -> Result<(), PersistenceError>;
    async fn set_system_app(&self, appid: &str, system_app: bool) -> Result<(), PersistenceError>;
    /// Add `group` to the app's granted scopes. Granting twice is a no-op.
    async fn grant_scope(&self, appid: &str, group: &ScopeGroup) -> Result<(), PersistenceError>;
    async fn set_enabled(&self, appid: &str, enabled: bool) -> Result<(), PersistenceError>;
    /// Record a successful heartbeat.
    async fn touch(&self, appid: &str, at: DateTime<Utc>) -> Result<(), PersistenceError>;
    async fn unregister_app(&self, appid: &str) -> Result<(), PersistenceError>;
}

/// Abstracts config persistence (load/save).
pub trait ConfigStore {
    /// Load the configuration, or defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn load(&self) -> Result<ExappConfig>;
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn save(&self, config: &ExappConfig) -> Result<()>;
    /// # Errors
    ///
    /// Returns an error if no location can be determined.
    fn path(&self) -> Result<PathBuf>;
}

// ── Interaction Ports ─────────────────────────────────────────────────────────

/// Asks an operator to approve requested scope groups.
pub trait ScopeConfirmer {
    /// `false` when no operator can answer (`--yes`, CI, no TTY).
    fn is_interactive(&self) -> bool;
    /// Ask once for a whole partition. `names` are display names.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt cannot be shown or read.
    fn confirm(&self, appid: &str, partition: ScopePartition, names: &[String]) -> Result<bool>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
    /// Close any running indicator before the terminal is handed to a prompt.
    fn pause(&self);
}
