//! Application service: the ExApp registration saga and its siblings.
//!
//! Registration runs as an explicit state machine. Once the provisional
//! record is persisted, every fatal failure runs the stage's compensation
//! (unregistering the appid) before the error is returned.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use exapp_common::{DaemonConfig, ExAppInfo, RegisteredApp, ScopeGroup};

use crate::application::ports::{
    ContainerEngine, DaemonConfigStore, EngineConnector, ExAppClient, ProgressReporter,
    RegistrationStore, ScopeConfirmer,
};
use crate::application::services::deploy_actions::DeployActionRegistry;
use crate::application::services::scopes::{fetch_requested, map_to_display_names};
use crate::domain::error::PersistenceError;
use crate::domain::registration::{
    Compensation, RegistrationError, RegistrationReport, RegistrationState, SagaStage,
    ScopeGrantFailure,
};
use crate::domain::scopes::ScopePartition;

// ── Register ──────────────────────────────────────────────────────────────────

pub struct RegisterOptions<'a, R: ProgressReporter> {
    pub reporter: &'a R,
    pub daemon: &'a DaemonConfig,
    /// Approve every requested scope without asking.
    pub force_scopes: bool,
    /// Enable the ExApp once scopes are granted.
    pub enable: bool,
    /// Operator-supplied metadata for daemons that cannot discover it.
    pub info_document: Option<&'a str>,
}

/// Bookkeeping shared by every stage of one registration run.
struct SagaRun<'a, S, R: ProgressReporter> {
    appid: &'a str,
    store: &'a S,
    reporter: &'a R,
    trace: Vec<RegistrationState>,
}

impl<S: RegistrationStore, R: ProgressReporter> SagaRun<'_, S, R> {
    fn advance(&mut self, state: RegistrationState) {
        tracing::debug!(appid = self.appid, %state, "registration advanced");
        self.trace.push(state);
    }

    fn current(&self) -> RegistrationState {
        self.trace
            .last()
            .copied()
            .unwrap_or(RegistrationState::Unregistered)
    }

    /// Fail the run at `stage`, compensating if the stage requires it.
    async fn fail(mut self, stage: SagaStage, cause: anyhow::Error) -> RegistrationError {
        tracing::warn!(appid = self.appid, %stage, error = %format!("{cause:#}"), "registration failed");
        match stage.compensation() {
            None => RegistrationError::Failed {
                appid: self.appid.to_string(),
                stage,
                cause,
                rolled_back: false,
                trace: self.trace,
            },
            Some(Compensation::UnregisterApp) => {
                self.reporter
                    .warn(&format!("{stage} failed, unregistering {}", self.appid));
                match self.store.unregister_app(self.appid).await {
                    Ok(()) => {
                        tracing::warn!(appid = self.appid, %stage, "registration rolled back");
                        self.trace.push(RegistrationState::Unregistered);
                        RegistrationError::Failed {
                            appid: self.appid.to_string(),
                            stage,
                            cause,
                            rolled_back: true,
                            trace: self.trace,
                        }
                    }
                    Err(rollback) => {
                        tracing::warn!(appid = self.appid, %stage, error = %rollback, "rollback failed, record left behind");
                        RegistrationError::Inconsistent {
                            appid: self.appid.to_string(),
                            stage,
                            cause,
                            rollback: rollback.into(),
                            trace: self.trace,
                        }
                    }
                }
            }
        }
    }
}

/// Decide which partitions are approved.
///
/// Prompts only when there is something to approve, scopes are not forced
/// and an operator can answer. Required scopes are asked first and optional
/// ones only after the required set was approved. Without prompting, the
/// answer for both partitions is `force`.
fn confirm_partitions(
    appid: &str,
    required: &[ScopeGroup],
    optional: &[ScopeGroup],
    force: bool,
    confirmer: &impl ScopeConfirmer,
    reporter: &impl ProgressReporter,
) -> Result<(bool, bool)> {
    let nothing_requested = required.is_empty() && optional.is_empty();
    if nothing_requested || force || !confirmer.is_interactive() {
        return Ok((force, force));
    }
    reporter.pause();
    let required_ok = required.is_empty()
        || confirmer.confirm(appid, ScopePartition::Required, &map_to_display_names(required))?;
    if !required_ok {
        return Ok((false, false));
    }
    let optional_ok = !optional.is_empty()
        && confirmer.confirm(appid, ScopePartition::Optional, &map_to_display_names(optional))?;
    Ok((true, optional_ok))
}

/// Register the ExApp `appid` deployed on `opts.daemon`.
///
/// # Errors
///
/// Returns [`RegistrationError::AlreadyRegistered`] if a record exists,
/// [`RegistrationError::Failed`] naming the failed stage otherwise, or
/// [`RegistrationError::Inconsistent`] when the compensating unregister
/// also failed.
#[allow(clippy::too_many_lines)]
pub async fn register_exapp(
    appid: &str,
    store: &impl RegistrationStore,
    actions: &DeployActionRegistry<'_>,
    client: &impl ExAppClient,
    confirmer: &impl ScopeConfirmer,
    opts: RegisterOptions<'_, impl ProgressReporter>,
) -> Result<RegistrationReport, RegistrationError> {
    let RegisterOptions {
        reporter,
        daemon,
        force_scopes,
        enable,
        info_document,
    } = opts;
    let mut run = SagaRun {
        appid,
        store,
        reporter,
        trace: vec![RegistrationState::Unregistered],
    };

    // 1. Existing record
    match store.get_app(appid).await {
        Ok(Some(_)) => return Err(RegistrationError::AlreadyRegistered(appid.to_string())),
        Ok(None) => {}
        Err(e) => return Err(run.fail(SagaStage::CheckExisting, e.into()).await),
    }

    // 2. Metadata
    reporter.step(&format!("resolving {appid} on {}...", daemon.name));
    let info: ExAppInfo = match actions.get(&daemon.accepts_deploy_id) {
        Ok(action) => match action.resolve_info(appid, daemon, info_document).await {
            Ok(info) => info,
            Err(e) => return Err(run.fail(SagaStage::ResolveMetadata, e).await),
        },
        Err(e) => return Err(run.fail(SagaStage::ResolveMetadata, e.into()).await),
    };
    run.advance(RegistrationState::MetadataResolved);

    // 3. Provisional record
    let record = RegisteredApp::provisional(&info, &daemon.name, Utc::now());
    match store.register_app(&record).await {
        Ok(()) => run.advance(RegistrationState::Persisted),
        Err(PersistenceError::AlreadyRegistered(id)) => {
            return Err(RegistrationError::AlreadyRegistered(id));
        }
        Err(e) => return Err(run.fail(SagaStage::Persist, e.into()).await),
    }

    // 4. System flag
    if info.system_app {
        if let Err(e) = store.set_system_app(appid, true).await {
            return Err(run.fail(SagaStage::ApplySystemFlag, e.into()).await);
        }
    }

    // 5. Requested scopes
    reporter.step(&format!("fetching scopes requested by {appid}..."));
    let requested = match fetch_requested(client, &info).await {
        Ok(requested) => requested,
        Err(e) => return Err(run.fail(SagaStage::FetchScopes, e.into()).await),
    };
    run.advance(RegistrationState::ScopesFetched);

    // 6. Confirmation
    let (required_ok, optional_ok) = match confirm_partitions(
        appid,
        &requested.required,
        &requested.optional,
        force_scopes,
        confirmer,
        reporter,
    ) {
        Ok(answers) => answers,
        Err(e) => return Err(run.fail(SagaStage::ConfirmScopes, e).await),
    };
    if !required_ok && !requested.required.is_empty() {
        run.advance(RegistrationState::RequiredRejected);
        let cause = anyhow!(
            "required scopes were not approved: {}",
            map_to_display_names(&requested.required).join(", ")
        );
        return Err(run.fail(SagaStage::ConfirmScopes, cause).await);
    }
    run.advance(RegistrationState::RequiredApproved);

    // 7. Grants
    let mut approved = requested.required.clone();
    let mut skipped_optional = Vec::new();
    if optional_ok {
        approved.extend(requested.optional.iter().cloned());
    } else if !requested.optional.is_empty() {
        reporter.warn(&format!(
            "optional scopes skipped: {}",
            map_to_display_names(&requested.optional).join(", ")
        ));
        skipped_optional = requested.optional.clone();
    }
    let mut granted = Vec::new();
    let mut failed_grants = Vec::new();
    for group in approved {
        match store.grant_scope(appid, &group).await {
            Ok(()) => granted.push(group),
            Err(e) => {
                tracing::warn!(appid, %group, error = %e, "scope grant failed");
                reporter.warn(&format!("could not grant scope {group}: {e}"));
                failed_grants.push(ScopeGrantFailure {
                    group,
                    reason: e.to_string(),
                });
            }
        }
    }
    if optional_ok && !requested.optional.is_empty() {
        run.advance(RegistrationState::OptionalApplied);
    }

    // 8. Enablement
    if enable {
        reporter.step(&format!("enabling {appid}..."));
        if let Err(e) = client.set_enabled(&info, true).await {
            return Err(run.fail(SagaStage::Enable, e.into()).await);
        }
        if let Err(e) = store.set_enabled(appid, true).await {
            return Err(run.fail(SagaStage::Enable, e.into()).await);
        }
        run.advance(RegistrationState::Enabled);
    }

    let final_state = run.current();
    tracing::info!(appid, daemon = %daemon.name, %final_state, "ExApp registered");
    reporter.success(&format!("registered {appid}"));
    Ok(RegistrationReport {
        appid: appid.to_string(),
        final_state,
        trace: run.trace,
        granted,
        failed_grants,
        skipped_optional,
        enabled: enable,
    })
}

// ── Unregister ────────────────────────────────────────────────────────────────

pub struct UnregisterOptions<'a, R: ProgressReporter> {
    pub reporter: &'a R,
    /// Also remove the container on `docker-install` daemons.
    pub remove_container: bool,
}

/// What an unregistration did besides deleting the record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnregisterOutcome {
    pub disabled: bool,
    pub container_removed: bool,
}

/// Disable `appid`, optionally remove its container, and delete its record.
///
/// A failed remote disable is only a warning: the ExApp may already be gone.
///
/// # Errors
///
/// Returns an error if the app is not registered, the container cannot be
/// removed (the record is kept so the command can be retried), or the record
/// cannot be deleted.
pub async fn unregister_exapp(
    appid: &str,
    store: &(impl RegistrationStore + DaemonConfigStore),
    client: &impl ExAppClient,
    connector: &impl EngineConnector,
    opts: UnregisterOptions<'_, impl ProgressReporter>,
) -> Result<UnregisterOutcome> {
    let reporter = opts.reporter;
    let app = store
        .get_app(appid)
        .await?
        .ok_or_else(|| PersistenceError::NotFound(appid.to_string()))?;
    let mut outcome = UnregisterOutcome::default();

    reporter.step(&format!("disabling {appid}..."));
    match client.set_enabled(&app.info(), false).await {
        Ok(()) => outcome.disabled = true,
        Err(e) => {
            tracing::warn!(appid, error = %e, "remote disable failed");
            reporter.warn(&format!("could not disable {appid}: {e}"));
        }
    }

    if opts.remove_container {
        let daemon = store.get_daemon(&app.daemon_config_name).await?;
        match daemon {
            Some(daemon) if daemon.is_docker() => {
                reporter.step(&format!("removing container {appid}..."));
                let engine = connector.connect(&daemon)?;
                engine.remove_container(appid, true).await?;
                outcome.container_removed = true;
            }
            Some(daemon) => reporter.warn(&format!(
                "daemon {} does not manage containers, nothing to remove",
                daemon.name
            )),
            None => reporter.warn(&format!(
                "daemon {} no longer exists, container not removed",
                app.daemon_config_name
            )),
        }
    }

    store.unregister_app(appid).await?;
    tracing::info!(appid, "ExApp unregistered");
    reporter.success(&format!("unregistered {appid}"));
    Ok(outcome)
}

// ── Enablement and listing ────────────────────────────────────────────────────

/// Enable or disable a registered ExApp, remotely first.
///
/// # Errors
///
/// Returns an error if the app is not registered, refuses the callback, or
/// the flag cannot be persisted.
pub async fn set_app_enabled(
    appid: &str,
    store: &impl RegistrationStore,
    client: &impl ExAppClient,
    enabled: bool,
) -> Result<()> {
    let app = store
        .get_app(appid)
        .await?
        .ok_or_else(|| PersistenceError::NotFound(appid.to_string()))?;
    client.set_enabled(&app.info(), enabled).await?;
    store.set_enabled(appid, enabled).await?;
    tracing::info!(appid, enabled, "ExApp enablement changed");
    Ok(())
}

/// All registrations, sorted by appid.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub async fn list_apps(store: &impl RegistrationStore) -> Result<Vec<RegisteredApp>> {
    let mut apps = store.list_apps().await?;
    apps.sort_by(|a, b| a.appid.cmp(&b.appid));
    Ok(apps)
}

// ── Heartbeat ─────────────────────────────────────────────────────────────────

/// Check that `appid` answers and record the time it did.
///
/// # Errors
///
/// Returns an error if the app is not registered or does not answer.
pub async fn heartbeat(
    appid: &str,
    store: &impl RegistrationStore,
    client: &impl ExAppClient,
) -> Result<DateTime<Utc>> {
    let app = store
        .get_app(appid)
        .await?
        .ok_or_else(|| PersistenceError::NotFound(appid.to_string()))?;
    client.heartbeat(&app.info()).await?;
    let now = Utc::now();
    store.touch(appid, now).await?;
    Ok(now)
}
