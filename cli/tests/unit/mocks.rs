//! Shared port implementations for unit tests.
//!
//! Every mock records the calls it receives so tests can assert on call
//! order, and exposes switches that make a single operation fail.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::Rc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use exapp_cli::application::ports::{
    ContainerEngine, DaemonConfigStore, EngineConnector, ExAppClient, ProgressReporter,
    RegistrationStore, ScopeConfirmer,
};
use exapp_cli::domain::error::{
    DockerApiError, DockerStage, NegotiationError, PersistenceError, TransportConfigError,
};
use exapp_cli::domain::exapp::ContainerDetails;
use exapp_cli::domain::scopes::ScopePartition;
use exapp_common::{
    ContainerParams, DaemonConfig, ExAppInfo, ImageParams, RegisteredApp, ScopeGroup,
    ScopeRequest, routes,
};

// ── Container engine ─────────────────────────────────────────────────────────

#[derive(Default)]
struct EngineState {
    calls: Vec<String>,
    fail: BTreeMap<&'static str, DockerApiError>,
    details: Option<ContainerDetails>,
}

/// Records every Docker call. Clones share state, so a connector can hand
/// out copies while the test keeps one for assertions.
#[derive(Clone, Default)]
pub struct RecordingEngine {
    state: Rc<RefCell<EngineState>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `stage` fail with HTTP `status`.
    pub fn failing(self, stage: DockerStage, status: u16, message: &str) -> Self {
        let key = stage_key(stage);
        self.state
            .borrow_mut()
            .fail
            .insert(key, DockerApiError::status(stage, status, message));
        self
    }

    pub fn with_details(self, details: ContainerDetails) -> Self {
        self.state.borrow_mut().details = Some(details);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    fn record(&self, stage: DockerStage, detail: &str) -> Result<(), DockerApiError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("{}:{detail}", stage_key(stage)));
        match state.fail.get(stage_key(stage)) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn stage_key(stage: DockerStage) -> &'static str {
    match stage {
        DockerStage::Pull => "pull",
        DockerStage::Create => "create",
        DockerStage::Start => "start",
        DockerStage::Inspect => "inspect",
        DockerStage::Remove => "remove",
    }
}

impl ContainerEngine for RecordingEngine {
    async fn pull_image(&self, image: &ImageParams) -> Result<(), DockerApiError> {
        self.record(DockerStage::Pull, &image.reference())
    }

    async fn create_container(
        &self,
        _image: &ImageParams,
        container: &ContainerParams,
    ) -> Result<String, DockerApiError> {
        self.record(DockerStage::Create, &container.name)?;
        Ok(format!("{}-id", container.name))
    }

    async fn start_container(&self, id: &str) -> Result<(), DockerApiError> {
        self.record(DockerStage::Start, id)
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails, DockerApiError> {
        self.record(DockerStage::Inspect, id)?;
        self.state.borrow().details.clone().ok_or_else(|| {
            DockerApiError::status(DockerStage::Inspect, 404, format!("No such container: {id}"))
        })
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<(), DockerApiError> {
        self.record(DockerStage::Remove, &format!("{id}:force={force}"))
    }
}

/// Connector that hands out a shared [`RecordingEngine`].
#[derive(Clone, Default)]
pub struct FakeConnector {
    pub engine: RecordingEngine,
    pub connects: Rc<Cell<usize>>,
    pub refuse: bool,
}

impl FakeConnector {
    pub fn new(engine: RecordingEngine) -> Self {
        Self {
            engine,
            connects: Rc::new(Cell::new(0)),
            refuse: false,
        }
    }

    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }
}

impl EngineConnector for FakeConnector {
    type Engine = RecordingEngine;

    fn connect(&self, _daemon: &DaemonConfig) -> Result<RecordingEngine, TransportConfigError> {
        self.connects.set(self.connects.get() + 1);
        if self.refuse {
            return Err(TransportConfigError::UnknownProtocol("carrier-pigeon".into()));
        }
        Ok(self.engine.clone())
    }
}

// ── Record store ─────────────────────────────────────────────────────────────

/// Which store operations fail.
#[derive(Default)]
pub struct StoreFailures {
    pub get_app: bool,
    pub register: bool,
    pub system_flag: bool,
    pub set_enabled: bool,
    pub unregister: bool,
    /// Scope groups whose grant fails.
    pub grants: BTreeSet<String>,
}

/// In-memory daemons and registrations with failure injection.
#[derive(Default)]
pub struct InMemoryStore {
    pub daemons: RefCell<Vec<DaemonConfig>>,
    pub apps: RefCell<BTreeMap<String, RegisteredApp>>,
    pub failures: StoreFailures,
    pub ops: RefCell<Vec<String>>,
}

fn backend(op: &str) -> PersistenceError {
    PersistenceError::Backend(anyhow::anyhow!("{op}: disk full"))
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failures(failures: StoreFailures) -> Self {
        Self {
            failures,
            ..Self::default()
        }
    }

    pub fn with_daemon(self, daemon: DaemonConfig) -> Self {
        self.daemons.borrow_mut().push(daemon);
        self
    }

    pub fn with_app(self, app: RegisteredApp) -> Self {
        self.apps.borrow_mut().insert(app.appid.clone(), app);
        self
    }

    pub fn app(&self, appid: &str) -> Option<RegisteredApp> {
        self.apps.borrow().get(appid).cloned()
    }

    pub fn ops(&self) -> Vec<String> {
        self.ops.borrow().clone()
    }

    fn log(&self, op: String) {
        self.ops.borrow_mut().push(op);
    }

    fn with_record<T>(
        &self,
        appid: &str,
        change: impl FnOnce(&mut RegisteredApp) -> T,
    ) -> Result<T, PersistenceError> {
        let mut apps = self.apps.borrow_mut();
        let app = apps
            .get_mut(appid)
            .ok_or_else(|| PersistenceError::NotFound(appid.to_string()))?;
        Ok(change(app))
    }
}

impl DaemonConfigStore for InMemoryStore {
    async fn get_daemon(&self, name: &str) -> Result<Option<DaemonConfig>, PersistenceError> {
        Ok(self.daemons.borrow().iter().find(|d| d.name == name).cloned())
    }

    async fn list_daemons(&self) -> Result<Vec<DaemonConfig>, PersistenceError> {
        Ok(self.daemons.borrow().clone())
    }

    async fn add_daemon(&self, daemon: &DaemonConfig) -> Result<(), PersistenceError> {
        let mut daemons = self.daemons.borrow_mut();
        if daemons.iter().any(|d| d.name == daemon.name) {
            return Err(PersistenceError::DaemonExists(daemon.name.clone()));
        }
        daemons.push(daemon.clone());
        Ok(())
    }

    async fn remove_daemon(&self, name: &str) -> Result<(), PersistenceError> {
        let users: Vec<String> = self
            .apps
            .borrow()
            .values()
            .filter(|a| a.daemon_config_name == name)
            .map(|a| a.appid.clone())
            .collect();
        if !users.is_empty() {
            return Err(PersistenceError::DaemonInUse {
                daemon: name.to_string(),
                apps: users.join(", "),
            });
        }
        let mut daemons = self.daemons.borrow_mut();
        let before = daemons.len();
        daemons.retain(|d| d.name != name);
        if daemons.len() == before {
            return Err(PersistenceError::NotFound(name.to_string()));
        }
        Ok(())
    }
}

impl RegistrationStore for InMemoryStore {
    async fn get_app(&self, appid: &str) -> Result<Option<RegisteredApp>, PersistenceError> {
        if self.failures.get_app {
            return Err(backend("get_app"));
        }
        Ok(self.app(appid))
    }

    async fn list_apps(&self) -> Result<Vec<RegisteredApp>, PersistenceError> {
        Ok(self.apps.borrow().values().cloned().collect())
    }

    async fn register_app(&self, app: &RegisteredApp) -> Result<(), PersistenceError> {
        self.log(format!("register:{}", app.appid));
        if self.failures.register {
            return Err(backend("register"));
        }
        let mut apps = self.apps.borrow_mut();
        if apps.contains_key(&app.appid) {
            return Err(PersistenceError::AlreadyRegistered(app.appid.clone()));
        }
        apps.insert(app.appid.clone(), app.clone());
        Ok(())
    }

    async fn set_system_app(&self, appid: &str, system_app: bool) -> Result<(), PersistenceError> {
        self.log(format!("system:{appid}={system_app}"));
        if self.failures.system_flag {
            return Err(backend("set_system_app"));
        }
        self.with_record(appid, |app| app.system_app = system_app)
    }

    async fn grant_scope(&self, appid: &str, group: &ScopeGroup) -> Result<(), PersistenceError> {
        self.log(format!("grant:{appid}:{group}"));
        if self.failures.grants.contains(group.as_str()) {
            return Err(backend("grant_scope"));
        }
        self.with_record(appid, |app| {
            if !app.scope_groups.contains(group) {
                app.scope_groups.push(group.clone());
            }
        })
    }

    async fn set_enabled(&self, appid: &str, enabled: bool) -> Result<(), PersistenceError> {
        self.log(format!("enabled:{appid}={enabled}"));
        if self.failures.set_enabled {
            return Err(backend("set_enabled"));
        }
        self.with_record(appid, |app| app.enabled = enabled)
    }

    async fn touch(&self, appid: &str, at: DateTime<Utc>) -> Result<(), PersistenceError> {
        self.with_record(appid, |app| app.last_check_time = Some(at))
    }

    async fn unregister_app(&self, appid: &str) -> Result<(), PersistenceError> {
        self.log(format!("unregister:{appid}"));
        if self.failures.unregister {
            return Err(backend("unregister"));
        }
        self.apps
            .borrow_mut()
            .remove(appid)
            .map(|_| ())
            .ok_or_else(|| PersistenceError::NotFound(appid.to_string()))
    }
}

// ── ExApp client ─────────────────────────────────────────────────────────────

/// Answers `/scopes` with a fixed request and records every callback.
#[derive(Default)]
pub struct FakeExAppClient {
    pub scopes: ScopeRequest,
    pub scopes_status: Option<u16>,
    pub refuse_enable: bool,
    pub refuse_heartbeat: bool,
    pub calls: RefCell<Vec<String>>,
}

impl FakeExAppClient {
    pub fn requesting(required: &[&str], optional: &[&str]) -> Self {
        Self {
            scopes: ScopeRequest {
                required: required.iter().map(|g| ScopeGroup::new(*g)).collect(),
                optional: optional.iter().map(|g| ScopeGroup::new(*g)).collect(),
            },
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn status_error(app: &ExAppInfo, path: &str, status: u16) -> NegotiationError {
        NegotiationError::Status {
            appid: app.appid.clone(),
            path: path.to_string(),
            status,
        }
    }
}

impl ExAppClient for FakeExAppClient {
    async fn fetch_scopes(&self, app: &ExAppInfo) -> Result<ScopeRequest, NegotiationError> {
        self.calls.borrow_mut().push(format!("scopes:{}", app.appid));
        match self.scopes_status {
            Some(status) => Err(Self::status_error(app, routes::SCOPES, status)),
            None => Ok(self.scopes.clone()),
        }
    }

    async fn set_enabled(&self, app: &ExAppInfo, enabled: bool) -> Result<(), NegotiationError> {
        self.calls
            .borrow_mut()
            .push(format!("enabled:{}={enabled}", app.appid));
        if self.refuse_enable {
            return Err(Self::status_error(app, routes::ENABLED, 500));
        }
        Ok(())
    }

    async fn heartbeat(&self, app: &ExAppInfo) -> Result<(), NegotiationError> {
        self.calls.borrow_mut().push(format!("heartbeat:{}", app.appid));
        if self.refuse_heartbeat {
            return Err(Self::status_error(app, routes::HEARTBEAT, 503));
        }
        Ok(())
    }
}

// ── Confirmer ────────────────────────────────────────────────────────────────

/// Answers prompts from a script and records what was asked.
pub struct ScriptedConfirmer {
    interactive: bool,
    answers: RefCell<VecDeque<bool>>,
    pub asked: RefCell<Vec<(ScopePartition, Vec<String>)>>,
    transcript: Option<Rc<RefCell<Vec<String>>>>,
}

impl ScriptedConfirmer {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            interactive: true,
            answers: RefCell::new(answers.iter().copied().collect()),
            asked: RefCell::new(Vec::new()),
            transcript: None,
        }
    }

    /// Also log each prompt as `confirm:<partition>` into the reporter's
    /// event list, so tests can see what the terminal showed before it.
    pub fn interleaved_with(mut self, reporter: &RecordingReporter) -> Self {
        self.transcript = Some(Rc::clone(&reporter.events));
        self
    }

    /// No operator present; any prompt is a test failure.
    pub fn unattended() -> Self {
        Self {
            interactive: false,
            answers: RefCell::new(VecDeque::new()),
            asked: RefCell::new(Vec::new()),
            transcript: None,
        }
    }

    pub fn prompts(&self) -> usize {
        self.asked.borrow().len()
    }
}

impl ScopeConfirmer for ScriptedConfirmer {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn confirm(&self, _appid: &str, partition: ScopePartition, names: &[String]) -> Result<bool> {
        self.asked.borrow_mut().push((partition, names.to_vec()));
        if let Some(transcript) = &self.transcript {
            transcript.borrow_mut().push(format!("confirm:{partition}"));
        }
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("unexpected {partition} prompt"))
    }
}

// ── Reporter ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    pub events: Rc<RefCell<Vec<String>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| e.strip_prefix("warn:").map(str::to_string))
            .collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.events.borrow_mut().push(format!("step:{message}"));
    }
    fn success(&self, message: &str) {
        self.events.borrow_mut().push(format!("success:{message}"));
    }
    fn warn(&self, message: &str) {
        self.events.borrow_mut().push(format!("warn:{message}"));
    }
    fn pause(&self) {
        self.events.borrow_mut().push("pause".to_string());
    }
}
