//! Deploy-action registry and the ExApp deploy use-case.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use exapp_cli::application::services::deploy::{DeployOptions, deploy_exapp};
use exapp_cli::application::services::deploy_actions::{DeployActionRegistry, ManualInstallAction};
use exapp_cli::domain::deploy::CleanupPolicy;
use exapp_cli::domain::error::ConfigError;
use exapp_common::{ExAppProtocol, deploy_kind, env};

use crate::helpers::{
    container_details, docker_daemon, exapp_env, info_document, manual_daemon, widget_image,
};
use crate::mocks::{FakeConnector, RecordingEngine, RecordingReporter};

fn deploy_opts<'a>(
    reporter: &'a RecordingReporter,
    daemon: &'a exapp_common::DaemonConfig,
    image: &'a exapp_common::ImageParams,
    extra_env: &'a [String],
) -> DeployOptions<'a, RecordingReporter> {
    DeployOptions {
        reporter,
        daemon,
        image,
        display_name: "Widget",
        version: "1.0.0",
        port: 23000,
        protocol: ExAppProtocol::Http,
        secret: Some("s3cret"),
        platform_url: "https://cloud.example.com",
        system_app: false,
        extra_env,
    }
}

#[test]
fn test_standard_registry_knows_both_kinds() {
    let actions = DeployActionRegistry::standard(FakeConnector::default(), CleanupPolicy::Keep);
    let mut kinds = actions.kinds();
    kinds.sort_unstable();
    assert_eq!(kinds, vec![deploy_kind::DOCKER_INSTALL, deploy_kind::MANUAL_INSTALL]);
}

#[test]
fn test_unknown_kind_is_unsupported() {
    let actions = DeployActionRegistry::standard(FakeConnector::default(), CleanupPolicy::Keep);
    let err = actions.get("kubernetes-install").err().expect("unknown kind");
    assert!(matches!(err, ConfigError::UnsupportedDeployKind { kind } if kind == "kubernetes-install"));
}

#[test]
fn test_with_replaces_action_of_same_kind() {
    let actions = DeployActionRegistry::empty()
        .with(ManualInstallAction)
        .with(ManualInstallAction);
    assert_eq!(actions.kinds(), vec![deploy_kind::MANUAL_INSTALL]);
}

#[tokio::test]
async fn test_docker_action_resolves_through_connector() {
    let engine = RecordingEngine::new()
        .with_details(container_details("widget", exapp_env("widget"), "host"));
    let connector = FakeConnector::new(engine.clone());
    let connects = connector.connects.clone();
    let actions = DeployActionRegistry::standard(connector, CleanupPolicy::Keep);

    let action = actions.get(deploy_kind::DOCKER_INSTALL).unwrap();
    let info = action
        .resolve_info("widget", &docker_daemon("host"), None)
        .await
        .unwrap();
    assert_eq!(info.appid, "widget");
    assert_eq!(connects.get(), 1);
    assert_eq!(engine.calls(), vec!["inspect:widget"]);
}

#[tokio::test]
async fn test_manual_action_requires_document() {
    let actions = DeployActionRegistry::standard(FakeConnector::default(), CleanupPolicy::Keep);
    let action = actions.get(deploy_kind::MANUAL_INSTALL).unwrap();

    let err = action
        .resolve_info("widget", &manual_daemon(), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("--info-json"));

    let info = action
        .resolve_info("widget", &manual_daemon(), Some(&info_document("widget")))
        .await
        .unwrap();
    assert_eq!(info.port, 23000);
}

#[tokio::test]
async fn test_manual_action_cannot_deploy() {
    let actions = DeployActionRegistry::standard(FakeConnector::default(), CleanupPolicy::Keep);
    let reporter = RecordingReporter::new();
    let daemon = manual_daemon();
    let image = widget_image();
    let err = deploy_exapp("widget", &actions, deploy_opts(&reporter, &daemon, &image, &[]))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::DeployUnsupported(kind)) if kind == deploy_kind::MANUAL_INSTALL
    ));
}

#[tokio::test]
async fn test_deploy_exapp_builds_contract_environment() {
    let engine = RecordingEngine::new();
    let actions =
        DeployActionRegistry::standard(FakeConnector::new(engine.clone()), CleanupPolicy::Keep);
    let reporter = RecordingReporter::new();
    let daemon = docker_daemon("bridge");
    let image = widget_image();
    let extra = vec!["LOG_LEVEL=debug".to_string()];

    let outcome = deploy_exapp("widget", &actions, deploy_opts(&reporter, &daemon, &image, &extra))
        .await
        .expect("deploy");

    assert!(outcome.report.is_success());
    let container = &outcome.container;
    assert_eq!(container.name, "widget");
    assert_eq!(container.net, "bridge");
    assert!(container.env.contains(&env::entry(env::APP_ID, "widget")));
    assert!(container.env.contains(&env::entry(env::APP_SECRET, "s3cret")));
    assert!(
        container
            .env
            .contains(&env::entry(env::PLATFORM_URL, "https://cloud.example.com"))
    );
    assert!(container.env.contains(&"LOG_LEVEL=debug".to_string()));
    assert_eq!(engine.calls().len(), 3);
}

#[tokio::test]
async fn test_deploy_exapp_prefers_daemon_platform_url() {
    let engine = RecordingEngine::new();
    let actions =
        DeployActionRegistry::standard(FakeConnector::new(engine), CleanupPolicy::Keep);
    let reporter = RecordingReporter::new();
    let mut daemon = docker_daemon("host");
    daemon.deploy_config.platform_url = Some("http://nextcloud.local".into());
    let image = widget_image();

    let outcome = deploy_exapp("widget", &actions, deploy_opts(&reporter, &daemon, &image, &[]))
        .await
        .unwrap();
    assert!(
        outcome
            .container
            .env
            .contains(&env::entry(env::PLATFORM_URL, "http://nextcloud.local"))
    );
}

#[tokio::test]
async fn test_deploy_exapp_rejects_invalid_appid_before_docker() {
    let engine = RecordingEngine::new();
    let actions =
        DeployActionRegistry::standard(FakeConnector::new(engine.clone()), CleanupPolicy::Keep);
    let reporter = RecordingReporter::new();
    let daemon = docker_daemon("host");
    let image = widget_image();

    let err = deploy_exapp("Not Valid!", &actions, deploy_opts(&reporter, &daemon, &image, &[]))
        .await
        .unwrap_err();
    assert!(err.downcast_ref::<ConfigError>().is_some());
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_transport_error_surfaces_from_connector() {
    let actions = DeployActionRegistry::standard(FakeConnector::refusing(), CleanupPolicy::Keep);
    let reporter = RecordingReporter::new();
    let daemon = docker_daemon("host");
    let image = widget_image();
    let err = deploy_exapp("widget", &actions, deploy_opts(&reporter, &daemon, &image, &[]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("carrier-pigeon"));
}
