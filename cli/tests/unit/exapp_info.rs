//! ExApp identity resolution from containers and documents.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use exapp_cli::application::services::exapp_info::{resolve_from_container, resolve_from_document};
use exapp_cli::domain::error::{DockerApiError, ValidationError};
use exapp_common::{ExAppProtocol, env};

use crate::helpers::{container_details, docker_daemon, exapp_env, info_document, manual_daemon};
use crate::mocks::RecordingEngine;

#[tokio::test]
async fn test_resolves_identity_from_container_environment() {
    let engine = RecordingEngine::new()
        .with_details(container_details("widget", exapp_env("widget"), "host"));
    let info = resolve_from_container(&engine, "widget", &docker_daemon("host"))
        .await
        .expect("resolve");

    assert_eq!(info.appid, "widget");
    assert_eq!(info.name, "Widget");
    assert_eq!(info.secret, "s3cret");
    assert_eq!(info.port, 23000);
    assert_eq!(info.protocol, ExAppProtocol::Http);
    assert_eq!(info.host, "localhost");
    assert!(!info.system_app);
    assert_eq!(engine.calls(), vec!["inspect:widget"]);
}

#[tokio::test]
async fn test_custom_network_uses_container_name_as_host() {
    let engine = RecordingEngine::new()
        .with_details(container_details("widget", exapp_env("widget"), "exapps"));
    let info = resolve_from_container(&engine, "widget", &docker_daemon("exapps"))
        .await
        .unwrap();
    assert_eq!(info.host, "widget");
}

#[tokio::test]
async fn test_declared_appid_must_match_requested() {
    let engine = RecordingEngine::new().with_details(container_details(
        "app_python_skeleton",
        exapp_env("app_other"),
        "host",
    ));
    let err = resolve_from_container(&engine, "app_python_skeleton", &docker_daemon("host"))
        .await
        .unwrap_err();
    let validation = err.downcast_ref::<ValidationError>().expect("validation error");
    assert!(matches!(
        validation,
        ValidationError::AppIdMismatch { requested, declared }
            if requested == "app_python_skeleton" && declared == "app_other"
    ));
}

#[tokio::test]
async fn test_missing_container_is_an_inspect_error() {
    let engine = RecordingEngine::new();
    let err = resolve_from_container(&engine, "widget", &docker_daemon("host"))
        .await
        .unwrap_err();
    let docker = err.downcast_ref::<DockerApiError>().expect("docker error");
    assert_eq!(docker.status, Some(404));
}

#[tokio::test]
async fn test_missing_required_variable_is_named() {
    let env: Vec<String> = exapp_env("widget")
        .into_iter()
        .filter(|e| !e.starts_with("APP_SECRET="))
        .collect();
    let engine = RecordingEngine::new().with_details(container_details("widget", env, "host"));
    let err = resolve_from_container(&engine, "widget", &docker_daemon("host"))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ValidationError>(),
        Some(ValidationError::MissingEnv(key)) if *key == env::APP_SECRET
    ));
}

#[test]
fn test_document_resolution_defaults_host_to_daemon() {
    let info = resolve_from_document("widget", &manual_daemon(), &info_document("widget")).unwrap();
    assert_eq!(info.host, "exapps.internal");
    assert_eq!(info.protocol, ExAppProtocol::Http);
}

#[test]
fn test_document_for_another_app_is_rejected() {
    let err = resolve_from_document("widget", &manual_daemon(), &info_document("gadget")).unwrap_err();
    assert!(err.to_string().contains("gadget"));
}
