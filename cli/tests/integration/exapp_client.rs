//! ExApp callback client against a loopback fake ExApp.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::extract::{Json, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, put};
use serde_json::json;

use exapp_cli::application::ports::ExAppClient;
use exapp_cli::domain::error::NegotiationError;
use exapp_cli::infra::exapp_client::HttpExAppClient;
use exapp_common::{ExAppInfo, ExAppProtocol, ScopeGroup, verify_shared_secret};

use crate::fake_server::{Seen, closed_port, spawn};

const SECRET: &str = "s3cret";

fn widget_at(addr: SocketAddr, secret: &str) -> ExAppInfo {
    ExAppInfo {
        appid: "widget".to_string(),
        name: "Widget".to_string(),
        version: "1.0.0".to_string(),
        secret: secret.to_string(),
        host: "127.0.0.1".to_string(),
        port: addr.port(),
        protocol: ExAppProtocol::Http,
        system_app: false,
    }
}

fn client() -> HttpExAppClient {
    HttpExAppClient::new(Duration::from_secs(5)).expect("client")
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization-app-api")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| verify_shared_secret(SECRET, v))
}

/// A well-behaved ExApp that records every callback.
fn widget_router(seen: Seen) -> Router {
    Router::new()
        .route(
            "/scopes",
            get(|State(seen): State<Seen>, headers: HeaderMap| async move {
                if !authorized(&headers) {
                    return StatusCode::UNAUTHORIZED.into_response();
                }
                let header = |name: &str| {
                    headers
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-")
                        .to_string()
                };
                seen.push(format!(
                    "scopes id={} version={} aa={}",
                    header("ex-app-id"),
                    header("ex-app-version"),
                    headers.contains_key("aa-version")
                ));
                Json(json!({ "required": ["files"], "optional": ["talk"] })).into_response()
            }),
        )
        .route(
            "/enabled",
            put(
                |State(seen): State<Seen>, Query(q): Query<HashMap<String, String>>| async move {
                    seen.push(format!("enabled={}", q["enabled"]));
                    StatusCode::OK
                },
            ),
        )
        .route("/heartbeat", get(|| async { Json(json!({ "status": "ok" })) }))
        .with_state(seen)
}

#[tokio::test]
async fn test_fetch_scopes_sends_identity_headers() {
    let seen = Seen::default();
    let addr = spawn(widget_router(seen.clone())).await;

    let scopes = client()
        .fetch_scopes(&widget_at(addr, SECRET))
        .await
        .expect("scopes");

    assert_eq!(scopes.required, vec![ScopeGroup::new("files")]);
    assert_eq!(scopes.optional, vec![ScopeGroup::new("talk")]);
    assert_eq!(seen.lines(), vec!["scopes id=widget version=1.0.0 aa=true"]);
}

#[tokio::test]
async fn test_wrong_secret_is_a_status_error() {
    let addr = spawn(widget_router(Seen::default())).await;

    let err = client()
        .fetch_scopes(&widget_at(addr, "not-the-secret"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        NegotiationError::Status { status: 401, ref path, .. } if path == "/scopes"
    ));
}

#[tokio::test]
async fn test_set_enabled_passes_flag_as_query() {
    let seen = Seen::default();
    let addr = spawn(widget_router(seen.clone())).await;
    let app = widget_at(addr, SECRET);
    let client = client();

    client.set_enabled(&app, true).await.expect("enable");
    client.set_enabled(&app, false).await.expect("disable");

    assert_eq!(seen.lines(), vec!["enabled=1", "enabled=0"]);
}

#[tokio::test]
async fn test_heartbeat_requires_ok_status() {
    let addr = spawn(widget_router(Seen::default())).await;
    client()
        .heartbeat(&widget_at(addr, SECRET))
        .await
        .expect("heartbeat");

    let starting = Router::new().route(
        "/heartbeat",
        get(|| async { Json(json!({ "status": "starting" })) }),
    );
    let addr = spawn(starting).await;
    let err = client()
        .heartbeat(&widget_at(addr, SECRET))
        .await
        .unwrap_err();
    assert!(matches!(err, NegotiationError::Decode { .. }));
    assert!(err.to_string().contains("starting"));
}

#[tokio::test]
async fn test_undecodable_scopes_body_is_a_decode_error() {
    let router = Router::new().route("/scopes", get(|| async { "scopes: files" }));
    let addr = spawn(router).await;

    let err = client()
        .fetch_scopes(&widget_at(addr, SECRET))
        .await
        .unwrap_err();

    assert!(matches!(err, NegotiationError::Decode { .. }));
}

#[tokio::test]
async fn test_unreachable_exapp_is_a_transport_error() {
    let addr = SocketAddr::from(([127, 0, 0, 1], closed_port()));

    let err = client()
        .heartbeat(&widget_at(addr, SECRET))
        .await
        .unwrap_err();

    assert!(matches!(err, NegotiationError::Transport { ref appid, .. } if appid == "widget"));
}
