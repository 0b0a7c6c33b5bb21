//! Infrastructure implementation of the `ExAppClient` port.

use std::time::Duration;

use anyhow::{Context, Result};
use exapp_common::{ExAppInfo, ScopeRequest, authorization_header, headers, routes};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;

use crate::application::ports::ExAppClient;
use crate::domain::deploy::AA_VERSION;
use crate::domain::error::NegotiationError;

/// Authenticated HTTP callbacks into ExApps.
#[derive(Debug, Clone)]
pub struct HttpExAppClient {
    client: Client,
}

#[derive(Deserialize)]
struct HeartbeatBody {
    status: String,
}

impl HttpExAppClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()
            .context("building ExApp callback client")?;
        Ok(Self { client })
    }

    fn request(&self, method: Method, app: &ExAppInfo, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", app.base_url()))
            .header(headers::AUTHORIZATION_APP_API, authorization_header("", &app.secret))
            .header(headers::EX_APP_ID, &app.appid)
            .header(headers::EX_APP_VERSION, &app.version)
            .header(headers::AA_VERSION, AA_VERSION)
    }

    async fn call(
        app: &ExAppInfo,
        path: &str,
        request: RequestBuilder,
    ) -> Result<Response, NegotiationError> {
        tracing::debug!(appid = %app.appid, path, "ExApp callback");
        let response = request.send().await.map_err(|e| NegotiationError::Transport {
            appid: app.appid.clone(),
            path: path.to_string(),
            message: e.to_string(),
        })?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(NegotiationError::Status {
                appid: app.appid.clone(),
                path: path.to_string(),
                status: response.status().as_u16(),
            })
        }
    }

    fn decode_error(app: &ExAppInfo, path: &str, message: impl ToString) -> NegotiationError {
        NegotiationError::Decode {
            appid: app.appid.clone(),
            path: path.to_string(),
            message: message.to_string(),
        }
    }
}

impl ExAppClient for HttpExAppClient {
    async fn fetch_scopes(&self, app: &ExAppInfo) -> Result<ScopeRequest, NegotiationError> {
        let path = routes::SCOPES;
        let response = Self::call(app, path, self.request(Method::GET, app, path)).await?;
        response
            .json::<ScopeRequest>()
            .await
            .map_err(|e| Self::decode_error(app, path, e))
    }

    async fn set_enabled(&self, app: &ExAppInfo, enabled: bool) -> Result<(), NegotiationError> {
        let path = routes::ENABLED;
        let request = self
            .request(Method::PUT, app, path)
            .query(&[("enabled", if enabled { "1" } else { "0" })]);
        Self::call(app, path, request).await?;
        Ok(())
    }

    async fn heartbeat(&self, app: &ExAppInfo) -> Result<(), NegotiationError> {
        let path = routes::HEARTBEAT;
        let response = Self::call(app, path, self.request(Method::GET, app, path)).await?;
        let body: HeartbeatBody = response
            .json()
            .await
            .map_err(|e| Self::decode_error(app, path, e))?;
        if body.status == "ok" {
            Ok(())
        } else {
            Err(Self::decode_error(
                app,
                path,
                format!("unexpected status '{}'", body.status),
            ))
        }
    }
}
