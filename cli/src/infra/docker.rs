//! Infrastructure implementation of the `ContainerEngine` and
//! `EngineConnector` ports over the Docker Engine API.

use std::time::Duration;

use exapp_common::{ContainerParams, DaemonConfig, ImageParams};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use crate::application::ports::{ContainerEngine, EngineConnector};
use crate::domain::config::ExappConfig;
use crate::domain::deploy::{create_container_body, registry_auth_header};
use crate::domain::error::{DockerApiError, DockerStage, TransportConfigError};
use crate::domain::exapp::ContainerDetails;
use crate::infra::transport::{ResolvedTransport, TransportOptions, resolve};

const REGISTRY_AUTH_HEADER: &str = "X-Registry-Auth";

/// Versioned Docker Engine API client.
#[derive(Debug, Clone)]
pub struct DockerApiClient {
    base_url: String,
    api_version: String,
    client: Client,
    pull_timeout: Duration,
}

#[derive(Deserialize)]
struct CreateResponse {
    #[serde(rename = "Id")]
    id: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl DockerApiClient {
    #[must_use]
    pub fn new(transport: ResolvedTransport, api_version: &str, pull_timeout: Duration) -> Self {
        Self {
            base_url: transport.base_url.trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
            client: transport.client,
            pull_timeout,
        }
    }

    fn url(&self, route: &str) -> String {
        format!("{}/{}{route}", self.base_url, self.api_version)
    }

    async fn send(
        stage: DockerStage,
        request: reqwest::RequestBuilder,
    ) -> Result<Response, DockerApiError> {
        request
            .send()
            .await
            .map_err(|e| DockerApiError::transport(stage, e.to_string()))
    }
}

/// Docker's `{"message": ...}` error body, or the raw text.
async fn failure(stage: DockerStage, response: Response) -> DockerApiError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.message)
        .unwrap_or_else(|_| text.trim().to_string());
    DockerApiError::status(stage, status, message)
}

/// First error reported inside a pull progress stream.
fn stream_error(body: &str) -> Option<String> {
    body.lines().find_map(|line| {
        let value: serde_json::Value = serde_json::from_str(line.trim()).ok()?;
        let err = value.get("error")?;
        Some(err.as_str().map_or_else(|| err.to_string(), str::to_string))
    })
}

impl ContainerEngine for DockerApiClient {
    async fn pull_image(&self, image: &ImageParams) -> Result<(), DockerApiError> {
        let reference = image.reference();
        tracing::debug!(image = %reference, "docker pull");
        let request = self
            .client
            .post(self.url("/images/create"))
            .query(&[("fromImage", reference.as_str())])
            .header(REGISTRY_AUTH_HEADER, registry_auth_header(&image.image_src))
            .timeout(self.pull_timeout);
        let response = Self::send(DockerStage::Pull, request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(failure(DockerStage::Pull, response).await);
        }
        let body = response
            .text()
            .await
            .map_err(|e| DockerApiError::transport(DockerStage::Pull, e.to_string()))?;
        match stream_error(&body) {
            Some(message) => Err(DockerApiError::status(DockerStage::Pull, status.as_u16(), message)),
            None => Ok(()),
        }
    }

    async fn create_container(
        &self,
        image: &ImageParams,
        container: &ContainerParams,
    ) -> Result<String, DockerApiError> {
        tracing::debug!(name = %container.name, net = %container.net, "docker create");
        let request = self
            .client
            .post(self.url("/containers/create"))
            .query(&[("name", container.name.as_str())])
            .json(&create_container_body(image, container));
        let response = Self::send(DockerStage::Create, request).await?;
        if !response.status().is_success() {
            return Err(failure(DockerStage::Create, response).await);
        }
        let status = response.status().as_u16();
        let created: CreateResponse = response
            .json()
            .await
            .map_err(|e| DockerApiError::status(DockerStage::Create, status, e.to_string()))?;
        Ok(created.id)
    }

    async fn start_container(&self, id: &str) -> Result<(), DockerApiError> {
        tracing::debug!(container = id, "docker start");
        let request = self.client.post(self.url(&format!("/containers/{id}/start")));
        let response = Self::send(DockerStage::Start, request).await?;
        if response.status() == StatusCode::NO_CONTENT {
            Ok(())
        } else {
            Err(failure(DockerStage::Start, response).await)
        }
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails, DockerApiError> {
        tracing::debug!(container = id, "docker inspect");
        let request = self.client.get(self.url(&format!("/containers/{id}/json")));
        let response = Self::send(DockerStage::Inspect, request).await?;
        if !response.status().is_success() {
            return Err(failure(DockerStage::Inspect, response).await);
        }
        let status = response.status().as_u16();
        response
            .json()
            .await
            .map_err(|e| DockerApiError::status(DockerStage::Inspect, status, e.to_string()))
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<(), DockerApiError> {
        tracing::debug!(container = id, force, "docker remove");
        let request = self
            .client
            .delete(self.url(&format!("/containers/{id}")))
            .query(&[("force", if force { "true" } else { "false" })]);
        let response = Self::send(DockerStage::Remove, request).await?;
        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => Ok(()),
            _ => Err(failure(DockerStage::Remove, response).await),
        }
    }
}

/// Builds [`DockerApiClient`]s from daemon records and orchestrator config.
#[derive(Debug, Clone)]
pub struct DockerConnector {
    transport: TransportOptions,
    api_version: String,
    pull_timeout: Duration,
}

impl DockerConnector {
    #[must_use]
    pub fn new(transport: TransportOptions, api_version: &str, pull_timeout: Duration) -> Self {
        Self {
            transport,
            api_version: api_version.to_string(),
            pull_timeout,
        }
    }

    #[must_use]
    pub fn from_config(config: &ExappConfig) -> Self {
        Self::new(
            TransportOptions {
                bundled_roots: !config.platform.installed,
                ca_bundle: config.tls.ca_bundle.clone(),
                timeout: Duration::from_secs(config.docker.timeout_secs),
            },
            &config.docker.api_version,
            Duration::from_secs(config.docker.pull_timeout_secs),
        )
    }
}

impl EngineConnector for DockerConnector {
    type Engine = DockerApiClient;

    fn connect(&self, daemon: &DaemonConfig) -> Result<DockerApiClient, TransportConfigError> {
        let transport = resolve(daemon, &self.transport)?;
        Ok(DockerApiClient::new(transport, &self.api_version, self.pull_timeout))
    }
}
