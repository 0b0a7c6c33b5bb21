//! Command implementations

pub mod apps;
pub mod config;
pub mod daemon;
pub mod deploy;
pub mod enable;
pub mod heartbeat;
pub mod register;
pub mod unregister;
pub mod version;

use std::time::Duration;

use anyhow::Result;

use crate::domain::config::ExappConfig;
use crate::infra::exapp_client::HttpExAppClient;

/// Callback client configured from `callback.timeout_secs`.
pub(crate) fn exapp_client(config: &ExappConfig) -> Result<HttpExAppClient> {
    HttpExAppClient::new(Duration::from_secs(config.callback.timeout_secs))
}
