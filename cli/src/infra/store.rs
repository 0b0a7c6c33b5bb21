//! Infrastructure implementation of the `DaemonConfigStore` and
//! `RegistrationStore` ports.
//!
//! `JsonRegistry` keeps daemons and registrations in one JSON document. Each
//! mutation is a read-modify-write under an async mutex, and every write is
//! atomic (temp file + rename) via `tokio::task::spawn_blocking`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use exapp_common::{DaemonConfig, RegisteredApp, ScopeGroup};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::application::ports::{DaemonConfigStore, RegistrationStore};
use crate::domain::error::PersistenceError;

/// Environment variable overriding the registry location.
pub const REGISTRY_ENV: &str = "EXAPP_REGISTRY";

/// On-disk layout of the registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub daemons: Vec<DaemonConfig>,
    #[serde(default)]
    pub apps: Vec<RegisteredApp>,
}

impl RegistryDocument {
    fn app_mut(&mut self, appid: &str) -> Result<&mut RegisteredApp, PersistenceError> {
        self.apps
            .iter_mut()
            .find(|a| a.appid == appid)
            .ok_or_else(|| PersistenceError::NotFound(appid.to_string()))
    }
}

/// JSON file registry.
pub struct JsonRegistry {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonRegistry {
    /// Registry at `$EXAPP_REGISTRY`, or `~/.exapp/registry.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        if let Ok(path) = std::env::var(REGISTRY_ENV) {
            return Ok(Self::with_path(PathBuf::from(path)));
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(Self::with_path(home.join(".exapp").join("registry.json")))
    }

    /// Registry with an explicit path (used in tests).
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn load_sync(path: &std::path::Path) -> Result<RegistryDocument> {
        if !path.exists() {
            return Ok(RegistryDocument::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading registry {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parsing registry {}", path.display()))
    }

    fn save_sync(path: &std::path::Path, doc: &RegistryDocument) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(doc).context("serializing registry")?;

        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
        }

        std::fs::rename(&temp_path, path)
            .with_context(|| format!("finalizing registry {}", path.display()))?;
        Ok(())
    }

    async fn load(&self) -> Result<RegistryDocument> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::load_sync(&path))
            .await
            .context("registry load task panicked")?
    }

    async fn save(&self, doc: RegistryDocument) -> Result<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::save_sync(&path, &doc))
            .await
            .context("registry save task panicked")?
    }

    async fn read(&self) -> Result<RegistryDocument, PersistenceError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?)
    }

    /// Apply `change` to the current document and write it back. Nothing is
    /// written when `change` fails.
    async fn update<T>(
        &self,
        change: impl FnOnce(&mut RegistryDocument) -> Result<T, PersistenceError>,
    ) -> Result<T, PersistenceError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        let out = change(&mut doc)?;
        self.save(doc).await?;
        Ok(out)
    }
}

impl DaemonConfigStore for JsonRegistry {
    async fn get_daemon(&self, name: &str) -> Result<Option<DaemonConfig>, PersistenceError> {
        Ok(self.read().await?.daemons.into_iter().find(|d| d.name == name))
    }

    async fn list_daemons(&self) -> Result<Vec<DaemonConfig>, PersistenceError> {
        Ok(self.read().await?.daemons)
    }

    async fn add_daemon(&self, daemon: &DaemonConfig) -> Result<(), PersistenceError> {
        self.update(|doc| {
            if doc.daemons.iter().any(|d| d.name == daemon.name) {
                return Err(PersistenceError::DaemonExists(daemon.name.clone()));
            }
            doc.daemons.push(daemon.clone());
            Ok(())
        })
        .await
    }

    async fn remove_daemon(&self, name: &str) -> Result<(), PersistenceError> {
        self.update(|doc| {
            let users: Vec<&str> = doc
                .apps
                .iter()
                .filter(|a| a.daemon_config_name == name)
                .map(|a| a.appid.as_str())
                .collect();
            if !users.is_empty() {
                return Err(PersistenceError::DaemonInUse {
                    daemon: name.to_string(),
                    apps: users.join(", "),
                });
            }
            let before = doc.daemons.len();
            doc.daemons.retain(|d| d.name != name);
            if doc.daemons.len() == before {
                return Err(PersistenceError::NotFound(name.to_string()));
            }
            Ok(())
        })
        .await
    }
}

impl RegistrationStore for JsonRegistry {
    async fn get_app(&self, appid: &str) -> Result<Option<RegisteredApp>, PersistenceError> {
        Ok(self.read().await?.apps.into_iter().find(|a| a.appid == appid))
    }

    async fn list_apps(&self) -> Result<Vec<RegisteredApp>, PersistenceError> {
        Ok(self.read().await?.apps)
    }

    async fn register_app(&self, app: &RegisteredApp) -> Result<(), PersistenceError> {
        self.update(|doc| {
            if doc.apps.iter().any(|a| a.appid == app.appid) {
                return Err(PersistenceError::AlreadyRegistered(app.appid.clone()));
            }
            doc.apps.push(app.clone());
            Ok(())
        })
        .await
    }

    async fn set_system_app(&self, appid: &str, system_app: bool) -> Result<(), PersistenceError> {
        self.update(|doc| {
            doc.app_mut(appid)?.system_app = system_app;
            Ok(())
        })
        .await
    }

    async fn grant_scope(&self, appid: &str, group: &ScopeGroup) -> Result<(), PersistenceError> {
        self.update(|doc| {
            let app = doc.app_mut(appid)?;
            if !app.scope_groups.contains(group) {
                app.scope_groups.push(group.clone());
            }
            Ok(())
        })
        .await
    }

    async fn set_enabled(&self, appid: &str, enabled: bool) -> Result<(), PersistenceError> {
        self.update(|doc| {
            doc.app_mut(appid)?.enabled = enabled;
            Ok(())
        })
        .await
    }

    async fn touch(&self, appid: &str, at: DateTime<Utc>) -> Result<(), PersistenceError> {
        self.update(|doc| {
            doc.app_mut(appid)?.last_check_time = Some(at);
            Ok(())
        })
        .await
    }

    async fn unregister_app(&self, appid: &str) -> Result<(), PersistenceError> {
        self.update(|doc| {
            let before = doc.apps.len();
            doc.apps.retain(|a| a.appid != appid);
            if doc.apps.len() == before {
                return Err(PersistenceError::NotFound(appid.to_string()));
            }
            Ok(())
        })
        .await
    }
}
