//! Launch sequence: launcher configuration guard, client config
//! initialisation, then one reconciliation pass.

use crate::auth::{
    reconcile_accounts, AuthProvider, ProviderCredentials, ReconcileContext, ReconcileReport,
};
use crate::models::ConfigClient;
use crate::session::SessionSink;
use crate::utils::config::{get_config_client, init_config_client};
use crate::utils::logging::{emit, Severity};
use anyhow::{Context, Result};
use cinder_lib::store::{KeySpace, RecordStore};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_DATA_DIRECTORY: &str = "cinder-launcher";

fn default_data_directory() -> String {
    DEFAULT_DATA_DIRECTORY.to_string()
}

/// Application configuration shipped with the launcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LauncherConfig {
    pub client_id: String,
    /// AZauth server URL
    #[serde(default)]
    pub online: Option<String>,
    #[serde(rename = "dataDirectory", default = "default_data_directory")]
    pub data_directory: String,
}

impl LauncherConfig {
    pub fn credentials(&self) -> ProviderCredentials {
        ProviderCredentials {
            client_id: self.client_id.clone(),
            azauth_url: self.online.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Failed to read launcher configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Launcher configuration is invalid: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ConfigLoadError {
    /// Stable code shown on the fatal error screen
    pub fn code(&self) -> &'static str {
        match self {
            ConfigLoadError::Io(_) => "CONFIG_UNREACHABLE",
            ConfigLoadError::Malformed(_) => "CONFIG_INVALID",
        }
    }
}

pub async fn load_launcher_config(path: &Path) -> Result<LauncherConfig, ConfigLoadError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let config = serde_json::from_str(&raw)?;
    Ok(config)
}

#[derive(Debug)]
pub enum StartupOutcome {
    /// The launcher configuration could not be loaded; the host should exit
    Aborted { code: String, message: String },
    Ready {
        config_client: ConfigClient,
        report: ReconcileReport,
    },
}

/// Run the launch sequence against an already loaded (or failed) launcher
/// configuration. Nothing touches the store when the configuration failed.
pub async fn start_launcher<K, P, S>(
    launcher_config: Result<LauncherConfig, ConfigLoadError>,
    store: &RecordStore<K>,
    provider: &P,
    sink: &S,
) -> Result<StartupOutcome>
where
    K: KeySpace,
    P: AuthProvider + ?Sized,
    S: SessionSink + ?Sized,
{
    let launcher_config = match launcher_config {
        Ok(config) => config,
        Err(e) => {
            let code = e.code().to_string();
            let message = e.to_string();
            emit(Severity::Error, Some("startup"), &format!("{}: {}", code, message));
            sink.show_fatal_error(&code, &message);
            return Ok(StartupOutcome::Aborted { code, message });
        }
    };

    init_config_client(store)
        .await
        .context("Failed to initialize client config")?;

    let credentials = launcher_config.credentials();
    let ctx = ReconcileContext {
        store,
        credentials: &credentials,
    };
    let report = reconcile_accounts(&ctx, provider, sink)
        .await
        .context("Account reconciliation failed")?;

    let config_client = get_config_client(store)
        .await
        .context("Failed to re-read client config")?
        .ok_or_else(|| anyhow::anyhow!("Client config disappeared during startup"))?;

    Ok(StartupOutcome::Ready {
        config_client,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_launcher_config_defaults() {
        let config: LauncherConfig =
            serde_json::from_value(json!({"client_id": "abc"})).unwrap();
        assert_eq!(config.data_directory, "cinder-launcher");
        assert_eq!(config.online, None);
        assert_eq!(
            config.credentials(),
            ProviderCredentials {
                client_id: "abc".into(),
                azauth_url: None
            }
        );
    }

    #[tokio::test]
    async fn test_load_launcher_config_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = load_launcher_config(&dir.path().join("nope.json"))
            .await
            .unwrap_err();
        assert_eq!(missing.code(), "CONFIG_UNREACHABLE");

        let bad = dir.path().join("config.json");
        tokio::fs::write(&bad, "{ not json").await.unwrap();
        let malformed = load_launcher_config(&bad).await.unwrap_err();
        assert_eq!(malformed.code(), "CONFIG_INVALID");

        let good = dir.path().join("good.json");
        tokio::fs::write(
            &good,
            r#"{"client_id": "abc", "online": "https://auth.example.net", "dataDirectory": "alt"}"#,
        )
        .await
        .unwrap();
        let config = load_launcher_config(&good).await.unwrap();
        assert_eq!(config.data_directory, "alt");
        assert_eq!(config.online.as_deref(), Some("https://auth.example.net"));
    }
}
