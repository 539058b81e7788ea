//! # Client configuration
//!
//! `ConfigClient` lives as a single row in the `configClient` table of the
//! record store. This module is the only place that knows that convention:
//!
//! - [`init_config_client`] runs once at startup and creates the row with
//!   the documented defaults if it does not exist yet.
//! - [`modify_config_client`] is the read-modify-write used by every settings
//!   change. It always re-reads the row, so changes never clobber each other
//!   as long as they are applied one at a time.
//! - [`update_config_field`] replaces a single top-level field by name, for
//!   callers that hold a raw JSON value.
//!
//! There is no migration step. A row written by an older launcher is used as
//! is and missing groups are defaulted by the `ConfigClient` accessors.

use crate::models::ConfigClient;
use cinder_lib::store::{KeySpace, RecordStore, StoreError};
use serde_json::Value;

/// Top-level fields `update_config_field` may replace
pub const CONFIG_FIELDS: &[&str] = &[
    "account_selected",
    "instance_select",
    "java_config",
    "game_config",
    "launcher_config",
];

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Account {0} not found")]
    AccountNotFound(i64),

    #[error("Not a java executable: {0}")]
    InvalidJavaPath(String),

    #[error("Invalid memory range: min {min} GB, max {max} GB")]
    InvalidMemory { min: f64, max: f64 },

    #[error("Invalid screen size: {width}x{height}")]
    InvalidScreenSize { width: u32, height: u32 },

    #[error("Download concurrency must be at least 1 (got {0})")]
    InvalidDownloadCount(u32),

    #[error("Unknown config field: {0}")]
    UnknownField(String),

    #[error("Config would no longer be valid: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Load the client config row, creating it with defaults on first launch
pub async fn init_config_client<K: KeySpace>(
    store: &RecordStore<K>,
) -> Result<ConfigClient, StoreError> {
    log::info!("[config] Initializing client config...");

    match store.read_first_as::<ConfigClient>().await? {
        Some(config) => {
            log::info!("[config] Using existing client config (ID:{})", config.id);
            Ok(config)
        }
        None => {
            let config = store.create_as(&ConfigClient::default()).await?;
            log::info!("[config] Created default client config (ID:{})", config.id);
            Ok(config)
        }
    }
}

/// The current client config row, if one exists
pub async fn get_config_client<K: KeySpace>(
    store: &RecordStore<K>,
) -> Result<Option<ConfigClient>, StoreError> {
    store.read_first_as::<ConfigClient>().await
}

/// Persist `config` over its own row
pub async fn update_config_client<K: KeySpace>(
    store: &RecordStore<K>,
    config: &ConfigClient,
) -> Result<(), StoreError> {
    store.update_as(config, config.id).await
}

/// Re-read the config, apply `change`, and persist the result.
///
/// Nothing is written if `change` fails.
pub async fn modify_config_client<K, F>(
    store: &RecordStore<K>,
    change: F,
) -> Result<ConfigClient, SettingsError>
where
    K: KeySpace,
    F: FnOnce(&mut ConfigClient) -> Result<(), SettingsError>,
{
    let mut config = match get_config_client(store).await? {
        Some(config) => config,
        None => init_config_client(store).await?,
    };

    change(&mut config)?;
    update_config_client(store, &config).await?;
    Ok(config)
}

/// Replace one top-level field of the config by name
pub async fn update_config_field<K: KeySpace>(
    store: &RecordStore<K>,
    field: &str,
    value: Value,
) -> Result<ConfigClient, SettingsError> {
    if !CONFIG_FIELDS.contains(&field) {
        return Err(SettingsError::UnknownField(field.to_string()));
    }

    let config = modify_config_client(store, |config| {
        let mut config_value = serde_json::to_value(&*config)?;
        if let Some(obj) = config_value.as_object_mut() {
            obj.insert(field.to_string(), value);
        }
        *config = serde_json::from_value(config_value)?;
        Ok(())
    })
    .await?;

    log::debug!("[config] Updated field {}", field);
    Ok(config)
}
