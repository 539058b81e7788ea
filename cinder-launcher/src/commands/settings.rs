//! Preference commands behind the settings panel
//!
//! Each command re-reads the client config, applies one change and persists
//! it, mirroring how the panel saves on every input event.

use crate::models::config_client::{
    DEFAULT_DOWNLOAD_MULTI, DEFAULT_SCREEN_SIZE, FALLBACK_JAVA_MEMORY,
};
use crate::models::{CloseBehavior, ConfigClient, JavaMemory, ScreenSize, Theme};
use crate::utils::config::{modify_config_client, SettingsError};
use cinder_lib::store::{KeySpace, RecordStore};
use cinder_lib::utils::hardware::{get_system_memory, SystemMemory};
use serde::Serialize;
use std::path::Path;

const JAVA_EXECUTABLES: &[&str] = &["java", "javaw"];

/// What the memory slider shows
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemorySettings {
    pub total_gb: f64,
    pub free_gb: f64,
    pub slider_max_gb: u64,
    pub current: JavaMemory,
}

/// Heap bounds to show for `config` on a host with `system` memory.
///
/// Falls back to 1-2 GB when nothing usable is stored or the stored minimum
/// no longer fits the machine.
pub fn memory_settings(config: &ConfigClient, system: SystemMemory) -> MemorySettings {
    let current = match config.java_memory() {
        Some(memory) if memory.is_valid() && system.total_gb >= memory.min => memory,
        _ => FALLBACK_JAVA_MEMORY,
    };

    MemorySettings {
        total_gb: system.total_gb,
        free_gb: system.free_gb,
        slider_max_gb: system.heap_slider_max_gb(),
        current,
    }
}

/// [`memory_settings`] for the machine the launcher runs on
pub fn host_memory_settings(config: &ConfigClient) -> MemorySettings {
    memory_settings(config, get_system_memory())
}

/// Whether `path` names a java launcher binary (`java`, `javaw`, `java.exe`, ...)
pub fn is_java_executable(path: &str) -> bool {
    Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| JAVA_EXECUTABLES.contains(&stem))
        .unwrap_or(false)
}

pub async fn set_java_memory<K: KeySpace>(
    store: &RecordStore<K>,
    min: f64,
    max: f64,
) -> Result<ConfigClient, SettingsError> {
    let memory = JavaMemory { min, max };
    if !memory.is_valid() {
        return Err(SettingsError::InvalidMemory { min, max });
    }

    modify_config_client(store, |config| {
        config.java_config_mut().java_memory = Some(memory);
        Ok(())
    })
    .await
}

pub async fn set_java_path<K: KeySpace>(
    store: &RecordStore<K>,
    path: &str,
) -> Result<ConfigClient, SettingsError> {
    if !is_java_executable(path) {
        return Err(SettingsError::InvalidJavaPath(path.to_string()));
    }

    modify_config_client(store, |config| {
        config.java_config_mut().java_path = Some(path.to_string());
        Ok(())
    })
    .await
}

/// Go back to the runtime bundled with the launcher
pub async fn reset_java_path<K: KeySpace>(
    store: &RecordStore<K>,
) -> Result<ConfigClient, SettingsError> {
    modify_config_client(store, |config| {
        config.java_config_mut().java_path = None;
        Ok(())
    })
    .await
}

pub async fn set_screen_size<K: KeySpace>(
    store: &RecordStore<K>,
    width: u32,
    height: u32,
) -> Result<ConfigClient, SettingsError> {
    if width == 0 || height == 0 {
        return Err(SettingsError::InvalidScreenSize { width, height });
    }

    modify_config_client(store, |config| {
        config.game_config_mut().screen_size = Some(ScreenSize { width, height });
        Ok(())
    })
    .await
}

pub async fn reset_screen_size<K: KeySpace>(
    store: &RecordStore<K>,
) -> Result<ConfigClient, SettingsError> {
    modify_config_client(store, |config| {
        config.game_config_mut().screen_size = Some(DEFAULT_SCREEN_SIZE);
        Ok(())
    })
    .await
}

/// Number of files downloaded in parallel
pub async fn set_download_multi<K: KeySpace>(
    store: &RecordStore<K>,
    count: u32,
) -> Result<ConfigClient, SettingsError> {
    if count == 0 {
        return Err(SettingsError::InvalidDownloadCount(count));
    }

    modify_config_client(store, |config| {
        config.launcher_config_mut().download_multi = Some(count);
        Ok(())
    })
    .await
}

pub async fn reset_download_multi<K: KeySpace>(
    store: &RecordStore<K>,
) -> Result<ConfigClient, SettingsError> {
    set_download_multi(store, DEFAULT_DOWNLOAD_MULTI).await
}

pub async fn set_theme<K: KeySpace>(
    store: &RecordStore<K>,
    theme: Theme,
) -> Result<ConfigClient, SettingsError> {
    modify_config_client(store, |config| {
        config.launcher_config_mut().theme = Some(theme);
        Ok(())
    })
    .await
}

pub async fn set_close_behavior<K: KeySpace>(
    store: &RecordStore<K>,
    behavior: CloseBehavior,
) -> Result<ConfigClient, SettingsError> {
    modify_config_client(store, |config| {
        config.launcher_config_mut().close_launcher = Some(behavior);
        Ok(())
    })
    .await
}
