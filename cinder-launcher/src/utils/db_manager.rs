//! Store Manager
//!
//! Resolves the per-user data directory and opens the record store inside it.

use anyhow::{Context, Result};
use cinder_lib::store::{JsonFileKeySpace, RecordStore};
use directories::BaseDirs;
use std::path::{Path, PathBuf};

/// File holding every table of the record store
pub const STORE_FILE_NAME: &str = "launcher-store.json";

/// Directory name under the user's config dir. Hidden everywhere except macOS.
pub fn data_dir_name(data_directory: &str) -> String {
    if cfg!(target_os = "macos") {
        data_directory.to_string()
    } else {
        format!(".{}", data_directory)
    }
}

/// Get the launcher's data directory (~/.config/.cinder-launcher, %APPDATA%/.cinder-launcher,
/// ~/Library/Application Support/cinder-launcher), creating it if needed
pub fn get_app_data_dir(data_directory: &str) -> Result<PathBuf> {
    let base_dirs = BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("Failed to determine user's config directory"))?;

    let data_dir = base_dirs.config_dir().join(data_dir_name(data_directory));

    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;
    }

    Ok(data_dir)
}

/// Open the file-backed record store living in `data_dir`
pub fn open_record_store(data_dir: &Path) -> Result<RecordStore<JsonFileKeySpace>> {
    let path = data_dir.join(STORE_FILE_NAME);
    log::info!("[db] Using store at {}", path.display());
    Ok(RecordStore::new(JsonFileKeySpace::new(path)))
}
