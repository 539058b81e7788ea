//! Durable key spaces backing the record store
//!
//! A key space maps a table name to one JSON value. The store never writes
//! partial tables, so implementations only need whole-value `get`/`set`.

use super::{Result, StoreError};
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};

/// Whole-value persistence keyed by table name.
pub trait KeySpace: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>>>;

    /// Replace the value stored under `key`.
    fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<()>>;
}

impl<K: KeySpace + ?Sized> KeySpace for Arc<K> {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>>> {
        (**self).get(key)
    }

    fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<()>> {
        (**self).set(key, value)
    }
}

/// Process-local key space. Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct MemoryKeySpace {
    values: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryKeySpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything currently stored
    pub async fn snapshot(&self) -> HashMap<String, Value> {
        self.values.read().await.clone()
    }
}

impl KeySpace for MemoryKeySpace {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>>> {
        Box::pin(async move { Ok(self.values.read().await.get(key).cloned()) })
    }

    fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.values.write().await.insert(key.to_string(), value);
            Ok(())
        })
    }
}

/// Key space persisted as a single JSON document on disk.
///
/// The document is an object keyed by table name. Each `set` rewrites the
/// whole document through a temporary file in the same directory followed by
/// a rename, so a crash never leaves a half-written store behind.
pub struct JsonFileKeySpace {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileKeySpace {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_document(&self) -> Result<Map<String, Value>> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&contents)? {
            Value::Object(document) => Ok(document),
            _ => {
                log::warn!(
                    "[db] Store document {:?} is not a JSON object; treating it as empty",
                    self.path
                );
                Ok(Map::new())
            }
        }
    }

    async fn write_document(&self, document: Map<String, Value>) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).await?;

        let json = serde_json::to_vec_pretty(&Value::Object(document))?;
        let target = self.path.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
            tmp.write_all(&json)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&target).map_err(|e| StoreError::Io(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

impl KeySpace for JsonFileKeySpace {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>>> {
        Box::pin(async move {
            let mut document = self.load_document().await?;
            Ok(document.remove(key))
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let mut document = self.load_document().await?;
            document.insert(key.to_string(), value);
            self.write_document(document).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_clones_share_state() {
        let a = MemoryKeySpace::new();
        let b = a.clone();

        a.set("accounts", json!([{"ID": 1}])).await.unwrap();
        assert_eq!(b.get("accounts").await.unwrap(), Some(json!([{"ID": 1}])));
        assert_eq!(b.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_missing_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let ks = JsonFileKeySpace::new(dir.path().join("store.json"));
        assert_eq!(ks.get("accounts").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_creates_parent_and_keeps_other_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("store.json");
        let ks = JsonFileKeySpace::new(&path);

        ks.set("accounts", json!([{"ID": 1, "name": "Steve"}]))
            .await
            .unwrap();
        ks.set("configClient", json!([{"ID": 1}])).await.unwrap();

        assert!(path.exists());
        let reopened = JsonFileKeySpace::new(&path);
        assert_eq!(
            reopened.get("accounts").await.unwrap(),
            Some(json!([{"ID": 1, "name": "Steve"}]))
        );
        assert_eq!(
            reopened.get("configClient").await.unwrap(),
            Some(json!([{"ID": 1}]))
        );
    }

    #[tokio::test]
    async fn test_file_corrupt_document_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{ not json").unwrap();

        let ks = JsonFileKeySpace::new(&path);
        let err = ks.get("accounts").await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
