//! # Record Store
//!
//! A small table-oriented store over a [`KeySpace`]. Each table is a JSON
//! array of objects kept under one key, and every object carries an integer
//! `ID` unique within its table. Insertion order is preserved and meaningful.
//!
//! Every mutation is a read-modify-write of the *whole* table. This is only
//! sound with a single writer per table at a time, which holds for the
//! launcher: reconciliation and settings changes never run concurrently.
//!
//! ## ID allocation
//!
//! `create` assigns `max(existing IDs, last allocated ID) + 1`. The last
//! allocated ID is kept under the sequence key `"<table>::last_id"` so that
//! deleting the newest record never lets its ID be handed out again. Stores
//! written without a sequence key fall back to `max(existing IDs) + 1`.
//!
//! ## Typed access
//!
//! Types implementing [`TableRecord`] get `*_as` helpers that convert to and
//! from [`Record`] through serde.

pub mod key_space;

pub use key_space::{JsonFileKeySpace, KeySpace, MemoryKeySpace};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Name of the identity field every record carries
pub const ID_FIELD: &str = "ID";

/// Default ID for singleton tables
pub const SINGLETON_ID: RecordId = 1;

pub type RecordId = i64;

/// A stored row: field name -> JSON value, always containing `ID`
pub type Record = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Key space I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Value for table '{table}' is not a JSON object")]
    NotAnObject { table: String },

    #[error("Persistence task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A serde type stored in a fixed table
pub trait TableRecord: Serialize + DeserializeOwned {
    const TABLE: &'static str;
}

/// The `ID` of a record, if it has an integer one
pub fn record_id(record: &Record) -> Option<RecordId> {
    record.get(ID_FIELD).and_then(Value::as_i64)
}

fn value_id(value: &Value) -> Option<RecordId> {
    value.get(ID_FIELD).and_then(Value::as_i64)
}

/// Serialize a value into a record for `table`
pub fn to_record<T: Serialize>(table: &str, value: &T) -> Result<Record> {
    match serde_json::to_value(value)? {
        Value::Object(record) => Ok(record),
        _ => Err(StoreError::NotAnObject {
            table: table.to_string(),
        }),
    }
}

/// Decode a record into a typed value
pub fn from_record<T: DeserializeOwned>(record: Record) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

fn sequence_key(table: &str) -> String {
    format!("{}::last_id", table)
}

pub struct RecordStore<K: KeySpace> {
    key_space: K,
}

impl<K: KeySpace> RecordStore<K> {
    pub fn new(key_space: K) -> Self {
        Self { key_space }
    }

    pub fn key_space(&self) -> &K {
        &self.key_space
    }

    /// Raw rows of a table. Anything other than an array reads as empty.
    async fn load_rows(&self, table: &str) -> Result<Vec<Value>> {
        match self.key_space.get(table).await? {
            Some(Value::Array(rows)) => Ok(rows),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(_) => {
                log::warn!("[db] Table {} is not an array; treating it as empty", table);
                Ok(Vec::new())
            }
        }
    }

    /// Object rows of a table in stored order
    async fn load_table(&self, table: &str) -> Result<Vec<Record>> {
        Ok(self
            .load_rows(table)
            .await?
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(record) => Some(record),
                _ => None,
            })
            .collect())
    }

    async fn save_table(&self, table: &str, rows: Vec<Record>) -> Result<()> {
        let value = Value::Array(rows.into_iter().map(Value::Object).collect());
        self.key_space.set(table, value).await
    }

    async fn last_allocated(&self, table: &str) -> Result<RecordId> {
        Ok(self
            .key_space
            .get(&sequence_key(table))
            .await?
            .and_then(|v| v.as_i64())
            .unwrap_or(0))
    }

    async fn bump_sequence(&self, table: &str, id: RecordId) -> Result<()> {
        if id > self.last_allocated(table).await? {
            self.key_space
                .set(&sequence_key(table), Value::from(id))
                .await?;
        }
        Ok(())
    }

    /// Insert `data` as a new record. Any `ID` it carries is overwritten.
    pub async fn create(&self, table: &str, mut data: Record) -> Result<Record> {
        let mut rows = self.load_table(table).await?;

        let max_existing = rows
            .iter()
            .filter_map(|row| record_id(row))
            .max()
            .unwrap_or(0);
        let id = max_existing.max(self.last_allocated(table).await?) + 1;

        data.insert(ID_FIELD.to_string(), Value::from(id));
        rows.push(data.clone());

        self.bump_sequence(table, id).await?;
        self.save_table(table, rows).await?;

        log::debug!("[db] CREATE {} ID:{}", table, id);
        Ok(data)
    }

    /// The record whose `ID` equals `id`, or `None`
    pub async fn read_one(&self, table: &str, id: RecordId) -> Result<Option<Record>> {
        let found = self
            .load_table(table)
            .await?
            .into_iter()
            .find(|row| record_id(row) == Some(id));

        log::debug!("[db] READ {} ID:{} found:{}", table, id, found.is_some());
        Ok(found)
    }

    /// The first record in table order, or `None` when the table is empty
    pub async fn read_first(&self, table: &str) -> Result<Option<Record>> {
        Ok(self.load_table(table).await?.into_iter().next())
    }

    /// All records in table order; empty when the table does not exist
    pub async fn read_all(&self, table: &str) -> Result<Vec<Record>> {
        let rows = self.load_table(table).await?;
        log::debug!("[db] READ ALL {} ({} rows)", table, rows.len());
        Ok(rows)
    }

    /// Upsert: replace the record with `id` in place, or append `data` if
    /// there is none. `data.ID` is forced to `id` either way.
    pub async fn update(&self, table: &str, mut data: Record, id: RecordId) -> Result<()> {
        let mut rows = self.load_rows(table).await?;
        data.insert(ID_FIELD.to_string(), Value::from(id));

        match rows.iter().position(|row| value_id(row) == Some(id)) {
            Some(index) => {
                rows[index] = Value::Object(data);
                log::debug!("[db] UPDATE {} ID:{}", table, id);
            }
            None => {
                rows.push(Value::Object(data));
                self.bump_sequence(table, id).await?;
                log::debug!("[db] UPDATE {} ID:{} -> appended (no existing row)", table, id);
            }
        }

        let rows = rows
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(record) => Some(record),
                _ => None,
            })
            .collect();
        self.save_table(table, rows).await
    }

    /// Remove the record with `id`. Missing records are not an error.
    pub async fn delete(&self, table: &str, id: RecordId) -> Result<()> {
        let rows: Vec<Record> = self
            .load_table(table)
            .await?
            .into_iter()
            .filter(|row| record_id(row) != Some(id))
            .collect();

        self.save_table(table, rows).await?;
        log::debug!("[db] DELETE {} ID:{}", table, id);
        Ok(())
    }

    pub async fn create_as<T: TableRecord>(&self, value: &T) -> Result<T> {
        let record = self.create(T::TABLE, to_record(T::TABLE, value)?).await?;
        from_record(record)
    }

    pub async fn read_one_as<T: TableRecord>(&self, id: RecordId) -> Result<Option<T>> {
        self.read_one(T::TABLE, id)
            .await?
            .map(from_record)
            .transpose()
    }

    pub async fn read_first_as<T: TableRecord>(&self) -> Result<Option<T>> {
        self.read_first(T::TABLE).await?.map(from_record).transpose()
    }

    pub async fn read_all_as<T: TableRecord>(&self) -> Result<Vec<T>> {
        self.read_all(T::TABLE)
            .await?
            .into_iter()
            .map(from_record)
            .collect()
    }

    pub async fn update_as<T: TableRecord>(&self, value: &T, id: RecordId) -> Result<()> {
        self.update(T::TABLE, to_record(T::TABLE, value)?, id).await
    }

    pub async fn delete_as<T: TableRecord>(&self, id: RecordId) -> Result<()> {
        self.delete(T::TABLE, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    fn store() -> RecordStore<MemoryKeySpace> {
        RecordStore::new(MemoryKeySpace::new())
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Profile {
        #[serde(rename = "ID", default)]
        id: RecordId,
        name: String,
    }

    impl TableRecord for Profile {
        const TABLE: &'static str = "profiles";
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = store();
        let a = store.create("t", record(json!({"v": "a"}))).await.unwrap();
        let b = store.create("t", record(json!({"v": "b"}))).await.unwrap();

        assert_eq!(record_id(&a), Some(1));
        assert_eq!(record_id(&b), Some(2));
        assert_eq!(store.read_all("t").await.unwrap(), vec![a, b]);
    }

    #[tokio::test]
    async fn test_create_overwrites_incoming_id() {
        let store = store();
        let created = store
            .create("t", record(json!({"ID": 42, "v": "x"})))
            .await
            .unwrap();
        assert_eq!(record_id(&created), Some(1));
        assert!(store.read_one("t", 42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_deleting_newest() {
        let store = store();
        for _ in 0..3 {
            store.create("t", Record::new()).await.unwrap();
        }
        store.delete("t", 3).await.unwrap();
        store.delete("t", 2).await.unwrap();

        let next = store.create("t", Record::new()).await.unwrap();
        assert_eq!(record_id(&next), Some(4));
    }

    #[tokio::test]
    async fn test_legacy_table_without_sequence_key() {
        let ks = MemoryKeySpace::new();
        ks.set("t", json!([{"ID": 3}, {"ID": 7}, {"name": "no id"}]))
            .await
            .unwrap();
        let store = RecordStore::new(ks);

        let next = store.create("t", Record::new()).await.unwrap();
        assert_eq!(record_id(&next), Some(8));
    }

    #[tokio::test]
    async fn test_reads_on_missing_table() {
        let store = store();
        assert!(store.read_one("nope", 1).await.unwrap().is_none());
        assert!(store.read_first("nope").await.unwrap().is_none());
        assert!(store.read_all("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_array_table_reads_as_empty() {
        let ks = MemoryKeySpace::new();
        ks.set("t", json!({"ID": 1})).await.unwrap();
        let store = RecordStore::new(ks);

        assert!(store.read_all("t").await.unwrap().is_empty());
        let created = store.create("t", Record::new()).await.unwrap();
        assert_eq!(record_id(&created), Some(1));
    }

    #[tokio::test]
    async fn test_update_replaces_in_place() {
        let store = store();
        for name in ["a", "b", "c"] {
            store
                .create("t", record(json!({"name": name})))
                .await
                .unwrap();
        }

        store
            .update("t", record(json!({"ID": 99, "name": "B"})), 2)
            .await
            .unwrap();

        let names: Vec<_> = store
            .read_all("t")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r["name"].clone())
            .collect();
        assert_eq!(names, vec![json!("a"), json!("B"), json!("c")]);
        assert_eq!(
            store.read_one("t", 2).await.unwrap(),
            Some(record(json!({"ID": 2, "name": "B"})))
        );
    }

    #[tokio::test]
    async fn test_update_appends_when_missing() {
        let store = store();
        store.create("t", Record::new()).await.unwrap();

        store
            .update("t", record(json!({"name": "late"})), 10)
            .await
            .unwrap();
        let all = store.read_all("t").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(record_id(&all[1]), Some(10));

        // upserted IDs also advance the sequence
        store.delete("t", 10).await.unwrap();
        let next = store.create("t", Record::new()).await.unwrap();
        assert_eq!(record_id(&next), Some(11));
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let store = store();
        store.create("t", Record::new()).await.unwrap();
        assert_ok!(store.delete("t", 5).await);
        assert_ok!(store.delete("other", 1).await);
        assert_eq!(store.read_all("t").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_typed_helpers() {
        let store = store();
        let created = store
            .create_as(&Profile {
                id: 0,
                name: "Alex".into(),
            })
            .await
            .unwrap();
        assert_eq!(created.id, 1);

        let first: Option<Profile> = store.read_first_as().await.unwrap();
        assert_eq!(first, Some(created));

        store
            .update_as(
                &Profile {
                    id: 0,
                    name: "Steve".into(),
                },
                1,
            )
            .await
            .unwrap();
        let read: Option<Profile> = store.read_one_as(1).await.unwrap();
        assert_eq!(read.map(|p| p.name), Some("Steve".to_string()));

        store.delete_as::<Profile>(1).await.unwrap();
        assert!(store.read_all_as::<Profile>().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_typed_read_rejects_wrong_shape() {
        let ks = MemoryKeySpace::new();
        ks.set("profiles", json!([{"ID": 1, "name": 5}]))
            .await
            .unwrap();
        let store = RecordStore::new(ks);
        assert_err!(store.read_all_as::<Profile>().await);
    }

    #[test]
    fn test_to_record_rejects_non_objects() {
        let err = to_record("t", &5).unwrap_err();
        assert!(matches!(err, StoreError::NotAnObject { .. }));
    }
}
