//! Persistence and host utilities shared by the Cinder launcher.
//!
//! - [`store`]: table-oriented record store over a durable key space.
//! - [`utils`]: host probing (memory) used by the settings layer.

pub mod store;
pub mod utils;

pub use store::{
    JsonFileKeySpace, KeySpace, MemoryKeySpace, Record, RecordId, RecordStore, StoreError,
    TableRecord,
};
