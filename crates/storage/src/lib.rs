#![forbid(unsafe_code)]

pub mod kv;
pub mod repository;
pub mod sqlite;

pub use repository::{
    BrokenLedger, InMemoryKeyValueStore, KeyValueStore, LedgerListing, LedgerRepository,
    SessionRepository, Storage, StorageError,
};
