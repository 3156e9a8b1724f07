use async_trait::async_trait;
use prep_core::model::{LedgerDocument, LedgerKey, UserSession};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::kv::{KvLedgerRepository, KvSessionRepository};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

//
// ─── KEY-VALUE PRIMITIVE ───────────────────────────────────────────────────────
//

/// Device-local string store: exact-key reads and writes plus key enumeration.
///
/// There are no transactions spanning several keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`; removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// All keys currently stored, in ascending order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// In-memory store for tests and ephemeral runs.
#[derive(Clone, Default)]
pub struct InMemoryKeyValueStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl InMemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.keys().cloned().collect())
    }
}

//
// ─── TYPED REPOSITORIES ────────────────────────────────────────────────────────
//

/// A stored ledger entry that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenLedger {
    pub storage_key: String,
    pub reason: String,
}

/// Every ledger document found in storage, each decoded independently.
pub type LedgerListing = Vec<Result<(LedgerKey, LedgerDocument), BrokenLedger>>;

/// Persistence for per-chapter question progress documents.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Fetch the document for `key`, `None` if it was never written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend or decode failures.
    async fn load(&self, key: &LedgerKey) -> Result<Option<LedgerDocument>, StorageError>;

    /// Replace the whole document stored for `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be encoded or stored.
    async fn save(&self, key: &LedgerKey, document: &LedgerDocument) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn delete(&self, key: &LedgerKey) -> Result<(), StorageError>;

    /// Enumerate every ledger document. A document that fails to decode is
    /// reported as `Err(BrokenLedger)` without affecting the others.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if keys cannot be enumerated.
    async fn list(&self) -> Result<LedgerListing, StorageError>;
}

/// Persistence for the signed-in user.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend or decode failures.
    async fn load_session(&self) -> Result<Option<UserSession>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be stored.
    async fn save_session(&self, session: &UserSession) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn clear_session(&self) -> Result<(), StorageError>;
}

/// Aggregates the raw store and the typed repositories built on it.
#[derive(Clone)]
pub struct Storage {
    pub kv: Arc<dyn KeyValueStore>,
    pub ledger: Arc<dyn LedgerRepository>,
    pub sessions: Arc<dyn SessionRepository>,
}

impl Storage {
    /// Wire typed repositories over any key-value backend.
    #[must_use]
    pub fn over(kv: Arc<dyn KeyValueStore>) -> Self {
        let ledger: Arc<dyn LedgerRepository> = Arc::new(KvLedgerRepository::new(Arc::clone(&kv)));
        let sessions: Arc<dyn SessionRepository> =
            Arc::new(KvSessionRepository::new(Arc::clone(&kv)));
        Self {
            kv,
            ledger,
            sessions,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::over(Arc::new(InMemoryKeyValueStore::new()))
    }
}
