use std::sync::Arc;

use async_trait::async_trait;
use prep_core::model::{LedgerDocument, LedgerKey};

use super::keys::{decode_ledger_key, encode_ledger_key};
use crate::repository::{
    BrokenLedger, KeyValueStore, LedgerListing, LedgerRepository, StorageError,
};

/// Stores one JSON document per ledger key.
#[derive(Clone)]
pub struct KvLedgerRepository {
    kv: Arc<dyn KeyValueStore>,
}

impl KvLedgerRepository {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    async fn decode_entry(
        &self,
        storage_key: String,
    ) -> Option<Result<(LedgerKey, LedgerDocument), BrokenLedger>> {
        let broken = |reason: String| BrokenLedger {
            storage_key: storage_key.clone(),
            reason,
        };

        let key = match decode_ledger_key(&storage_key) {
            Ok(Some(key)) => key,
            Ok(None) => return None,
            Err(err) => return Some(Err(broken(err.to_string()))),
        };

        let raw = match self.kv.get(&storage_key).await {
            Ok(Some(raw)) => raw,
            // Removed between enumeration and read.
            Ok(None) => return None,
            Err(err) => return Some(Err(broken(err.to_string()))),
        };

        Some(
            serde_json::from_str::<LedgerDocument>(&raw)
                .map(|doc| (key, doc))
                .map_err(|err| broken(err.to_string())),
        )
    }
}

#[async_trait]
impl LedgerRepository for KvLedgerRepository {
    async fn load(&self, key: &LedgerKey) -> Result<Option<LedgerDocument>, StorageError> {
        let storage_key = encode_ledger_key(key)?;
        let Some(raw) = self.kv.get(&storage_key).await? else {
            return Ok(None);
        };
        let document = serde_json::from_str(&raw)?;
        Ok(Some(document))
    }

    async fn save(&self, key: &LedgerKey, document: &LedgerDocument) -> Result<(), StorageError> {
        let storage_key = encode_ledger_key(key)?;
        let raw = serde_json::to_string(document)?;
        self.kv.set(&storage_key, &raw).await
    }

    async fn delete(&self, key: &LedgerKey) -> Result<(), StorageError> {
        let storage_key = encode_ledger_key(key)?;
        self.kv.remove(&storage_key).await
    }

    async fn list(&self) -> Result<LedgerListing, StorageError> {
        let keys = self.kv.keys().await?;
        let mut listing = Vec::new();
        for storage_key in keys {
            if let Some(entry) = self.decode_entry(storage_key).await {
                listing.push(entry);
            }
        }
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryKeyValueStore;
    use prep_core::model::{PoolType, QuestionId, QuestionStatus};
    use prep_core::time::fixed_now;

    fn repo() -> (Arc<InMemoryKeyValueStore>, KvLedgerRepository) {
        let kv = Arc::new(InMemoryKeyValueStore::new());
        let repo = KvLedgerRepository::new(kv.clone());
        (kv, repo)
    }

    fn doc_with(id: &str) -> LedgerDocument {
        let mut doc = LedgerDocument::new();
        doc.record_status(&QuestionId::new(id), QuestionStatus::Seen, None, None, fixed_now());
        doc
    }

    #[tokio::test]
    async fn missing_document_loads_as_none() {
        let (_kv, repo) = repo();
        let key = LedgerKey::new(PoolType::MostWanted, "p11", "c1");
        assert!(repo.load(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_load_delete() {
        let (_kv, repo) = repo();
        let key = LedgerKey::new(PoolType::MostWanted, "p11", "c1");
        repo.save(&key, &doc_with("q1")).await.unwrap();

        let loaded = repo.load(&key).await.unwrap().unwrap();
        assert_eq!(loaded, doc_with("q1"));

        repo.delete(&key).await.unwrap();
        assert!(repo.load(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_skips_foreign_keys_and_reports_broken_documents() {
        let (kv, repo) = repo();
        let good = LedgerKey::new(PoolType::PreviousYear, "c12", "c_7");
        repo.save(&good, &doc_with("q1")).await.unwrap();
        kv.set("user", "{}").await.unwrap();
        let broken_key = encode_ledger_key(&LedgerKey::new(PoolType::MostWanted, "p11", "x"))
            .unwrap();
        kv.set(&broken_key, "not json").await.unwrap();

        let listing = repo.list().await.unwrap();
        assert_eq!(listing.len(), 2);

        let ok: Vec<_> = listing.iter().filter_map(|e| e.as_ref().ok()).collect();
        assert_eq!(ok.len(), 1);
        assert_eq!(ok[0].0, good);

        let bad: Vec<_> = listing.iter().filter_map(|e| e.as_ref().err()).collect();
        assert_eq!(bad[0].storage_key, broken_key);
    }
}
