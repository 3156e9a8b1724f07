use std::sync::Arc;

use prep_core::Clock;
use prep_core::model::{
    ChapterStats, LedgerDocument, LedgerKey, QuestionId, QuestionState, QuestionStatus,
};
use storage::repository::{LedgerRepository, StorageError};

/// Bookmarked questions of one chapter document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkGroup {
    pub key: LedgerKey,
    pub question_ids: Vec<QuestionId>,
}

/// Per-question progress, one document per (pool, subject, chapter).
///
/// Storage failures never reach callers: they are logged and the operation
/// degrades to an empty document, `false`, or a no-op. Writes are
/// read-modify-write on a single document without locking.
#[derive(Clone)]
pub struct QuestionLedger {
    clock: Clock,
    ledger: Arc<dyn LedgerRepository>,
}

impl QuestionLedger {
    #[must_use]
    pub fn new(clock: Clock, ledger: Arc<dyn LedgerRepository>) -> Self {
        Self { clock, ledger }
    }

    async fn try_load(&self, key: &LedgerKey) -> Result<LedgerDocument, StorageError> {
        Ok(self.ledger.load(key).await?.unwrap_or_default())
    }

    /// Load, apply `change`, and save when `change` produced a value.
    ///
    /// A document that no longer parses is replaced by a fresh one. A backend
    /// failure skips the write.
    async fn modify<R, F>(&self, key: &LedgerKey, op: &'static str, change: F) -> Option<R>
    where
        R: Send,
        F: FnOnce(&mut LedgerDocument) -> Option<R> + Send,
    {
        let mut document = match self.try_load(key).await {
            Ok(document) => document,
            Err(StorageError::Serialization(reason)) => {
                tracing::warn!(%key, op, %reason, "unreadable ledger document; starting over");
                LedgerDocument::default()
            }
            Err(err) => {
                tracing::warn!(%key, op, error = %err, "ledger read failed");
                return None;
            }
        };

        let outcome = change(&mut document)?;

        if let Err(err) = self.ledger.save(key, &document).await {
            tracing::warn!(%key, op, error = %err, "ledger write failed");
            return None;
        }
        Some(outcome)
    }

    /// Whole document for `key`; empty when missing or unreadable.
    pub async fn get_states(&self, key: &LedgerKey) -> LedgerDocument {
        self.try_load(key).await.unwrap_or_else(|err| {
            tracing::warn!(%key, error = %err, "ledger read failed; using empty document");
            LedgerDocument::default()
        })
    }

    pub async fn get_state(&self, key: &LedgerKey, question: &QuestionId) -> Option<QuestionState> {
        self.get_states(key).await.get(question).cloned()
    }

    pub async fn is_bookmarked(&self, key: &LedgerKey, question: &QuestionId) -> bool {
        self.get_state(key, question)
            .await
            .is_some_and(|state| state.is_bookmarked)
    }

    /// Overwrite status, option and correctness of one entry, keeping its bookmark.
    ///
    /// Returns the stored entry, or `None` when storage failed.
    pub async fn update_state(
        &self,
        key: &LedgerKey,
        question: &QuestionId,
        status: QuestionStatus,
        selected_option: Option<String>,
        is_correct: Option<bool>,
    ) -> Option<QuestionState> {
        let at = self.clock.now();
        self.modify(key, "update_state", |doc| {
            Some(
                doc.record_status(question, status, selected_option, is_correct, at)
                    .clone(),
            )
        })
        .await
    }

    /// Flip the bookmark of one entry; `false` when storage failed.
    pub async fn toggle_bookmark(&self, key: &LedgerKey, question: &QuestionId) -> bool {
        let at = self.clock.now();
        self.modify(key, "toggle_bookmark", |doc| {
            Some(doc.toggle_bookmark(question, at))
        })
        .await
        .unwrap_or(false)
    }

    pub async fn get_bookmarked(&self, key: &LedgerKey) -> Vec<QuestionId> {
        self.get_states(key).await.bookmarked_ids()
    }

    /// Promote an absent or `new` entry to `seen`; later statuses are left alone.
    pub async fn mark_seen(&self, key: &LedgerKey, question: &QuestionId) {
        let at = self.clock.now();
        self.modify(key, "mark_seen", |doc| {
            let current = doc.get(question).map(|s| s.status);
            if current.is_some_and(|status| status != QuestionStatus::New) {
                return None;
            }
            doc.record_status(question, QuestionStatus::Seen, None, None, at);
            Some(())
        })
        .await;
    }

    pub async fn mark_attempted(
        &self,
        key: &LedgerKey,
        question: &QuestionId,
        selected_option: impl Into<String>,
        is_correct: bool,
    ) {
        let _ = self
            .update_state(
                key,
                question,
                QuestionStatus::Attempted,
                Some(selected_option.into()),
                Some(is_correct),
            )
            .await;
    }

    /// Status counts of one document. Totals are up to the caller.
    pub async fn chapter_stats(&self, key: &LedgerKey) -> ChapterStats {
        self.get_states(key).await.stats()
    }

    /// Delete the whole document for `key`.
    pub async fn clear(&self, key: &LedgerKey) {
        if let Err(err) = self.ledger.delete(key).await {
            tracing::warn!(%key, error = %err, "ledger clear failed");
        }
    }

    /// Every readable document; broken ones are logged and skipped.
    pub async fn list_all_documents(&self) -> Vec<(LedgerKey, LedgerDocument)> {
        let listing = match self.ledger.list().await {
            Ok(listing) => listing,
            Err(err) => {
                tracing::warn!(error = %err, "ledger listing failed");
                return Vec::new();
            }
        };

        listing
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(document) => Some(document),
                Err(broken) => {
                    tracing::warn!(
                        storage_key = %broken.storage_key,
                        reason = %broken.reason,
                        "skipping unreadable ledger document"
                    );
                    None
                }
            })
            .collect()
    }

    /// Bookmarks grouped by document; documents without bookmarks are omitted.
    pub async fn list_all_bookmarks(&self) -> Vec<BookmarkGroup> {
        self.list_all_documents()
            .await
            .into_iter()
            .filter_map(|(key, document)| {
                let question_ids = document.bookmarked_ids();
                (!question_ids.is_empty()).then_some(BookmarkGroup { key, question_ids })
            })
            .collect()
    }

    /// Counts summed over every readable document.
    pub async fn overview(&self) -> ChapterStats {
        self.list_all_documents()
            .await
            .iter()
            .fold(ChapterStats::default(), |mut total, (_, document)| {
                total.merge(&document.stats());
                total
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::model::PoolType;
    use prep_core::time::{fixed_clock, fixed_now};
    use storage::repository::Storage;

    fn ledger() -> (QuestionLedger, Storage) {
        let storage = Storage::in_memory();
        let ledger = QuestionLedger::new(fixed_clock(), Arc::clone(&storage.ledger));
        (ledger, storage)
    }

    fn key() -> LedgerKey {
        LedgerKey::new(PoolType::MostWanted, "p11", "phy11_01")
    }

    fn qid(id: &str) -> QuestionId {
        QuestionId::new(id)
    }

    #[tokio::test]
    async fn missing_document_reads_empty() {
        let (ledger, _) = ledger();
        assert!(ledger.get_states(&key()).await.is_empty());
        assert!(ledger.get_state(&key(), &qid("q1")).await.is_none());
        assert!(!ledger.is_bookmarked(&key(), &qid("q1")).await);
    }

    #[tokio::test]
    async fn mark_seen_never_regresses_attempted() {
        let (ledger, _) = ledger();
        ledger.mark_attempted(&key(), &qid("q1"), "Newton", true).await;
        ledger.mark_seen(&key(), &qid("q1")).await;

        let state = ledger.get_state(&key(), &qid("q1")).await.unwrap();
        assert_eq!(state.status, QuestionStatus::Attempted);
        assert_eq!(state.selected_option.as_deref(), Some("Newton"));
        assert_eq!(state.is_correct, Some(true));
    }

    #[tokio::test]
    async fn mark_seen_promotes_new_and_absent() {
        let (ledger, _) = ledger();
        ledger.mark_seen(&key(), &qid("absent")).await;
        ledger.toggle_bookmark(&key(), &qid("bookmarked")).await;
        ledger.mark_seen(&key(), &qid("bookmarked")).await;

        let doc = ledger.get_states(&key()).await;
        assert_eq!(doc.get(&qid("absent")).unwrap().status, QuestionStatus::Seen);
        let bookmarked = doc.get(&qid("bookmarked")).unwrap();
        assert_eq!(bookmarked.status, QuestionStatus::Seen);
        assert!(bookmarked.is_bookmarked);
    }

    #[tokio::test]
    async fn mark_attempted_supersedes_seen_and_keeps_bookmark() {
        let (ledger, _) = ledger();
        ledger.mark_seen(&key(), &qid("q1")).await;
        assert!(ledger.toggle_bookmark(&key(), &qid("q1")).await);
        ledger.mark_attempted(&key(), &qid("q1"), "Joule", false).await;

        let state = ledger.get_state(&key(), &qid("q1")).await.unwrap();
        assert_eq!(state.status, QuestionStatus::Attempted);
        assert_eq!(state.is_correct, Some(false));
        assert!(state.is_bookmarked);
        assert_eq!(state.timestamp, fixed_now());
    }

    #[tokio::test]
    async fn every_write_restamps_the_entry() {
        let (ledger, store) = ledger();
        ledger.mark_seen(&key(), &qid("q1")).await;

        let mut later = fixed_clock();
        later.advance(chrono::Duration::minutes(5));
        let ledger_later = QuestionLedger::new(later, Arc::clone(&store.ledger));
        ledger_later.toggle_bookmark(&key(), &qid("q1")).await;

        let state = ledger.get_state(&key(), &qid("q1")).await.unwrap();
        assert_eq!(state.status, QuestionStatus::Seen);
        assert_eq!(state.timestamp, later.now());
        assert!(state.timestamp > fixed_now());
    }

    #[tokio::test]
    async fn corrupt_document_is_replaced_on_next_write() {
        let (ledger, store) = ledger();
        let storage_key = storage::kv::encode_ledger_key(&key()).unwrap();
        store.kv.set(&storage_key, "{corrupt").await.unwrap();
        assert!(ledger.get_states(&key()).await.is_empty());

        ledger.mark_attempted(&key(), &qid("q1"), "Newton", true).await;
        assert!(ledger.toggle_bookmark(&key(), &qid("q1")).await);

        let state = ledger.get_state(&key(), &qid("q1")).await.unwrap();
        assert_eq!(state.status, QuestionStatus::Attempted);
        assert!(state.is_bookmarked);
        assert_eq!(ledger.list_all_documents().await.len(), 1);
    }

    #[tokio::test]
    async fn stats_and_clear() {
        let (ledger, _) = ledger();
        ledger.mark_attempted(&key(), &qid("a"), "x", true).await;
        ledger.mark_attempted(&key(), &qid("b"), "y", false).await;
        ledger.mark_seen(&key(), &qid("c")).await;
        ledger.toggle_bookmark(&key(), &qid("c")).await;

        let stats = ledger.chapter_stats(&key()).await;
        assert_eq!(stats.attempted, 2);
        assert_eq!(stats.correct, 1);
        assert_eq!(stats.incorrect, 1);
        assert_eq!(stats.seen, 1);
        assert_eq!(stats.bookmarked, 1);
        assert_eq!(ledger.get_bookmarked(&key()).await, vec![qid("c")]);

        ledger.clear(&key()).await;
        assert_eq!(ledger.chapter_stats(&key()).await, ChapterStats::default());
    }

    #[tokio::test]
    async fn listing_skips_broken_documents_and_groups_bookmarks() {
        let (ledger, store) = ledger();
        let other = LedgerKey::new(PoolType::PreviousYear, "c12", "chem_12:03");
        ledger.toggle_bookmark(&key(), &qid("q1")).await;
        ledger.mark_seen(&other, &qid("q2")).await;

        let broken = storage::kv::encode_ledger_key(&LedgerKey::new(
            PoolType::MostWanted,
            "z11",
            "broken",
        ))
        .unwrap();
        store.kv.set(&broken, "{not json").await.unwrap();

        let documents = ledger.list_all_documents().await;
        assert_eq!(documents.len(), 2);

        let groups = ledger.list_all_bookmarks().await;
        assert_eq!(
            groups,
            vec![BookmarkGroup {
                key: key(),
                question_ids: vec![qid("q1")],
            }]
        );

        let overview = ledger.overview().await;
        assert_eq!(overview.new, 1);
        assert_eq!(overview.seen, 1);
        assert_eq!(overview.bookmarked, 1);
    }
}
