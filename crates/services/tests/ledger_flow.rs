mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::{FakeContentApi, question, signed_in};
use prep_core::model::{
    AuthState, ChapterId, ChapterStats, LedgerKey, PoolType, QuestionId, QuestionStatus,
    SubjectCode,
};
use prep_core::time::fixed_clock;
use services::api::{ExamFilter, PyqQuery, YearRange};
use services::{QuestionBankError, QuestionBankService, QuestionLedger};
use storage::repository::{KeyValueStore, Storage, StorageError};

/// Store whose every call fails, as a broken device store would.
struct UnavailableStore;

#[async_trait]
impl KeyValueStore for UnavailableStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Connection("store offline".into()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("store offline".into()))
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("store offline".into()))
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        Err(StorageError::Connection("store offline".into()))
    }
}

fn key() -> LedgerKey {
    LedgerKey::new(PoolType::PreviousYear, "p11", "phy11_units")
}

#[tokio::test]
async fn storage_failures_degrade_to_safe_defaults() {
    let storage = Storage::over(Arc::new(UnavailableStore));
    let ledger = QuestionLedger::new(fixed_clock(), Arc::clone(&storage.ledger));
    let q = QuestionId::new("q1");

    assert!(ledger.get_states(&key()).await.is_empty());
    assert!(ledger.get_state(&key(), &q).await.is_none());
    assert!(!ledger.toggle_bookmark(&key(), &q).await);
    assert!(ledger.update_state(&key(), &q, QuestionStatus::Seen, None, None).await.is_none());
    ledger.mark_seen(&key(), &q).await;
    ledger.mark_attempted(&key(), &q, "a", true).await;
    ledger.clear(&key()).await;
    assert!(ledger.get_bookmarked(&key()).await.is_empty());
    assert_eq!(ledger.chapter_stats(&key()).await, ChapterStats::default());
    assert!(ledger.list_all_documents().await.is_empty());
    assert!(ledger.list_all_bookmarks().await.is_empty());
    assert_eq!(ledger.overview().await, ChapterStats::default());
}

#[tokio::test]
async fn identifiers_with_separators_stay_distinct() {
    let storage = Storage::in_memory();
    let ledger = QuestionLedger::new(fixed_clock(), Arc::clone(&storage.ledger));
    let a = LedgerKey::new(PoolType::MostWanted, "p_11", "units");
    let b = LedgerKey::new(PoolType::MostWanted, "p", "11_units");
    let q = QuestionId::new("q1");

    ledger.toggle_bookmark(&a, &q).await;
    ledger.mark_attempted(&b, &q, "x", false).await;

    let mut documents = ledger.list_all_documents().await;
    documents.sort_by(|left, right| left.0.cmp(&right.0));
    let keys: Vec<_> = documents.iter().map(|(key, _)| key.clone()).collect();
    assert_eq!(keys.len(), 2);
    assert!(keys.contains(&a));
    assert!(keys.contains(&b));

    assert!(ledger.is_bookmarked(&a, &q).await);
    assert!(!ledger.is_bookmarked(&b, &q).await);
}

#[tokio::test]
async fn practice_session_records_progress() {
    let storage = Storage::sqlite("sqlite:file:memdb_practice?mode=memory&cache=shared")
        .await
        .expect("storage");
    let api = Arc::new(FakeContentApi {
        questions: (1..=3).map(question).collect(),
        ..FakeContentApi::default()
    });
    let ledger = QuestionLedger::new(fixed_clock(), Arc::clone(&storage.ledger));
    let bank = QuestionBankService::new(api.clone(), ledger.clone());

    let code: SubjectCode = "p11".parse().unwrap();
    let chapter = ChapterId::new("phy11_units");
    let query = PyqQuery::new(code, chapter.clone())
        .with_exam(ExamFilter::Neet)
        .with_years(YearRange::From2021);
    let questions = bank.questions(&signed_in(), &query).await.unwrap();
    assert_eq!(api.pyq_queries.lock().unwrap()[0], query);

    let mut session = bank.practice(PoolType::PreviousYear, code, chapter, questions);
    assert_eq!(session.key(), &key());

    session.open(0).await.unwrap();
    let check = session.check_answer("right1").await.unwrap();
    assert!(check.is_correct);
    session.next().await.unwrap();
    assert!(session.toggle_bookmark().await);
    let check = session.check_answer("wrong2a").await.unwrap();
    assert!(!check.is_correct);
    assert_eq!(check.correct_answer, "right2");

    // Revisiting an attempted question keeps it attempted.
    session.previous().await.unwrap();
    session.previous().await.unwrap();
    assert_eq!(session.index(), 0);

    let statuses = session.statuses().await;
    let summary: Vec<_> = statuses
        .iter()
        .map(|entry| (entry.status, entry.is_bookmarked))
        .collect();
    assert_eq!(
        summary,
        vec![
            (QuestionStatus::Attempted, false),
            (QuestionStatus::Attempted, true),
            (QuestionStatus::New, false),
        ]
    );

    let stats = ledger.chapter_stats(&key()).await;
    assert_eq!(stats.correct, 1);
    assert_eq!(stats.incorrect, 1);
    assert_eq!(stats.bookmarked, 1);
}

#[tokio::test]
async fn question_bank_requires_a_token() {
    let api = Arc::new(FakeContentApi::default());
    let ledger = QuestionLedger::new(fixed_clock(), Arc::clone(&Storage::in_memory().ledger));
    let bank = QuestionBankService::new(api.clone(), ledger);

    let code: SubjectCode = "z12".parse().unwrap();
    let err = bank
        .chapters(&AuthState::signed_out(), code)
        .await
        .unwrap_err();
    assert!(matches!(err, QuestionBankError::Auth(_)));
    assert_eq!(api.calls(), 0);
}
