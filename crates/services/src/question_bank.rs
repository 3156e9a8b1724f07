use std::sync::Arc;

use prep_core::model::{
    AuthState, Chapter, ChapterId, ClassLevel, LedgerKey, PoolType, Question, QuestionId,
    QuestionStatus, SubjectCode,
};

use crate::api::{ContentApi, PyqQuery, SubjectTotals};
use crate::error::QuestionBankError;
use crate::ledger_service::QuestionLedger;

/// Browsing the question banks chapter by chapter.
#[derive(Clone)]
pub struct QuestionBankService {
    api: Arc<dyn ContentApi>,
    ledger: QuestionLedger,
}

impl QuestionBankService {
    #[must_use]
    pub fn new(api: Arc<dyn ContentApi>, ledger: QuestionLedger) -> Self {
        Self { api, ledger }
    }

    /// # Errors
    ///
    /// Returns `QuestionBankError::Api` if the counts cannot be fetched.
    pub async fn subject_totals(
        &self,
        pool: PoolType,
        class: ClassLevel,
    ) -> Result<SubjectTotals, QuestionBankError> {
        self.api
            .subject_totals(pool, class)
            .await
            .inspect_err(|err| tracing::error!(%pool, %class, error = %err, "error fetching totals"))
            .map_err(Into::into)
    }

    /// # Errors
    ///
    /// Returns `QuestionBankError` without a token or if the fetch fails.
    pub async fn chapters(
        &self,
        auth: &AuthState,
        code: SubjectCode,
    ) -> Result<Vec<Chapter>, QuestionBankError> {
        let token = auth.require_token()?;
        self.api
            .chapters_by_subject(token, code)
            .await
            .inspect_err(|err| tracing::error!(subject = %code, error = %err, "error fetching chapters"))
            .map_err(Into::into)
    }

    /// # Errors
    ///
    /// Returns `QuestionBankError` without a token or if the fetch fails.
    pub async fn questions(
        &self,
        auth: &AuthState,
        query: &PyqQuery,
    ) -> Result<Vec<Question>, QuestionBankError> {
        let token = auth.require_token()?;
        self.api
            .previous_year_questions(token, query)
            .await
            .inspect_err(|err| {
                tracing::error!(
                    subject = %query.subject,
                    chapter = %query.chapter_id,
                    error = %err,
                    "error fetching questions"
                );
            })
            .map_err(Into::into)
    }

    /// Practice `questions` of one chapter, recording progress in the ledger.
    #[must_use]
    pub fn practice(
        &self,
        pool: PoolType,
        subject: SubjectCode,
        chapter: ChapterId,
        questions: Vec<Question>,
    ) -> PracticeSession {
        PracticeSession {
            ledger: self.ledger.clone(),
            key: LedgerKey::new(pool, subject.to_string(), chapter.as_str()),
            questions,
            index: 0,
        }
    }
}

/// Ledger view of one question in a practice list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionEntry {
    pub question_id: QuestionId,
    pub status: QuestionStatus,
    pub is_bookmarked: bool,
}

/// Outcome of checking an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerCheck {
    pub is_correct: bool,
    pub correct_answer: String,
    pub solution: Option<String>,
}

/// One chapter's question list being worked through.
pub struct PracticeSession {
    ledger: QuestionLedger,
    key: LedgerKey,
    questions: Vec<Question>,
    index: usize,
}

impl PracticeSession {
    #[must_use]
    pub fn key(&self) -> &LedgerKey {
        &self.key
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.index)
    }

    /// Show the question at `index` and mark it seen.
    pub async fn open(&mut self, index: usize) -> Option<&Question> {
        let id = self.questions.get(index)?.id.clone();
        self.index = index;
        self.ledger.mark_seen(&self.key, &id).await;
        self.current()
    }

    /// Move forward, staying on the last question.
    pub async fn next(&mut self) -> Option<&Question> {
        let target = (self.index + 1).min(self.questions.len().saturating_sub(1));
        self.open(target).await
    }

    /// Move back, staying on the first question.
    pub async fn previous(&mut self) -> Option<&Question> {
        self.open(self.index.saturating_sub(1)).await
    }

    /// Check `option` against the current question and record the attempt.
    pub async fn check_answer(&mut self, option: &str) -> Option<AnswerCheck> {
        let question = self.questions.get(self.index)?;
        let check = AnswerCheck {
            is_correct: question.is_correct(option),
            correct_answer: question.correct_answer.clone(),
            solution: question.solution.clone(),
        };
        let id = question.id.clone();
        self.ledger
            .mark_attempted(&self.key, &id, option, check.is_correct)
            .await;
        Some(check)
    }

    /// Flip the bookmark of the current question; returns the new value.
    pub async fn toggle_bookmark(&mut self) -> bool {
        let Some(question) = self.questions.get(self.index) else {
            return false;
        };
        self.ledger.toggle_bookmark(&self.key, &question.id).await
    }

    /// Ledger state of every question in list order; untracked ones are `new`.
    pub async fn statuses(&self) -> Vec<QuestionEntry> {
        let document = self.ledger.get_states(&self.key).await;
        self.questions
            .iter()
            .map(|question| {
                let state = document.get(&question.id);
                QuestionEntry {
                    question_id: question.id.clone(),
                    status: state.map_or(QuestionStatus::New, |s| s.status),
                    is_bookmarked: state.is_some_and(|s| s.is_bookmarked),
                }
            })
            .collect()
    }
}
