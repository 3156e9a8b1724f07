#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use prep_core::model::{
    AuthState, AuthToken, Chapter, ChapterId, ClassLevel, PoolType, Question, QuestionId,
    SubjectCode, UserRole, UserSession,
};
use services::ApiError;
use services::api::{ContentApi, CreateTestRequest, GuestLogin, PyqQuery, SubjectTotals};

/// Content service double that serves canned data and records calls.
#[derive(Default)]
pub struct FakeContentApi {
    pub chapters: Vec<Chapter>,
    pub questions: Vec<Question>,
    pub fail_chapters: AtomicBool,
    pub fail_create: AtomicBool,
    pub calls: AtomicUsize,
    pub create_requests: Mutex<Vec<CreateTestRequest>>,
    pub pyq_queries: Mutex<Vec<PyqQuery>>,
}

impl FakeContentApi {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContentApi for FakeContentApi {
    async fn login_as_guest(&self) -> Result<GuestLogin, ApiError> {
        self.record();
        Ok(GuestLogin {
            success: true,
            message: "ok".into(),
            token: "guest-token".into(),
            user_id: "guest-1".into(),
            username: "Guest".into(),
        })
    }

    async fn chapters_by_subject(
        &self,
        _token: &AuthToken,
        _code: SubjectCode,
    ) -> Result<Vec<Chapter>, ApiError> {
        self.record();
        if self.fail_chapters.load(Ordering::SeqCst) {
            return Err(ApiError::UnexpectedPayload("chapters unavailable".into()));
        }
        Ok(self.chapters.clone())
    }

    async fn create_test(
        &self,
        _token: &AuthToken,
        request: &CreateTestRequest,
    ) -> Result<Vec<Question>, ApiError> {
        self.record();
        self.create_requests.lock().unwrap().push(request.clone());
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(ApiError::UnexpectedPayload("generation failed".into()));
        }
        Ok(self.questions.clone())
    }

    async fn previous_year_questions(
        &self,
        _token: &AuthToken,
        query: &PyqQuery,
    ) -> Result<Vec<Question>, ApiError> {
        self.record();
        self.pyq_queries.lock().unwrap().push(query.clone());
        Ok(self.questions.clone())
    }

    async fn subject_totals(
        &self,
        _pool: PoolType,
        _class: ClassLevel,
    ) -> Result<SubjectTotals, ApiError> {
        self.record();
        Ok(SubjectTotals::default())
    }
}

pub fn signed_in() -> AuthState {
    AuthState::signed_in(UserSession {
        user_id: "guest-1".into(),
        username: "Guest".into(),
        token: AuthToken::new("guest-token"),
        role: UserRole::Guest,
    })
}

pub fn units_chapter() -> Chapter {
    Chapter {
        row_id: 1,
        chapter_id: ChapterId::new("phy11_units"),
        name: "Units".into(),
        most_wanted_total: 40,
        previous_year_total: 25,
        subject_id: "physics_11".into(),
        subtopic_source: "['1.Physical Quantities', '2.Units']".into(),
        total_questions: 65,
    }
}

/// Question `n` whose correct answer is `right{n}`.
pub fn question(n: usize) -> Question {
    Question {
        id: QuestionId::new(format!("q{n}")),
        prompt: format!("Question {n}"),
        options: vec![
            format!("right{n}"),
            format!("wrong{n}a"),
            format!("wrong{n}b"),
            format!("wrong{n}c"),
        ],
        correct_answer: format!("right{n}"),
        solution: Some(format!("Because {n}")),
        exam_type: "NEET".into(),
        exam_year: "2021".into(),
    }
}
