//! Client side of the remote content service.

mod http;
mod request;
mod wire;

use std::collections::BTreeMap;

use async_trait::async_trait;
use prep_core::model::{AuthToken, Chapter, ClassLevel, PoolType, Question, SubjectCode};
use serde::Deserialize;

use crate::error::ApiError;

pub use http::HttpContentApi;
pub use request::{
    ChapterRef, CreateTestRequest, ExamFilter, FilterParseError, GradeGroup, PyqQuery,
    SubjectGroup, YearRange,
};
pub use wire::{TextOrNumber, WireChapter, WireQuestion};

/// Response of the guest login endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuestLogin {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user_id: String,
    pub username: String,
}

/// Per-subject question counts of one pool and class.
///
/// Keys are whatever the service reports: `p11`-style codes for the
/// most-wanted bank, `physics_11`-style names for the previous-year bank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectTotals {
    counts: BTreeMap<String, u32>,
}

impl SubjectTotals {
    #[must_use]
    pub fn new(counts: BTreeMap<String, u32>) -> Self {
        Self { counts }
    }

    /// Parse `{data: [{...}]}` (first element) or `{data: {...}}`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::UnexpectedPayload` when no counts object is present.
    pub fn from_payload(payload: &serde_json::Value) -> Result<Self, ApiError> {
        let data = payload
            .get("data")
            .ok_or_else(|| ApiError::UnexpectedPayload("missing `data`".into()))?;
        let object = match data {
            serde_json::Value::Array(items) => items.first(),
            other => Some(other),
        }
        .and_then(serde_json::Value::as_object)
        .ok_or_else(|| ApiError::UnexpectedPayload("`data` holds no counts object".into()))?;

        let counts = object
            .iter()
            .filter_map(|(key, value)| {
                let count = serde_json::from_value::<TextOrNumber>(value.clone()).ok()?;
                Some((key.clone(), count.as_count()))
            })
            .collect();
        Ok(Self { counts })
    }

    /// Count for a subject in `pool`, 0 when the service did not report it.
    #[must_use]
    pub fn count(&self, pool: PoolType, code: SubjectCode) -> u32 {
        let key = match pool {
            PoolType::MostWanted => code.to_string(),
            PoolType::PreviousYear => code.chapter_query(),
        };
        self.counts.get(&key).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn raw(&self) -> &BTreeMap<String, u32> {
        &self.counts
    }
}

/// Operations offered by the content service.
///
/// Every call except guest login and the public totals needs a bearer token;
/// callers obtain it from `AuthState::require_token` before calling.
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// # Errors
    ///
    /// Returns `ApiError` on transport failures or non-success statuses.
    async fn login_as_guest(&self) -> Result<GuestLogin, ApiError>;

    /// Chapters of one subject and class.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failures or non-success statuses.
    async fn chapters_by_subject(
        &self,
        token: &AuthToken,
        code: SubjectCode,
    ) -> Result<Vec<Chapter>, ApiError>;

    /// Generate a test; a response without a question list yields no questions.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failures or non-success statuses.
    async fn create_test(
        &self,
        token: &AuthToken,
        request: &CreateTestRequest,
    ) -> Result<Vec<Question>, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` on transport failures or non-success statuses.
    async fn previous_year_questions(
        &self,
        token: &AuthToken,
        query: &PyqQuery,
    ) -> Result<Vec<Question>, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` on transport failures, non-success statuses, or a
    /// payload without counts.
    async fn subject_totals(
        &self,
        pool: PoolType,
        class: ClassLevel,
    ) -> Result<SubjectTotals, ApiError>;
}
