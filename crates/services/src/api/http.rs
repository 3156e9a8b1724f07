use std::time::Duration;

use async_trait::async_trait;
use prep_core::model::{
    ApiSettings, AuthToken, Chapter, ClassLevel, PoolType, Question, SubjectCode,
};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::request::{CreateTestRequest, PyqQuery};
use super::wire::{WireChapter, WireQuestion, normalize_questions};
use super::{ContentApi, GuestLogin, SubjectTotals};
use crate::error::ApiError;

/// `ContentApi` over HTTPS with bearer authentication.
#[derive(Clone)]
pub struct HttpContentApi {
    client: Client,
    settings: ApiSettings,
}

impl HttpContentApi {
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs()))
            .build()?;
        Ok(Self { client, settings })
    }

    #[must_use]
    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    async fn send<T: DeserializeOwned>(
        &self,
        path: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        tracing::debug!(path, "content service request");
        let response = request.send().await?;

        if !response.status().is_success() {
            tracing::warn!(path, status = %response.status(), "content service rejected request");
            return Err(ApiError::HttpStatus(response.status()));
        }

        Ok(response.json().await?)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.settings.endpoint(path))
    }
}

#[derive(Debug, Deserialize)]
struct CreateTestResponse {
    #[serde(default)]
    questions: Option<Vec<WireQuestion>>,
}

#[async_trait]
impl ContentApi for HttpContentApi {
    async fn login_as_guest(&self) -> Result<GuestLogin, ApiError> {
        const PATH: &str = "login-as-guest";
        self.send(PATH, self.post(PATH)).await
    }

    async fn chapters_by_subject(
        &self,
        token: &AuthToken,
        code: SubjectCode,
    ) -> Result<Vec<Chapter>, ApiError> {
        const PATH: &str = "admin/data/getChaptersBySubjects";
        let body = serde_json::json!({ "subjectName_class": code.chapter_query() });
        let request = self.post(PATH).bearer_auth(token.as_str()).json(&body);
        let chapters: Vec<WireChapter> = self.send(PATH, request).await?;
        Ok(chapters.into_iter().map(Chapter::from).collect())
    }

    async fn create_test(
        &self,
        token: &AuthToken,
        request: &CreateTestRequest,
    ) -> Result<Vec<Question>, ApiError> {
        const PATH: &str = "admin/data/createTest";
        let http = self.post(PATH).bearer_auth(token.as_str()).json(request);
        let response: CreateTestResponse = self.send(PATH, http).await?;
        Ok(normalize_questions(response.questions.unwrap_or_default()))
    }

    async fn previous_year_questions(
        &self,
        token: &AuthToken,
        query: &PyqQuery,
    ) -> Result<Vec<Question>, ApiError> {
        const PATH: &str = "admin/data/getPYQsQuestions";
        let request = self
            .post(PATH)
            .bearer_auth(token.as_str())
            .json(&query.body());
        let records: Vec<WireQuestion> = self.send(PATH, request).await?;
        Ok(normalize_questions(records))
    }

    async fn subject_totals(
        &self,
        pool: PoolType,
        class: ClassLevel,
    ) -> Result<SubjectTotals, ApiError> {
        let path = totals_path(pool, class);
        let request = self.client.get(self.settings.endpoint(path));
        let payload: serde_json::Value = self.send(path, request).await?;
        SubjectTotals::from_payload(&payload)
    }
}

fn totals_path(pool: PoolType, class: ClassLevel) -> &'static str {
    match (pool, class) {
        (PoolType::MostWanted, ClassLevel::Eleven) => "admin/data/totalQuestions11",
        (PoolType::MostWanted, ClassLevel::Twelve) => "admin/data/totalQuestions12",
        (PoolType::PreviousYear, ClassLevel::Eleven) => "admin/data/getTotalPYQsQuestions11",
        (PoolType::PreviousYear, ClassLevel::Twelve) => "admin/data/getTotalPYQsQuestions12",
    }
}
