use std::sync::Arc;

use prep_core::Clock;
use prep_core::model::{AuthState, ClassLevel, SubjectCode};

use super::runner::SubmitOutcome;
use super::wizard::{CHAPTERS_FAILED, CREATE_TEST_FAILED, TestWizard};
use crate::api::ContentApi;
use crate::error::{TestFlowError, WizardError};

/// Performs the network side of the wizard's transitions.
///
/// Authentication is checked before every request; a missing token is
/// surfaced on the banner and no request is made. Remote failures are logged
/// and surfaced once, with no automatic retry.
#[derive(Clone)]
pub struct TestFlowService {
    api: Arc<dyn ContentApi>,
    clock: Clock,
}

impl TestFlowService {
    #[must_use]
    pub fn new(api: Arc<dyn ContentApi>, clock: Clock) -> Self {
        Self { api, clock }
    }

    /// Pick the class level and load its chapters.
    ///
    /// # Errors
    ///
    /// Returns `TestFlowError` when the transition is invalid, no token is
    /// available, or the fetch fails. The wizard banner reflects the failure.
    pub async fn select_class(
        &self,
        wizard: &mut TestWizard,
        auth: &AuthState,
        class: ClassLevel,
    ) -> Result<(), TestFlowError> {
        let code = wizard.select_class(class)?;
        self.load_chapters(wizard, auth, code).await
    }

    /// Fetch the chapter list again after a failure.
    ///
    /// # Errors
    ///
    /// Same as `select_class`.
    pub async fn retry_chapters(
        &self,
        wizard: &mut TestWizard,
        auth: &AuthState,
    ) -> Result<(), TestFlowError> {
        let code = wizard.retry_chapters()?;
        self.load_chapters(wizard, auth, code).await
    }

    async fn load_chapters(
        &self,
        wizard: &mut TestWizard,
        auth: &AuthState,
        code: SubjectCode,
    ) -> Result<(), TestFlowError> {
        let token = match auth.require_token() {
            Ok(token) => token,
            Err(err) => {
                wizard.chapters_loaded(Err(err.to_string()));
                return Err(err.into());
            }
        };

        match self.api.chapters_by_subject(token, code).await {
            Ok(chapters) => {
                tracing::debug!(subject = %code, count = chapters.len(), "chapters loaded");
                wizard.chapters_loaded(Ok(chapters));
                Ok(())
            }
            Err(err) => {
                tracing::error!(subject = %code, error = %err, "error fetching chapters");
                wizard.chapters_loaded(Err(CHAPTERS_FAILED.to_string()));
                Err(err.into())
            }
        }
    }

    /// Request the configured test and start it.
    ///
    /// Exactly one generation request is made per call. On failure the
    /// wizard stays on the configure step with its selections intact.
    ///
    /// # Errors
    ///
    /// Returns `TestFlowError` for an incomplete configuration, a missing
    /// token, a failed request, or an empty question list.
    pub async fn create_test(
        &self,
        wizard: &mut TestWizard,
        auth: &AuthState,
    ) -> Result<(), TestFlowError> {
        let request = wizard.prepare_test()?;

        let token = match auth.require_token() {
            Ok(token) => token,
            Err(err) => {
                wizard.test_creation_failed(err.to_string());
                return Err(err.into());
            }
        };

        let questions = match self.api.create_test(token, &request).await {
            Ok(questions) => questions,
            Err(err) => {
                tracing::error!(test = %request.test_name, error = %err, "error creating test");
                wizard.test_creation_failed(CREATE_TEST_FAILED);
                return Err(err.into());
            }
        };

        tracing::info!(
            test = %request.test_name,
            questions = questions.len(),
            "test created"
        );
        wizard.test_created(questions, self.clock.now())?;
        Ok(())
    }

    /// Submit the running test. Repeated calls return the first result.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::NoActiveTest` when no test is running.
    pub async fn submit(&self, wizard: &TestWizard) -> Result<SubmitOutcome, TestFlowError> {
        let runner = wizard.runner().ok_or(WizardError::NoActiveTest)?;
        let outcome = runner.lock().await.submit(self.clock.now());
        if outcome.is_first() {
            let result = outcome.result();
            tracing::info!(
                attempted = result.attempted,
                correct = result.correct,
                percentage = result.percentage,
                "test submitted"
            );
        }
        Ok(outcome)
    }
}
