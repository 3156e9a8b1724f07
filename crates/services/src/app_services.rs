use std::sync::Arc;

use prep_core::model::ApiSettings;
use storage::repository::Storage;

use crate::Clock;
use crate::api::{ContentApi, HttpContentApi};
use crate::auth_service::AuthService;
use crate::error::AppServicesError;
use crate::ledger_service::QuestionLedger;
use crate::question_bank::QuestionBankService;
use crate::test_flow::TestFlowService;

/// Assembles app-facing services over one storage and one content API.
#[derive(Clone)]
pub struct AppServices {
    auth: Arc<AuthService>,
    ledger: Arc<QuestionLedger>,
    question_bank: Arc<QuestionBankService>,
    test_flow: Arc<TestFlowService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the HTTP content API.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or the
    /// HTTP client cannot be built.
    pub async fn new_sqlite(
        db_url: &str,
        settings: ApiSettings,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let api: Arc<dyn ContentApi> = Arc::new(HttpContentApi::new(settings)?);
        Ok(Self::from_parts(&storage, api, clock))
    }

    /// Wire services over existing storage and API implementations.
    #[must_use]
    pub fn from_parts(storage: &Storage, api: Arc<dyn ContentApi>, clock: Clock) -> Self {
        let ledger = QuestionLedger::new(clock, Arc::clone(&storage.ledger));
        let auth = Arc::new(AuthService::new(
            Arc::clone(&api),
            Arc::clone(&storage.sessions),
        ));
        let question_bank = Arc::new(QuestionBankService::new(Arc::clone(&api), ledger.clone()));
        let test_flow = Arc::new(TestFlowService::new(api, clock));

        Self {
            auth,
            ledger: Arc::new(ledger),
            question_bank,
            test_flow,
        }
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn ledger(&self) -> Arc<QuestionLedger> {
        Arc::clone(&self.ledger)
    }

    #[must_use]
    pub fn question_bank(&self) -> Arc<QuestionBankService> {
        Arc::clone(&self.question_bank)
    }

    #[must_use]
    pub fn test_flow(&self) -> Arc<TestFlowService> {
        Arc::clone(&self.test_flow)
    }
}
