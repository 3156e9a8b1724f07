#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod auth_service;
pub mod error;
pub mod ledger_service;
pub mod question_bank;
pub mod test_flow;

pub use prep_core::Clock;

pub use api::{ContentApi, HttpContentApi};
pub use app_services::AppServices;
pub use auth_service::AuthService;
pub use error::{
    ApiError, AppServicesError, AuthServiceError, QuestionBankError, TestFlowError, WizardError,
};
pub use ledger_service::{BookmarkGroup, QuestionLedger};
pub use question_bank::{AnswerCheck, PracticeSession, QuestionBankService, QuestionEntry};
pub use test_flow::{SubmitOutcome, TestFlowService, TestRunner, TestWizard, WizardStep};
