//! Shared error types for the services crate.

use thiserror::Error;

use prep_core::model::{ApiSettingsError, AuthError, ConfigError, SubtopicId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::test_flow::WizardStep;

/// Errors emitted by `ContentApi` implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("content service request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("content service returned an unexpected payload: {0}")]
    UnexpectedPayload(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthServiceError {
    #[error("guest login was rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `TestWizard` transitions.
///
/// The `Display` text doubles as the banner shown to the user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WizardError {
    #[error("not available on the {0} step")]
    WrongStep(WizardStep),
    #[error("Please select a subject first")]
    NoSubject,
    #[error("Chapters are not loaded yet")]
    ChaptersNotLoaded,
    #[error("No chapter at position {0}")]
    UnknownChapter(usize),
    #[error("Unknown subtopic {0}")]
    UnknownSubtopic(SubtopicId),
    #[error("Please select at least one subtopic")]
    NoSubtopicsSelected,
    #[error("No selected chapter at position {0}")]
    UnknownSelection(usize),
    #[error("Please select at least one chapter before configuring the test")]
    NoSelections,
    #[error("No questions were generated for this test")]
    NoQuestions,
    #[error("No test is running")]
    NoActiveTest,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors emitted by `TestFlowService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TestFlowError {
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted by `QuestionBankService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionBankError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Settings(#[from] ApiSettingsError),
    #[error(transparent)]
    Api(#[from] ApiError),
}
