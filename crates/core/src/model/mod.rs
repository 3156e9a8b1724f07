mod auth;
mod chapter;
mod ids;
mod ledger;
mod question;
mod scoring;
mod selection;
mod settings;
mod subject;

pub use auth::{AuthError, AuthState, AuthToken, UserRole, UserSession};
pub use chapter::{Chapter, Subtopic, parse_subtopics};
pub use ids::{ChapterId, ParseIdError, QuestionId, SubtopicId};
pub use ledger::{
    ChapterStats, LedgerDocument, LedgerKey, ParsePoolError, PoolType, QuestionState,
    QuestionStatus,
};
pub use question::{Question, option_label};
pub use scoring::{TestResult, percentage};
pub use selection::{
    ConfigError, DURATION_OPTIONS, Difficulty, ExamType, QUESTION_COUNT_OPTIONS, Selection,
    TestConfiguration,
};
pub use settings::{
    ApiSettings, ApiSettingsDraft, ApiSettingsError, DEFAULT_API_BASE_URL,
    DEFAULT_API_TIMEOUT_SECS,
};
pub use subject::{ClassLevel, Subject, SubjectCode, SubjectParseError};
