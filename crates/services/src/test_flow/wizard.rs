use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use prep_core::model::{
    Chapter, ClassLevel, Difficulty, ExamType, Question, Selection, Subject, SubjectCode,
    Subtopic, SubtopicId, TestConfiguration,
};
use tokio::sync::Mutex;

use super::runner::TestRunner;
use crate::api::CreateTestRequest;
use crate::error::WizardError;

/// Runner shared between the test screen and its countdown task.
pub type SharedRunner = Arc<Mutex<TestRunner>>;

/// Banner shown when the chapter list cannot be fetched.
pub const CHAPTERS_FAILED: &str = "Failed to load chapters";
/// Banner shown when test generation fails.
pub const CREATE_TEST_FAILED: &str = "Failed to create test. Please try again.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WizardStep {
    #[default]
    Subject,
    Class,
    Chapters,
    Subtopics,
    Configure,
    Test,
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WizardStep::Subject => "subject",
            WizardStep::Class => "class",
            WizardStep::Chapters => "chapters",
            WizardStep::Subtopics => "subtopics",
            WizardStep::Configure => "configure",
            WizardStep::Test => "test",
        };
        f.write_str(name)
    }
}

/// Chapter list of the subject and class being browsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ChapterList {
    #[default]
    Idle,
    Loading,
    Loaded(Vec<Chapter>),
    Failed,
}

/// Test-creation wizard: picks chapters across subjects and classes,
/// configures the test, and holds the running test.
///
/// Transitions are synchronous; the services layer performs the network
/// calls and feeds their outcome back through `chapters_loaded`,
/// `test_created` and `test_creation_failed`. Every failed transition sets
/// the error banner, every successful one clears it.
#[derive(Debug, Default)]
pub struct TestWizard {
    step: WizardStep,
    subject: Option<Subject>,
    class: ClassLevel,
    chapters: ChapterList,
    chapter: Option<Chapter>,
    subtopics: Vec<Subtopic>,
    picked: BTreeSet<SubtopicId>,
    selections: Vec<Selection>,
    config: TestConfiguration,
    runner: Option<SharedRunner>,
    error: Option<String>,
}

impl TestWizard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn step(&self) -> WizardStep {
        self.step
    }

    #[must_use]
    pub fn subject(&self) -> Option<Subject> {
        self.subject
    }

    #[must_use]
    pub fn class(&self) -> ClassLevel {
        self.class
    }

    #[must_use]
    pub fn subject_code(&self) -> Option<SubjectCode> {
        self.subject.map(|subject| SubjectCode::new(subject, self.class))
    }

    #[must_use]
    pub fn chapters(&self) -> &ChapterList {
        &self.chapters
    }

    #[must_use]
    pub fn chapter(&self) -> Option<&Chapter> {
        self.chapter.as_ref()
    }

    #[must_use]
    pub fn subtopics(&self) -> &[Subtopic] {
        &self.subtopics
    }

    #[must_use]
    pub fn is_subtopic_selected(&self, id: SubtopicId) -> bool {
        self.picked.contains(&id)
    }

    #[must_use]
    pub fn selected_subtopic_count(&self) -> usize {
        self.picked.len()
    }

    #[must_use]
    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    #[must_use]
    pub fn config(&self) -> &TestConfiguration {
        &self.config
    }

    #[must_use]
    pub fn runner(&self) -> Option<SharedRunner> {
        self.runner.clone()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    //
    // ─── HELPERS ───────────────────────────────────────────────────────────────
    //

    fn fail<T>(&mut self, err: WizardError) -> Result<T, WizardError> {
        self.error = Some(err.to_string());
        Err(err)
    }

    fn expect_step(&mut self, step: WizardStep) -> Result<(), WizardError> {
        if self.step == step {
            Ok(())
        } else {
            self.fail(WizardError::WrongStep(self.step))
        }
    }

    fn succeed(&mut self, step: WizardStep) {
        self.step = step;
        self.error = None;
    }

    fn clear_working_state(&mut self) {
        self.subject = None;
        self.chapters = ChapterList::Idle;
        self.chapter = None;
        self.subtopics.clear();
        self.picked.clear();
    }

    //
    // ─── SELECTION ─────────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// Returns `WizardError::WrongStep` outside the subject step.
    pub fn select_subject(&mut self, subject: Subject) -> Result<(), WizardError> {
        self.expect_step(WizardStep::Subject)?;
        self.subject = Some(subject);
        self.succeed(WizardStep::Class);
        Ok(())
    }

    /// Pick the class level and move to the chapter list, which starts
    /// loading. Returns the subject code whose chapters must be fetched.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::WrongStep` outside the class step.
    pub fn select_class(&mut self, class: ClassLevel) -> Result<SubjectCode, WizardError> {
        self.expect_step(WizardStep::Class)?;
        let Some(subject) = self.subject else {
            return self.fail(WizardError::NoSubject);
        };
        self.class = class;
        self.chapters = ChapterList::Loading;
        self.succeed(WizardStep::Chapters);
        Ok(SubjectCode::new(subject, class))
    }

    /// Put the chapter list back into loading for another fetch attempt.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::WrongStep` outside the chapters step.
    pub fn retry_chapters(&mut self) -> Result<SubjectCode, WizardError> {
        self.expect_step(WizardStep::Chapters)?;
        let Some(code) = self.subject_code() else {
            return self.fail(WizardError::NoSubject);
        };
        self.chapters = ChapterList::Loading;
        self.error = None;
        Ok(code)
    }

    /// Deliver the outcome of a chapter fetch; `Err` carries the banner text.
    ///
    /// Results arriving when no fetch is pending are dropped. The step does
    /// not change either way.
    pub fn chapters_loaded(&mut self, result: Result<Vec<Chapter>, String>) {
        if self.chapters != ChapterList::Loading {
            return;
        }
        match result {
            Ok(chapters) => {
                self.chapters = ChapterList::Loaded(chapters);
                self.error = None;
            }
            Err(banner) => {
                self.chapters = ChapterList::Failed;
                self.error = Some(banner);
            }
        }
    }

    /// Open the chapter at `index` of the loaded list and parse its subtopics.
    ///
    /// # Errors
    ///
    /// Returns `WizardError` outside the chapters step, before the list has
    /// loaded, or for an index past the end.
    pub fn select_chapter(&mut self, index: usize) -> Result<(), WizardError> {
        self.expect_step(WizardStep::Chapters)?;
        let ChapterList::Loaded(chapters) = &self.chapters else {
            return self.fail(WizardError::ChaptersNotLoaded);
        };
        let Some(chapter) = chapters.get(index).cloned() else {
            return self.fail(WizardError::UnknownChapter(index));
        };
        self.subtopics = chapter.subtopics();
        self.chapter = Some(chapter);
        self.picked.clear();
        self.succeed(WizardStep::Subtopics);
        Ok(())
    }

    /// Flip one subtopic; returns whether it is now selected.
    ///
    /// # Errors
    ///
    /// Returns `WizardError` outside the subtopics step or for an id the
    /// chapter does not list.
    pub fn toggle_subtopic(&mut self, id: SubtopicId) -> Result<bool, WizardError> {
        self.expect_step(WizardStep::Subtopics)?;
        if !self.subtopics.iter().any(|t| t.id == id) {
            return self.fail(WizardError::UnknownSubtopic(id));
        }
        let selected = if self.picked.remove(&id) {
            false
        } else {
            self.picked.insert(id);
            true
        };
        self.error = None;
        Ok(selected)
    }

    /// Select every subtopic, or clear them all when all are already selected.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::WrongStep` outside the subtopics step.
    pub fn toggle_all_subtopics(&mut self) -> Result<(), WizardError> {
        self.expect_step(WizardStep::Subtopics)?;
        if self.picked.len() == self.subtopics.len() {
            self.picked.clear();
        } else {
            self.picked = self.subtopics.iter().map(|t| t.id).collect();
        }
        self.error = None;
        Ok(())
    }

    /// Append the current chapter and its picked subtopics to the test, then
    /// start over at the subject step for the next pick.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::NoSubtopicsSelected` when nothing is picked.
    pub fn add_to_test(&mut self) -> Result<(), WizardError> {
        self.expect_step(WizardStep::Subtopics)?;
        if self.picked.is_empty() {
            return self.fail(WizardError::NoSubtopicsSelected);
        }
        let (Some(subject), Some(chapter)) = (self.subject, self.chapter.take()) else {
            return self.fail(WizardError::NoSubject);
        };
        let subtopics = self
            .subtopics
            .iter()
            .filter(|t| self.picked.contains(&t.id))
            .cloned()
            .collect();
        self.selections.push(Selection {
            subject,
            class: self.class,
            chapter,
            subtopics,
        });
        self.clear_working_state();
        self.succeed(WizardStep::Subject);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `WizardError` while a test runs or for an index past the end.
    pub fn remove_selection(&mut self, index: usize) -> Result<Selection, WizardError> {
        if self.step == WizardStep::Test {
            return self.fail(WizardError::WrongStep(self.step));
        }
        if index >= self.selections.len() {
            return self.fail(WizardError::UnknownSelection(index));
        }
        self.error = None;
        Ok(self.selections.remove(index))
    }

    /// Step back along the chain; no-op on the subject and test steps.
    pub fn back(&mut self) -> WizardStep {
        let previous = match self.step {
            WizardStep::Class | WizardStep::Configure => WizardStep::Subject,
            WizardStep::Chapters => WizardStep::Class,
            WizardStep::Subtopics => WizardStep::Chapters,
            step @ (WizardStep::Subject | WizardStep::Test) => step,
        };
        self.succeed(previous);
        self.step
    }

    //
    // ─── CONFIGURATION ─────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// Returns `WizardError::NoSelections` when no chapter was added.
    pub fn configure(&mut self) -> Result<(), WizardError> {
        self.expect_step(WizardStep::Subject)?;
        if self.selections.is_empty() {
            return self.fail(WizardError::NoSelections);
        }
        self.succeed(WizardStep::Configure);
        Ok(())
    }

    pub fn set_test_name(&mut self, name: impl Into<String>) {
        self.config.set_name(name);
    }

    /// # Errors
    ///
    /// Returns `WizardError::Config` for a count that is not offered.
    pub fn set_question_count(&mut self, count: u32) -> Result<(), WizardError> {
        match self.config.set_question_count(count) {
            Ok(()) => Ok(()),
            Err(err) => self.fail(err.into()),
        }
    }

    /// # Errors
    ///
    /// Returns `WizardError::Config` for a duration that is not offered.
    pub fn set_duration_minutes(&mut self, minutes: u32) -> Result<(), WizardError> {
        match self.config.set_duration_minutes(minutes) {
            Ok(()) => Ok(()),
            Err(err) => self.fail(err.into()),
        }
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.config.set_difficulty(difficulty);
    }

    pub fn set_exam_type(&mut self, exam_type: ExamType) {
        self.config.set_exam_type(exam_type);
    }

    /// Validate the configuration and build the generation request.
    ///
    /// # Errors
    ///
    /// Returns `WizardError` outside the configure step, without selections,
    /// or with a blank test name.
    pub fn prepare_test(&mut self) -> Result<CreateTestRequest, WizardError> {
        self.expect_step(WizardStep::Configure)?;
        if self.selections.is_empty() {
            return self.fail(WizardError::NoSelections);
        }
        if let Err(err) = self.config.validate() {
            return self.fail(err.into());
        }
        self.error = None;
        Ok(CreateTestRequest::build(&self.config, &self.selections))
    }

    /// Start the generated test.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::NoQuestions` for an empty question list; the
    /// wizard stays on the configure step.
    pub fn test_created(
        &mut self,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<SharedRunner, WizardError> {
        self.expect_step(WizardStep::Configure)?;
        if questions.is_empty() {
            return self.fail(WizardError::NoQuestions);
        }
        let runner = Arc::new(Mutex::new(TestRunner::new(
            self.config.name().trim(),
            questions,
            self.config.duration_minutes(),
            started_at,
        )));
        self.runner = Some(Arc::clone(&runner));
        self.succeed(WizardStep::Test);
        Ok(runner)
    }

    /// Stay on the configure step with `message` as the banner.
    pub fn test_creation_failed(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Discard every selection, the configuration, and any running test.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
