use std::collections::HashMap;

use chrono::{DateTime, Utc};
use prep_core::model::{Question, QuestionId, TestResult};

/// Remaining time at which the countdown turns to a warning.
pub const WARNING_THRESHOLD_SECS: u32 = 600;
/// Remaining time at which the countdown turns critical.
pub const CRITICAL_THRESHOLD_SECS: u32 = 300;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Result of a submission attempt.
///
/// Only `Submitted` should trigger completion handling; every later attempt,
/// manual or timer-driven, sees `AlreadySubmitted` with the original result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted(TestResult),
    AlreadySubmitted(TestResult),
}

impl SubmitOutcome {
    #[must_use]
    pub fn result(&self) -> &TestResult {
        match self {
            SubmitOutcome::Submitted(result) | SubmitOutcome::AlreadySubmitted(result) => result,
        }
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Time remains.
    Running,
    /// This tick used up the last second and submitted the test.
    Expired(SubmitOutcome),
    /// The test was already submitted; the countdown should stop.
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Normal,
    Warning,
    Critical,
}

/// Palette state of one question. `Marked` wins over the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteStatus {
    Unseen,
    Seen,
    Attempted,
    Marked,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaletteCounts {
    pub unseen: usize,
    pub seen: usize,
    pub attempted: usize,
    pub marked: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub statuses: Vec<PaletteStatus>,
    pub counts: PaletteCounts,
}

//
// ─── RUNNER ────────────────────────────────────────────────────────────────────
//

/// A generated test being answered.
///
/// Remaining time is counted in ticks rather than derived from the wall
/// clock, so the countdown can be driven deterministically.
#[derive(Debug, Clone)]
pub struct TestRunner {
    name: String,
    questions: Vec<Question>,
    index: usize,
    answers: HashMap<QuestionId, String>,
    seen: Vec<bool>,
    marked: Vec<bool>,
    duration_secs: u32,
    remaining_secs: u32,
    started_at: DateTime<Utc>,
    submitted: Option<(TestResult, DateTime<Utc>)>,
}

impl TestRunner {
    /// Start a test; the first question counts as seen.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        questions: Vec<Question>,
        duration_minutes: u32,
        started_at: DateTime<Utc>,
    ) -> Self {
        let count = questions.len();
        let mut seen = vec![false; count];
        if let Some(first) = seen.first_mut() {
            *first = true;
        }
        let duration_secs = duration_minutes.saturating_mul(60);
        Self {
            name: name.into(),
            questions,
            index: 0,
            answers: HashMap::new(),
            seen,
            marked: vec![false; count],
            duration_secs,
            remaining_secs: duration_secs,
            started_at,
            submitted: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.index)
    }

    #[must_use]
    pub fn answer_for(&self, id: &QuestionId) -> Option<&str> {
        self.answers.get(id).map(String::as_str)
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u32 {
        self.duration_secs - self.remaining_secs
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.submitted.is_some()
    }

    #[must_use]
    pub fn result(&self) -> Option<&TestResult> {
        self.submitted.as_ref().map(|(result, _)| result)
    }

    #[must_use]
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted.as_ref().map(|(_, at)| *at)
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// Advance one question; no-op on the last one.
    pub fn next(&mut self) -> usize {
        if self.index + 1 < self.questions.len() {
            self.visit(self.index + 1);
        }
        self.index
    }

    /// Go back one question; no-op on the first one.
    pub fn previous(&mut self) -> usize {
        if self.index > 0 {
            self.visit(self.index - 1);
        }
        self.index
    }

    /// Jump to `index`; out-of-range positions are ignored.
    pub fn jump(&mut self, index: usize) -> usize {
        if index < self.questions.len() {
            self.visit(index);
        }
        self.index
    }

    fn visit(&mut self, index: usize) {
        self.index = index;
        self.seen[index] = true;
    }

    //
    // ─── ANSWERS ───────────────────────────────────────────────────────────────
    //

    /// Record `option` for the current question, replacing an earlier choice.
    ///
    /// Returns `false` once the test has been submitted.
    pub fn select_answer(&mut self, option: impl Into<String>) -> bool {
        if self.is_submitted() {
            return false;
        }
        let Some(question) = self.questions.get(self.index) else {
            return false;
        };
        self.answers.insert(question.id.clone(), option.into());
        true
    }

    /// Flip the review mark on the current question; returns the new mark.
    pub fn toggle_mark(&mut self) -> bool {
        let Some(mark) = self.marked.get_mut(self.index) else {
            return false;
        };
        *mark = !*mark;
        *mark
    }

    #[must_use]
    pub fn palette(&self) -> Palette {
        let mut counts = PaletteCounts::default();
        let statuses = self
            .questions
            .iter()
            .enumerate()
            .map(|(i, question)| {
                if self.marked[i] {
                    counts.marked += 1;
                    PaletteStatus::Marked
                } else if self.answers.contains_key(&question.id) {
                    counts.attempted += 1;
                    PaletteStatus::Attempted
                } else if self.seen[i] {
                    counts.seen += 1;
                    PaletteStatus::Seen
                } else {
                    counts.unseen += 1;
                    PaletteStatus::Unseen
                }
            })
            .collect();
        Palette { statuses, counts }
    }

    //
    // ─── TIME AND SUBMISSION ───────────────────────────────────────────────────
    //

    /// Consume one second. Reaching zero submits through the same path as a
    /// manual submission.
    pub fn tick(&mut self, at: DateTime<Utc>) -> Tick {
        if self.is_submitted() {
            return Tick::Idle;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            return Tick::Expired(self.submit(at));
        }
        Tick::Running
    }

    /// Score the test once; later calls return the stored result untouched.
    pub fn submit(&mut self, at: DateTime<Utc>) -> SubmitOutcome {
        if let Some((result, _)) = self.submitted {
            return SubmitOutcome::AlreadySubmitted(result);
        }
        let result = TestResult::score(&self.questions, &self.answers, self.time_spent_secs());
        self.submitted = Some((result, at));
        SubmitOutcome::Submitted(result)
    }

    /// `MM:SS`, or `HH:MM:SS` from one hour up.
    #[must_use]
    pub fn format_remaining(&self) -> String {
        let hours = self.remaining_secs / 3600;
        let minutes = (self.remaining_secs % 3600) / 60;
        let seconds = self.remaining_secs % 60;
        if hours > 0 {
            format!("{hours:02}:{minutes:02}:{seconds:02}")
        } else {
            format!("{minutes:02}:{seconds:02}")
        }
    }

    #[must_use]
    pub fn urgency(&self) -> Urgency {
        match self.remaining_secs {
            s if s <= CRITICAL_THRESHOLD_SECS => Urgency::Critical,
            s if s <= WARNING_THRESHOLD_SECS => Urgency::Warning,
            _ => Urgency::Normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::time::fixed_now;

    fn question(id: usize) -> Question {
        Question {
            id: QuestionId::new(format!("q{id}")),
            prompt: format!("prompt {id}"),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: "a".into(),
            solution: None,
            exam_type: "NEET".into(),
            exam_year: "2020".into(),
        }
    }

    fn runner(count: usize, minutes: u32) -> TestRunner {
        TestRunner::new("Mock", (0..count).map(question).collect(), minutes, fixed_now())
    }

    #[test]
    fn navigation_clamps_at_both_ends() {
        let mut runner = runner(3, 30);
        assert_eq!(runner.previous(), 0);
        assert_eq!(runner.next(), 1);
        assert_eq!(runner.next(), 2);
        assert_eq!(runner.next(), 2);
        assert_eq!(runner.jump(7), 2);
        assert_eq!(runner.jump(0), 0);
    }

    #[test]
    fn palette_tracks_seen_attempted_and_marked() {
        let mut runner = runner(4, 30);
        runner.select_answer("a");
        runner.next();
        runner.toggle_mark();
        runner.next();

        let palette = runner.palette();
        assert_eq!(
            palette.statuses,
            vec![
                PaletteStatus::Attempted,
                PaletteStatus::Marked,
                PaletteStatus::Seen,
                PaletteStatus::Unseen,
            ]
        );
        assert_eq!(
            palette.counts,
            PaletteCounts {
                unseen: 1,
                seen: 1,
                attempted: 1,
                marked: 1,
            }
        );

        runner.previous();
        assert!(!runner.toggle_mark());
        assert_eq!(runner.palette().statuses[1], PaletteStatus::Seen);
    }

    #[test]
    fn reanswering_overwrites_until_submitted() {
        let mut runner = runner(1, 30);
        assert!(runner.select_answer("b"));
        assert!(runner.select_answer("a"));
        assert_eq!(runner.answer_for(&QuestionId::new("q0")), Some("a"));

        runner.submit(fixed_now());
        assert!(!runner.select_answer("c"));
        assert_eq!(runner.answer_for(&QuestionId::new("q0")), Some("a"));
    }

    #[test]
    fn second_submit_returns_unchanged_result() {
        let mut runner = runner(2, 30);
        runner.select_answer("a");
        let first = runner.submit(fixed_now());
        assert!(first.is_first());

        runner.tick(fixed_now());
        let second = runner.submit(fixed_now());
        assert_eq!(second, SubmitOutcome::AlreadySubmitted(*first.result()));
        assert_eq!(runner.tick(fixed_now()), Tick::Idle);
    }

    #[test]
    fn countdown_expires_into_submission() {
        let mut runner = runner(2, 1);
        for _ in 0..59 {
            assert_eq!(runner.tick(fixed_now()), Tick::Running);
        }
        let Tick::Expired(outcome) = runner.tick(fixed_now()) else {
            panic!("expected expiry");
        };
        assert!(outcome.is_first());
        assert_eq!(outcome.result().time_spent_secs, 60);
        assert_eq!(runner.submit(fixed_now()), SubmitOutcome::AlreadySubmitted(*outcome.result()));
    }

    #[test]
    fn remaining_time_formats_and_escalates() {
        let mut runner = runner(1, 120);
        assert_eq!(runner.format_remaining(), "02:00:00");
        assert_eq!(runner.urgency(), Urgency::Normal);

        for _ in 0..(7200 - 600) {
            runner.tick(fixed_now());
        }
        assert_eq!(runner.format_remaining(), "10:00");
        assert_eq!(runner.urgency(), Urgency::Warning);

        for _ in 0..300 {
            runner.tick(fixed_now());
        }
        assert_eq!(runner.urgency(), Urgency::Critical);
        assert_eq!(runner.time_spent_secs(), 6900);
    }
}
