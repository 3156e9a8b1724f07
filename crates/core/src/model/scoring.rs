use std::collections::HashMap;

use serde::Serialize;

use crate::model::ids::QuestionId;
use crate::model::question::Question;

/// Score of a submitted test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TestResult {
    pub total: u32,
    pub attempted: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub unattempted: u32,
    pub percentage: u32,
    pub time_spent_secs: u32,
}

impl TestResult {
    /// Score `answers` against `questions`.
    ///
    /// Answers for ids that are not part of the test are ignored. The
    /// percentage is relative to attempted questions and rounds half up.
    #[must_use]
    pub fn score(
        questions: &[Question],
        answers: &HashMap<QuestionId, String>,
        time_spent_secs: u32,
    ) -> Self {
        let mut attempted = 0_u32;
        let mut correct = 0_u32;

        for question in questions {
            let Some(answer) = answers.get(&question.id) else {
                continue;
            };
            attempted = attempted.saturating_add(1);
            if question.is_correct(answer) {
                correct = correct.saturating_add(1);
            }
        }

        let total = u32::try_from(questions.len()).unwrap_or(u32::MAX);
        Self {
            total,
            attempted,
            correct,
            incorrect: attempted - correct,
            unattempted: total.saturating_sub(attempted),
            percentage: percentage(correct, attempted),
            time_spent_secs,
        }
    }
}

/// `round(correct / attempted * 100)` with halves rounded up; 0 when nothing was attempted.
#[must_use]
pub fn percentage(correct: u32, attempted: u32) -> u32 {
    if attempted == 0 {
        return 0;
    }
    let correct = u64::from(correct);
    let attempted = u64::from(attempted);
    let rounded = (correct * 200 + attempted) / (attempted * 2);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, correct: &str) -> Question {
        Question {
            id: QuestionId::new(id),
            prompt: format!("prompt {id}"),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: correct.into(),
            solution: None,
            exam_type: String::new(),
            exam_year: String::new(),
        }
    }

    #[test]
    fn percentage_rounds_half_up_and_guards_zero() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(3, 4), 75);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(10, 12), 83);
    }

    #[test]
    fn score_counts_attempted_and_correct() {
        let questions = vec![question("1", "a"), question("2", "b"), question("3", "c")];
        let mut answers = HashMap::new();
        answers.insert(QuestionId::new("1"), "a".to_string());
        answers.insert(QuestionId::new("2"), "c".to_string());
        answers.insert(QuestionId::new("other"), "a".to_string());

        let result = TestResult::score(&questions, &answers, 120);

        assert_eq!(result.total, 3);
        assert_eq!(result.attempted, 2);
        assert_eq!(result.correct, 1);
        assert_eq!(result.incorrect, 1);
        assert_eq!(result.unattempted, 1);
        assert_eq!(result.percentage, 50);
        assert_eq!(result.time_spent_secs, 120);
    }

    #[test]
    fn empty_answers_score_zero() {
        let questions = vec![question("1", "a")];
        let result = TestResult::score(&questions, &HashMap::new(), 0);
        assert_eq!(result.attempted, 0);
        assert_eq!(result.unattempted, 1);
        assert_eq!(result.percentage, 0);
    }
}
