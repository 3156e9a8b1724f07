use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;

/// Canonical multiple-choice question, after wire normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub solution: Option<String>,
    pub exam_type: String,
    pub exam_year: String,
}

impl Question {
    /// Answers are compared verbatim against the correct option text.
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer
    }

    /// Letter label (`A`..) of the correct option, if it is among the options.
    #[must_use]
    pub fn correct_label(&self) -> Option<char> {
        self.options
            .iter()
            .position(|opt| *opt == self.correct_answer)
            .and_then(option_label)
    }

    /// Option text for a letter label, case-insensitive.
    #[must_use]
    pub fn option_by_label(&self, label: char) -> Option<&str> {
        let index = (label.to_ascii_uppercase() as usize).checked_sub('A' as usize)?;
        self.options.get(index).map(String::as_str)
    }
}

/// `0 -> 'A'`, `1 -> 'B'`, ...
#[must_use]
pub fn option_label(index: usize) -> Option<char> {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| char::from(b'A' + i))
}
