//! Raw records as the content service sends them.
//!
//! Field names differ between endpoints, so every accepted variant is
//! deserialized here and collapsed into a canonical model type exactly once.

use prep_core::model::{Chapter, ChapterId, Question, QuestionId};
use serde::Deserialize;

/// A scalar the service sends either quoted or bare.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

impl TextOrNumber {
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            TextOrNumber::Text(text) => text.trim().to_string(),
            TextOrNumber::Number(number) => number.to_string(),
        }
    }

    /// Non-negative count; anything unparseable reads as zero.
    #[must_use]
    pub fn as_count(&self) -> u32 {
        match self {
            TextOrNumber::Text(text) => text.trim().parse().unwrap_or(0),
            TextOrNumber::Number(number) => number
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0),
        }
    }
}

fn count(value: Option<&TextOrNumber>) -> u32 {
    value.map_or(0, TextOrNumber::as_count)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WireQuestion {
    pub question_id: Option<TextOrNumber>,
    pub question: Option<String>,
    pub question_text: Option<String>,
    pub options: Option<Vec<String>>,
    pub option_a: Option<String>,
    pub option_b: Option<String>,
    pub option_c: Option<String>,
    pub option_d: Option<String>,
    pub correct_answer: Option<String>,
    pub correct_option: Option<String>,
    pub solution: Option<String>,
    pub explanation: Option<String>,
    pub exam_type: Option<String>,
    pub exam_year: Option<TextOrNumber>,
}

impl WireQuestion {
    /// Collapse the record into a `Question`.
    ///
    /// An `options` array wins when it is non-empty; otherwise the discrete
    /// `option_a..d` fields are used with blanks dropped. Canonical names
    /// (`question`, `correct_answer`, `solution`) win over their alternates
    /// unless missing or blank. Returns `None` for records without an id.
    #[must_use]
    pub fn normalize(self) -> Option<Question> {
        let id = self
            .question_id
            .map(TextOrNumber::into_text)
            .filter(|id| !id.is_empty())?;

        let options = match self.options {
            Some(options) if !options.is_empty() => options,
            _ => [self.option_a, self.option_b, self.option_c, self.option_d]
                .into_iter()
                .filter_map(non_blank)
                .collect(),
        };

        Some(Question {
            id: QuestionId::new(id),
            prompt: non_blank(self.question)
                .or_else(|| non_blank(self.question_text))
                .unwrap_or_default(),
            options,
            correct_answer: non_blank(self.correct_answer)
                .or_else(|| non_blank(self.correct_option))
                .unwrap_or_default(),
            solution: non_blank(self.solution).or_else(|| non_blank(self.explanation)),
            exam_type: self.exam_type.unwrap_or_default(),
            exam_year: self
                .exam_year
                .map(TextOrNumber::into_text)
                .unwrap_or_default(),
        })
    }
}

/// Normalize a batch, dropping records that cannot identify themselves.
pub(crate) fn normalize_questions(records: Vec<WireQuestion>) -> Vec<Question> {
    let received = records.len();
    let questions: Vec<Question> = records
        .into_iter()
        .filter_map(WireQuestion::normalize)
        .collect();
    if questions.len() < received {
        tracing::warn!(
            received,
            kept = questions.len(),
            "dropped question records without an id"
        );
    }
    questions
}

//
// ─── CHAPTERS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Deserialize)]
pub struct WireChapter {
    #[serde(rename = "ID", default)]
    pub row_id: Option<TextOrNumber>,
    pub chapter_id: TextOrNumber,
    #[serde(default)]
    pub chapter_name: Option<String>,
    #[serde(default)]
    pub mw_total_question: Option<TextOrNumber>,
    #[serde(default)]
    pub pyq_total_question: Option<TextOrNumber>,
    #[serde(default)]
    pub subject_id: Option<TextOrNumber>,
    #[serde(default)]
    pub subtopic_name: Option<String>,
    #[serde(default)]
    pub total_questions: Option<TextOrNumber>,
}

impl From<WireChapter> for Chapter {
    fn from(wire: WireChapter) -> Self {
        Chapter {
            row_id: wire
                .row_id
                .as_ref()
                .map_or(0, |id| u64::from(id.as_count())),
            chapter_id: ChapterId::new(wire.chapter_id.into_text()),
            name: wire.chapter_name.unwrap_or_default(),
            most_wanted_total: count(wire.mw_total_question.as_ref()),
            previous_year_total: count(wire.pyq_total_question.as_ref()),
            subject_id: wire
                .subject_id
                .map(TextOrNumber::into_text)
                .unwrap_or_default(),
            subtopic_source: wire.subtopic_name.unwrap_or_default(),
            total_questions: count(wire.total_questions.as_ref()),
        }
    }
}
