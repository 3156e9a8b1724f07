use serde::{Deserialize, Serialize};

use crate::model::ids::{ChapterId, SubtopicId};

/// A chapter as listed by the content service for one subject and class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub row_id: u64,
    pub chapter_id: ChapterId,
    pub name: String,
    pub most_wanted_total: u32,
    pub previous_year_total: u32,
    pub subject_id: String,
    /// Raw subtopic list as delivered, e.g. `"['1.Units', '2.Errors']"`.
    pub subtopic_source: String,
    pub total_questions: u32,
}

impl Chapter {
    /// Subtopics parsed from `subtopic_source`.
    #[must_use]
    pub fn subtopics(&self) -> Vec<Subtopic> {
        parse_subtopics(&self.subtopic_source)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtopic {
    pub id: SubtopicId,
    pub name: String,
}

/// Parse the delimited subtopic field of a chapter record.
///
/// The field is usually a Python-style list literal with single quotes. When
/// that does not parse as a JSON array of strings, brackets and quotes are
/// stripped and the remainder is split on commas. Ids are assigned 1..=n.
#[must_use]
pub fn parse_subtopics(source: &str) -> Vec<Subtopic> {
    let names = parse_list_literal(source).unwrap_or_else(|| split_fallback(source));

    names
        .into_iter()
        .zip(1_u32..)
        .map(|(name, id)| Subtopic {
            id: SubtopicId::new(id),
            name,
        })
        .collect()
}

fn parse_list_literal(source: &str) -> Option<Vec<String>> {
    let normalized = source.replace('\'', "\"");
    serde_json::from_str::<Vec<String>>(&normalized).ok()
}

fn split_fallback(source: &str) -> Vec<String> {
    source
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '\'' | '"'))
        .collect::<String>()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
