use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── KEYS ──────────────────────────────────────────────────────────────────────
//

/// Question pool a ledger document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PoolType {
    #[serde(rename = "most-wanted")]
    MostWanted,
    #[serde(rename = "previous-year")]
    PreviousYear,
}

impl PoolType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PoolType::MostWanted => "most-wanted",
            PoolType::PreviousYear => "previous-year",
        }
    }
}

impl fmt::Display for PoolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown question pool: {0}")]
pub struct ParsePoolError(String);

impl FromStr for PoolType {
    type Err = ParsePoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "most-wanted" | "mw" => Ok(PoolType::MostWanted),
            "previous-year" | "pyq" => Ok(PoolType::PreviousYear),
            other => Err(ParsePoolError(other.to_string())),
        }
    }
}

/// Address of one ledger document: one per (pool, subject, chapter).
///
/// Identifiers are kept as separate fields; storage adapters serialize the
/// whole tuple, so no separator character is reserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LedgerKey {
    pub pool: PoolType,
    pub subject_id: String,
    pub chapter_id: String,
}

impl LedgerKey {
    #[must_use]
    pub fn new(pool: PoolType, subject_id: impl Into<String>, chapter_id: impl Into<String>) -> Self {
        Self {
            pool,
            subject_id: subject_id.into(),
            chapter_id: chapter_id.into(),
        }
    }
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.pool, self.subject_id, self.chapter_id)
    }
}

//
// ─── ENTRIES ───────────────────────────────────────────────────────────────────
//

/// Progression of a question: `New < Seen < Attempted`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    #[default]
    New,
    Seen,
    Attempted,
}

impl fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            QuestionStatus::New => "new",
            QuestionStatus::Seen => "seen",
            QuestionStatus::Attempted => "attempted",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionState {
    pub question_id: QuestionId,
    pub status: QuestionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_option: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    #[serde(default)]
    pub is_bookmarked: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

//
// ─── DOCUMENT ──────────────────────────────────────────────────────────────────
//

/// All question states of one (pool, subject, chapter).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerDocument {
    entries: BTreeMap<QuestionId, QuestionState>,
}

impl LedgerDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: &QuestionId) -> Option<&QuestionState> {
        self.entries.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuestionState> {
        self.entries.values()
    }

    /// Overwrite the status, option and correctness of an entry.
    ///
    /// The bookmark flag of an existing entry is carried over untouched.
    pub fn record_status(
        &mut self,
        id: &QuestionId,
        status: QuestionStatus,
        selected_option: Option<String>,
        is_correct: Option<bool>,
        at: DateTime<Utc>,
    ) -> &QuestionState {
        let is_bookmarked = self.entries.get(id).is_some_and(|s| s.is_bookmarked);
        let state = QuestionState {
            question_id: id.clone(),
            status,
            selected_option,
            is_correct,
            is_bookmarked,
            timestamp: at,
        };
        self.entries.insert(id.clone(), state);
        &self.entries[id]
    }

    /// Flip the bookmark of an entry, creating it as `New` if absent.
    ///
    /// Returns the new bookmark value.
    pub fn toggle_bookmark(&mut self, id: &QuestionId, at: DateTime<Utc>) -> bool {
        let state = self
            .entries
            .entry(id.clone())
            .or_insert_with(|| QuestionState {
                question_id: id.clone(),
                status: QuestionStatus::New,
                selected_option: None,
                is_correct: None,
                is_bookmarked: false,
                timestamp: at,
            });
        state.is_bookmarked = !state.is_bookmarked;
        state.timestamp = at;
        state.is_bookmarked
    }

    #[must_use]
    pub fn bookmarked_ids(&self) -> Vec<QuestionId> {
        self.entries
            .values()
            .filter(|s| s.is_bookmarked)
            .map(|s| s.question_id.clone())
            .collect()
    }

    #[must_use]
    pub fn stats(&self) -> ChapterStats {
        self.entries
            .values()
            .fold(ChapterStats::default(), |mut stats, state| {
                stats.add(state);
                stats
            })
    }
}

//
// ─── STATS ─────────────────────────────────────────────────────────────────────
//

/// Per-status counts of a ledger document.
///
/// The total question count of a chapter is not known to the ledger; callers
/// combine these with the chapter's totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChapterStats {
    pub new: u32,
    pub seen: u32,
    pub attempted: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub bookmarked: u32,
}

impl ChapterStats {
    fn add(&mut self, state: &QuestionState) {
        if state.is_bookmarked {
            self.bookmarked += 1;
        }
        match state.status {
            QuestionStatus::New => self.new += 1,
            QuestionStatus::Seen => self.seen += 1,
            QuestionStatus::Attempted => {
                self.attempted += 1;
                match state.is_correct {
                    Some(true) => self.correct += 1,
                    Some(false) => self.incorrect += 1,
                    None => {}
                }
            }
        }
    }

    pub fn merge(&mut self, other: &ChapterStats) {
        self.new += other.new;
        self.seen += other.seen;
        self.attempted += other.attempted;
        self.correct += other.correct;
        self.incorrect += other.incorrect;
        self.bookmarked += other.bookmarked;
    }
}
