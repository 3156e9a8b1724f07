use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::chapter::{Chapter, Subtopic};
use crate::model::subject::{ClassLevel, Subject};

/// Question counts offered when configuring a test.
pub const QUESTION_COUNT_OPTIONS: [u32; 4] = [15, 30, 45, 60];

/// Durations (minutes) offered when configuring a test.
pub const DURATION_OPTIONS: [u32; 4] = [30, 60, 90, 120];

/// One chapter picked for a test, with the chosen subset of its subtopics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub subject: Subject,
    pub class: ClassLevel,
    pub chapter: Chapter,
    pub subtopics: Vec<Subtopic>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamType {
    #[default]
    Neet,
    Aipmt,
    Aiims,
}

impl std::str::FromStr for Difficulty {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(ConfigError::UnknownDifficulty(s.to_string())),
        }
    }
}

impl std::str::FromStr for ExamType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "neet" => Ok(Self::Neet),
            "aipmt" => Ok(Self::Aipmt),
            "aiims" => Ok(Self::Aiims),
            _ => Err(ConfigError::UnknownExamType(s.to_string())),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("test name cannot be empty")]
    EmptyName,
    #[error("unsupported question count: {0}")]
    QuestionCount(u32),
    #[error("unsupported duration: {0} minutes")]
    Duration(u32),
    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
    #[error("unknown exam type: {0}")]
    UnknownExamType(String),
}

/// Parameters of a test about to be generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestConfiguration {
    name: String,
    question_count: u32,
    duration_minutes: u32,
    difficulty: Difficulty,
    exam_type: ExamType,
}

impl Default for TestConfiguration {
    fn default() -> Self {
        Self {
            name: String::new(),
            question_count: 30,
            duration_minutes: 60,
            difficulty: Difficulty::default(),
            exam_type: ExamType::default(),
        }
    }
}

impl TestConfiguration {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn exam_type(&self) -> ExamType {
        self.exam_type
    }

    /// The name is stored as typed; trimming happens in `validate`.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// # Errors
    ///
    /// Returns `ConfigError::QuestionCount` for values outside `QUESTION_COUNT_OPTIONS`.
    pub fn set_question_count(&mut self, count: u32) -> Result<(), ConfigError> {
        if !QUESTION_COUNT_OPTIONS.contains(&count) {
            return Err(ConfigError::QuestionCount(count));
        }
        self.question_count = count;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Duration` for values outside `DURATION_OPTIONS`.
    pub fn set_duration_minutes(&mut self, minutes: u32) -> Result<(), ConfigError> {
        if !DURATION_OPTIONS.contains(&minutes) {
            return Err(ConfigError::Duration(minutes));
        }
        self.duration_minutes = minutes;
        Ok(())
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    pub fn set_exam_type(&mut self, exam_type: ExamType) {
        self.exam_type = exam_type;
    }

    /// Check the configuration is ready for submission.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyName` if the name is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_offered_options() {
        let config = TestConfiguration::default();
        assert_eq!(config.question_count(), 30);
        assert_eq!(config.duration_minutes(), 60);
        assert_eq!(config.difficulty(), Difficulty::Medium);
        assert_eq!(config.exam_type(), ExamType::Neet);
        assert!(QUESTION_COUNT_OPTIONS.contains(&config.question_count()));
        assert!(DURATION_OPTIONS.contains(&config.duration_minutes()));
    }

    #[test]
    fn rejects_unsupported_counts_and_durations() {
        let mut config = TestConfiguration::default();
        assert_eq!(
            config.set_question_count(20),
            Err(ConfigError::QuestionCount(20))
        );
        assert_eq!(config.set_duration_minutes(45), Err(ConfigError::Duration(45)));
        assert_eq!(config.question_count(), 30);

        config.set_question_count(15).unwrap();
        config.set_duration_minutes(120).unwrap();
        assert_eq!(config.question_count(), 15);
        assert_eq!(config.duration_minutes(), 120);
    }

    #[test]
    fn blank_name_fails_validation() {
        let mut config = TestConfiguration::default();
        assert_eq!(config.validate(), Err(ConfigError::EmptyName));
        config.set_name("   ");
        assert_eq!(config.validate(), Err(ConfigError::EmptyName));
        config.set_name("Mock 1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn enums_parse_from_cli_text() {
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!("aiims".parse::<ExamType>().unwrap(), ExamType::Aiims);
        assert!("jee".parse::<ExamType>().is_err());
    }
}
