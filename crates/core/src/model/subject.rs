use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubjectParseError {
    #[error("unknown subject: {0}")]
    UnknownSubject(String),
    #[error("unknown class level: {0}")]
    UnknownClass(String),
    #[error("invalid subject code: {0}")]
    InvalidCode(String),
}

/// Subjects offered by the platform, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Physics,
    Chemistry,
    Botany,
    Zoology,
}

impl Subject {
    pub const ALL: [Subject; 4] = [
        Subject::Physics,
        Subject::Chemistry,
        Subject::Botany,
        Subject::Zoology,
    ];

    /// Lowercase wire name, as used in chapter and test-creation requests.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Subject::Physics => "physics",
            Subject::Chemistry => "chemistry",
            Subject::Botany => "botany",
            Subject::Zoology => "zoology",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Subject::Physics => "Physics",
            Subject::Chemistry => "Chemistry",
            Subject::Botany => "Botany",
            Subject::Zoology => "Zoology",
        }
    }

    /// Single-letter prefix used by question-bank subject codes (`p11`).
    #[must_use]
    pub fn code(self) -> char {
        match self {
            Subject::Physics => 'p',
            Subject::Chemistry => 'c',
            Subject::Botany => 'b',
            Subject::Zoology => 'z',
        }
    }

    fn from_code(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == c)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Subject {
    type Err = SubjectParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|subject| subject.slug() == lowered)
            .ok_or_else(|| SubjectParseError::UnknownSubject(s.to_string()))
    }
}

/// Class level of the syllabus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClassLevel {
    #[default]
    Eleven,
    Twelve,
}

impl ClassLevel {
    pub const ALL: [ClassLevel; 2] = [ClassLevel::Eleven, ClassLevel::Twelve];

    #[must_use]
    pub fn grade(self) -> u8 {
        match self {
            ClassLevel::Eleven => 11,
            ClassLevel::Twelve => 12,
        }
    }
}

impl fmt::Display for ClassLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.grade())
    }
}

impl FromStr for ClassLevel {
    type Err = SubjectParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "11" => Ok(ClassLevel::Eleven),
            "12" => Ok(ClassLevel::Twelve),
            other => Err(SubjectParseError::UnknownClass(other.to_string())),
        }
    }
}

impl Serialize for ClassLevel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.grade())
    }
}

impl<'de> Deserialize<'de> for ClassLevel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let grade = u8::deserialize(deserializer)?;
        match grade {
            11 => Ok(ClassLevel::Eleven),
            12 => Ok(ClassLevel::Twelve),
            other => Err(serde::de::Error::custom(format!(
                "unknown class level: {other}"
            ))),
        }
    }
}

/// Subject plus class level, written `p11`, `c12`, ... in the question bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectCode {
    pub subject: Subject,
    pub class: ClassLevel,
}

impl SubjectCode {
    #[must_use]
    pub fn new(subject: Subject, class: ClassLevel) -> Self {
        Self { subject, class }
    }

    /// Key understood by the chapter lookup endpoint, e.g. `physics_11`.
    #[must_use]
    pub fn chapter_query(self) -> String {
        format!("{}_{}", self.subject.slug(), self.class)
    }
}

impl fmt::Display for SubjectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.subject.code(), self.class)
    }
}

impl FromStr for SubjectCode {
    type Err = SubjectParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let subject = chars
            .next()
            .map(|c| c.to_ascii_lowercase())
            .and_then(Subject::from_code)
            .ok_or_else(|| SubjectParseError::InvalidCode(s.to_string()))?;
        let class = chars
            .as_str()
            .parse::<ClassLevel>()
            .map_err(|_| SubjectParseError::InvalidCode(s.to_string()))?;
        Ok(Self { subject, class })
    }
}
