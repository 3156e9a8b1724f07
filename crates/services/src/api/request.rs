use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use prep_core::model::{
    ChapterId, ClassLevel, Difficulty, ExamType, Selection, Subject, SubjectCode, SubtopicId,
    TestConfiguration,
};
use serde::Serialize;
use thiserror::Error;

//
// ─── CREATE TEST ───────────────────────────────────────────────────────────────
//

/// Body of the test-generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTestRequest {
    pub test_name: String,
    pub no_of_questions: u32,
    pub test_duration: u32,
    pub difficulty_level: Difficulty,
    pub exam_type: ExamType,
    pub subjects: Vec<GradeGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradeGroup {
    pub grade: u8,
    pub subjects: Vec<SubjectGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectGroup {
    pub name: Subject,
    pub chapter_ids: Vec<ChapterRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRef {
    pub id: ChapterId,
    pub sub_topic_ids: Vec<SubtopicId>,
}

impl CreateTestRequest {
    /// Group `selections` by class level (ascending), then list every catalog
    /// subject for that level; subjects without a selection get no chapters.
    #[must_use]
    pub fn build(config: &TestConfiguration, selections: &[Selection]) -> Self {
        let mut by_class: BTreeMap<ClassLevel, Vec<&Selection>> = BTreeMap::new();
        for selection in selections {
            by_class.entry(selection.class).or_default().push(selection);
        }

        let subjects = by_class
            .into_iter()
            .map(|(class, picked)| GradeGroup {
                grade: class.grade(),
                subjects: Subject::ALL
                    .into_iter()
                    .map(|subject| SubjectGroup {
                        name: subject,
                        chapter_ids: picked
                            .iter()
                            .filter(|s| s.subject == subject)
                            .map(|s| ChapterRef {
                                id: s.chapter.chapter_id.clone(),
                                sub_topic_ids: s.subtopics.iter().map(|t| t.id).collect(),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            test_name: config.name().trim().to_string(),
            no_of_questions: config.question_count(),
            test_duration: config.duration_minutes(),
            difficulty_level: config.difficulty(),
            exam_type: config.exam_type(),
            subjects,
        }
    }
}

//
// ─── PREVIOUS-YEAR FILTERS ─────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FilterParseError {
    #[error("unknown exam filter: {0}")]
    Exam(String),
    #[error("unknown year range: {0}")]
    Years(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ExamFilter {
    #[default]
    All,
    Neet,
    Aipmt,
    Aiims,
}

impl ExamFilter {
    pub const ALL: [ExamFilter; 4] = [
        ExamFilter::All,
        ExamFilter::Neet,
        ExamFilter::Aipmt,
        ExamFilter::Aiims,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ExamFilter::All => "All",
            ExamFilter::Neet => "NEET",
            ExamFilter::Aipmt => "AIPMT",
            ExamFilter::Aiims => "AIIMS",
        }
    }

    /// Value sent to the service; `All` is expressed by omitting the field.
    #[must_use]
    pub fn request_value(self) -> Option<&'static str> {
        match self {
            ExamFilter::All => None,
            other => Some(other.label()),
        }
    }
}

impl fmt::Display for ExamFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ExamFilter {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FilterParseError::Exam(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum YearRange {
    #[default]
    AllYears,
    UpTo2000,
    From2001To2010,
    From2011To2015,
    From2016To2020,
    From2021,
}

impl YearRange {
    pub const ALL: [YearRange; 6] = [
        YearRange::AllYears,
        YearRange::UpTo2000,
        YearRange::From2001To2010,
        YearRange::From2011To2015,
        YearRange::From2016To2020,
        YearRange::From2021,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            YearRange::AllYears => "All Years",
            YearRange::UpTo2000 => "2000 & Before",
            YearRange::From2001To2010 => "2001 - 2010",
            YearRange::From2011To2015 => "2011 - 2015",
            YearRange::From2016To2020 => "2016 - 2020",
            YearRange::From2021 => "2021 & Onwards",
        }
    }

    #[must_use]
    pub fn request_value(self) -> Option<&'static str> {
        match self {
            YearRange::AllYears => None,
            other => Some(other.label()),
        }
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts the labels with any spacing or case (`"2001-2010"`, `"all years"`),
/// plus `all`.
impl FromStr for YearRange {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact = |text: &str| -> String {
            text.chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_lowercase()
        };
        let wanted = compact(s);
        if wanted == "all" {
            return Ok(YearRange::AllYears);
        }
        Self::ALL
            .into_iter()
            .find(|range| compact(range.label()) == wanted)
            .ok_or_else(|| FilterParseError::Years(s.to_string()))
    }
}

/// Question lookup for one chapter of the previous-year bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyqQuery {
    pub subject: SubjectCode,
    pub chapter_id: ChapterId,
    pub exam: ExamFilter,
    pub years: YearRange,
}

impl PyqQuery {
    #[must_use]
    pub fn new(subject: SubjectCode, chapter_id: ChapterId) -> Self {
        Self {
            subject,
            chapter_id,
            exam: ExamFilter::All,
            years: YearRange::AllYears,
        }
    }

    #[must_use]
    pub fn with_exam(mut self, exam: ExamFilter) -> Self {
        self.exam = exam;
        self
    }

    #[must_use]
    pub fn with_years(mut self, years: YearRange) -> Self {
        self.years = years;
        self
    }

    pub(crate) fn body(&self) -> PyqRequestBody<'_> {
        PyqRequestBody {
            subject_id: self.subject.to_string(),
            chapter_id: &self.chapter_id,
            exam_type: self.exam.request_value(),
            year_range: self.years.request_value(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PyqRequestBody<'a> {
    subject_id: String,
    chapter_id: &'a ChapterId,
    #[serde(skip_serializing_if = "Option::is_none")]
    exam_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    year_range: Option<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::model::{Chapter, Subtopic};
    use serde_json::json;

    fn chapter(id: &str) -> Chapter {
        Chapter {
            row_id: 1,
            chapter_id: ChapterId::new(id),
            name: id.to_string(),
            most_wanted_total: 0,
            previous_year_total: 0,
            subject_id: String::new(),
            subtopic_source: String::new(),
            total_questions: 0,
        }
    }

    fn selection(subject: Subject, class: ClassLevel, chapter_id: &str, ids: &[u32]) -> Selection {
        Selection {
            subject,
            class,
            chapter: chapter(chapter_id),
            subtopics: ids
                .iter()
                .map(|id| Subtopic {
                    id: SubtopicId::new(*id),
                    name: format!("topic {id}"),
                })
                .collect(),
        }
    }

    #[test]
    fn create_test_groups_by_class_then_catalog_subject() {
        let mut config = TestConfiguration::default();
        config.set_name(" Mock 1 ");
        config.set_question_count(15).unwrap();
        config.set_duration_minutes(30).unwrap();

        let selections = vec![
            selection(Subject::Zoology, ClassLevel::Twelve, "zoo12_04", &[1]),
            selection(Subject::Physics, ClassLevel::Eleven, "phy11_01", &[1, 3]),
            selection(Subject::Physics, ClassLevel::Eleven, "phy11_02", &[2]),
        ];

        let request = CreateTestRequest::build(&config, &selections);
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(
            body,
            json!({
                "testName": "Mock 1",
                "noOfQuestions": 15,
                "testDuration": 30,
                "difficultyLevel": "medium",
                "examType": "neet",
                "subjects": [
                    {
                        "grade": 11,
                        "subjects": [
                            { "name": "physics", "chapterIds": [
                                { "id": "phy11_01", "subTopicIds": [1, 3] },
                                { "id": "phy11_02", "subTopicIds": [2] }
                            ] },
                            { "name": "chemistry", "chapterIds": [] },
                            { "name": "botany", "chapterIds": [] },
                            { "name": "zoology", "chapterIds": [] }
                        ]
                    },
                    {
                        "grade": 12,
                        "subjects": [
                            { "name": "physics", "chapterIds": [] },
                            { "name": "chemistry", "chapterIds": [] },
                            { "name": "botany", "chapterIds": [] },
                            { "name": "zoology", "chapterIds": [
                                { "id": "zoo12_04", "subTopicIds": [1] }
                            ] }
                        ]
                    }
                ]
            })
        );
    }

    #[test]
    fn pyq_body_omits_all_filters() {
        let code: SubjectCode = "p11".parse().unwrap();
        let query = PyqQuery::new(code, ChapterId::new("phy11_01"));
        assert_eq!(
            serde_json::to_value(query.body()).unwrap(),
            json!({ "subjectId": "p11", "chapterId": "phy11_01" })
        );

        let filtered = query
            .with_exam(ExamFilter::Aiims)
            .with_years(YearRange::From2011To2015);
        assert_eq!(
            serde_json::to_value(filtered.body()).unwrap(),
            json!({
                "subjectId": "p11",
                "chapterId": "phy11_01",
                "examType": "AIIMS",
                "yearRange": "2011 - 2015"
            })
        );
    }

    #[test]
    fn filters_parse_loosely() {
        assert_eq!("neet".parse::<ExamFilter>().unwrap(), ExamFilter::Neet);
        assert_eq!("all".parse::<YearRange>().unwrap(), YearRange::AllYears);
        assert_eq!(
            "2016-2020".parse::<YearRange>().unwrap(),
            YearRange::From2016To2020
        );
        assert_eq!(
            "2021 & onwards".parse::<YearRange>().unwrap(),
            YearRange::From2021
        );
        assert!("1990s".parse::<YearRange>().is_err());
    }
}
