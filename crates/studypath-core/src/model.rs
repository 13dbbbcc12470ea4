//! Core data model types for studypath.
//!
//! Row types mirror the hosted backend's tables; the backend owns the schema
//! and these structs are the typed view the rest of the system works with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Score at which a pathway node counts as mastered.
pub const MASTERY_THRESHOLD: u32 = 10;

/// Points awarded for a correct quiz slot answer.
pub const QUIZ_SLOT_POINTS: u32 = 5;

/// Quiz slots per lecture segment.
pub const QUIZ_SLOTS_PER_SEGMENT: usize = 2;

/// Node identifier for a segment, as used in score maps and pathways.
pub fn segment_node_id(sequence_number: u32) -> String {
    format!("segment_{sequence_number}")
}

/// A single node in a learning pathway.
///
/// Immutable once loaded; availability is always derived from the score map,
/// never stored on the node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonNode {
    /// Unique identifier (e.g. "segment_3").
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// What kind of node this is.
    pub kind: NodeKind,
    /// Difficulty tier shown to the learner.
    pub difficulty: Difficulty,
    /// Identifiers of nodes that must be mastered before this one unlocks.
    #[serde(default)]
    pub prerequisites: Vec<String>,
    /// XP awarded for full mastery.
    pub points: u32,
    /// Short description.
    #[serde(default)]
    pub description: String,
}

/// Kind of pathway node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Concept,
    Quiz,
    Challenge,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Concept => write!(f, "concept"),
            NodeKind::Quiz => write!(f, "quiz"),
            NodeKind::Challenge => write!(f, "challenge"),
        }
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "concept" => Ok(NodeKind::Concept),
            "quiz" => Ok(NodeKind::Quiz),
            "challenge" => Ok(NodeKind::Challenge),
            other => Err(format!("unknown node kind: {other}")),
        }
    }
}

/// Difficulty tier of a pathway node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Beginner => write!(f, "beginner"),
            Difficulty::Intermediate => write!(f, "intermediate"),
            Difficulty::Advanced => write!(f, "advanced"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// A course row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub course_code: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A lecture row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lecture {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub course_id: Option<i64>,
    pub title: String,
    /// Full lecture text, once processed.
    #[serde(default)]
    pub content: Option<String>,
    /// Storage path of the uploaded source document.
    #[serde(default)]
    pub pdf_path: Option<String>,
    #[serde(default)]
    pub original_language: Option<String>,
}

/// A lecture segment row: one unit of the learning pathway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LectureSegment {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub lecture_id: Option<i64>,
    /// Position of the segment within its lecture, starting at 1.
    pub sequence_number: u32,
    pub title: String,
    #[serde(default, rename = "segment_description")]
    pub description: String,
}

/// Generated teaching content for one segment: two theory slides and two
/// quiz slots. The row is flat because the backend stores it that way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentContent {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub lecture_id: Option<i64>,
    pub sequence_number: u32,
    #[serde(default)]
    pub theory_slide_1: String,
    #[serde(default)]
    pub theory_slide_2: String,
    #[serde(default)]
    pub quiz_1_type: String,
    #[serde(default)]
    pub quiz_1_question: String,
    #[serde(default)]
    pub quiz_1_options: Option<Vec<String>>,
    #[serde(default)]
    pub quiz_1_correct_answer: String,
    #[serde(default)]
    pub quiz_1_explanation: String,
    #[serde(default)]
    pub quiz_2_type: String,
    #[serde(default)]
    pub quiz_2_question: String,
    #[serde(default)]
    pub quiz_2_correct_answer: bool,
    #[serde(default)]
    pub quiz_2_explanation: String,
}

/// Accumulated mastery score for one segment of one lecture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub lecture_id: Option<i64>,
    pub segment_number: u32,
    /// Accumulated score; absent reads as 0.
    #[serde(default)]
    pub score: Option<u32>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// Node identifier this record scores.
    pub fn node_id(&self) -> String {
        segment_node_id(self.segment_number)
    }
}

/// Outcome of answering a single quiz slot, as persisted remotely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizProgressRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub lecture_id: Option<i64>,
    pub segment_number: u32,
    /// 1-based quiz slot within the segment.
    pub quiz_number: u32,
    #[serde(default)]
    pub quiz_score: Option<u32>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// A flashcard row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flashcard {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub lecture_id: Option<i64>,
    pub question: String,
    pub answer: String,
}

/// Generated additional-resource material for a segment, as markdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceNote {
    #[serde(default)]
    pub id: Option<i64>,
    pub lecture_id: i64,
    pub title: String,
    pub content: String,
}

/// Kind of generated quiz question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "multiple_choice" => Ok(QuestionKind::MultipleChoice),
            "true_false" => Ok(QuestionKind::TrueFalse),
            other => Err(format!("unknown question kind: {other}")),
        }
    }
}

impl SegmentContent {
    /// The question behind a 0-based quiz slot, reconstructed from the flat
    /// row. Slot 0 is multiple choice, slot 1 is true/false.
    pub fn slot_question(&self, slot: usize) -> Option<GeneratedQuestion> {
        match slot {
            0 => Some(GeneratedQuestion {
                question: self.quiz_1_question.clone(),
                kind: self.quiz_1_type.parse().unwrap_or(QuestionKind::MultipleChoice),
                options: self.quiz_1_options.clone().unwrap_or_default(),
                correct_answer: self.quiz_1_correct_answer.clone(),
                hint: None,
                explanation: Some(self.quiz_1_explanation.clone()),
            }),
            1 => Some(GeneratedQuestion {
                question: self.quiz_2_question.clone(),
                kind: QuestionKind::TrueFalse,
                options: vec!["True".into(), "False".into()],
                correct_answer: if self.quiz_2_correct_answer {
                    "True".into()
                } else {
                    "False".into()
                },
                hint: None,
                explanation: Some(self.quiz_2_explanation.clone()),
            }),
            _ => None,
        }
    }
}

/// A question returned by the content-generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Configuration sent to the quiz generator and cached per lecture between
/// the configuration view and the quiz view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizConfig {
    /// Number of questions to generate.
    pub count: u32,
    /// Time limit in minutes.
    pub time_limit: u32,
    /// Whether hints may be shown during the quiz.
    pub hints_enabled: bool,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            count: 10,
            time_limit: 15,
            hints_enabled: false,
        }
    }
}
