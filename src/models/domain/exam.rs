use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 4;

fn default_pass_percentage() -> f64 {
    90.0
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ExamDefinition {
    pub id: String,
    pub exam_code: String,
    pub subject_id: String,
    pub subtopic_id: String,
    pub level: u8,
    pub question_ids: Vec<String>, // exam order
    #[serde(default = "default_pass_percentage")]
    pub pass_percentage: f64,
    pub status: ExamStatus,
    #[serde(default)]
    pub shuffle_questions: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamStatus {
    Active,
    Inactive,
}

impl ExamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamStatus::Active => "active",
            ExamStatus::Inactive => "inactive",
        }
    }
}

impl ExamDefinition {
    pub fn is_active(&self) -> bool {
        self.status == ExamStatus::Active
    }

    pub fn has_valid_level(&self) -> bool {
        (MIN_LEVEL..=MAX_LEVEL).contains(&self.level)
    }

    pub fn question_count(&self) -> usize {
        self.question_ids.len()
    }

    /// Level that has to be passed before this exam unlocks.
    pub fn prerequisite_level(&self) -> Option<u8> {
        (self.level > MIN_LEVEL).then(|| self.level - 1)
    }
}

/// An exam the caller may attempt, with catalog names attached.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedExam {
    pub exam: ExamDefinition,
    pub subject_name: Option<String>,
    pub subtopic_name: Option<String>,
}
