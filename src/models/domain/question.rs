use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuestionDefinition {
    pub id: String,
    pub question_type: QuestionType,
    pub question_text: String,
    #[serde(default)]
    pub options: Vec<String>, // only choice questions carry options
    pub correct_answers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum QuestionType {
    #[serde(rename = "MCQ")]
    SingleChoice,
    #[serde(rename = "MSQ")]
    MultiChoice,
    #[serde(rename = "Fill in the Blanks")]
    FillBlank,
    #[serde(rename = "Short Answer")]
    ShortAnswer,
}
