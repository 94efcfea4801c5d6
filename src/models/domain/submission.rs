use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::progress::ProgressRecord;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Submission {
    pub id: String,
    pub user_id: String,
    pub exam_id: String,
    pub attempt_number: i32,
    pub status: SubmissionStatus,
    #[serde(default)]
    pub answers: Vec<AnswerRecord>,
    #[serde(default)]
    pub time_taken_secs: i64,
    #[serde(default)]
    pub obtained_mark: f64,
    #[serde(default)]
    pub total_marks: f64,
    #[serde(default)]
    pub pass: bool,
    #[serde(default)]
    pub timed_out: bool,
    #[serde(default)]
    pub reviews: Vec<ReviewComment>,
    pub created_at: DateTime<Utc>, // authoritative attempt start
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// `Processing` only exists while a finalize transaction holds the attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Started,
    Processing,
    Completed,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Started => "started",
            SubmissionStatus::Processing => "processing",
            SubmissionStatus::Completed => "completed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AnswerRecord {
    pub question_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_answer: Option<StudentAnswer>,
    pub correct_answers: Vec<String>, // snapshot at grading time
    pub status: AnswerStatus,
    pub mark: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum AnswerStatus {
    Correct,
    Incorrect,
    #[serde(rename = "Partially Correct")]
    PartiallyCorrect,
    Skipped,
}

/// Raw answer as the client sent it: free text or a set of picked options.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum StudentAnswer {
    Text(String),
    Choices(Vec<String>),
}

impl StudentAnswer {
    pub fn is_blank(&self) -> bool {
        match self {
            StudentAnswer::Text(text) => text.trim().is_empty(),
            StudentAnswer::Choices(choices) => choices.iter().all(|c| c.trim().is_empty()),
        }
    }

    /// Single text value; a one-element choice list counts as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StudentAnswer::Text(text) => Some(text),
            StudentAnswer::Choices(choices) if choices.len() == 1 => Some(&choices[0]),
            StudentAnswer::Choices(_) => None,
        }
    }

    pub fn choices(&self) -> Vec<&str> {
        match self {
            StudentAnswer::Text(text) => vec![text.as_str()],
            StudentAnswer::Choices(choices) => choices.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReviewComment {
    pub id: String,
    pub evaluator_id: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ReviewComment {
    pub fn new(evaluator_id: &str, message: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            evaluator_id: evaluator_id.to_string(),
            message: message.to_string(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

/// Everything the finalizer persists for a locked attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct AttemptOutcome {
    pub answers: Vec<AnswerRecord>,
    pub time_taken_secs: i64,
    pub obtained_mark: f64,
    pub total_marks: f64,
    pub pass: bool,
    pub timed_out: bool,
    pub progress: Option<ProgressRecord>,
}

impl Submission {
    pub fn start(user_id: &str, exam_id: &str, attempt_number: i32) -> Self {
        let now = Utc::now();
        Submission {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            exam_id: exam_id.to_string(),
            attempt_number,
            status: SubmissionStatus::Started,
            answers: Vec::new(),
            time_taken_secs: 0,
            obtained_mark: 0.0,
            total_marks: 0.0,
            pass: false,
            timed_out: false,
            reviews: Vec::new(),
            created_at: now,
            submitted_at: None,
            updated_at: Some(now),
        }
    }

    pub fn complete(&mut self, outcome: &AttemptOutcome, at: DateTime<Utc>) {
        self.status = SubmissionStatus::Completed;
        self.answers = outcome.answers.clone();
        self.time_taken_secs = outcome.time_taken_secs;
        self.obtained_mark = outcome.obtained_mark;
        self.total_marks = outcome.total_marks;
        self.pass = outcome.pass;
        self.timed_out = outcome.timed_out;
        self.submitted_at = Some(at);
        self.updated_at = Some(at);
    }
}
