use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::{
    AnswerRecord, QuestionDefinition, QuestionType, ReviewComment, Submission, SubmissionStatus,
};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, message: &str) -> Self {
        Self {
            data,
            message: message.to_string(),
        }
    }
}

/// Question as shown to a student: no correct answers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: String,
    pub question_type: QuestionType,
    pub question_text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl From<&QuestionDefinition> for QuestionView {
    fn from(question: &QuestionDefinition) -> Self {
        QuestionView {
            id: question.id.clone(),
            question_type: question.question_type,
            question_text: question.question_text.clone(),
            options: question.options.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartExamResponse {
    pub submission_id: String,
    pub start_time: DateTime<Utc>,
    pub attempt_number: i32,
    pub server_duration_seconds: i64,
    pub exam_id: String,
    pub level: u8,
    pub subject_name: Option<String>,
    pub subtopic_name: Option<String>,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSummary {
    pub id: String,
    pub user_id: String,
    pub exam_id: String,
    pub attempt_number: i32,
    pub status: SubmissionStatus,
    pub obtained_mark: f64,
    pub total_marks: f64,
    pub pass: bool,
    pub time_taken_secs: i64,
    pub timed_out: bool,
    pub answers: Vec<AnswerRecord>,
    pub reviews: Vec<ReviewComment>,
    pub started_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl From<Submission> for SubmissionSummary {
    fn from(submission: Submission) -> Self {
        SubmissionSummary {
            id: submission.id,
            user_id: submission.user_id,
            exam_id: submission.exam_id,
            attempt_number: submission.attempt_number,
            status: submission.status,
            obtained_mark: submission.obtained_mark,
            total_marks: submission.total_marks,
            pass: submission.pass,
            time_taken_secs: submission.time_taken_secs,
            timed_out: submission.timed_out,
            answers: submission.answers,
            reviews: submission.reviews,
            started_at: submission.created_at,
            submitted_at: submission.submitted_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibleExam {
    pub exam_id: String,
    pub exam_code: String,
    pub subject_id: String,
    pub subject_name: Option<String>,
    pub subtopic_id: String,
    pub subtopic_name: Option<String>,
    pub level: u8,
    pub pass_percentage: f64,
    pub question_count: usize,
}
