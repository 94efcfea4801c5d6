use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use validator::Validate;

use crate::{
    config::{ExamPolicy, RetryPolicy},
    db::retry_transaction,
    errors::{AppError, AppResult},
    models::{
        domain::{
            AnswerRecord, AttemptOutcome, ExamDefinition, LevelMarks, ProgressRecord,
            QuestionDefinition, Submission,
        },
        dto::request::{AnswerInput, SubmitExamRequest},
    },
    repositories::{AttemptRepository, CatalogRepository},
    services::{
        attempt_service::allowed_duration_secs,
        grading,
        notification_service::{should_alert, FailureAlert, NotificationQueue},
    },
};

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compared at two decimals, the precision marks are stored with.
pub fn is_pass(obtained_mark: f64, total_marks: f64, pass_percentage: f64) -> bool {
    let pass_mark = pass_percentage * total_marks / 100.0;
    round2(obtained_mark) >= round2(pass_mark)
}

/// Rejects answers for questions outside the exam and repeated question ids.
pub fn validate_answers(
    answers: &[AnswerInput],
    questions: &HashMap<&str, &QuestionDefinition>,
) -> AppResult<()> {
    let mut seen = HashSet::new();
    for answer in answers {
        if !questions.contains_key(answer.question_id.as_str()) {
            return Err(AppError::ValidationError(format!(
                "Question '{}' is not part of this exam",
                answer.question_id
            )));
        }
        if !seen.insert(answer.question_id.as_str()) {
            return Err(AppError::ValidationError(format!(
                "Question '{}' was answered more than once",
                answer.question_id
            )));
        }
    }
    Ok(())
}

/// Everything needed to turn a locked attempt and its answers into an outcome.
/// Holds no storage handles; grading happens inside the finalize transaction.
pub struct AttemptGrader<'a> {
    pub exam: &'a ExamDefinition,
    pub questions: &'a HashMap<&'a str, &'a QuestionDefinition>,
    pub answers: &'a [AnswerInput],
    pub marks: LevelMarks,
    pub allowed_secs: i64,
    pub grace_secs: i64,
}

impl AttemptGrader<'_> {
    pub fn grade(&self, submission: &Submission, now: DateTime<Utc>) -> AppResult<AttemptOutcome> {
        let elapsed = (now - submission.created_at).num_seconds().max(0);

        let mut raw_total = 0.0;
        let mut records = Vec::with_capacity(self.answers.len());
        for answer in self.answers {
            let question = self
                .questions
                .get(answer.question_id.as_str())
                .ok_or_else(|| {
                    AppError::ValidationError(format!(
                        "Question '{}' is not part of this exam",
                        answer.question_id
                    ))
                })?;

            let evaluation = grading::evaluate(
                question.question_type,
                &question.correct_answers,
                answer.student_answer.as_ref(),
            );
            let mark = evaluation.mark(self.marks);
            raw_total += mark;

            records.push(AnswerRecord {
                question_id: answer.question_id.clone(),
                student_answer: answer.student_answer.clone(),
                correct_answers: question.correct_answers.clone(),
                status: evaluation.status,
                mark: round2(mark),
            });
        }

        let total_marks = self.answers.len() as f64 * self.marks.positive;

        if elapsed > self.allowed_secs + self.grace_secs {
            return Ok(AttemptOutcome {
                answers: records,
                time_taken_secs: self.allowed_secs,
                obtained_mark: 0.0,
                total_marks,
                pass: false,
                timed_out: true,
                progress: None,
            });
        }

        let obtained_mark = round2(raw_total.clamp(0.0, total_marks));
        let pass = is_pass(obtained_mark, total_marks, self.exam.pass_percentage);

        let progress = pass.then(|| {
            ProgressRecord::passed(
                &submission.user_id,
                &self.exam.subject_id,
                &self.exam.subtopic_id,
                self.exam.level,
            )
        });

        Ok(AttemptOutcome {
            answers: records,
            time_taken_secs: elapsed,
            obtained_mark,
            total_marks,
            pass,
            timed_out: false,
            progress,
        })
    }
}

pub struct SubmissionService {
    catalog: Arc<dyn CatalogRepository>,
    attempts: Arc<dyn AttemptRepository>,
    notifications: NotificationQueue,
    policy: ExamPolicy,
    retry: RetryPolicy,
}

impl SubmissionService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        attempts: Arc<dyn AttemptRepository>,
        notifications: NotificationQueue,
        policy: ExamPolicy,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            catalog,
            attempts,
            notifications,
            policy,
            retry,
        }
    }

    /// Grades and completes the user's started attempt in one transaction.
    ///
    /// A late submission is still stored as a completed, failed attempt before
    /// `TimeLimitExceeded` is returned, so the attempt cannot be resumed.
    pub async fn submit_exam(&self, request: SubmitExamRequest) -> AppResult<Submission> {
        request.validate()?;

        let exam = self
            .catalog
            .find_exam_by_id(&request.exam_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Exam '{}' not found", request.exam_id)))?;

        let question_list = self.catalog.find_questions(&exam.question_ids).await?;
        let questions: HashMap<&str, &QuestionDefinition> = question_list
            .iter()
            .map(|q| (q.id.as_str(), q))
            .collect();
        validate_answers(&request.answers, &questions)?;

        let marks = self
            .catalog
            .scoring_config()
            .await?
            .marks_for_level(exam.level)
            .ok_or_else(|| {
                AppError::InternalError(format!("No marks configured for level {}", exam.level))
            })?;
        let duration_config = self.catalog.duration_config().await?;
        let allowed_secs = allowed_duration_secs(
            duration_config.as_ref(),
            &exam,
            self.policy.fallback_duration_secs,
        );

        let grader = AttemptGrader {
            exam: &exam,
            questions: &questions,
            answers: &request.answers,
            marks,
            allowed_secs,
            grace_secs: self.policy.grace_period_secs,
        };
        let grade = |submission: &Submission| grader.grade(submission, Utc::now());

        let attempts = &self.attempts;
        let grade = &grade;
        let user_id = request.user_id.as_str();
        let exam_id = request.exam_id.as_str();
        let completed = retry_transaction(&self.retry, move || {
            attempts.finalize_attempt(user_id, exam_id, grade)
        })
        .await?;

        log::info!(
            "Finalized attempt {} for user {} on exam {}: {}/{} ({})",
            completed.attempt_number,
            user_id,
            exam_id,
            completed.obtained_mark,
            completed.total_marks,
            if completed.pass { "pass" } else { "fail" }
        );

        if should_alert(&completed, self.policy.failure_alert_threshold) {
            self.enqueue_alert(&exam, &completed).await;
        }

        if completed.timed_out {
            let elapsed_secs = completed
                .submitted_at
                .map(|at| (at - completed.created_at).num_seconds())
                .unwrap_or(completed.time_taken_secs);
            log::warn!(
                "Attempt {} for user {} on exam {} submitted after {}s, {}s allowed",
                completed.attempt_number,
                user_id,
                exam_id,
                elapsed_secs,
                allowed_secs
            );
            return Err(AppError::TimeLimitExceeded {
                elapsed_secs,
                allowed_secs,
            });
        }

        Ok(completed)
    }

    async fn enqueue_alert(&self, exam: &ExamDefinition, submission: &Submission) {
        let subject = match self.catalog.find_subject(&exam.subject_id).await {
            Ok(subject) => subject,
            Err(err) => {
                log::warn!("Could not resolve subject for failure alert: {}", err);
                None
            }
        };
        let subtopic_name = subject
            .as_ref()
            .and_then(|s| s.subtopic_name(&exam.subtopic_id))
            .unwrap_or(&exam.subtopic_id)
            .to_string();
        let subject_name = subject
            .map(|s| s.name)
            .unwrap_or_else(|| exam.subject_id.clone());

        self.notifications.enqueue(FailureAlert {
            user_id: submission.user_id.clone(),
            exam_id: submission.exam_id.clone(),
            attempt_number: submission.attempt_number,
            subject_name,
            subtopic_name,
            level: exam.level,
            timed_out: submission.timed_out,
        });
    }

    pub async fn get_submission(&self, id: &str) -> AppResult<Submission> {
        self.attempts
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Submission '{}' not found", id)))
    }

    pub async fn passed_submissions(&self, user_id: &str) -> AppResult<Vec<Submission>> {
        self.attempts.list_completed_for_user(user_id, true).await
    }

    pub async fn previous_attempts(&self, user_id: &str) -> AppResult<Vec<Submission>> {
        self.attempts.list_completed_for_user(user_id, false).await
    }

    /// Passed attempts of all students, for staff dashboards.
    pub async fn all_passed_submissions(&self) -> AppResult<Vec<Submission>> {
        self.attempts.list_completed(true).await
    }

    pub async fn all_previous_attempts(&self) -> AppResult<Vec<Submission>> {
        self.attempts.list_completed(false).await
    }
}
