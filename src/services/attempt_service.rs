use std::sync::Arc;

use rand::seq::SliceRandom;
use validator::Validate;

use crate::{
    config::{ExamPolicy, RetryPolicy},
    db::retry_transaction,
    errors::AppResult,
    models::{
        domain::{DurationConfig, ExamDefinition, Submission},
        dto::{
            request::StartExamRequest,
            response::{QuestionView, StartExamResponse},
        },
    },
    repositories::{AttemptRepository, CatalogRepository},
    services::eligibility_service::EligibilityService,
};

/// Whole-exam time budget in seconds; the fallback applies when no usable
/// duration is configured for the exam's level.
pub fn allowed_duration_secs(
    config: Option<&DurationConfig>,
    exam: &ExamDefinition,
    fallback_secs: i64,
) -> i64 {
    config
        .and_then(|c| c.exam_duration_secs(exam.level, exam.question_count()))
        .filter(|secs| *secs > 0)
        .unwrap_or(fallback_secs)
}

pub struct AttemptService {
    eligibility: Arc<EligibilityService>,
    catalog: Arc<dyn CatalogRepository>,
    attempts: Arc<dyn AttemptRepository>,
    policy: ExamPolicy,
    retry: RetryPolicy,
}

impl AttemptService {
    pub fn new(
        eligibility: Arc<EligibilityService>,
        catalog: Arc<dyn CatalogRepository>,
        attempts: Arc<dyn AttemptRepository>,
        policy: ExamPolicy,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            eligibility,
            catalog,
            attempts,
            policy,
            retry,
        }
    }

    pub async fn start_exam(&self, request: StartExamRequest) -> AppResult<StartExamResponse> {
        request.validate()?;

        let resolved = self
            .eligibility
            .resolve_exam(&request.user_id, &request.exam_code)
            .await?;
        let exam = &resolved.exam;

        let submission = self.start_attempt(&request.user_id, &exam.id).await?;

        let duration_config = self.catalog.duration_config().await?;
        let duration = allowed_duration_secs(
            duration_config.as_ref(),
            exam,
            self.policy.fallback_duration_secs,
        );

        let mut questions: Vec<QuestionView> = self
            .catalog
            .find_questions(&exam.question_ids)
            .await?
            .iter()
            .map(QuestionView::from)
            .collect();
        if exam.shuffle_questions {
            questions.shuffle(&mut rand::thread_rng());
        }

        Ok(StartExamResponse {
            submission_id: submission.id,
            start_time: submission.created_at,
            attempt_number: submission.attempt_number,
            server_duration_seconds: duration,
            exam_id: exam.id.clone(),
            level: exam.level,
            subject_name: resolved.subject_name.clone(),
            subtopic_name: resolved.subtopic_name.clone(),
            questions,
        })
    }

    /// Returns the started attempt for (user, exam), opening a new one when none
    /// exists. Calling it again before submitting yields the same attempt.
    pub async fn start_attempt(&self, user_id: &str, exam_id: &str) -> AppResult<Submission> {
        if let Some(existing) = self.attempts.find_started(user_id, exam_id).await? {
            log::info!(
                "Resuming attempt {} for user {} on exam {}",
                existing.attempt_number,
                user_id,
                exam_id
            );
            return Ok(existing);
        }

        let attempts = &self.attempts;
        let opened =
            retry_transaction(&self.retry, move || attempts.open_attempt(user_id, exam_id)).await;

        let err = match opened {
            Ok(submission) => return Ok(submission),
            Err(err) => err,
        };

        // A concurrent start may have won, either through the unique index or a
        // write conflict that outlasted the retries; hand back its attempt.
        match self.attempts.find_started(user_id, exam_id).await {
            Ok(Some(winner)) => {
                log::warn!(
                    "Start for user {} on exam {} lost to attempt {}: {}",
                    user_id,
                    exam_id,
                    winner.attempt_number,
                    err
                );
                Ok(winner)
            }
            Ok(None) => Err(err),
            Err(read_err) => {
                log::error!("Re-reading started attempt after '{}' failed: {}", err, read_err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::test_exam as exam;

    #[test]
    fn duration_is_per_question_value_times_count() {
        let config = DurationConfig::default();

        assert_eq!(allowed_duration_secs(Some(&config), &exam(1, 10), 3600), 450);
        assert_eq!(allowed_duration_secs(Some(&config), &exam(3, 5), 3600), 600);
    }

    #[test]
    fn duration_falls_back_without_config() {
        assert_eq!(allowed_duration_secs(None, &exam(2, 10), 3600), 3600);
    }

    #[test]
    fn duration_falls_back_for_unusable_values() {
        let mut config = DurationConfig::default();
        config.level2_duration = 0;

        assert_eq!(allowed_duration_secs(Some(&config), &exam(2, 10), 3600), 3600);
        assert_eq!(allowed_duration_secs(Some(&config), &exam(9, 10), 3600), 3600);
    }
}
