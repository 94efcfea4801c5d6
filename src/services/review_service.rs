use std::sync::Arc;

use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{ReviewComment, Submission},
        dto::request::ReviewRequest,
    },
    repositories::AttemptRepository,
};

/// Evaluator comments on completed submissions. Only the `reviews` list is
/// ever written; grading fields stay as the finalizer left them.
pub struct ReviewService {
    attempts: Arc<dyn AttemptRepository>,
}

impl ReviewService {
    pub fn new(attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { attempts }
    }

    pub async fn add_review(
        &self,
        submission_id: &str,
        evaluator_id: &str,
        request: ReviewRequest,
    ) -> AppResult<Submission> {
        request.validate()?;
        let review = ReviewComment::new(evaluator_id, request.message.trim());
        let submission = self.attempts.add_review(submission_id, review).await?;
        log::info!(
            "Evaluator {} reviewed submission {}",
            evaluator_id,
            submission_id
        );
        Ok(submission)
    }

    /// Only the author of a comment may edit it.
    pub async fn update_review(
        &self,
        submission_id: &str,
        review_id: &str,
        evaluator_id: &str,
        request: ReviewRequest,
    ) -> AppResult<Submission> {
        request.validate()?;
        self.ensure_author(submission_id, review_id, evaluator_id)
            .await?;
        self.attempts
            .update_review(submission_id, review_id, request.message.trim())
            .await
    }

    pub async fn delete_review(
        &self,
        submission_id: &str,
        review_id: &str,
        evaluator_id: &str,
        is_admin: bool,
    ) -> AppResult<Submission> {
        if !is_admin {
            self.ensure_author(submission_id, review_id, evaluator_id)
                .await?;
        }
        self.attempts.delete_review(submission_id, review_id).await
    }

    async fn ensure_author(
        &self,
        submission_id: &str,
        review_id: &str,
        evaluator_id: &str,
    ) -> AppResult<()> {
        let submission = self
            .attempts
            .find_by_id(submission_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Submission '{}' not found", submission_id))
            })?;
        let review = submission
            .reviews
            .iter()
            .find(|r| r.id == review_id)
            .ok_or_else(|| AppError::NotFound(format!("Review '{}' not found", review_id)))?;

        if review.evaluator_id != evaluator_id {
            return Err(AppError::Forbidden(
                "Only the author can change this review".to_string(),
            ));
        }
        Ok(())
    }
}
