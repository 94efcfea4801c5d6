use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, Document},
    options::{IndexOptions, ReturnDocument},
    ClientSession, Collection, IndexModel,
};

use crate::{
    db::{commit_or_abort, Database},
    errors::{AppError, AppResult},
    models::domain::{
        AttemptCounter, AttemptOutcome, ProgressRecord, ReviewComment, Submission,
        SubmissionStatus,
    },
    repositories::progress_repository::PROGRESS_COLLECTION,
};

/// Grades a locked attempt inside the finalize transaction.
pub type GradeFn<'a> = dyn for<'s> Fn(&'s Submission) -> AppResult<AttemptOutcome> + Send + Sync + 'a;

/// Storage for attempts. Every method that changes more than one document runs
/// as a single transaction; uniqueness is enforced by indexes, not by reads.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    async fn find_started(&self, user_id: &str, exam_id: &str) -> AppResult<Option<Submission>>;

    /// Bumps the (user, exam) counter and inserts a `started` submission with the
    /// new number. Fails with `DuplicateKey` while another attempt is started,
    /// in which case the counter bump is rolled back too.
    async fn open_attempt(&self, user_id: &str, exam_id: &str) -> AppResult<Submission>;

    /// Locks the started attempt (started -> processing), asks `grade` for the
    /// outcome, then stores it as completed and upserts the pass record, all in
    /// one transaction. `NoActiveSession` when nothing is started.
    async fn finalize_attempt(
        &self,
        user_id: &str,
        exam_id: &str,
        grade: &GradeFn<'_>,
    ) -> AppResult<Submission>;

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Submission>>;

    /// Completed attempts with the given pass flag, newest first.
    async fn list_completed_for_user(&self, user_id: &str, passed: bool)
        -> AppResult<Vec<Submission>>;

    /// Completed attempts of every user with the given pass flag, newest first.
    async fn list_completed(&self, passed: bool) -> AppResult<Vec<Submission>>;

    async fn add_review(&self, submission_id: &str, review: ReviewComment) -> AppResult<Submission>;
    async fn update_review(
        &self,
        submission_id: &str,
        review_id: &str,
        message: &str,
    ) -> AppResult<Submission>;
    async fn delete_review(&self, submission_id: &str, review_id: &str) -> AppResult<Submission>;
}

pub struct MongoAttemptRepository {
    db: Database,
    submissions: Collection<Submission>,
    counters: Collection<AttemptCounter>,
    progress: Collection<ProgressRecord>,
}

fn started_filter(user_id: &str, exam_id: &str) -> Document {
    doc! {
        "user_id": user_id,
        "exam_id": exam_id,
        "status": SubmissionStatus::Started.as_str(),
    }
}

impl MongoAttemptRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            db: db.clone(),
            submissions: db.get_collection("exam_submissions"),
            counters: db.get_collection("attempt_counters"),
            progress: db.get_collection(PROGRESS_COLLECTION),
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for exam_submissions and attempt_counters collections");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let attempt_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "exam_id": 1, "attempt_number": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_exam_attempt_unique".to_string())
                    .build(),
            )
            .build();

        // At most one started attempt per user and exam.
        let started_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "exam_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .partial_filter_expression(doc! { "status": SubmissionStatus::Started.as_str() })
                    .name("user_exam_started_unique".to_string())
                    .build(),
            )
            .build();

        let history_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "pass": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("user_pass_history".to_string())
                    .build(),
            )
            .build();

        let counter_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "exam_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_exam_unique".to_string())
                    .build(),
            )
            .build();

        self.submissions.create_index(id_index).await?;
        self.submissions.create_index(attempt_index).await?;
        self.submissions.create_index(started_index).await?;
        self.submissions.create_index(history_index).await?;
        self.counters.create_index(counter_index).await?;

        log::info!("Successfully created indexes for exam_submissions and attempt_counters");
        Ok(())
    }

    /// Increments the (user, exam) counter in the session's transaction, creating
    /// it on first use. Aborting the transaction rolls the increment back.
    async fn bump_counter(
        &self,
        session: &mut ClientSession,
        user_id: &str,
        exam_id: &str,
    ) -> AppResult<i32> {
        let counter = self
            .counters
            .find_one_and_update(
                doc! { "user_id": user_id, "exam_id": exam_id },
                doc! {
                    "$inc": { "current_attempt": 1 },
                    "$set": { "updated_at": to_bson(&Utc::now())? },
                },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .session(&mut *session)
            .await?
            .ok_or_else(|| AppError::InternalError("Attempt counter upsert returned nothing".into()))?;
        Ok(counter.current_attempt)
    }

    async fn open_in_session(
        &self,
        session: &mut ClientSession,
        user_id: &str,
        exam_id: &str,
    ) -> AppResult<Submission> {
        let attempt_number = self.bump_counter(session, user_id, exam_id).await?;

        let submission = Submission::start(user_id, exam_id, attempt_number);
        self.submissions
            .insert_one(&submission)
            .session(&mut *session)
            .await?;

        Ok(submission)
    }

    async fn finalize_in_session(
        &self,
        session: &mut ClientSession,
        user_id: &str,
        exam_id: &str,
        grade: &GradeFn<'_>,
    ) -> AppResult<Submission> {
        let locked = self
            .submissions
            .find_one_and_update(
                started_filter(user_id, exam_id),
                doc! { "$set": {
                    "status": SubmissionStatus::Processing.as_str(),
                    "updated_at": to_bson(&Utc::now())?,
                } },
            )
            .return_document(ReturnDocument::After)
            .session(&mut *session)
            .await?
            .ok_or(AppError::NoActiveSession)?;

        let outcome = grade(&locked)?;

        let now = Utc::now();
        let mut completed = locked;
        completed.complete(&outcome, now);

        self.submissions
            .update_one(
                doc! { "id": &completed.id },
                doc! { "$set": {
                    "status": SubmissionStatus::Completed.as_str(),
                    "answers": to_bson(&completed.answers)?,
                    "time_taken_secs": completed.time_taken_secs,
                    "obtained_mark": completed.obtained_mark,
                    "total_marks": completed.total_marks,
                    "pass": completed.pass,
                    "timed_out": completed.timed_out,
                    "submitted_at": to_bson(&now)?,
                    "updated_at": to_bson(&now)?,
                } },
            )
            .session(&mut *session)
            .await?;

        if let Some(record) = &outcome.progress {
            self.progress
                .update_one(
                    doc! {
                        "user_id": &record.user_id,
                        "subject_id": &record.subject_id,
                        "subtopic_id": &record.subtopic_id,
                        "level": i32::from(record.level),
                    },
                    doc! {
                        "$set": { "pass": true, "updated_at": to_bson(&now)? },
                        "$setOnInsert": { "id": &record.id, "created_at": to_bson(&now)? },
                    },
                )
                .upsert(true)
                .session(&mut *session)
                .await?;
        }

        Ok(completed)
    }
}

#[async_trait]
impl AttemptRepository for MongoAttemptRepository {
    async fn find_started(&self, user_id: &str, exam_id: &str) -> AppResult<Option<Submission>> {
        let submission = self
            .submissions
            .find_one(started_filter(user_id, exam_id))
            .await?;
        Ok(submission)
    }

    async fn open_attempt(&self, user_id: &str, exam_id: &str) -> AppResult<Submission> {
        let mut session = self.db.start_transaction().await?;
        let result = self.open_in_session(&mut session, user_id, exam_id).await;
        let submission = commit_or_abort(&mut session, result).await?;

        log::info!(
            "Opened attempt {} for user {} on exam {}",
            submission.attempt_number,
            user_id,
            exam_id
        );
        Ok(submission)
    }

    async fn finalize_attempt(
        &self,
        user_id: &str,
        exam_id: &str,
        grade: &GradeFn<'_>,
    ) -> AppResult<Submission> {
        let mut session = self.db.start_transaction().await?;
        let result = self
            .finalize_in_session(&mut session, user_id, exam_id, grade)
            .await;
        commit_or_abort(&mut session, result).await
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Submission>> {
        let submission = self.submissions.find_one(doc! { "id": id }).await?;
        Ok(submission)
    }

    async fn list_completed_for_user(
        &self,
        user_id: &str,
        passed: bool,
    ) -> AppResult<Vec<Submission>> {
        let submissions = self
            .submissions
            .find(doc! {
                "user_id": user_id,
                "status": SubmissionStatus::Completed.as_str(),
                "pass": passed,
            })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(submissions)
    }

    async fn list_completed(&self, passed: bool) -> AppResult<Vec<Submission>> {
        let submissions = self
            .submissions
            .find(doc! {
                "status": SubmissionStatus::Completed.as_str(),
                "pass": passed,
            })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(submissions)
    }

    async fn add_review(&self, submission_id: &str, review: ReviewComment) -> AppResult<Submission> {
        self.submissions
            .find_one_and_update(
                doc! {
                    "id": submission_id,
                    "status": SubmissionStatus::Completed.as_str(),
                },
                doc! { "$push": { "reviews": to_bson(&review)? } },
            )
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Completed submission '{}' not found", submission_id))
            })
    }

    async fn update_review(
        &self,
        submission_id: &str,
        review_id: &str,
        message: &str,
    ) -> AppResult<Submission> {
        self.submissions
            .find_one_and_update(
                doc! { "id": submission_id, "reviews.id": review_id },
                doc! { "$set": {
                    "reviews.$.message": message,
                    "reviews.$.updated_at": to_bson(&Utc::now())?,
                } },
            )
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Review '{}' on submission '{}' not found",
                    review_id, submission_id
                ))
            })
    }

    async fn delete_review(&self, submission_id: &str, review_id: &str) -> AppResult<Submission> {
        self.submissions
            .find_one_and_update(
                doc! { "id": submission_id, "reviews.id": review_id },
                doc! { "$pull": { "reviews": { "id": review_id } } },
            )
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Review '{}' on submission '{}' not found",
                    review_id, submission_id
                ))
            })
    }
}
