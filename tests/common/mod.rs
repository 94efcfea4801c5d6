#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use secrecy::SecretString;
use tokio::sync::Mutex;

use exam_portal_server::{
    app_state::{AppState, Repositories},
    config::Config,
    errors::{AppError, AppResult},
    models::domain::{
        AttemptOutcome, DurationConfig, ExamDefinition, ExamStatus, ProgressRecord,
        QuestionDefinition, QuestionType, ReviewComment, ScoringConfig, Subject, Subtopic,
        Submission, SubmissionStatus, User, UserRole,
    },
    repositories::{
        AttemptRepository, CatalogRepository, GradeFn, ProgressRepository, UserRepository,
    },
    services::notification_service::{AlertMessage, Notifier},
};

pub const TEST_JWT_SECRET: &str = "integration_test_secret_key_0123456789";

pub fn test_config() -> Config {
    Config {
        mongo_conn_string: "mongodb://localhost:27017".to_string(),
        mongo_db_name: "exam-portal-test".to_string(),
        web_server_host: "127.0.0.1".to_string(),
        web_server_port: 8080,
        client_url: None,
        jwt_secret: SecretString::from(TEST_JWT_SECRET.to_string()),
        jwt_expiration_hours: 1,
        exam_grace_period_secs: 60,
        default_exam_duration_secs: 3600,
        failure_alert_threshold: 5,
        transaction_max_retries: 3,
        notification_webhook_url: None,
    }
}

#[derive(Default)]
pub struct State {
    pub exams: Vec<ExamDefinition>,
    pub questions: Vec<QuestionDefinition>,
    pub subjects: Vec<Subject>,
    pub scoring: Option<ScoringConfig>,
    pub durations: Option<DurationConfig>,
    pub users: Vec<User>,
    pub submissions: Vec<Submission>,
    pub counters: HashMap<(String, String), i32>,
    pub progress: Vec<ProgressRecord>,
}

/// One store behind every repository trait. Each write holds the single mutex
/// for its whole duration, which stands in for a storage transaction, and the
/// uniqueness checks mirror the Mongo indexes.
#[derive(Default)]
pub struct InMemoryDatabase {
    state: Mutex<State>,
    transient_failures: AtomicU32,
}

impl InMemoryDatabase {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn seed<F: FnOnce(&mut State)>(&self, f: F) {
        let mut state = self.state.lock().await;
        f(&mut state);
    }

    pub async fn read<T, F: FnOnce(&State) -> T>(&self, f: F) -> T {
        let state = self.state.lock().await;
        f(&state)
    }

    /// The next `count` transactional writes fail with a transient error.
    pub fn fail_next_transactions(&self, count: u32) {
        self.transient_failures.store(count, Ordering::SeqCst);
    }

    /// Moves the start of the user's started attempt into the past.
    pub async fn backdate_started(&self, user_id: &str, exam_id: &str, by: Duration) {
        let mut state = self.state.lock().await;
        if let Some(submission) = state.submissions.iter_mut().find(|s| {
            s.user_id == user_id && s.exam_id == exam_id && s.status == SubmissionStatus::Started
        }) {
            submission.created_at -= by;
        }
    }

    pub async fn submissions_for(&self, user_id: &str, exam_id: &str) -> Vec<Submission> {
        self.read(|state| {
            state
                .submissions
                .iter()
                .filter(|s| s.user_id == user_id && s.exam_id == exam_id)
                .cloned()
                .collect()
        })
        .await
    }

    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            catalog: self.clone(),
            progress: self.clone(),
            attempts: self.clone(),
            users: self.clone(),
        }
    }

    fn take_transient_failure(&self) -> AppResult<()> {
        let remaining = self.transient_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(AppError::TransientStorage("simulated write conflict".into()));
        }
        Ok(())
    }
}

fn find_started<'a>(state: &'a State, user_id: &str, exam_id: &str) -> Option<&'a Submission> {
    state.submissions.iter().find(|s| {
        s.user_id == user_id && s.exam_id == exam_id && s.status == SubmissionStatus::Started
    })
}

#[async_trait]
impl CatalogRepository for InMemoryDatabase {
    async fn find_exam_by_code(&self, exam_code: &str) -> AppResult<Option<ExamDefinition>> {
        let state = self.state.lock().await;
        Ok(state.exams.iter().find(|e| e.exam_code == exam_code).cloned())
    }

    async fn find_exam_by_id(&self, exam_id: &str) -> AppResult<Option<ExamDefinition>> {
        let state = self.state.lock().await;
        Ok(state.exams.iter().find(|e| e.id == exam_id).cloned())
    }

    async fn find_questions(&self, question_ids: &[String]) -> AppResult<Vec<QuestionDefinition>> {
        let state = self.state.lock().await;
        Ok(question_ids
            .iter()
            .filter_map(|id| state.questions.iter().find(|q| &q.id == id).cloned())
            .collect())
    }

    async fn find_subject(&self, subject_id: &str) -> AppResult<Option<Subject>> {
        let state = self.state.lock().await;
        Ok(state.subjects.iter().find(|s| s.id == subject_id).cloned())
    }

    async fn list_subjects(&self) -> AppResult<Vec<Subject>> {
        let state = self.state.lock().await;
        Ok(state.subjects.clone())
    }

    async fn list_active_exams(
        &self,
        subject_id: &str,
        subtopic_id: &str,
        level: u8,
    ) -> AppResult<Vec<ExamDefinition>> {
        let state = self.state.lock().await;
        Ok(state
            .exams
            .iter()
            .filter(|e| {
                e.is_active()
                    && e.subject_id == subject_id
                    && e.subtopic_id == subtopic_id
                    && e.level == level
            })
            .cloned()
            .collect())
    }

    async fn scoring_config(&self) -> AppResult<ScoringConfig> {
        let mut state = self.state.lock().await;
        Ok(state.scoring.get_or_insert_with(ScoringConfig::default).clone())
    }

    async fn duration_config(&self) -> AppResult<Option<DurationConfig>> {
        let state = self.state.lock().await;
        Ok(state.durations.clone())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryDatabase {
    async fn has_passed(
        &self,
        user_id: &str,
        subject_id: &str,
        subtopic_id: &str,
        level: u8,
    ) -> AppResult<bool> {
        let state = self.state.lock().await;
        Ok(state.progress.iter().any(|p| {
            p.user_id == user_id
                && p.subject_id == subject_id
                && p.subtopic_id == subtopic_id
                && p.level == level
                && p.pass
        }))
    }

    async fn list_passed(&self, user_id: &str) -> AppResult<Vec<ProgressRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .progress
            .iter()
            .filter(|p| p.user_id == user_id && p.pass)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserRepository for InMemoryDatabase {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_emails_by_role(&self, role: UserRole) -> AppResult<Vec<String>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .filter(|u| u.role == role)
            .map(|u| u.email.clone())
            .collect())
    }
}

#[async_trait]
impl AttemptRepository for InMemoryDatabase {
    async fn find_started(&self, user_id: &str, exam_id: &str) -> AppResult<Option<Submission>> {
        let found = {
            let state = self.state.lock().await;
            find_started(&state, user_id, exam_id).cloned()
        };
        // Give concurrent starters a chance to interleave between read and write.
        tokio::task::yield_now().await;
        Ok(found)
    }

    async fn open_attempt(&self, user_id: &str, exam_id: &str) -> AppResult<Submission> {
        let mut state = self.state.lock().await;
        self.take_transient_failure()?;

        if find_started(&state, user_id, exam_id).is_some() {
            return Err(AppError::DuplicateKey(format!(
                "started attempt exists for user {} on exam {}",
                user_id, exam_id
            )));
        }

        let key = (user_id.to_string(), exam_id.to_string());
        let next = state.counters.get(&key).copied().unwrap_or(0) + 1;
        if state.submissions.iter().any(|s| {
            s.user_id == user_id && s.exam_id == exam_id && s.attempt_number == next
        }) {
            return Err(AppError::DuplicateKey(format!("attempt {} already exists", next)));
        }

        let submission = Submission::start(user_id, exam_id, next);
        state.counters.insert(key, next);
        state.submissions.push(submission.clone());
        Ok(submission)
    }

    async fn finalize_attempt(
        &self,
        user_id: &str,
        exam_id: &str,
        grade: &GradeFn<'_>,
    ) -> AppResult<Submission> {
        let mut state = self.state.lock().await;
        self.take_transient_failure()?;

        let index = state
            .submissions
            .iter()
            .position(|s| {
                s.user_id == user_id
                    && s.exam_id == exam_id
                    && s.status == SubmissionStatus::Started
            })
            .ok_or(AppError::NoActiveSession)?;

        let mut locked = state.submissions[index].clone();
        locked.status = SubmissionStatus::Processing;
        let outcome = grade(&locked)?;

        let now = Utc::now();
        locked.complete(&outcome, now);
        state.submissions[index] = locked.clone();

        if let Some(record) = outcome.progress {
            let existing = state.progress.iter().position(|p| p.same_level_as(&record));
            match existing {
                Some(i) => {
                    state.progress[i].pass = true;
                    state.progress[i].updated_at = Some(now);
                }
                None => state.progress.push(record),
            }
        }

        Ok(locked)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Submission>> {
        let state = self.state.lock().await;
        Ok(state.submissions.iter().find(|s| s.id == id).cloned())
    }

    async fn list_completed_for_user(
        &self,
        user_id: &str,
        passed: bool,
    ) -> AppResult<Vec<Submission>> {
        let state = self.state.lock().await;
        let mut submissions: Vec<Submission> = state
            .submissions
            .iter()
            .filter(|s| {
                s.user_id == user_id && s.status == SubmissionStatus::Completed && s.pass == passed
            })
            .cloned()
            .collect();
        submissions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(submissions)
    }

    async fn list_completed(&self, passed: bool) -> AppResult<Vec<Submission>> {
        let state = self.state.lock().await;
        let mut submissions: Vec<Submission> = state
            .submissions
            .iter()
            .filter(|s| s.status == SubmissionStatus::Completed && s.pass == passed)
            .cloned()
            .collect();
        submissions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(submissions)
    }

    async fn add_review(&self, submission_id: &str, review: ReviewComment) -> AppResult<Submission> {
        let mut state = self.state.lock().await;
        let submission = state
            .submissions
            .iter_mut()
            .find(|s| s.id == submission_id && s.status == SubmissionStatus::Completed)
            .ok_or_else(|| {
                AppError::NotFound(format!("Completed submission '{}' not found", submission_id))
            })?;
        submission.reviews.push(review);
        Ok(submission.clone())
    }

    async fn update_review(
        &self,
        submission_id: &str,
        review_id: &str,
        message: &str,
    ) -> AppResult<Submission> {
        let mut state = self.state.lock().await;
        let submission = state
            .submissions
            .iter_mut()
            .find(|s| s.id == submission_id)
            .ok_or_else(|| AppError::NotFound(format!("Submission '{}' not found", submission_id)))?;
        let review = submission
            .reviews
            .iter_mut()
            .find(|r| r.id == review_id)
            .ok_or_else(|| AppError::NotFound(format!("Review '{}' not found", review_id)))?;
        review.message = message.to_string();
        review.updated_at = Some(Utc::now());
        Ok(submission.clone())
    }

    async fn delete_review(&self, submission_id: &str, review_id: &str) -> AppResult<Submission> {
        let mut state = self.state.lock().await;
        let submission = state
            .submissions
            .iter_mut()
            .find(|s| s.id == submission_id)
            .ok_or_else(|| AppError::NotFound(format!("Submission '{}' not found", submission_id)))?;
        let before = submission.reviews.len();
        submission.reviews.retain(|r| r.id != review_id);
        if submission.reviews.len() == before {
            return Err(AppError::NotFound(format!("Review '{}' not found", review_id)));
        }
        Ok(submission.clone())
    }
}

/// Keeps every alert it is asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<AlertMessage>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &AlertMessage) -> AppResult<()> {
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

impl RecordingNotifier {
    /// Polls until `count` alerts arrived or a second passed.
    pub async fn wait_for(&self, count: usize) -> Vec<AlertMessage> {
        for _ in 0..100 {
            {
                let sent = self.sent.lock().await;
                if sent.len() >= count {
                    return sent.clone();
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        self.sent.lock().await.clone()
    }
}

pub fn question(id: &str, question_type: QuestionType, correct: &[&str]) -> QuestionDefinition {
    QuestionDefinition {
        id: id.to_string(),
        question_type,
        question_text: format!("Question {}", id),
        options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
        correct_answers: correct.iter().map(|c| c.to_string()).collect(),
        created_at: None,
    }
}

pub fn exam(level: u8, question_ids: Vec<String>) -> ExamDefinition {
    ExamDefinition {
        id: format!("exam-algebra-{}", level),
        exam_code: format!("ALG-{}", level),
        subject_id: "math".to_string(),
        subtopic_id: "algebra".to_string(),
        level,
        question_ids,
        pass_percentage: 90.0,
        status: ExamStatus::Active,
        shuffle_questions: false,
        created_at: None,
        modified_at: None,
    }
}

/// Math/Algebra with levels 1 to 3, ten single-choice questions each (answer "A"),
/// default marks and durations, a student and an evaluator.
pub async fn seeded_database() -> Arc<InMemoryDatabase> {
    let db = InMemoryDatabase::new();
    db.seed(|state| {
        for level in 1..=3u8 {
            let ids: Vec<String> = (0..10).map(|i| format!("l{}-q{}", level, i)).collect();
            state.questions.extend(
                ids.iter()
                    .map(|id| question(id, QuestionType::SingleChoice, &["A"])),
            );
            state.exams.push(exam(level, ids));
        }
        state.subjects.push(Subject {
            id: "math".to_string(),
            name: "Mathematics".to_string(),
            subtopics: vec![Subtopic {
                id: "algebra".to_string(),
                name: "Algebra".to_string(),
            }],
        });
        state.scoring = Some(ScoringConfig::default());
        state.durations = Some(DurationConfig::default());
        state.users.push(User::new(
            "student-1",
            "alice",
            "alice@example.com",
            UserRole::Student,
        ));
        state.users.push(User::new(
            "evaluator-1",
            "eve",
            "eve@example.com",
            UserRole::Evaluator,
        ));
    })
    .await;
    db
}

pub fn app_state(db: &Arc<InMemoryDatabase>, notifier: Arc<RecordingNotifier>) -> AppState {
    AppState::from_repositories(test_config(), db.repositories(), notifier)
}
