use std::collections::HashMap;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_document, Document},
    options::{IndexOptions, ReturnDocument},
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::{
        scoring::{DURATION_CONFIG_ID, SCORING_CONFIG_ID},
        DurationConfig, ExamDefinition, ExamStatus, QuestionDefinition, ScoringConfig, Subject,
    },
};

/// Read-only view of the exam catalog. Nothing in the exam pipeline writes here
/// except the lazy creation of the scoring and duration singletons.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn find_exam_by_code(&self, exam_code: &str) -> AppResult<Option<ExamDefinition>>;
    async fn find_exam_by_id(&self, exam_id: &str) -> AppResult<Option<ExamDefinition>>;
    /// Questions in the order of `question_ids`; unknown ids are skipped.
    async fn find_questions(&self, question_ids: &[String]) -> AppResult<Vec<QuestionDefinition>>;
    async fn find_subject(&self, subject_id: &str) -> AppResult<Option<Subject>>;
    async fn list_subjects(&self) -> AppResult<Vec<Subject>>;
    async fn list_active_exams(
        &self,
        subject_id: &str,
        subtopic_id: &str,
        level: u8,
    ) -> AppResult<Vec<ExamDefinition>>;
    /// Returns the scoring singleton, creating it with defaults when missing.
    async fn scoring_config(&self) -> AppResult<ScoringConfig>;
    async fn duration_config(&self) -> AppResult<Option<DurationConfig>>;
}

pub struct MongoCatalogRepository {
    exams: Collection<ExamDefinition>,
    questions: Collection<QuestionDefinition>,
    subjects: Collection<Subject>,
    marks: Collection<ScoringConfig>,
    durations: Collection<DurationConfig>,
}

impl MongoCatalogRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            exams: db.get_collection("exams"),
            questions: db.get_collection("questions"),
            subjects: db.get_collection("subjects"),
            marks: db.get_collection("marks"),
            durations: db.get_collection("durations"),
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for catalog collections");

        let unique = |keys: Document, name: &str| {
            IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name(name.to_string())
                        .build(),
                )
                .build()
        };

        self.exams
            .create_index(unique(doc! { "id": 1 }, "id_unique"))
            .await?;
        self.exams
            .create_index(unique(doc! { "exam_code": 1 }, "exam_code_unique"))
            .await?;
        self.questions
            .create_index(unique(doc! { "id": 1 }, "id_unique"))
            .await?;
        self.subjects
            .create_index(unique(doc! { "id": 1 }, "id_unique"))
            .await?;

        log::info!("Successfully created indexes for catalog collections");
        Ok(())
    }

    /// Makes sure both configuration singletons exist without touching stored values.
    pub async fn ensure_defaults(&self) -> AppResult<()> {
        self.scoring_config().await?;

        let mut defaults = to_document(&DurationConfig::default())?;
        defaults.remove("_id");
        self.durations
            .update_one(
                doc! { "_id": DURATION_CONFIG_ID },
                doc! { "$setOnInsert": defaults },
            )
            .upsert(true)
            .await?;

        log::info!("Scoring and duration configuration ensured");
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for MongoCatalogRepository {
    async fn find_exam_by_code(&self, exam_code: &str) -> AppResult<Option<ExamDefinition>> {
        let exam = self.exams.find_one(doc! { "exam_code": exam_code }).await?;
        Ok(exam)
    }

    async fn find_exam_by_id(&self, exam_id: &str) -> AppResult<Option<ExamDefinition>> {
        let exam = self.exams.find_one(doc! { "id": exam_id }).await?;
        Ok(exam)
    }

    async fn find_questions(&self, question_ids: &[String]) -> AppResult<Vec<QuestionDefinition>> {
        let found: Vec<QuestionDefinition> = self
            .questions
            .find(doc! { "id": { "$in": question_ids.to_vec() } })
            .await?
            .try_collect()
            .await?;

        let mut by_id: HashMap<String, QuestionDefinition> =
            found.into_iter().map(|q| (q.id.clone(), q)).collect();

        Ok(question_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect())
    }

    async fn find_subject(&self, subject_id: &str) -> AppResult<Option<Subject>> {
        let subject = self.subjects.find_one(doc! { "id": subject_id }).await?;
        Ok(subject)
    }

    async fn list_subjects(&self) -> AppResult<Vec<Subject>> {
        let subjects = self
            .subjects
            .find(doc! {})
            .sort(doc! { "name": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(subjects)
    }

    async fn list_active_exams(
        &self,
        subject_id: &str,
        subtopic_id: &str,
        level: u8,
    ) -> AppResult<Vec<ExamDefinition>> {
        let exams = self
            .exams
            .find(doc! {
                "subject_id": subject_id,
                "subtopic_id": subtopic_id,
                "level": i32::from(level),
                "status": ExamStatus::Active.as_str(),
            })
            .await?
            .try_collect()
            .await?;
        Ok(exams)
    }

    async fn scoring_config(&self) -> AppResult<ScoringConfig> {
        let mut defaults = to_document(&ScoringConfig::default())?;
        defaults.remove("_id");

        self.marks
            .find_one_and_update(
                doc! { "_id": SCORING_CONFIG_ID },
                doc! { "$setOnInsert": defaults },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| AppError::InternalError("Scoring configuration unavailable".to_string()))
    }

    async fn duration_config(&self) -> AppResult<Option<DurationConfig>> {
        let config = self
            .durations
            .find_one(doc! { "_id": DURATION_CONFIG_ID })
            .await?;
        Ok(config)
    }
}
