use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{db::Database, errors::AppResult, models::domain::ProgressRecord};

pub const PROGRESS_COLLECTION: &str = "user_passes";

/// Read side of the pass records. Writes happen inside the attempt finalize transaction.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    async fn has_passed(
        &self,
        user_id: &str,
        subject_id: &str,
        subtopic_id: &str,
        level: u8,
    ) -> AppResult<bool>;
    async fn list_passed(&self, user_id: &str) -> AppResult<Vec<ProgressRecord>>;
}

pub struct MongoProgressRepository {
    collection: Collection<ProgressRecord>,
}

impl MongoProgressRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(PROGRESS_COLLECTION);
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for {} collection", PROGRESS_COLLECTION);

        let level_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "subject_id": 1, "subtopic_id": 1, "level": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_subject_subtopic_level_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(level_index).await?;

        log::info!("Successfully created indexes for {} collection", PROGRESS_COLLECTION);
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for MongoProgressRepository {
    async fn has_passed(
        &self,
        user_id: &str,
        subject_id: &str,
        subtopic_id: &str,
        level: u8,
    ) -> AppResult<bool> {
        let record = self
            .collection
            .find_one(doc! {
                "user_id": user_id,
                "subject_id": subject_id,
                "subtopic_id": subtopic_id,
                "level": i32::from(level),
                "pass": true,
            })
            .await?;
        Ok(record.is_some())
    }

    async fn list_passed(&self, user_id: &str) -> AppResult<Vec<ProgressRecord>> {
        let records = self
            .collection
            .find(doc! { "user_id": user_id, "pass": true })
            .await?
            .try_collect()
            .await?;
        Ok(records)
    }
}
