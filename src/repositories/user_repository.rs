use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, Collection};

use crate::{
    db::Database,
    errors::AppResult,
    models::domain::{User, UserRole},
};

/// Lookups the alerting job needs from the user directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>>;
    async fn find_emails_by_role(&self, role: UserRole) -> AppResult<Vec<String>>;
}

pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("users");
        Self { collection }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let user = self.collection.find_one(doc! { "id": id }).await?;
        Ok(user)
    }

    async fn find_emails_by_role(&self, role: UserRole) -> AppResult<Vec<String>> {
        let users: Vec<User> = self
            .collection
            .find(doc! { "role": role.as_str() })
            .await?
            .try_collect()
            .await?;
        Ok(users.into_iter().map(|u| u.email).collect())
    }
}
