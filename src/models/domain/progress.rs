use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durable fact that a user passed one level of a subject/subtopic.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProgressRecord {
    pub id: String,
    pub user_id: String,
    pub subject_id: String,
    pub subtopic_id: String,
    pub level: u8,
    pub pass: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    pub fn passed(user_id: &str, subject_id: &str, subtopic_id: &str, level: u8) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            subject_id: subject_id.to_string(),
            subtopic_id: subtopic_id.to_string(),
            level,
            pass: true,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn same_level_as(&self, other: &ProgressRecord) -> bool {
        self.user_id == other.user_id
            && self.subject_id == other.subject_id
            && self.subtopic_id == other.subtopic_id
            && self.level == other.level
    }
}
