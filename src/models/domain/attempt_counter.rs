use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per (user, exam) sequence behind attempt numbers.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttemptCounter {
    pub user_id: String,
    pub exam_id: String,
    pub current_attempt: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
