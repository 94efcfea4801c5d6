use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SCORING_CONFIG_ID: &str = "mark-based-on-levels";
pub const DURATION_CONFIG_ID: &str = "duration-in-seconds";

/// Reward and penalty applied to every question of one level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelMarks {
    pub positive: f64,
    pub negative: f64,
}

/// Singleton holding per-level marks. Negative marks only apply to single-choice questions.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ScoringConfig {
    #[serde(rename = "_id")]
    pub id: String,
    pub level1_mark: f64,
    pub level1_negative_mark: f64,
    pub level2_mark: f64,
    pub level2_negative_mark: f64,
    pub level3_mark: f64,
    pub level3_negative_mark: f64,
    pub level4_mark: f64,
    pub level4_negative_mark: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            id: SCORING_CONFIG_ID.to_string(),
            level1_mark: 1.0,
            level1_negative_mark: 0.33,
            level2_mark: 1.0,
            level2_negative_mark: 0.66,
            level3_mark: 2.0,
            level3_negative_mark: 0.66,
            level4_mark: 10.0,
            level4_negative_mark: 0.0,
            updated_at: None,
        }
    }
}

impl ScoringConfig {
    pub fn marks_for_level(&self, level: u8) -> Option<LevelMarks> {
        let (positive, negative) = match level {
            1 => (self.level1_mark, self.level1_negative_mark),
            2 => (self.level2_mark, self.level2_negative_mark),
            3 => (self.level3_mark, self.level3_negative_mark),
            4 => (self.level4_mark, self.level4_negative_mark),
            _ => return None,
        };
        // Marks are magnitudes; a negative value in the document would flip the rule.
        Some(LevelMarks {
            positive: positive.max(0.0),
            negative: negative.max(0.0),
        })
    }
}

/// Singleton holding the allowed seconds per question for each level.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct DurationConfig {
    #[serde(rename = "_id")]
    pub id: String,
    pub level1_duration: i64,
    pub level2_duration: i64,
    pub level3_duration: i64,
    pub level4_duration: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for DurationConfig {
    fn default() -> Self {
        Self {
            id: DURATION_CONFIG_ID.to_string(),
            level1_duration: 45,
            level2_duration: 90,
            level3_duration: 120,
            level4_duration: 150,
            updated_at: None,
        }
    }
}

impl DurationConfig {
    pub fn per_question_secs(&self, level: u8) -> Option<i64> {
        match level {
            1 => Some(self.level1_duration),
            2 => Some(self.level2_duration),
            3 => Some(self.level3_duration),
            4 => Some(self.level4_duration),
            _ => None,
        }
    }

    /// Whole-exam budget: the per-question value times the number of questions.
    pub fn exam_duration_secs(&self, level: u8, question_count: usize) -> Option<i64> {
        self.per_question_secs(level)
            .map(|secs| secs.max(0) * question_count as i64)
    }
}
