use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Directory entry for a portal user. Credentials live with the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Student,
    Evaluator,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Evaluator => "evaluator",
            UserRole::Admin => "admin",
        }
    }

    /// Evaluators and admins may see and review any attempt.
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Evaluator | UserRole::Admin)
    }
}

impl User {
    pub fn new(id: &str, username: &str, email: &str, role: UserRole) -> Self {
        User {
            id: id.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            role,
            created_at: Some(Utc::now()),
        }
    }
}
