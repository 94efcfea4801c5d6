use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subtopics: Vec<Subtopic>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Subtopic {
    pub id: String,
    pub name: String,
}

impl Subject {
    pub fn subtopic_name(&self, subtopic_id: &str) -> Option<&str> {
        self.subtopics
            .iter()
            .find(|s| s.id == subtopic_id)
            .map(|s| s.name.as_str())
    }
}
