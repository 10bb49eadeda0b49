use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{problems_to_result, require_text, Status};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: i64,
    pub mission_id: i64,
    pub name: String,
    pub country: String,
    pub notes: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A target that has not been stored yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub notes: String,
}

impl TargetDraft {
    pub fn validate(&self) -> Result<(), String> {
        let mut problems = Vec::new();
        require_text(&mut problems, "name", &self.name);
        require_text(&mut problems, "country", &self.country);
        problems_to_result(problems)
    }
}

/// Request body for `PUT /targets`: the full target plus the mission it claims to belong to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetUpdate {
    pub id: i64,
    pub mission_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub status: Status,
}

impl TargetUpdate {
    pub fn validate(&self) -> Result<(), String> {
        let mut problems = Vec::new();
        require_text(&mut problems, "name", &self.name);
        require_text(&mut problems, "country", &self.country);
        problems_to_result(problems)
    }
}

/// Request body for `PUT /targets/{id}/notes`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotesUpdate {
    #[serde(default)]
    pub notes: String,
}
