use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Status, Target, TargetDraft};

/// Fewest targets a mission may have
pub const MIN_TARGETS: usize = 1;
/// Most targets a mission may have
pub const MAX_TARGETS: usize = 3;

/// A mission with its targets hydrated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: i64,
    /// `None` while the mission is unassigned
    pub cat_id: Option<i64>,
    pub status: Status,
    pub targets: Vec<Target>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Mission {
    pub fn all_targets_completed(&self) -> bool {
        self.targets.iter().all(|t| t.status.is_completed())
    }
}

/// Request body for `POST /missions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionDraft {
    #[serde(default)]
    pub cat_id: Option<i64>,
    #[serde(default)]
    pub targets: Vec<TargetDraft>,
}

impl MissionDraft {
    pub fn validate(&self) -> Result<(), String> {
        let count = self.targets.len();
        if !(MIN_TARGETS..=MAX_TARGETS).contains(&count) {
            return Err(format!(
                "a mission must have between {MIN_TARGETS} and {MAX_TARGETS} targets"
            ));
        }
        for (index, target) in self.targets.iter().enumerate() {
            target
                .validate()
                .map_err(|msg| format!("target {}: {msg}", index + 1))?;
        }
        Ok(())
    }
}

/// Request body for `PUT /missions/{id}`; overwrites the whole record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MissionUpdate {
    #[serde(default)]
    pub cat_id: Option<i64>,
    #[serde(default)]
    pub status: Status,
}

/// Request body for `PUT /missions/{id}/assign`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub cat_id: i64,
}
