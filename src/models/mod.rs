// Domain records shared by the store, the lifecycle services and the HTTP layer

pub mod cat;
pub mod mission;
pub mod target;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use cat::{Cat, NewCat, SalaryUpdate};
pub use mission::{Assignment, Mission, MissionDraft, MissionUpdate, MAX_TARGETS, MIN_TARGETS};
pub use target::{NotesUpdate, Target, TargetDraft, TargetUpdate};

/// Lifecycle state shared by missions and targets.
///
/// The only legal transition is `InProgress -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    InProgress,
    Completed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Status::Completed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(Status::InProgress),
            "completed" => Ok(Status::Completed),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

/// Collect a "field is required" message for every blank string field.
pub(crate) fn require_text(problems: &mut Vec<String>, field: &str, value: &str) {
    if value.trim().is_empty() {
        problems.push(format!("{field} is required"));
    }
}

pub(crate) fn problems_to_result(problems: Vec<String>) -> Result<(), String> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [Status::InProgress, Status::Completed] {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
        }
        assert!("paused".parse::<Status>().is_err());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&Status::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
