use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::storage::SessionRecord;
use crate::timer::{IntervalConfig, IntervalSnapshot, StopwatchState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseType {
    /// Continuous hold, timed by the stopwatch engine.
    Plank,
    /// Work/rest rounds, timed by the interval engine.
    Hiit,
}

impl ExerciseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseType::Plank => "plank",
            ExerciseType::Hiit => "hiit",
        }
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ExerciseType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plank" => Ok(ExerciseType::Plank),
            "hiit" => Ok(ExerciseType::Hiit),
            other => Err(ValidationError::UnknownExercise(other.to_string())),
        }
    }
}

/// Result of a finished run, handed to the completion callback.
///
/// Shaped so the owning surface can pass it straight to
/// [`crate::storage::Database::save_completion`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub exercise: ExerciseType,
    pub duration_secs: u64,
    pub started_at: DateTime<Utc>,
    /// Interval settings the run was latched with (HIIT only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<IntervalConfig>,
}

/// Everything the CLI prints as JSON goes through here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    StopwatchSnapshot {
        state: StopwatchState,
        at: DateTime<Utc>,
    },
    IntervalSnapshot {
        snapshot: IntervalSnapshot,
        at: DateTime<Utc>,
    },
    SessionSaved {
        record: SessionRecord,
    },
    /// Run was shorter than the configured minimum and not persisted.
    SessionDiscarded {
        exercise: ExerciseType,
        duration_secs: u64,
        minimum_secs: u64,
    },
}
