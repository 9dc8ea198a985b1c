//! Persists completions, dropping runs too short to count.

use tracing::info;

use crate::error::Result;
use crate::events::{Completion, Event, ExerciseType};
use crate::storage::{Database, RecordingConfig, SessionRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded(SessionRecord),
    Discarded {
        exercise: ExerciseType,
        duration_secs: u64,
        minimum_secs: u64,
    },
}

impl RecordOutcome {
    pub fn into_event(self) -> Event {
        match self {
            RecordOutcome::Recorded(record) => Event::SessionSaved { record },
            RecordOutcome::Discarded {
                exercise,
                duration_secs,
                minimum_secs,
            } => Event::SessionDiscarded {
                exercise,
                duration_secs,
                minimum_secs,
            },
        }
    }
}

/// Applies the discard policy in front of [`Database::save_completion`].
pub struct SessionRecorder<'a> {
    db: &'a Database,
    policy: RecordingConfig,
}

impl<'a> SessionRecorder<'a> {
    pub fn new(db: &'a Database, policy: RecordingConfig) -> Self {
        Self { db, policy }
    }

    pub fn minimum_for(&self, exercise: ExerciseType) -> u64 {
        self.policy.minimum_secs(exercise)
    }

    /// Runs shorter than the exercise minimum are discarded, not saved.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record(&self, completion: &Completion) -> Result<RecordOutcome> {
        let minimum_secs = self.minimum_for(completion.exercise);
        if completion.duration_secs < minimum_secs {
            info!(
                exercise = %completion.exercise,
                duration_secs = completion.duration_secs,
                minimum_secs,
                "session too short, discarded"
            );
            return Ok(RecordOutcome::Discarded {
                exercise: completion.exercise,
                duration_secs: completion.duration_secs,
                minimum_secs,
            });
        }
        let record = self.db.save_completion(completion)?;
        Ok(RecordOutcome::Recorded(record))
    }
}
