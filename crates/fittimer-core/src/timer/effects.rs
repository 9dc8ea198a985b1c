//! Side effects computed alongside every state transition.
//!
//! State machines in this module never touch a clock, a sink or a
//! callback. Each transition returns an [`Effects`] value and the engine
//! carries it out after the state lock is released.

use serde::{Deserialize, Serialize};

use crate::events::Completion;
use crate::feedback::Cue;

/// Whether the engine's tick schedule should be running.
///
/// Kept as an explicit field so run status is never inferred from whether
/// a schedule handle happens to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Idle,
    Running,
    Paused,
    /// Run ended by itself; waiting for stop/reset.
    Finished,
}

/// What to do with the tick schedule after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScheduleChange {
    #[default]
    Keep,
    Arm,
    Disarm,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effects {
    pub cues: Vec<Cue>,
    pub completion: Option<Completion>,
    pub schedule: ScheduleChange,
}

impl Effects {
    pub(crate) fn arm() -> Self {
        Self {
            schedule: ScheduleChange::Arm,
            ..Self::default()
        }
    }

    pub(crate) fn disarm() -> Self {
        Self {
            schedule: ScheduleChange::Disarm,
            ..Self::default()
        }
    }

    pub(crate) fn with_cue(mut self, cue: Cue) -> Self {
        self.cues.push(cue);
        self
    }

    pub(crate) fn with_completion(mut self, completion: Completion) -> Self {
        self.completion = Some(completion);
        self
    }
}
