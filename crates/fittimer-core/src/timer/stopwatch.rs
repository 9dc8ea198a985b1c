//! Stopwatch state machine for continuous holds (plank).
//!
//! ```text
//! Idle -> Running <-> Paused -> Idle   (stop / reset)
//! ```
//!
//! There is no terminal state: the run ends when the caller stops it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::effects::{Effects, RunStatus};
use crate::events::{Completion, ExerciseType};
use crate::feedback::Cue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopwatchState {
    pub status: RunStatus,
    pub elapsed_secs: u64,
    /// Captured on the first start of a run, kept across pauses.
    pub started_at: Option<DateTime<Utc>>,
}

impl StopwatchState {
    pub fn running(&self) -> bool {
        self.status == RunStatus::Running
    }
}

impl Default for StopwatchState {
    fn default() -> Self {
        Self {
            status: RunStatus::Idle,
            elapsed_secs: 0,
            started_at: None,
        }
    }
}

/// Pure stopwatch. Every command returns `None` when it is a no-op.
#[derive(Debug, Clone, Default)]
pub struct Stopwatch {
    state: StopwatchState,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &StopwatchState {
        &self.state
    }

    /// Start a run, or continue a paused one.
    pub fn start(&mut self, now: DateTime<Utc>) -> Option<Effects> {
        if self.state.running() {
            return None;
        }
        self.state.started_at.get_or_insert(now);
        self.state.status = RunStatus::Running;
        Some(Effects::arm().with_cue(Cue::Start))
    }

    pub fn pause(&mut self) -> Option<Effects> {
        if !self.state.running() {
            return None;
        }
        self.state.status = RunStatus::Paused;
        Some(Effects::disarm())
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Option<Effects> {
        if self.state.status != RunStatus::Paused {
            return None;
        }
        self.start(now)
    }

    /// End the run. Reports a completion when any time was accumulated.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<Effects> {
        if self.is_pristine() {
            return None;
        }
        let finished = std::mem::take(&mut self.state);
        let mut effects = Effects::disarm();
        if finished.elapsed_secs > 0 {
            effects = effects.with_cue(Cue::Complete).with_completion(Completion {
                exercise: ExerciseType::Plank,
                duration_secs: finished.elapsed_secs,
                started_at: finished.started_at.unwrap_or(now),
                config: None,
            });
        }
        Some(effects)
    }

    /// Discard the run without reporting it.
    pub fn reset(&mut self) -> Option<Effects> {
        if self.is_pristine() {
            return None;
        }
        self.state = StopwatchState::default();
        Some(Effects::disarm())
    }

    pub fn tick(&mut self) -> Effects {
        if self.state.running() {
            self.state.elapsed_secs += 1;
        }
        Effects::default()
    }

    fn is_pristine(&self) -> bool {
        self.state == StopwatchState::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::effects::ScheduleChange;

    fn ticked(sw: &mut Stopwatch, n: u64) {
        for _ in 0..n {
            sw.tick();
        }
    }

    #[test]
    fn start_arms_and_emits_start_cue() {
        let mut sw = Stopwatch::new();
        let now = Utc::now();
        let effects = sw.start(now).unwrap();
        assert_eq!(effects.schedule, ScheduleChange::Arm);
        assert_eq!(effects.cues, vec![Cue::Start]);
        assert_eq!(sw.state().started_at, Some(now));
        assert!(sw.start(now).is_none());
    }

    #[test]
    fn ticks_only_count_while_running() {
        let mut sw = Stopwatch::new();
        ticked(&mut sw, 3);
        assert_eq!(sw.state().elapsed_secs, 0);

        sw.start(Utc::now());
        ticked(&mut sw, 4);
        sw.pause();
        ticked(&mut sw, 10);
        assert_eq!(sw.state().elapsed_secs, 4);
    }

    #[test]
    fn resume_keeps_elapsed_and_first_start_time() {
        let mut sw = Stopwatch::new();
        let first = Utc::now();
        sw.start(first);
        ticked(&mut sw, 5);
        sw.pause();

        let later = first + chrono::Duration::seconds(30);
        assert!(sw.resume(later).is_some());
        ticked(&mut sw, 2);
        assert_eq!(sw.state().elapsed_secs, 7);
        assert_eq!(sw.state().started_at, Some(first));
    }

    #[test]
    fn stop_reports_short_runs_too() {
        let mut sw = Stopwatch::new();
        let now = Utc::now();
        sw.start(now);
        ticked(&mut sw, 3);

        let effects = sw.stop(now).unwrap();
        assert_eq!(effects.cues, vec![Cue::Complete]);
        let completion = effects.completion.unwrap();
        assert_eq!(completion.duration_secs, 3);
        assert_eq!(completion.exercise, ExerciseType::Plank);
        assert_eq!(completion.started_at, now);
        assert_eq!(sw.state(), &StopwatchState::default());
    }

    #[test]
    fn stop_without_elapsed_time_reports_nothing() {
        let mut sw = Stopwatch::new();
        sw.start(Utc::now());
        let effects = sw.stop(Utc::now()).unwrap();
        assert!(effects.completion.is_none());
        assert!(effects.cues.is_empty());
        assert_eq!(effects.schedule, ScheduleChange::Disarm);
    }

    #[test]
    fn idle_commands_are_noops() {
        let mut sw = Stopwatch::new();
        assert!(sw.pause().is_none());
        assert!(sw.resume(Utc::now()).is_none());
        assert!(sw.stop(Utc::now()).is_none());
        assert!(sw.reset().is_none());
    }

    #[test]
    fn reset_discards_without_completion() {
        let mut sw = Stopwatch::new();
        sw.start(Utc::now());
        ticked(&mut sw, 8);
        let effects = sw.reset().unwrap();
        assert!(effects.completion.is_none());
        assert_eq!(sw.state().elapsed_secs, 0);
        assert_eq!(sw.state().status, RunStatus::Idle);
    }
}
