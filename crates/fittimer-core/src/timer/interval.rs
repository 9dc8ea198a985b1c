//! Work/rest interval state machine (HIIT).
//!
//! ## Phase transitions
//!
//! ```text
//! Idle --start--> Work --(last round)--> Completed
//!                  ^  \--(more rounds)--> Rest
//!                  \_________________________/
//! ```
//!
//! A boundary is crossed on the tick whose pre-decrement `time_remaining`
//! is 1. That tick still counts towards `total_elapsed`, so a 30/10 x 2
//! run completes after exactly 70 ticks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::effects::{Effects, RunStatus};
use crate::error::ValidationError;
use crate::events::{Completion, ExerciseType};
use crate::feedback::Cue;

/// Warning cues fire while the pre-decrement countdown is in `2..=4`.
pub const WARNING_WINDOW: std::ops::RangeInclusive<u32> = 2..=4;

pub const WORK_SECS_RANGE: std::ops::RangeInclusive<u32> = 1..=300;
pub const REST_SECS_RANGE: std::ops::RangeInclusive<u32> = 0..=120;
pub const ROUNDS_RANGE: std::ops::RangeInclusive<u32> = 1..=50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntervalConfig {
    pub work_secs: u32,
    pub rest_secs: u32,
    pub rounds: u32,
}

impl IntervalConfig {
    pub fn new(work_secs: u32, rest_secs: u32, rounds: u32) -> Result<Self, ValidationError> {
        let config = Self {
            work_secs,
            rest_secs,
            rounds,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check("work_secs", self.work_secs, WORK_SECS_RANGE)?;
        check("rest_secs", self.rest_secs, REST_SECS_RANGE)?;
        check("rounds", self.rounds, ROUNDS_RANGE)
    }

    /// Planned run length: every work phase plus the rests between them.
    ///
    /// A zero-length rest still occupies the one tick that leaves it.
    pub fn total_secs(&self) -> u64 {
        let rounds = u64::from(self.rounds);
        let rest = u64::from(self.rest_secs.max(1));
        rounds * u64::from(self.work_secs) + (rounds - 1) * rest
    }
}

fn check(
    field: &'static str,
    value: u32,
    range: std::ops::RangeInclusive<u32>,
) -> Result<(), ValidationError> {
    if range.contains(&value) {
        return Ok(());
    }
    Err(ValidationError::InvalidIntervalConfig {
        field,
        message: format!("must be between {} and {}", range.start(), range.end()),
    })
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            work_secs: 30,
            rest_secs: 10,
            rounds: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Work,
    Rest,
    Completed,
}

impl Phase {
    /// Phases in which ticks advance time.
    pub fn is_active(&self) -> bool {
        matches!(self, Phase::Work | Phase::Rest)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalState {
    pub phase: Phase,
    pub current_round: u32,
    pub total_rounds: u32,
    pub time_remaining: u32,
    pub total_elapsed: u64,
}

/// Outcome of a single tick on [`IntervalState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub cues: Vec<Cue>,
    /// This tick moved the run into [`Phase::Completed`].
    pub completed: bool,
}

impl IntervalState {
    pub fn idle(config: &IntervalConfig) -> Self {
        Self {
            phase: Phase::Idle,
            current_round: 0,
            total_rounds: config.rounds,
            time_remaining: config.work_secs,
            total_elapsed: 0,
        }
    }

    fn first_round(config: &IntervalConfig) -> Self {
        Self {
            phase: Phase::Work,
            current_round: 1,
            total_rounds: config.rounds,
            time_remaining: config.work_secs,
            total_elapsed: 0,
        }
    }

    /// Advance one second. Does nothing outside work/rest.
    pub fn tick(&mut self, config: &IntervalConfig) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if !self.phase.is_active() {
            return outcome;
        }

        if WARNING_WINDOW.contains(&self.time_remaining) {
            outcome.cues.push(Cue::Warning);
        }
        self.total_elapsed += 1;

        if self.time_remaining > 1 {
            self.time_remaining -= 1;
            return outcome;
        }

        match self.phase {
            Phase::Work if self.current_round >= self.total_rounds => {
                self.phase = Phase::Completed;
                self.time_remaining = 0;
                outcome.cues.push(Cue::Complete);
                outcome.completed = true;
            }
            Phase::Work => {
                self.phase = Phase::Rest;
                self.time_remaining = config.rest_secs;
                outcome.cues.push(Cue::PhaseSwitch);
            }
            Phase::Rest => {
                self.phase = Phase::Work;
                self.current_round += 1;
                self.time_remaining = config.work_secs;
                outcome.cues.push(Cue::PhaseSwitch);
            }
            Phase::Idle | Phase::Completed => {}
        }
        outcome
    }
}

/// Everything a surface needs to render an interval run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalSnapshot {
    pub state: IntervalState,
    pub status: RunStatus,
    pub config: IntervalConfig,
    pub started_at: Option<DateTime<Utc>>,
}

impl IntervalSnapshot {
    /// 0.0 .. 100.0 progress across the planned run.
    pub fn progress_pct(&self) -> f64 {
        match self.state.phase {
            Phase::Idle => 0.0,
            Phase::Completed => 100.0,
            Phase::Work | Phase::Rest => {
                let total = self.config.total_secs();
                if total == 0 {
                    return 0.0;
                }
                (self.state.total_elapsed as f64 / total as f64 * 100.0).min(100.0)
            }
        }
    }
}

/// Interval machine: [`IntervalState`] plus run bookkeeping.
///
/// The config is latched at `start`. A config set mid-run is parked and
/// takes effect when the machine next returns to idle.
#[derive(Debug, Clone)]
pub struct IntervalMachine {
    config: IntervalConfig,
    pending: Option<IntervalConfig>,
    state: IntervalState,
    status: RunStatus,
    started_at: Option<DateTime<Utc>>,
    /// Completion already delivered for the current run.
    reported: bool,
}

impl IntervalMachine {
    pub fn new(config: IntervalConfig) -> Self {
        Self {
            config,
            pending: None,
            state: IntervalState::idle(&config),
            status: RunStatus::Idle,
            started_at: None,
            reported: false,
        }
    }

    pub fn state(&self) -> &IntervalState {
        &self.state
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn config(&self) -> &IntervalConfig {
        &self.config
    }

    pub fn snapshot(&self) -> IntervalSnapshot {
        IntervalSnapshot {
            state: self.state,
            status: self.status,
            config: self.config,
            started_at: self.started_at,
        }
    }

    /// Replace the config. Applied immediately only while idle.
    pub fn set_config(&mut self, config: IntervalConfig) -> bool {
        if self.state.phase == Phase::Idle {
            self.config = config;
            self.pending = None;
            self.state = IntervalState::idle(&config);
            true
        } else {
            self.pending = Some(config);
            false
        }
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Option<Effects> {
        if self.state.phase != Phase::Idle {
            return None;
        }
        self.state = IntervalState::first_round(&self.config);
        self.status = RunStatus::Running;
        self.started_at = Some(now);
        self.reported = false;
        Some(Effects::arm().with_cue(Cue::Start))
    }

    pub fn pause(&mut self) -> Option<Effects> {
        if !self.state.phase.is_active() || self.status != RunStatus::Running {
            return None;
        }
        self.status = RunStatus::Paused;
        Some(Effects::disarm())
    }

    pub fn resume(&mut self) -> Option<Effects> {
        if !self.state.phase.is_active() || self.status != RunStatus::Paused {
            return None;
        }
        self.status = RunStatus::Running;
        Some(Effects::arm())
    }

    /// End the run, reporting it unless it already completed on its own.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<Effects> {
        if self.state.phase == Phase::Idle {
            return None;
        }
        let mut effects = Effects::disarm();
        if self.state.total_elapsed > 0 && !self.reported {
            effects = effects.with_completion(self.completion(now));
        }
        self.return_to_idle();
        Some(effects)
    }

    pub fn reset(&mut self) -> Option<Effects> {
        if self.state.phase == Phase::Idle {
            return None;
        }
        self.return_to_idle();
        Some(Effects::disarm())
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> Effects {
        if self.status != RunStatus::Running {
            return Effects::default();
        }
        let outcome = self.state.tick(&self.config);
        let mut effects = Effects {
            cues: outcome.cues,
            ..Effects::default()
        };
        if outcome.completed {
            self.status = RunStatus::Finished;
            self.reported = true;
            effects = Effects {
                cues: effects.cues,
                ..Effects::disarm()
            }
            .with_completion(self.completion(now));
        }
        effects
    }

    fn completion(&self, now: DateTime<Utc>) -> Completion {
        Completion {
            exercise: ExerciseType::Hiit,
            duration_secs: self.state.total_elapsed,
            started_at: self.started_at.unwrap_or(now),
            config: Some(self.config),
        }
    }

    fn return_to_idle(&mut self) {
        if let Some(config) = self.pending.take() {
            self.config = config;
        }
        self.state = IntervalState::idle(&self.config);
        self.status = RunStatus::Idle;
        self.started_at = None;
        self.reported = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::effects::ScheduleChange;

    fn cfg(work: u32, rest: u32, rounds: u32) -> IntervalConfig {
        IntervalConfig::new(work, rest, rounds).unwrap()
    }

    fn run(machine: &mut IntervalMachine, ticks: u32) -> Vec<Effects> {
        (0..ticks).map(|_| machine.tick(Utc::now())).collect()
    }

    #[test]
    fn config_validation() {
        assert!(IntervalConfig::new(0, 10, 3).is_err());
        assert!(IntervalConfig::new(20, 10, 0).is_err());
        assert!(IntervalConfig::new(20, 0, 1).is_ok());
        assert!(IntervalConfig::new(300, 120, 50).is_ok());
        assert!(IntervalConfig::new(301, 10, 3).is_err());
        assert!(IntervalConfig::new(20, 121, 3).is_err());
        assert!(IntervalConfig::new(20, 10, 4_000_000_000).is_err());
    }

    #[test]
    fn total_secs_excludes_trailing_rest() {
        assert_eq!(cfg(30, 10, 2).total_secs(), 70);
        assert_eq!(cfg(20, 10, 8).total_secs(), 230);
        assert_eq!(cfg(45, 0, 3).total_secs(), 137);
    }

    #[test]
    fn start_enters_first_work_round() {
        let mut m = IntervalMachine::new(cfg(30, 10, 2));
        let effects = m.start(Utc::now()).unwrap();
        assert_eq!(effects.cues, vec![Cue::Start]);
        assert_eq!(effects.schedule, ScheduleChange::Arm);
        assert_eq!(m.state().phase, Phase::Work);
        assert_eq!(m.state().current_round, 1);
        assert_eq!(m.state().time_remaining, 30);
        assert!(m.start(Utc::now()).is_none());
    }

    #[test]
    fn thirty_ten_two_scenario() {
        let mut m = IntervalMachine::new(cfg(30, 10, 2));
        m.start(Utc::now());

        run(&mut m, 30);
        assert_eq!(m.state().phase, Phase::Rest);
        assert_eq!(m.state().time_remaining, 10);
        assert_eq!(m.state().current_round, 1);

        run(&mut m, 10);
        assert_eq!(m.state().phase, Phase::Work);
        assert_eq!(m.state().time_remaining, 30);
        assert_eq!(m.state().current_round, 2);

        let effects = run(&mut m, 30);
        assert_eq!(m.state().phase, Phase::Completed);
        assert_eq!(m.state().time_remaining, 0);
        assert_eq!(m.state().total_elapsed, 70);
        assert_eq!(m.status(), RunStatus::Finished);

        let last = effects.last().unwrap();
        assert_eq!(last.schedule, ScheduleChange::Disarm);
        assert!(last.cues.contains(&Cue::Complete));
        assert_eq!(last.completion.as_ref().unwrap().duration_secs, 70);
    }

    #[test]
    fn warning_fires_only_in_final_three_seconds() {
        let config = cfg(30, 10, 2);
        let mut state = IntervalState::first_round(&config);
        let mut warned_at = Vec::new();
        while state.phase.is_active() {
            let before = state.time_remaining;
            let outcome = state.tick(&config);
            if outcome.cues.contains(&Cue::Warning) {
                warned_at.push(before);
            }
        }
        assert_eq!(warned_at, vec![4, 3, 2, 4, 3, 2, 4, 3, 2]);
    }

    #[test]
    fn phase_switch_cues_between_rounds() {
        let config = cfg(5, 3, 3);
        let mut state = IntervalState::first_round(&config);
        let mut switches = 0;
        let mut completes = 0;
        while state.phase.is_active() {
            let outcome = state.tick(&config);
            switches += outcome.cues.iter().filter(|c| **c == Cue::PhaseSwitch).count();
            completes += outcome.cues.iter().filter(|c| **c == Cue::Complete).count();
        }
        // three work phases separated by two rests
        assert_eq!(switches, 4);
        assert_eq!(completes, 1);
        assert_eq!(state.total_elapsed, config.total_secs());
    }

    #[test]
    fn zero_rest_is_entered_and_left_on_the_next_tick() {
        let config = cfg(3, 0, 2);
        let mut state = IntervalState::first_round(&config);
        let mut switches = 0;
        for _ in 0..3 {
            switches += state.tick(&config).cues.iter().filter(|c| **c == Cue::PhaseSwitch).count();
        }
        assert_eq!(state.phase, Phase::Rest);
        assert_eq!(state.current_round, 1);
        assert_eq!(state.time_remaining, 0);

        let outcome = state.tick(&config);
        switches += outcome.cues.iter().filter(|c| **c == Cue::PhaseSwitch).count();
        assert!(!outcome.cues.contains(&Cue::Warning));
        assert_eq!(state.phase, Phase::Work);
        assert_eq!(state.current_round, 2);
        assert_eq!(state.time_remaining, 3);

        for _ in 0..3 {
            state.tick(&config);
        }
        assert_eq!(state.phase, Phase::Completed);
        assert_eq!(switches, 2);
        assert_eq!(state.total_elapsed, 7);
        assert_eq!(state.total_elapsed, config.total_secs());
    }

    #[test]
    fn single_second_phases_never_warn() {
        let config = cfg(1, 1, 3);
        let mut state = IntervalState::first_round(&config);
        while state.phase.is_active() {
            assert!(!state.tick(&config).cues.contains(&Cue::Warning));
        }
        assert_eq!(state.total_elapsed, 5);
    }

    #[test]
    fn stop_after_auto_completion_does_not_report_again() {
        let mut m = IntervalMachine::new(cfg(2, 1, 1));
        m.start(Utc::now());
        let completions = run(&mut m, 5)
            .into_iter()
            .filter(|e| e.completion.is_some())
            .count();
        assert_eq!(completions, 1);

        let effects = m.stop(Utc::now()).unwrap();
        assert!(effects.completion.is_none());
        assert_eq!(m.state().phase, Phase::Idle);
        assert!(m.stop(Utc::now()).is_none());
    }

    #[test]
    fn manual_stop_reports_elapsed_and_config() {
        let config = cfg(30, 10, 4);
        let mut m = IntervalMachine::new(config);
        let started = Utc::now();
        m.start(started);
        run(&mut m, 12);

        let completion = m.stop(Utc::now()).unwrap().completion.unwrap();
        assert_eq!(completion.duration_secs, 12);
        assert_eq!(completion.config, Some(config));
        assert_eq!(completion.started_at, started);
        assert_eq!(m.state(), &IntervalState::idle(&config));
    }

    #[test]
    fn stop_before_first_tick_reports_nothing() {
        let mut m = IntervalMachine::new(cfg(30, 10, 4));
        m.start(Utc::now());
        let effects = m.stop(Utc::now()).unwrap();
        assert!(effects.completion.is_none());
    }

    #[test]
    fn pause_freezes_and_resume_rearms() {
        let mut m = IntervalMachine::new(cfg(30, 10, 2));
        m.start(Utc::now());
        run(&mut m, 5);
        assert_eq!(m.pause().unwrap().schedule, ScheduleChange::Disarm);
        assert!(m.pause().is_none());

        let frozen = *m.state();
        run(&mut m, 10);
        assert_eq!(m.state(), &frozen);

        assert_eq!(m.resume().unwrap().schedule, ScheduleChange::Arm);
        assert!(m.resume().is_none());
        run(&mut m, 1);
        assert_eq!(m.state().total_elapsed, 6);
    }

    #[test]
    fn idle_commands_are_noops() {
        let config = cfg(30, 10, 2);
        let mut m = IntervalMachine::new(config);
        assert!(m.pause().is_none());
        assert!(m.resume().is_none());
        assert!(m.stop(Utc::now()).is_none());
        assert!(m.reset().is_none());
        assert_eq!(m.state(), &IntervalState::idle(&config));
    }

    #[test]
    fn completed_run_cannot_be_paused_or_restarted() {
        let mut m = IntervalMachine::new(cfg(1, 0, 1));
        m.start(Utc::now());
        run(&mut m, 1);
        assert_eq!(m.state().phase, Phase::Completed);
        assert!(m.pause().is_none());
        assert!(m.resume().is_none());
        assert!(m.start(Utc::now()).is_none());
        assert!(m.reset().is_some());
        assert!(m.start(Utc::now()).is_some());
    }

    #[test]
    fn config_latched_for_the_run() {
        let mut m = IntervalMachine::new(cfg(30, 10, 2));
        m.start(Utc::now());
        assert!(!m.set_config(cfg(60, 20, 5)));
        run(&mut m, 30);
        assert_eq!(m.state().time_remaining, 10);
        assert_eq!(m.state().total_rounds, 2);

        m.reset();
        assert_eq!(m.config(), &cfg(60, 20, 5));
        assert_eq!(m.state().time_remaining, 60);
        assert_eq!(m.state().total_rounds, 5);
    }

    #[test]
    fn config_change_while_idle_reseeds_display() {
        let mut m = IntervalMachine::new(cfg(30, 10, 2));
        assert!(m.set_config(cfg(45, 15, 6)));
        assert_eq!(m.state().time_remaining, 45);
        assert_eq!(m.state().total_rounds, 6);
        assert_eq!(m.state().current_round, 0);
    }

    #[test]
    fn progress_tracks_planned_duration() {
        let mut m = IntervalMachine::new(cfg(30, 10, 2));
        assert_eq!(m.snapshot().progress_pct(), 0.0);
        m.start(Utc::now());
        run(&mut m, 35);
        assert_eq!(m.snapshot().progress_pct(), 50.0);
        run(&mut m, 35);
        assert_eq!(m.snapshot().progress_pct(), 100.0);
    }
}
