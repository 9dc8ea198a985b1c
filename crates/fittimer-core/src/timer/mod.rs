mod effects;
mod engine;
mod interval;
mod stopwatch;

pub use effects::{Effects, RunStatus, ScheduleChange};
pub use engine::{CompletionFn, IntervalTimer, Lifecycle, SimpleTimer};
pub use interval::{
    IntervalConfig, IntervalMachine, IntervalSnapshot, IntervalState, Phase, TickOutcome,
    REST_SECS_RANGE, ROUNDS_RANGE, WARNING_WINDOW, WORK_SECS_RANGE,
};
pub use stopwatch::{Stopwatch, StopwatchState};
