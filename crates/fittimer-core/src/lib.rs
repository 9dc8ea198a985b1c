//! # Fittimer Core Library
//!
//! Timer engines and persistence for plank and HIIT workouts. The CLI is a
//! thin surface over this crate; everything it does is available here.
//!
//! ## Architecture
//!
//! - **Tick**: a recurring one-second schedule on the tokio runtime
//! - **Timer**: pure state machines ([`Stopwatch`], [`IntervalMachine`]) and
//!   the runtime engines that drive them ([`SimpleTimer`], [`IntervalTimer`])
//! - **Feedback**: cue sinks the engines notify on start, countdown, phase
//!   switch and completion
//! - **Storage**: SQLite session storage and TOML configuration
//!
//! ## Key Components
//!
//! - [`IntervalTimer`]: work/rest interval engine
//! - [`SimpleTimer`]: count-up stopwatch engine
//! - [`Database`]: session and preset persistence
//! - [`SessionRecorder`]: discard policy in front of the database
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod feedback;
pub mod format;
pub mod recorder;
pub mod stats;
pub mod storage;
pub mod tick;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, FeedbackError, ValidationError};
pub use events::{Completion, Event, ExerciseType};
pub use feedback::{ChannelSink, Cue, FeedbackSink, NullSink, RecordingSink};
pub use recorder::{RecordOutcome, SessionRecorder};
pub use stats::{DailyTotal, Stats};
pub use storage::{Config, Database, HiitPreset, SessionRecord};
pub use tick::{TickHandle, Ticker, TICK_PERIOD};
pub use timer::{
    IntervalConfig, IntervalMachine, IntervalSnapshot, IntervalState, IntervalTimer, Lifecycle,
    Phase, RunStatus, SimpleTimer, Stopwatch, StopwatchState,
};
