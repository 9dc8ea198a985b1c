//! Runtime timer engines.
//!
//! [`SimpleTimer`] and [`IntervalTimer`] wrap the pure state machines with a
//! tick schedule, a feedback sink and a completion callback. All mutations
//! go through one mutex; cues and callbacks run after it is released, so a
//! callback may call back into the engine.
//!
//! ## Usage
//!
//! ```ignore
//! let timer = IntervalTimer::new(config, Arc::new(NullSink));
//! timer.on_complete(|done| println!("{}s", done.duration_secs));
//! timer.start();
//! let mut updates = timer.subscribe();
//! while updates.changed().await.is_ok() { /* render */ }
//! ```

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::effects::{Effects, ScheduleChange};
use super::interval::{IntervalConfig, IntervalMachine, IntervalSnapshot};
use super::stopwatch::{Stopwatch, StopwatchState};
use crate::events::Completion;
use crate::feedback::{Cue, FeedbackSink};
use crate::tick::{TickHandle, Ticker, TICK_PERIOD};

/// Completion callback. Invoked at most once per run.
pub type CompletionFn = Box<dyn FnMut(Completion) + Send>;

/// Lifecycle shared by both engines.
///
/// Every method returns whether it changed anything; calls that make no
/// sense in the current state are no-ops.
pub trait Lifecycle {
    fn start(&self) -> bool;
    fn pause(&self) -> bool;
    fn resume(&self) -> bool;
    fn stop(&self) -> bool;
    fn reset(&self) -> bool;
}

/// A state machine the driver can tick.
trait Machine: Send + 'static {
    type Snapshot: Clone + Send + Sync + 'static;

    fn tick(&mut self) -> Effects;
    fn snapshot(&self) -> Self::Snapshot;
}

impl Machine for Stopwatch {
    type Snapshot = StopwatchState;

    fn tick(&mut self) -> Effects {
        Stopwatch::tick(self)
    }

    fn snapshot(&self) -> StopwatchState {
        self.state().clone()
    }
}

impl Machine for IntervalMachine {
    type Snapshot = IntervalSnapshot;

    fn tick(&mut self) -> Effects {
        IntervalMachine::tick(self, Utc::now())
    }

    fn snapshot(&self) -> IntervalSnapshot {
        IntervalMachine::snapshot(self)
    }
}

struct Slot<M> {
    machine: M,
    schedule: Option<TickHandle>,
    /// Bumped on every arm/disarm. A tick carrying an older epoch was
    /// already in flight when its schedule was cancelled and is dropped.
    epoch: u64,
}

impl<M> Slot<M> {
    fn disarm(&mut self) {
        self.epoch += 1;
        if let Some(mut handle) = self.schedule.take() {
            handle.cancel();
        }
    }
}

/// Sink and callback, shared with the tick task.
struct Collaborators {
    sink: Arc<dyn FeedbackSink>,
    on_complete: Mutex<Option<CompletionFn>>,
}

impl Collaborators {
    fn dispatch(&self, effects: Effects) {
        for cue in effects.cues {
            self.emit(cue);
        }
        if let Some(completion) = effects.completion {
            self.complete(completion);
        }
    }

    fn emit(&self, cue: Cue) {
        match catch_unwind(AssertUnwindSafe(|| self.sink.emit(cue))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(cue = cue.label(), "feedback cue dropped: {e}"),
            Err(_) => warn!(cue = cue.label(), "feedback sink panicked"),
        }
    }

    fn complete(&self, completion: Completion) {
        info!(
            exercise = %completion.exercise,
            duration_secs = completion.duration_secs,
            "run complete"
        );
        // Run the callback unlocked so it may register a replacement.
        let Some(mut callback) = lock(&self.on_complete).take() else {
            return;
        };
        if catch_unwind(AssertUnwindSafe(|| callback(completion))).is_err() {
            warn!("completion callback panicked");
        }
        let mut slot = lock(&self.on_complete);
        if slot.is_none() {
            *slot = Some(callback);
        }
    }
}

/// Shared mechanics: one slot, one schedule, one update channel.
struct Driver<M: Machine> {
    slot: Arc<Mutex<Slot<M>>>,
    collaborators: Arc<Collaborators>,
    updates: Arc<watch::Sender<M::Snapshot>>,
    ticker: Ticker,
}

impl<M: Machine> Driver<M> {
    fn new(machine: M, ticker: Ticker, sink: Arc<dyn FeedbackSink>) -> Self {
        let (updates, _) = watch::channel(machine.snapshot());
        Self {
            slot: Arc::new(Mutex::new(Slot {
                machine,
                schedule: None,
                epoch: 0,
            })),
            collaborators: Arc::new(Collaborators {
                sink,
                on_complete: Mutex::new(None),
            }),
            updates: Arc::new(updates),
            ticker,
        }
    }

    /// Run a command against the machine. `None` from `op` means no-op.
    fn apply<F>(&self, op: F) -> bool
    where
        F: FnOnce(&mut M) -> Option<Effects>,
    {
        let effects = {
            let mut slot = lock(&self.slot);
            let Some(effects) = op(&mut slot.machine) else {
                return false;
            };
            match effects.schedule {
                ScheduleChange::Arm => self.arm(&mut slot),
                ScheduleChange::Disarm => slot.disarm(),
                ScheduleChange::Keep => {}
            }
            self.updates.send_replace(slot.machine.snapshot());
            effects
        };
        self.collaborators.dispatch(effects);
        true
    }

    fn arm(&self, slot: &mut Slot<M>) {
        if slot.schedule.as_ref().is_some_and(TickHandle::is_active) {
            return;
        }
        slot.epoch += 1;
        let epoch = slot.epoch;
        let weak: Weak<Mutex<Slot<M>>> = Arc::downgrade(&self.slot);
        let collaborators = Arc::clone(&self.collaborators);
        let updates = Arc::clone(&self.updates);

        let handle = self.ticker.schedule_recurring(TICK_PERIOD, move || {
            let Some(slot) = weak.upgrade() else {
                return;
            };
            let effects = {
                let mut slot = lock(&slot);
                if slot.epoch != epoch {
                    return;
                }
                let effects = slot.machine.tick();
                if effects.schedule == ScheduleChange::Disarm {
                    slot.disarm();
                }
                updates.send_replace(slot.machine.snapshot());
                effects
            };
            collaborators.dispatch(effects);
        });
        slot.schedule = Some(handle);
    }

    fn snapshot(&self) -> M::Snapshot {
        lock(&self.slot).machine.snapshot()
    }

    fn subscribe(&self) -> watch::Receiver<M::Snapshot> {
        self.updates.subscribe()
    }

    fn set_on_complete(&self, callback: CompletionFn) {
        *lock(&self.collaborators.on_complete) = Some(callback);
    }

    fn schedule_active(&self) -> bool {
        lock(&self.slot)
            .schedule
            .as_ref()
            .is_some_and(TickHandle::is_active)
    }
}

impl<M: Machine> Drop for Driver<M> {
    fn drop(&mut self) {
        let mut slot = lock(&self.slot);
        if slot.schedule.is_some() {
            debug!("engine dropped with an active schedule, cancelling");
        }
        slot.disarm();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Stopwatch engine for continuous holds.
pub struct SimpleTimer {
    driver: Driver<Stopwatch>,
}

impl SimpleTimer {
    /// Engine ticking on the current tokio runtime.
    pub fn new(sink: Arc<dyn FeedbackSink>) -> Self {
        Self::with_ticker(Ticker::current(), sink)
    }

    pub fn with_ticker(ticker: Ticker, sink: Arc<dyn FeedbackSink>) -> Self {
        Self {
            driver: Driver::new(Stopwatch::new(), ticker, sink),
        }
    }

    pub fn on_complete<F>(&self, callback: F)
    where
        F: FnMut(Completion) + Send + 'static,
    {
        self.driver.set_on_complete(Box::new(callback));
    }

    pub fn state(&self) -> StopwatchState {
        self.driver.snapshot()
    }

    /// Receives a new state after every tick and command.
    pub fn subscribe(&self) -> watch::Receiver<StopwatchState> {
        self.driver.subscribe()
    }

    pub fn is_scheduled(&self) -> bool {
        self.driver.schedule_active()
    }
}

impl Lifecycle for SimpleTimer {
    fn start(&self) -> bool {
        debug!("stopwatch start");
        self.driver.apply(|sw| sw.start(Utc::now()))
    }

    fn pause(&self) -> bool {
        debug!("stopwatch pause");
        self.driver.apply(Stopwatch::pause)
    }

    fn resume(&self) -> bool {
        debug!("stopwatch resume");
        self.driver.apply(|sw| sw.resume(Utc::now()))
    }

    fn stop(&self) -> bool {
        debug!("stopwatch stop");
        self.driver.apply(|sw| sw.stop(Utc::now()))
    }

    fn reset(&self) -> bool {
        debug!("stopwatch reset");
        self.driver.apply(Stopwatch::reset)
    }
}

/// Work/rest interval engine.
pub struct IntervalTimer {
    driver: Driver<IntervalMachine>,
}

impl IntervalTimer {
    /// Engine ticking on the current tokio runtime.
    pub fn new(config: IntervalConfig, sink: Arc<dyn FeedbackSink>) -> Self {
        Self::with_ticker(config, Ticker::current(), sink)
    }

    pub fn with_ticker(config: IntervalConfig, ticker: Ticker, sink: Arc<dyn FeedbackSink>) -> Self {
        Self {
            driver: Driver::new(IntervalMachine::new(config), ticker, sink),
        }
    }

    pub fn on_complete<F>(&self, callback: F)
    where
        F: FnMut(Completion) + Send + 'static,
    {
        self.driver.set_on_complete(Box::new(callback));
    }

    /// Replace the config; takes effect now if idle, otherwise after the run.
    pub fn set_config(&self, config: IntervalConfig) -> bool {
        let mut applied = false;
        self.driver.apply(|machine| {
            applied = machine.set_config(config);
            Some(Effects::default())
        });
        applied
    }

    pub fn snapshot(&self) -> IntervalSnapshot {
        self.driver.snapshot()
    }

    /// Receives a new snapshot after every tick and command.
    pub fn subscribe(&self) -> watch::Receiver<IntervalSnapshot> {
        self.driver.subscribe()
    }

    pub fn is_scheduled(&self) -> bool {
        self.driver.schedule_active()
    }
}

impl Lifecycle for IntervalTimer {
    fn start(&self) -> bool {
        debug!("interval start");
        self.driver.apply(|m| m.start(Utc::now()))
    }

    fn pause(&self) -> bool {
        debug!("interval pause");
        self.driver.apply(IntervalMachine::pause)
    }

    fn resume(&self) -> bool {
        debug!("interval resume");
        self.driver.apply(IntervalMachine::resume)
    }

    fn stop(&self) -> bool {
        debug!("interval stop");
        self.driver.apply(|m| m.stop(Utc::now()))
    }

    fn reset(&self) -> bool {
        debug!("interval reset");
        self.driver.apply(IntervalMachine::reset)
    }
}
