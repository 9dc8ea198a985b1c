//! Recurring tick schedule.
//!
//! A [`Ticker`] spawns one tokio task per schedule that invokes a callback
//! once per period. The returned [`TickHandle`] is the only way to stop it:
//! cancelling is idempotent and dropping the handle cancels too, so a
//! schedule never outlives its owner.
//!
//! Missed periods (the host was suspended, the runtime was starved) are not
//! replayed. Each callback invocation stands for exactly one period.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// One logical second.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Spawns recurring schedules onto a tokio runtime.
#[derive(Debug, Clone)]
pub struct Ticker {
    runtime: Handle,
}

impl Ticker {
    /// Ticker bound to an explicit runtime.
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Ticker bound to the runtime of the calling context.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime, like `tokio::spawn`.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Invoke `callback` once per `period` until the handle is cancelled.
    ///
    /// The first invocation happens one full period after this call.
    pub fn schedule_recurring<F>(&self, period: Duration, mut callback: F) -> TickHandle
    where
        F: FnMut() + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        let first = Instant::now() + period;
        let task = self.runtime.spawn(async move {
            let mut interval = interval_at(first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                callback();
            }
        });
        TickHandle { task: Some(task) }
    }
}

/// Owned handle to a running schedule.
#[derive(Debug)]
pub struct TickHandle {
    task: Option<JoinHandle<()>>,
}

impl TickHandle {
    /// Stop the schedule. Calling this more than once is a no-op.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
