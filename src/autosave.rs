//! Periodic background saving.
//!
//! One worker thread sleeps on a condition variable between ticks so the
//! sleep can be cut short on shutdown. Every tick re-checks the enabled flag
//! after taking the save lock and again before sleeping, so once a
//! disablement is observed no further tick is scheduled. At most one extra
//! save can land after the flag flips.

use std::{
    io,
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

use crate::error::DocumentError;

pub const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);

/// What the scheduler saves, and the flag and lock it coordinates on.
pub trait AutosaveTarget: Send + Sync + 'static {
    fn autosave_enabled(&self) -> bool;

    fn disable_autosave(&self);

    /// Held for the duration of every save, periodic or not.
    fn save_lock(&self) -> &Mutex<()>;

    /// Writes the document out. Only called with `save_lock` held.
    fn persist(&self) -> Result<(), DocumentError>;
}

/// Outcome of a periodic save, forwarded to the UI status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutosaveEvent {
    Saved,
    Failed(String),
}

#[derive(Debug, Default)]
struct TimerState {
    cancelled: bool,
    pending: bool,
    ticks: u64,
}

#[derive(Debug, Default)]
struct TimerInner {
    state: Mutex<TimerState>,
    cv: Condvar,
}

impl TimerInner {
    fn state(&self) -> MutexGuard<'_, TimerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleeps one interval. Returns false if cancelled before it elapsed.
    fn wait_for_tick(&self, interval: Duration) -> bool {
        let deadline = Instant::now() + interval;
        let mut state = self.state();
        if state.cancelled {
            return false;
        }
        state.pending = true;
        loop {
            if state.cancelled {
                state.pending = false;
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            state = self
                .cv
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        state.pending = false;
        true
    }

    fn record_tick(&self) {
        self.state().ticks += 1;
    }

    fn cancel(&self) {
        let mut state = self.state();
        state.cancelled = true;
        self.cv.notify_all();
    }
}

pub struct AutosaveScheduler<T: AutosaveTarget> {
    target: Arc<T>,
    inner: Arc<TimerInner>,
    worker: Option<JoinHandle<()>>,
}

impl<T: AutosaveTarget> AutosaveScheduler<T> {
    pub fn start(target: Arc<T>, events: Sender<AutosaveEvent>) -> io::Result<Self> {
        Self::with_interval(target, AUTOSAVE_INTERVAL, events)
    }

    /// Starts the worker if autosaving is enabled; otherwise the scheduler
    /// only performs the final save on shutdown.
    pub fn with_interval(
        target: Arc<T>,
        interval: Duration,
        events: Sender<AutosaveEvent>,
    ) -> io::Result<Self> {
        let inner = Arc::new(TimerInner::default());
        let worker = if target.autosave_enabled() {
            info!(target: "autosave", interval_ms = interval.as_millis() as u64, "autosave_started");
            let handle = thread::Builder::new()
                .name("skrevo-autosave".to_owned())
                .spawn({
                    let target = target.clone();
                    let inner = inner.clone();
                    move || run_worker(target, inner, interval, events)
                })?;
            Some(handle)
        } else {
            None
        };
        Ok(Self {
            target,
            inner,
            worker,
        })
    }

    /// True while the worker thread is alive.
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// True while a future tick is waiting to fire.
    pub fn is_tick_pending(&self) -> bool {
        self.inner.state().pending
    }

    /// Number of ticks that attempted a save.
    pub fn ticks(&self) -> u64 {
        self.inner.state().ticks
    }

    /// Disable, cancel the pending tick, then save once more under the save
    /// lock so the file reflects the last edit.
    pub fn shutdown(mut self) -> Result<(), DocumentError> {
        self.target.disable_autosave();
        self.stop_worker();
        let _guard = self
            .target
            .save_lock()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let result = self.target.persist();
        match &result {
            Ok(()) => info!(target: "autosave", "final_save_ok"),
            Err(err) => warn!(target: "autosave", %err, "final_save_failed"),
        }
        result
    }

    fn stop_worker(&mut self) {
        self.inner.cancel();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!(target: "autosave", "autosave_worker_panicked");
            }
        }
    }
}

impl<T: AutosaveTarget> Drop for AutosaveScheduler<T> {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

fn run_worker<T: AutosaveTarget>(
    target: Arc<T>,
    inner: Arc<TimerInner>,
    interval: Duration,
    events: Sender<AutosaveEvent>,
) {
    while inner.wait_for_tick(interval) {
        if !target.autosave_enabled() {
            break;
        }
        let result = {
            let _guard = target
                .save_lock()
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !target.autosave_enabled() {
                break;
            }
            target.persist()
        };
        inner.record_tick();

        let event = match result {
            Ok(()) => {
                debug!(target: "autosave", "autosave_ok");
                AutosaveEvent::Saved
            }
            Err(err) => {
                warn!(target: "autosave", %err, "autosave_failed");
                AutosaveEvent::Failed(err.to_string())
            }
        };
        // The UI may already be gone during shutdown.
        let _ = events.send(event);

        if !target.autosave_enabled() {
            break;
        }
    }
    debug!(target: "autosave", "autosave_stopped");
}
