//! Cancellable, single-flight timer tasks.
//!
//! Both the transfer tracker and the diagnostic console run a periodic driver
//! on a Tokio task.  This module gives them a common shape:
//!
//! - [`TaskHandle`] is returned to the caller.  It can `cancel()` the run,
//!   report `is_finished()`, and `wait()` for the run's [`TaskOutcome`].
//! - [`TaskControl`] is moved into the driver.  The driver checks
//!   `is_cancelled()` on every tick *before* rescheduling itself, and records
//!   how the run ended with `finish()`.  Dropping the control without
//!   finishing (early return or abort) ends the run as `Aborted`.
//!
//! The outcome belongs to the run, not to whatever state the driver was
//! updating, so a waiter still sees `Completed` even if a newer run has
//! already reset that state.
//! - [`SingleFlight`] owns at most one running task.  A second start while
//!   one is in flight returns the existing handle instead of spawning an
//!   overlapping stream.  Dropping it aborts the pending task so nothing keeps
//!   ticking into a torn-down session.

use std::future::Future;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The driver ran to its natural end.
    Completed,
    /// The driver observed a cancellation request and stopped.
    Cancelled,
    /// The driver went away without finishing (aborted or dropped).
    Aborted,
}

/// Caller-side handle to a running (or finished) timer task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    cancelled: Arc<AtomicBool>,
    finished: watch::Receiver<Option<TaskOutcome>>,
}

impl TaskHandle {
    /// Requests cancellation.  The driver observes the flag on its next tick.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Returns `true` once the driver has exited.
    pub fn is_finished(&self) -> bool {
        self.finished.borrow().is_some()
    }

    /// The run's outcome, or `None` while it is still running.
    pub fn outcome(&self) -> Option<TaskOutcome> {
        *self.finished.borrow()
    }

    /// Waits until the driver has exited and returns how the run ended.
    pub async fn wait(&self) -> TaskOutcome {
        let mut finished = self.finished.clone();
        let outcome = match finished.wait_for(Option::is_some).await {
            Ok(outcome) => (*outcome).unwrap_or(TaskOutcome::Aborted),
            // The control always records an outcome before the sender goes away.
            Err(_) => TaskOutcome::Aborted,
        };
        outcome
    }
}

/// Driver-side half of a task: the cancellation flag and the finish signal.
#[derive(Debug)]
pub struct TaskControl {
    cancelled: Arc<AtomicBool>,
    finished: watch::Sender<Option<TaskOutcome>>,
}

impl TaskControl {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Ends the run with `outcome`.
    pub fn finish(self, outcome: TaskOutcome) {
        self.finished.send_replace(Some(outcome));
    }
}

impl Drop for TaskControl {
    fn drop(&mut self) {
        self.finished.send_if_modified(|outcome| {
            if outcome.is_some() {
                return false;
            }
            *outcome = Some(TaskOutcome::Aborted);
            true
        });
    }
}

/// Creates a linked control/handle pair.
pub fn task_pair() -> (TaskControl, TaskHandle) {
    let cancelled = Arc::new(AtomicBool::new(false));
    let (tx, rx) = watch::channel(None);
    (
        TaskControl {
            cancelled: Arc::clone(&cancelled),
            finished: tx,
        },
        TaskHandle {
            cancelled,
            finished: rx,
        },
    )
}

struct Running {
    handle: TaskHandle,
    join: JoinHandle<()>,
}

/// Owner of at most one in-flight timer task.
#[derive(Default)]
pub struct SingleFlight {
    name: &'static str,
    current: Mutex<Option<Running>>,
}

impl SingleFlight {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            current: Mutex::new(None),
        }
    }

    /// Starts a new run via `spawn_driver`, or returns the in-flight run's
    /// handle if one has not finished yet.
    ///
    /// `spawn_driver` is only invoked when a new run actually starts, so any
    /// state reset it performs happens exactly once per run.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<F, Fut>(&self, spawn_driver: F) -> TaskHandle
    where
        F: FnOnce(TaskControl) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(running) = current.as_ref() {
            if !running.handle.is_finished() {
                debug!("{}: run already in flight; coalescing", self.name);
                return running.handle.clone();
            }
        }

        let (control, handle) = task_pair();
        let join = tokio::spawn(spawn_driver(control));
        *current = Some(Running {
            handle: handle.clone(),
            join,
        });
        handle
    }

    /// Handle of the most recent run, finished or not.
    pub fn current(&self) -> Option<TaskHandle> {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|r| r.handle.clone())
    }
}

impl Drop for SingleFlight {
    fn drop(&mut self) {
        let current = self.current.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(running) = current.take() {
            running.join.abort();
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
