//! TransferTracker: drives the single active transfer on a fixed cadence.
//!
//! # Timing (for beginners)
//!
//! Starting a transfer resets the state to `{transferring, 0}` and spawns a
//! Tokio task that, once per tick (500 ms by default), adds 10 to the
//! progress.  The tenth tick reaches 100, marks the transfer `completed`, and
//! the task exits on its own:
//!
//! ```text
//! t=0      start()      transferring   0
//! t=1×tick              transferring  10
//! …
//! t=10×tick             completed    100   (driver stops)
//! ```
//!
//! Observers never poll the task.  They read [`TransferTracker::snapshot`] or
//! subscribe to a `watch` channel that carries every state change.
//!
//! Send and receive use the identical mechanism; the direction is only a
//! label the caller attaches (see [`TransferDirection`]).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dpn_core::TransferState;
use tokio::sync::watch;
use tracing::{debug, info};

use super::task::{SingleFlight, TaskControl, TaskHandle, TaskOutcome};

/// Caller-side label for a transfer.  Not tracked by the tracker itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    Send,
    Receive,
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Send => f.write_str("send"),
            Self::Receive => f.write_str("receive"),
        }
    }
}

/// Exclusive owner of the [`TransferState`].
pub struct TransferTracker {
    tick: Duration,
    state: Arc<watch::Sender<TransferState>>,
    flight: SingleFlight,
}

impl TransferTracker {
    /// Creates a tracker in the `pending` state that advances once per `tick`.
    pub fn new(tick: Duration) -> Self {
        let (tx, _rx) = watch::channel(TransferState::default());
        Self {
            tick,
            state: Arc::new(tx),
            flight: SingleFlight::new("transfer"),
        }
    }

    /// Starts a transfer run and returns its handle.
    ///
    /// The state is re-initialised to `{transferring, 0}` regardless of how the
    /// previous run ended.  If a run is still in flight, no new run is started
    /// and the in-flight run's handle is returned instead.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> TaskHandle {
        let state = Arc::clone(&self.state);
        let tick = self.tick;
        self.flight.start(move |control| {
            state.send_replace(TransferState::started());
            info!("transfer started");
            drive(state, tick, control)
        })
    }

    /// Current state of the transfer.
    pub fn snapshot(&self) -> TransferState {
        *self.state.borrow()
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<TransferState> {
        self.state.subscribe()
    }

    /// Handle of the most recent run, if any run was ever started.
    pub fn current(&self) -> Option<TaskHandle> {
        self.flight.current()
    }
}

/// The periodic driver: one step per tick until completed or cancelled.
async fn drive(state: Arc<watch::Sender<TransferState>>, tick: Duration, control: TaskControl) {
    loop {
        tokio::time::sleep(tick).await;

        if control.is_cancelled() {
            state.send_modify(|s| s.cancel());
            info!("transfer cancelled at {}%", state.borrow().progress);
            control.finish(TaskOutcome::Cancelled);
            return;
        }

        let mut completed = false;
        state.send_modify(|s| completed = s.advance());
        debug!("transfer progress {}%", state.borrow().progress);

        if completed {
            info!("transfer completed");
            control.finish(TaskOutcome::Completed);
            return;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
