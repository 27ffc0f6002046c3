//! Transfer progress state machine.
//!
//! A transfer is a simulated progress run from 0 to 100 in fixed steps.  Sends
//! and receives use the identical mechanism; direction is a caller-side label
//! and is not tracked here.
//!
//! ```text
//! Pending ──start──► Transferring(0) ─advance─► … ─advance─► Completed(100)
//!                         │
//!                       cancel
//!                         ▼
//!                  Cancelled(last progress)
//! ```
//!
//! This module only knows how one step changes the state.  The timing
//! (one step per tick) is driven by `TransferTracker` in `dpn-console`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Progress added on every tick.
pub const TRANSFER_STEP: u8 = 10;

/// Progress value of a finished transfer.
pub const TRANSFER_COMPLETE: u8 = 100;

/// Lifecycle phase of the active transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferPhase {
    Pending,
    Transferring,
    Completed,
    Cancelled,
}

impl fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Transferring => "transferring",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        })
    }
}

/// The single active transfer's state.
///
/// Invariant: `progress` never decreases within one run and `phase` is
/// `Completed` only when `progress == 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferState {
    pub phase: TransferPhase,
    pub progress: u8,
}

impl Default for TransferState {
    fn default() -> Self {
        Self {
            phase: TransferPhase::Pending,
            progress: 0,
        }
    }
}

impl TransferState {
    /// The state at the beginning of every run, regardless of prior state.
    pub fn started() -> Self {
        Self {
            phase: TransferPhase::Transferring,
            progress: 0,
        }
    }

    /// Returns `true` while the run is still advancing.
    pub fn is_running(&self) -> bool {
        self.phase == TransferPhase::Transferring
    }

    /// Applies one tick.  Progress grows by [`TRANSFER_STEP`], clamped to 100;
    /// reaching 100 completes the run.  Ticks on a run that is not
    /// transferring are ignored.
    ///
    /// Returns `true` once the run has completed.
    pub fn advance(&mut self) -> bool {
        if !self.is_running() {
            return self.phase == TransferPhase::Completed;
        }
        self.progress = self
            .progress
            .saturating_add(TRANSFER_STEP)
            .min(TRANSFER_COMPLETE);
        if self.progress == TRANSFER_COMPLETE {
            self.phase = TransferPhase::Completed;
        }
        self.phase == TransferPhase::Completed
    }

    /// Stops a running transfer, keeping the progress reached so far.
    pub fn cancel(&mut self) {
        if self.is_running() {
            self.phase = TransferPhase::Cancelled;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
