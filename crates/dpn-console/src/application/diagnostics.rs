//! DiagnosticConsole: emits the scripted status sequence on a fixed cadence.
//!
//! The sequence is fixed and literal.  It says nothing about the real
//! connection state; it is the console's "self-check" animation.  Each line is
//! appended to the transcript and pushed on the channel returned by
//! [`DiagnosticConsole::new`], one line per period, first line after one
//! period.
//!
//! A run can be cancelled through its [`TaskHandle`].  Calling
//! [`DiagnosticConsole::run`] while a run is still emitting returns the
//! in-flight handle instead of starting a second, interleaved stream.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::task::{SingleFlight, TaskControl, TaskHandle, TaskOutcome};

/// The scripted diagnostic lines, in emission order.
pub const DIAGNOSTIC_SCRIPT: [&str; 5] = [
    "Initializing secure connection...",
    "Verifying hardware signature...",
    "Establishing encrypted tunnel...",
    "Running security checks...",
    "Connection established successfully!",
];

/// Capacity of the line channel handed to the presentation layer.
const LINE_CHANNEL_CAPACITY: usize = 64;

/// Owner of the diagnostic transcript and the emission task.
pub struct DiagnosticConsole {
    period: Duration,
    transcript: Arc<Mutex<Vec<String>>>,
    line_tx: mpsc::Sender<String>,
    flight: SingleFlight,
}

impl DiagnosticConsole {
    /// Creates a console emitting one line per `period`, together with the
    /// receiver that delivers every emitted line.
    pub fn new(period: Duration) -> (Self, mpsc::Receiver<String>) {
        let (line_tx, line_rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
        let console = Self {
            period,
            transcript: Arc::new(Mutex::new(Vec::new())),
            line_tx,
            flight: SingleFlight::new("diagnostics"),
        };
        (console, line_rx)
    }

    /// Starts emitting the script from its first line.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn run(&self) -> TaskHandle {
        let transcript = Arc::clone(&self.transcript);
        let line_tx = self.line_tx.clone();
        let period = self.period;
        self.flight.start(move |control| {
            info!("diagnostic run started");
            emit(transcript, line_tx, period, control)
        })
    }

    /// Every line emitted so far, across all runs, in order.
    pub fn transcript(&self) -> Vec<String> {
        self.transcript
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

async fn emit(
    transcript: Arc<Mutex<Vec<String>>>,
    line_tx: mpsc::Sender<String>,
    period: Duration,
    control: TaskControl,
) {
    for line in DIAGNOSTIC_SCRIPT {
        tokio::time::sleep(period).await;
        if control.is_cancelled() {
            info!("diagnostic run cancelled");
            control.finish(TaskOutcome::Cancelled);
            return;
        }

        transcript
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(line.to_string());
        // A dropped receiver only means nobody is displaying the lines.
        if line_tx.send(line.to_string()).await.is_err() {
            debug!("diagnostic line receiver closed");
        }
    }
    info!("diagnostic run finished");
    control.finish(TaskOutcome::Completed);
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    const PERIOD: Duration = Duration::from_millis(1000);

    #[tokio::test(start_paused = true)]
    async fn test_run_emits_script_in_order_one_per_period() {
        // Arrange
        let (console, mut rx) = DiagnosticConsole::new(PERIOD);
        let started_at = Instant::now();

        // Act
        let handle = console.run();
        let mut received = Vec::new();
        let mut arrivals = Vec::new();
        for _ in 0..DIAGNOSTIC_SCRIPT.len() {
            received.push(rx.recv().await.expect("line"));
            arrivals.push(started_at.elapsed());
        }
        handle.wait().await;

        // Assert
        assert_eq!(received, DIAGNOSTIC_SCRIPT.to_vec());
        assert_eq!(
            arrivals,
            (1..=5).map(|n| PERIOD * n).collect::<Vec<_>>()
        );
        assert_eq!(console.transcript(), DIAGNOSTIC_SCRIPT.to_vec());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rerun_restarts_from_first_line() {
        let (console, _rx) = DiagnosticConsole::new(PERIOD);
        assert_eq!(console.run().wait().await, TaskOutcome::Completed);
        console.run().wait().await;

        let transcript = console.transcript();
        assert_eq!(transcript.len(), 10);
        assert_eq!(transcript[5], DIAGNOSTIC_SCRIPT[0]);
        assert_eq!(transcript[9], DIAGNOSTIC_SCRIPT[4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_run_does_not_interleave_streams() {
        // Arrange
        let (console, _rx) = DiagnosticConsole::new(PERIOD);
        let first = console.run();
        tokio::time::sleep(PERIOD * 2 + PERIOD / 2).await;

        // Act
        let second = console.run();
        second.wait().await;

        // Assert
        assert!(first.is_finished());
        assert_eq!(console.transcript(), DIAGNOSTIC_SCRIPT.to_vec());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_emission() {
        let (console, _rx) = DiagnosticConsole::new(PERIOD);
        let handle = console.run();
        tokio::time::sleep(PERIOD + PERIOD / 2).await;

        handle.cancel();
        let outcome = handle.wait().await;

        assert_eq!(outcome, TaskOutcome::Cancelled);
        assert_eq!(console.transcript(), vec![DIAGNOSTIC_SCRIPT[0].to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_emission_continues_without_a_receiver() {
        let (console, rx) = DiagnosticConsole::new(PERIOD);
        drop(rx);
        console.run().wait().await;
        assert_eq!(console.transcript().len(), DIAGNOSTIC_SCRIPT.len());
    }
}
