//! HandoffSlot: the single-record file handoff between two identities.
//!
//! # How a handoff works (for beginners)
//!
//! ```text
//!  alice@example.com                         bob@example.com
//!  ─────────────────                         ───────────────
//!  publish(record)  ──► [ slot: 1 record ] ──► fetch("bob@…")   → Ready
//!                                          └─► fetch("alice@…") → NotAvailable(OwnUpload)
//! ```
//!
//! The slot holds at most one [`FileRecord`].  A new publish overwrites the
//! previous record unconditionally (last write wins).  A fetch by the record's
//! own uploader comes back `NotAvailable`: the slot models a two-party
//! exchange, not personal storage.
//!
//! Both publish and a successful fetch start a [`TransferTracker`] run, so the
//! console shows progress for uploads and downloads alike.
//!
//! The record itself lives behind the [`SlotStore`] port.  The infrastructure
//! layer provides a JSON-file store (survives restarts) and an in-memory store.

use std::path::PathBuf;
use std::sync::Arc;

use dpn_core::{FileRecord, NotAvailableReason};
use thiserror::Error;
use tracing::{info, warn};

use super::task::{TaskHandle, TaskOutcome};
use super::track_transfer::TransferTracker;

/// Errors raised by a [`SlotStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on slot file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("slot file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("failed to serialise file record: {0}")]
    Serialize(String),
}

/// Errors raised by [`HandoffSlot`] operations.
///
/// "Nothing to fetch" is not an error; see [`FetchOutcome::NotAvailable`].
#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("handoff slot storage failed: {0}")]
    Store(#[from] StoreError),
}

/// Persistence port for the single handoff record.
///
/// The record is read and written as a whole.  An absent record (`Ok(None)`)
/// is a valid state distinct from a storage failure.
pub trait SlotStore: Send + Sync {
    fn load(&self) -> Result<Option<FileRecord>, StoreError>;
    fn save(&self, record: &FileRecord) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// Result of [`HandoffSlot::fetch`].
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The record is available; `transfer` tracks the download run.
    Ready {
        record: FileRecord,
        transfer: TaskHandle,
    },
    NotAvailable(NotAvailableReason),
}

/// Result of [`HandoffSlot::complete_download`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Completed(FileRecord),
    /// The download run was cancelled before reaching 100%.
    Cancelled(FileRecord),
    NotAvailable(NotAvailableReason),
}

impl DownloadOutcome {
    /// User-facing notice for this outcome.
    pub fn notice(&self) -> String {
        match self {
            Self::Completed(record) => {
                format!("File \"{}\" downloaded successfully!", record.name)
            }
            Self::Cancelled(record) => format!("Download of \"{}\" cancelled", record.name),
            Self::NotAvailable(_) => "No files available for download".to_string(),
        }
    }
}

/// Mediates the single handoff record and its transfer side effects.
pub struct HandoffSlot {
    store: Arc<dyn SlotStore>,
    tracker: Arc<TransferTracker>,
}

impl HandoffSlot {
    pub fn new(store: Arc<dyn SlotStore>, tracker: Arc<TransferTracker>) -> Self {
        Self { store, tracker }
    }

    /// Stores `record`, replacing whatever the slot held, and starts an upload
    /// transfer run.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Store`] if the record could not be persisted.
    /// No transfer is started in that case.
    pub fn publish(&self, record: FileRecord) -> Result<TaskHandle, HandoffError> {
        self.store.save(&record)?;
        info!(
            "published \"{}\" ({} bytes) as {}",
            record.name, record.size_bytes, record.uploader_identity
        );
        Ok(self.tracker.start())
    }

    /// Looks up the record on behalf of `requester`.
    ///
    /// Returns `NotAvailable` when the slot is empty or when `requester` is
    /// the record's uploader.  Otherwise starts a download transfer run and
    /// returns the record with the run's handle.
    pub fn fetch(&self, requester: &str) -> Result<FetchOutcome, HandoffError> {
        let Some(record) = self.store.load()? else {
            info!("fetch by {requester}: slot empty");
            return Ok(FetchOutcome::NotAvailable(NotAvailableReason::EmptySlot));
        };
        if record.is_uploaded_by(requester) {
            info!("fetch by {requester}: own upload");
            return Ok(FetchOutcome::NotAvailable(NotAvailableReason::OwnUpload));
        }

        info!("fetch by {requester}: downloading \"{}\"", record.name);
        let transfer = self.tracker.start();
        Ok(FetchOutcome::Ready { record, transfer })
    }

    /// Fetches on behalf of `requester` and waits for the download run to end.
    ///
    /// The caller is notified only after the transfer has finished.  The
    /// result follows the run's own outcome, so a transfer started right after
    /// it completes cannot turn a finished download into a cancelled one.
    pub async fn complete_download(&self, requester: &str) -> Result<DownloadOutcome, HandoffError> {
        match self.fetch(requester)? {
            FetchOutcome::NotAvailable(reason) => Ok(DownloadOutcome::NotAvailable(reason)),
            FetchOutcome::Ready { record, transfer } => {
                match transfer.wait().await {
                    TaskOutcome::Completed => Ok(DownloadOutcome::Completed(record)),
                    outcome => {
                        warn!("download of \"{}\" ended {outcome:?}", record.name);
                        Ok(DownloadOutcome::Cancelled(record))
                    }
                }
            }
        }
    }

    /// Removes the record if `requester` uploaded it.
    ///
    /// Returns `false`, leaving the slot untouched, when it is empty or holds
    /// someone else's record.
    pub fn withdraw(&self, requester: &str) -> Result<bool, HandoffError> {
        match self.store.load()? {
            Some(record) if record.is_uploaded_by(requester) => {
                self.store.clear()?;
                info!("{requester} withdrew \"{}\"", record.name);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// The stored record, without any identity check or transfer.
    pub fn peek(&self) -> Result<Option<FileRecord>, HandoffError> {
        Ok(self.store.load()?)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use dpn_core::TransferPhase;
    use std::sync::Mutex;
    use std::time::Duration;

    const TICK: Duration = Duration::from_millis(500);

    // ── Test doubles ──────────────────────────────────────────────────────────

    #[derive(Default)]
    struct RecordingStore {
        slot: Mutex<Option<FileRecord>>,
        saves: Mutex<u32>,
        fail_saves: bool,
    }

    impl SlotStore for RecordingStore {
        fn load(&self) -> Result<Option<FileRecord>, StoreError> {
            Ok(self.slot.lock().unwrap().clone())
        }

        fn save(&self, record: &FileRecord) -> Result<(), StoreError> {
            if self.fail_saves {
                return Err(StoreError::Serialize("disk full".to_string()));
            }
            *self.saves.lock().unwrap() += 1;
            *self.slot.lock().unwrap() = Some(record.clone());
            Ok(())
        }

        fn clear(&self) -> Result<(), StoreError> {
            *self.slot.lock().unwrap() = None;
            Ok(())
        }
    }

    fn make_slot(store: Arc<RecordingStore>) -> (HandoffSlot, Arc<TransferTracker>) {
        let tracker = Arc::new(TransferTracker::new(TICK));
        (HandoffSlot::new(store, Arc::clone(&tracker)), tracker)
    }

    fn record_by(uploader: &str, name: &str) -> FileRecord {
        FileRecord::new(name, 2048, "text/plain", uploader)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_on_empty_slot_is_not_available() {
        let (slot, tracker) = make_slot(Arc::default());

        let outcome = slot.fetch("bob@example.com").unwrap();

        assert!(matches!(
            outcome,
            FetchOutcome::NotAvailable(NotAvailableReason::EmptySlot)
        ));
        assert!(tracker.current().is_none(), "no transfer for an empty slot");
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_saves_and_starts_transfer() {
        // Arrange
        let store = Arc::new(RecordingStore::default());
        let (slot, tracker) = make_slot(Arc::clone(&store));

        // Act
        let handle = slot.publish(record_by("alice@example.com", "a.txt")).unwrap();

        // Assert
        assert_eq!(*store.saves.lock().unwrap(), 1);
        assert_eq!(tracker.snapshot().phase, TransferPhase::Transferring);
        handle.wait().await;
        assert_eq!(tracker.snapshot().phase, TransferPhase::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_uploader_cannot_fetch_own_record() {
        let (slot, _tracker) = make_slot(Arc::default());
        slot.publish(record_by("alice@example.com", "a.txt"))
            .unwrap()
            .wait()
            .await;

        let outcome = slot.fetch("alice@example.com").unwrap();

        assert!(matches!(
            outcome,
            FetchOutcome::NotAvailable(NotAvailableReason::OwnUpload)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_identity_fetches_record_with_transfer() {
        let (slot, _tracker) = make_slot(Arc::default());
        let record = record_by("alice@example.com", "a.txt");
        slot.publish(record.clone()).unwrap().wait().await;

        let outcome = slot.fetch("bob@example.com").unwrap();

        match outcome {
            FetchOutcome::Ready {
                record: fetched,
                transfer,
            } => {
                assert_eq!(fetched, record);
                assert!(!transfer.is_finished());
            }
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_publish_wins() {
        let (slot, _tracker) = make_slot(Arc::default());
        slot.publish(record_by("alice@example.com", "first.txt"))
            .unwrap()
            .wait()
            .await;
        slot.publish(record_by("carol@example.com", "second.txt"))
            .unwrap()
            .wait()
            .await;

        let outcome = slot.complete_download("bob@example.com").await.unwrap();

        assert_eq!(
            outcome.notice(),
            "File \"second.txt\" downloaded successfully!"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_download_notifies_after_transfer_completes() {
        // Arrange
        let (slot, tracker) = make_slot(Arc::default());
        slot.publish(record_by("alice@example.com", "report.pdf"))
            .unwrap()
            .wait()
            .await;
        let started_at = tokio::time::Instant::now();

        // Act
        let outcome = slot.complete_download("bob@example.com").await.unwrap();

        // Assert
        assert!(matches!(outcome, DownloadOutcome::Completed(_)));
        assert_eq!(started_at.elapsed(), TICK * 10);
        assert_eq!(tracker.snapshot().progress, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_download_reports_cancellation() {
        let (slot, tracker) = make_slot(Arc::default());
        slot.publish(record_by("alice@example.com", "big.iso"))
            .unwrap()
            .wait()
            .await;

        let download = slot.complete_download("bob@example.com");
        let canceller = async {
            tokio::time::sleep(TICK * 2 + TICK / 2).await;
            tracker.current().expect("download running").cancel();
        };
        let (outcome, ()) = tokio::join!(download, canceller);

        let outcome = outcome.unwrap();
        assert!(matches!(outcome, DownloadOutcome::Cancelled(_)));
        assert_eq!(outcome.notice(), "Download of \"big.iso\" cancelled");
    }

    #[tokio::test(start_paused = true)]
    async fn test_transfer_started_right_after_completion_keeps_download_completed() {
        // Arrange: an observer starts a new transfer the moment the download
        // run reports completion, before the downloader wakes up.
        let (slot, tracker) = make_slot(Arc::default());
        slot.publish(record_by("alice@example.com", "a.txt"))
            .unwrap()
            .wait()
            .await;
        let mut rx = tracker.subscribe();
        let restarter = {
            let tracker = Arc::clone(&tracker);
            tokio::spawn(async move {
                while rx.changed().await.is_ok() {
                    if rx.borrow_and_update().phase == TransferPhase::Completed {
                        return Some(tracker.start());
                    }
                }
                None
            })
        };

        // Act
        let outcome = slot.complete_download("bob@example.com").await.unwrap();
        let restarted = restarter.await.unwrap().expect("observer restarted");

        // Assert
        assert!(matches!(outcome, DownloadOutcome::Completed(_)));
        assert_eq!(outcome.notice(), "File \"a.txt\" downloaded successfully!");
        assert!(!restarted.is_finished());
        assert_eq!(tracker.snapshot(), dpn_core::TransferState::started());
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_failure_surfaces_and_skips_transfer() {
        let store = Arc::new(RecordingStore {
            fail_saves: true,
            ..Default::default()
        });
        let (slot, tracker) = make_slot(store);

        let result = slot.publish(record_by("alice@example.com", "a.txt"));

        assert!(matches!(result, Err(HandoffError::Store(_))));
        assert!(tracker.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_the_uploader_can_withdraw() {
        // Arrange
        let (slot, _tracker) = make_slot(Arc::default());
        assert!(!slot.withdraw("alice@example.com").unwrap(), "empty slot");
        slot.publish(record_by("alice@example.com", "a.txt"))
            .unwrap()
            .wait()
            .await;

        // Act
        let by_bob = slot.withdraw("bob@example.com").unwrap();
        let after_bob = slot.peek().unwrap();
        let by_alice = slot.withdraw("alice@example.com").unwrap();

        // Assert
        assert!(!by_bob);
        assert_eq!(after_bob.map(|r| r.name), Some("a.txt".to_string()));
        assert!(by_alice);
        assert_eq!(slot.peek().unwrap(), None);
        assert!(matches!(
            slot.fetch("bob@example.com").unwrap(),
            FetchOutcome::NotAvailable(NotAvailableReason::EmptySlot)
        ));
    }

    #[test]
    fn test_not_available_notice() {
        let outcome = DownloadOutcome::NotAvailable(NotAvailableReason::OwnUpload);
        assert_eq!(outcome.notice(), "No files available for download");
    }
}
