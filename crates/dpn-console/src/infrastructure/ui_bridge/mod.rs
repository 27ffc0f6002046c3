//! Command bridge: exposes application-layer operations to the console front end.
//!
//! Every user command typed at the prompt ends up calling one of the async
//! functions in this module.  They all take the shared [`AppState`] and return
//! a [`CommandResult`], so the front end only ever has to print `data` or
//! `error`.
//!
//! # Data Transfer Objects (DTOs)
//!
//! The application layer works with rich types (`ConnectionState`,
//! `FileRecord`, `TransferState`).  The DTOs here flatten them into plain,
//! serialisable fields ready for display or for `--json` style output:
//!
//! - [`StatusDto`]   – the "Network Status" panel.
//! - [`TransferDto`] – phase and percentage of the current transfer.
//! - [`FileDto`]     – the record held in the handoff slot.
//!
//! # `CommandResult<T>` wrapper
//!
//! All commands return `CommandResult<T>` rather than `Result<T, E>`, so every
//! response has the same shape: `{ success, data, error }`.

pub mod console_command;

use std::path::Path;
use std::sync::Arc;

use dpn_core::{guess_mime_type, AesGcmCipher, FileRecord, HardwareVariant, PairingAuthenticator};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};
use tracing::info;

use crate::application::{
    connect_session::{ConnectionSession, DpnNetwork, SessionError, SessionStatus},
    diagnostics::DiagnosticConsole,
    encryption::{EncryptionWorkflow, KeySource},
    handoff_slot::{DownloadOutcome, HandoffSlot, SlotStore},
    message_log::MessageLog,
    track_transfer::{TransferDirection, TransferTracker},
};
use crate::infrastructure::storage::config::{AppConfig, ConfigError};

// ── Shared application state ──────────────────────────────────────────────────

/// State shared by every command.
///
/// Fields that commands mutate sit behind an async Tokio `Mutex`, because the
/// connect command holds the session across the network await.  The tracker,
/// handoff slot, and diagnostic console synchronise internally.
pub struct AppState {
    /// The connection/pairing state machine.
    pub session: Mutex<ConnectionSession>,
    /// The single transfer shared by send, receive, upload, and download.
    pub tracker: Arc<TransferTracker>,
    pub handoff: HandoffSlot,
    pub messages: Mutex<MessageLog>,
    pub diagnostics: DiagnosticConsole,
    pub encryption: EncryptionWorkflow,
    /// Identity passed to every handoff slot call.
    pub identity: Mutex<String>,
    pub config: AppConfig,
}

impl AppState {
    /// Wires the application components from `config` and the injected
    /// adapters.
    ///
    /// Also returns the receiver carrying diagnostic console lines.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Pairing`] if the configured PINs are unusable.
    pub fn new(
        config: AppConfig,
        network: Arc<dyn DpnNetwork>,
        store: Arc<dyn SlotStore>,
    ) -> Result<(Arc<Self>, mpsc::Receiver<String>), ConfigError> {
        let authenticator = PairingAuthenticator::new(config.pairing_secrets()?);
        let tracker = Arc::new(TransferTracker::new(config.transfer_tick()));
        let (diagnostics, line_rx) = DiagnosticConsole::new(config.console_line_period());

        let state = Arc::new(Self {
            session: Mutex::new(ConnectionSession::new(network, authenticator)),
            handoff: HandoffSlot::new(store, Arc::clone(&tracker)),
            tracker,
            messages: Mutex::new(MessageLog::new()),
            diagnostics,
            encryption: EncryptionWorkflow::new(Arc::new(AesGcmCipher::new())),
            identity: Mutex::new(config.console.identity.clone()),
            config,
        });
        Ok((state, line_rx))
    }

    async fn current_identity(&self) -> String {
        self.identity.lock().await.clone()
    }
}

// ── Data Transfer Objects ─────────────────────────────────────────────────────

/// DTO for the network status panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDto {
    pub connected: bool,
    pub phase: String,
    pub device_id: String,
    pub network_type: String,
    pub peer_count: u32,
    pub endpoint: Option<String>,
    /// Accessory awaiting a PIN, if the PIN dialog is open.
    pub pairing_with: Option<String>,
}

impl From<&SessionStatus> for StatusDto {
    fn from(s: &SessionStatus) -> Self {
        Self {
            connected: s.state.is_connected,
            phase: format!("{:?}", s.phase),
            device_id: s.device_id_label().to_string(),
            network_type: s.network_label().to_string(),
            peer_count: s.state.peer_count,
            endpoint: s.endpoint.clone(),
            pairing_with: s.pairing_variant.map(|v| v.display_name().to_string()),
        }
    }
}

/// DTO for the transfer progress bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferDto {
    pub phase: String,
    pub progress: u8,
}

impl From<dpn_core::TransferState> for TransferDto {
    fn from(s: dpn_core::TransferState) -> Self {
        Self {
            phase: s.phase.to_string(),
            progress: s.progress,
        }
    }
}

/// DTO for a handoff slot record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDto {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub uploader: String,
    /// RFC 3339 timestamp.
    pub uploaded_at: String,
}

impl From<&FileRecord> for FileDto {
    fn from(r: &FileRecord) -> Self {
        Self {
            name: r.name.clone(),
            size_bytes: r.size_bytes,
            mime_type: r.mime_type.clone(),
            uploader: r.uploader_identity.clone(),
            uploaded_at: r.uploaded_at.to_rfc3339(),
        }
    }
}

/// DTO for a finished download attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadDto {
    pub notice: String,
    pub completed: bool,
    pub file: Option<FileDto>,
}

/// DTO for an encryption result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionDto {
    pub ciphertext: String,
    pub key: String,
}

/// Unified response wrapper used by every command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// ── Connection commands ───────────────────────────────────────────────────────

/// Returns the current network status.
pub async fn get_status(state: Arc<AppState>) -> CommandResult<StatusDto> {
    let session = state.session.lock().await;
    CommandResult::ok(StatusDto::from(&session.status()))
}

/// Connects to the peer at `address`.
pub async fn connect_by_address(state: Arc<AppState>, address: &str) -> CommandResult<StatusDto> {
    let mut session = state.session.lock().await;
    match session.begin_address_connection(address.trim()).await {
        Ok(()) => CommandResult::ok(StatusDto::from(&session.status())),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Opens the PIN dialog for the accessory named by `variant` (`a`/`tplink`
/// or `b`/`attiny85`).
pub async fn select_hardware(state: Arc<AppState>, variant: &str) -> CommandResult<String> {
    let variant: HardwareVariant = match variant.parse() {
        Ok(v) => v,
        Err(e) => return CommandResult::err(format!("{e}")),
    };
    let mut session = state.session.lock().await;
    match session.select_hardware_variant(variant) {
        Ok(()) => CommandResult::ok(variant.display_name().to_string()),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Submits a PIN for the open pairing dialog.
pub async fn submit_pin(state: Arc<AppState>, pin: &str) -> CommandResult<StatusDto> {
    let mut session = state.session.lock().await;
    match session.submit_pin(pin) {
        Ok(()) => CommandResult::ok(StatusDto::from(&session.status())),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Closes the PIN dialog.  `data` is `false` when no dialog was open.
pub async fn cancel_pairing(state: Arc<AppState>) -> CommandResult<bool> {
    let mut session = state.session.lock().await;
    CommandResult::ok(session.cancel_pairing())
}

// ── Transfer commands ─────────────────────────────────────────────────────────

/// Starts a send or receive transfer.  Requires a connected session.
pub async fn start_transfer(
    state: Arc<AppState>,
    direction: TransferDirection,
) -> CommandResult<TransferDto> {
    {
        let session = state.session.lock().await;
        if !session.is_connected() {
            let operation = match direction {
                TransferDirection::Send => "send",
                TransferDirection::Receive => "receive",
            };
            return CommandResult::err(
                SessionError::InvalidState {
                    operation,
                    phase: session.phase(),
                }
                .to_string(),
            );
        }
    }
    state.tracker.start();
    info!("{direction} transfer requested");
    CommandResult::ok(TransferDto::from(state.tracker.snapshot()))
}

/// Cancels the running transfer.  `data` is `false` when nothing was running.
pub async fn cancel_transfer(state: Arc<AppState>) -> CommandResult<bool> {
    match state.tracker.current() {
        Some(handle) if !handle.is_finished() => {
            handle.cancel();
            CommandResult::ok(true)
        }
        _ => CommandResult::ok(false),
    }
}

/// Returns the current transfer state.
pub async fn get_transfer(state: Arc<AppState>) -> CommandResult<TransferDto> {
    CommandResult::ok(TransferDto::from(state.tracker.snapshot()))
}

// ── Handoff commands ──────────────────────────────────────────────────────────

/// Publishes the file at `path` to the handoff slot as the current identity.
///
/// Only metadata is read; the file contents are not copied anywhere.
pub async fn upload_file(state: Arc<AppState>, path: &Path) -> CommandResult<FileDto> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) => m,
        Err(e) => return CommandResult::err(format!("cannot read {}: {e}", path.display())),
    };
    if !metadata.is_file() {
        return CommandResult::err(format!("{} is not a file", path.display()));
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return CommandResult::err(format!("{} has no usable file name", path.display()));
    };

    let record = FileRecord::new(
        name,
        metadata.len(),
        guess_mime_type(name),
        state.current_identity().await,
    );
    let dto = FileDto::from(&record);
    match state.handoff.publish(record) {
        Ok(_transfer) => CommandResult::ok(dto),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Downloads the slot's record as the current identity and waits for the
/// transfer to finish.
pub async fn download_file(state: Arc<AppState>) -> CommandResult<DownloadDto> {
    let identity = state.current_identity().await;
    match state.handoff.complete_download(&identity).await {
        Ok(outcome) => {
            let notice = outcome.notice();
            let (completed, file) = match &outcome {
                DownloadOutcome::Completed(r) => (true, Some(FileDto::from(r))),
                DownloadOutcome::Cancelled(r) => (false, Some(FileDto::from(r))),
                DownloadOutcome::NotAvailable(_) => (false, None),
            };
            CommandResult::ok(DownloadDto {
                notice,
                completed,
                file,
            })
        }
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Removes the current identity's own record from the handoff slot.
/// `data` is `false` when there was nothing of theirs to remove.
pub async fn withdraw_file(state: Arc<AppState>) -> CommandResult<bool> {
    let identity = state.current_identity().await;
    match state.handoff.withdraw(&identity) {
        Ok(removed) => CommandResult::ok(removed),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

// ── Messaging and diagnostics ─────────────────────────────────────────────────

/// Posts a message.  `data` is `false` for blank input.
pub async fn post_message(state: Arc<AppState>, text: &str) -> CommandResult<bool> {
    CommandResult::ok(state.messages.lock().await.post(text))
}

pub async fn get_messages(state: Arc<AppState>) -> CommandResult<Vec<String>> {
    CommandResult::ok(state.messages.lock().await.read())
}

/// Starts the diagnostic script.  Lines arrive on the receiver returned by
/// [`AppState::new`].
pub async fn run_diagnostics(state: Arc<AppState>) -> CommandResult<()> {
    state.diagnostics.run();
    CommandResult::ok(())
}

// ── Identity ──────────────────────────────────────────────────────────────────

pub async fn get_identity(state: Arc<AppState>) -> CommandResult<String> {
    CommandResult::ok(state.current_identity().await)
}

/// Switches the identity used for handoff slot calls.
pub async fn set_identity(state: Arc<AppState>, identity: &str) -> CommandResult<String> {
    let identity = identity.trim();
    if identity.is_empty() {
        return CommandResult::err("identity must not be empty");
    }
    *state.identity.lock().await = identity.to_string();
    info!("identity switched to {identity}");
    CommandResult::ok(identity.to_string())
}

// ── Encryption tool ───────────────────────────────────────────────────────────

/// Encrypts `plaintext` with `key`, or with a fresh random key when `None`.
pub async fn encrypt_text(
    state: Arc<AppState>,
    plaintext: &str,
    key: Option<String>,
) -> CommandResult<EncryptionDto> {
    let source = key.map_or(KeySource::Random, KeySource::Manual);
    match state.encryption.encrypt(plaintext, source) {
        Ok(r) => CommandResult::ok(EncryptionDto {
            ciphertext: r.ciphertext,
            key: r.key,
        }),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

pub async fn decrypt_text(state: Arc<AppState>, key: &str, ciphertext: &str) -> CommandResult<String> {
    match state.encryption.decrypt(ciphertext, key) {
        Ok(plaintext) => CommandResult::ok(plaintext),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Encrypts the text content of the file at `path`.
pub async fn encrypt_file(
    state: Arc<AppState>,
    path: &Path,
    key: Option<String>,
) -> CommandResult<EncryptionDto> {
    match tokio::fs::read_to_string(path).await {
        Ok(plaintext) => encrypt_text(state, &plaintext, key).await,
        Err(e) => CommandResult::err(format!("cannot read {}: {e}", path.display())),
    }
}

/// Decrypts ciphertext stored in the file at `path`.  Surrounding whitespace
/// (such as a trailing newline) is ignored.
pub async fn decrypt_file(state: Arc<AppState>, key: &str, path: &Path) -> CommandResult<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(ciphertext) => decrypt_text(state, key, ciphertext.trim()).await,
        Err(e) => CommandResult::err(format!("cannot read {}: {e}", path.display())),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
